mod auth;
mod bookings;
mod db;
mod friends;
mod listings;
mod loyalty;
mod notifications;
mod reviews;
pub mod tags;
mod util;

use std::sync::Arc;

pub use auth::*;
pub use bookings::*;
pub use db::*;
pub use friends::*;
pub use listings::*;
pub use loyalty::*;
pub use notifications::*;
pub use reviews::*;

/// The stayflow marketplace system, facilitating listings, bookings,
/// loyalty, and the social features on top of them.
pub struct StayFlow<Db> {
    database: Arc<Db>,

    pub auth: Auth<Db>,
    pub listings: ListingManager<Db>,
    pub bookings: BookingManager<Db>,
    pub reviews: ReviewManager<Db>,
    pub notifications: Arc<NotificationManager<Db>>,
    pub friends: FriendManager<Db>,
    pub loyalty: Arc<Loyalty<Db>>,
}

impl<Db> StayFlow<Db>
where
    Db: Database,
{
    pub fn new(database: Db) -> Self {
        let database = Arc::new(database);

        let loyalty = Arc::new(Loyalty::new(&database));
        let notifications = Arc::new(NotificationManager::new(&database));

        Self {
            auth: Auth::new(&database),
            listings: ListingManager::new(&database),
            bookings: BookingManager::new(&database, &loyalty, &notifications),
            reviews: ReviewManager::new(&database, &loyalty),
            friends: FriendManager::new(&database),
            notifications,
            loyalty,
            database,
        }
    }

    /// Direct access to the underlying database, for callers that need
    /// reads with no business logic attached
    pub fn database(&self) -> &Arc<Db> {
        &self.database
    }
}
