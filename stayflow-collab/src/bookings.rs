use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use log::warn;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    kinds, BookingData, BookingStatus, Database, DatabaseError, Loyalty, NewBooking,
    NotificationManager, PrimaryKey, BOOKING_POINTS,
};

/// Wire format for check-in and check-out dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Creates and reads bookings. Creation validates the requested stay,
/// rejects date conflicts, and triggers loyalty and notification side
/// effects.
pub struct BookingManager<Db> {
    db: Arc<Db>,
    loyalty: Arc<Loyalty<Db>>,
    notifications: Arc<NotificationManager<Db>>,
    /// Serializes creation per listing. The conflict check and the insert
    /// are not a single database operation, so without this two racing
    /// requests could both pass the check.
    locks: DashMap<PrimaryKey, Arc<Mutex<()>>>,
}

/// A requested stay, with dates still in wire format
#[derive(Debug)]
pub struct BookingRequest {
    pub listing_id: PrimaryKey,
    pub check_in: String,
    pub check_out: String,
    pub guests: i32,
    /// Computed by the caller and trusted as-is
    pub total_price: f64,
    pub is_split_pay: bool,
    pub invited_emails: Vec<String>,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Invalid date format, expected YYYY-MM-DD")]
    InvalidDateFormat,
    #[error("Check-out date must be after check-in date")]
    InvalidDateRange,
    #[error("A booking must have at least one guest")]
    InvalidGuestCount,
    #[error("The selected dates are already booked, please choose different ones")]
    DateConflict,
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

/// Half-open interval overlap: `[a_start, a_end)` intersects `[b_start, b_end)`
fn overlaps(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start < b_end && a_end > b_start
}

impl<Db> BookingManager<Db>
where
    Db: Database,
{
    pub fn new(
        db: &Arc<Db>,
        loyalty: &Arc<Loyalty<Db>>,
        notifications: &Arc<NotificationManager<Db>>,
    ) -> Self {
        Self {
            db: db.clone(),
            loyalty: loyalty.clone(),
            notifications: notifications.clone(),
            locks: Default::default(),
        }
    }

    /// Creates a confirmed booking for a guest.
    ///
    /// The booking insert is the point of no return: loyalty points and
    /// notifications are best-effort afterwards, and a failure there is
    /// logged without voiding the booking.
    pub async fn create(
        &self,
        request: BookingRequest,
        guest_id: PrimaryKey,
    ) -> Result<BookingData, BookingError> {
        let check_in = NaiveDate::parse_from_str(&request.check_in, DATE_FORMAT)
            .map_err(|_| BookingError::InvalidDateFormat)?;
        let check_out = NaiveDate::parse_from_str(&request.check_out, DATE_FORMAT)
            .map_err(|_| BookingError::InvalidDateFormat)?;

        if check_in >= check_out {
            return Err(BookingError::InvalidDateRange);
        }

        if request.guests < 1 {
            return Err(BookingError::InvalidGuestCount);
        }

        let lock = self
            .locks
            .entry(request.listing_id)
            .or_insert_with(Default::default)
            .clone();

        let _guard = lock.lock().await;

        let listing = self.db.listing_by_id(request.listing_id).await?;

        let existing = self
            .db
            .confirmed_bookings_for_listing(request.listing_id)
            .await?;

        let conflict = existing
            .iter()
            .any(|b| overlaps(b.check_in, b.check_out, check_in, check_out));

        if conflict {
            return Err(BookingError::DateConflict);
        }

        let booking = self
            .db
            .create_booking(NewBooking {
                listing_id: request.listing_id,
                user_id: guest_id,
                check_in,
                check_out,
                guests: request.guests,
                total_price: request.total_price,
                status: BookingStatus::Confirmed,
                is_split_pay: request.is_split_pay,
                invited_emails: request.invited_emails,
            })
            .await?;

        if let Err(e) = self.loyalty.award(guest_id, BOOKING_POINTS).await {
            warn!("Booking {} created but points were not awarded: {e}", booking.id);
        }

        let guest_message = format!("You booked {} from {}.", listing.title, check_in);
        let result = self
            .notifications
            .notify(
                guest_id,
                kinds::BOOKING_CONFIRMED,
                "Booking confirmed!",
                guest_message,
                Some("/trips".to_string()),
            )
            .await;

        if let Err(e) = result {
            warn!("Booking {} created but the guest was not notified: {e}", booking.id);
        }

        if let Some(host_id) = listing.host_id {
            let host_message = format!(
                "Someone booked {} for ${}.",
                listing.title, booking.total_price
            );
            let result = self
                .notifications
                .notify(
                    host_id,
                    kinds::NEW_BOOKING,
                    "New booking received!",
                    host_message,
                    Some("/host/dashboard".to_string()),
                )
                .await;

            if let Err(e) = result {
                warn!("Booking {} created but the host was not notified: {e}", booking.id);
            }
        }

        Ok(booking)
    }

    pub async fn booking_by_id(&self, booking_id: PrimaryKey) -> Result<BookingData, DatabaseError> {
        self.db.booking_by_id(booking_id).await
    }

    /// A user's bookings, most recent check-in first
    pub async fn bookings_by_user(
        &self,
        user_id: PrimaryKey,
    ) -> Result<Vec<BookingData>, DatabaseError> {
        self.db.bookings_by_user(user_id).await
    }

    /// Every booking in the system, regardless of guest
    pub async fn all_bookings(&self) -> Result<Vec<BookingData>, DatabaseError> {
        self.db.list_bookings().await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        FlowTier, FriendshipData, FriendshipStatus, ListingData, ListingFilter, MemoryDatabase,
        NewFriendship, NewListing, NewNotification, NewReview, NewSession, NewUser,
        NotificationData, Result as DbResult, ReviewData, SessionData, UpdatedListing,
        UpdatedUser, UserData, UserRole,
    };
    use async_trait::async_trait;

    struct Fixture {
        db: Arc<MemoryDatabase>,
        bookings: Arc<BookingManager<MemoryDatabase>>,
        notifications: Arc<NotificationManager<MemoryDatabase>>,
        guest: PrimaryKey,
        host: PrimaryKey,
        listing: PrimaryKey,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(MemoryDatabase::default());

        let host = db
            .create_user(NewUser {
                email: "host@example.com".to_string(),
                name: "host".to_string(),
                password: "hash".to_string(),
                role: UserRole::Host,
            })
            .await
            .expect("host is created");

        let guest = db
            .create_user(NewUser {
                email: "guest@example.com".to_string(),
                name: "guest".to_string(),
                password: "hash".to_string(),
                role: UserRole::Guest,
            })
            .await
            .expect("guest is created");

        let listing = db
            .create_listing(NewListing {
                title: "Seaside loft".to_string(),
                location: "Valencia".to_string(),
                description: "A loft by the sea".to_string(),
                image_url: None,
                price: 120.0,
                amenities: vec!["Wifi".to_string()],
                vibes: vec!["Relax".to_string()],
                accessibility_features: vec![],
                travel_time: Some(15.0),
                host_id: Some(host.id),
            })
            .await
            .expect("listing is created");

        let loyalty = Arc::new(Loyalty::new(&db));
        let notifications = Arc::new(NotificationManager::new(&db));
        let bookings = Arc::new(BookingManager::new(&db, &loyalty, &notifications));

        Fixture {
            db,
            bookings,
            notifications,
            guest: guest.id,
            host: host.id,
            listing: listing.id,
        }
    }

    fn request(listing: PrimaryKey, check_in: &str, check_out: &str) -> BookingRequest {
        BookingRequest {
            listing_id: listing,
            check_in: check_in.to_string(),
            check_out: check_out.to_string(),
            guests: 2,
            total_price: 360.0,
            is_split_pay: false,
            invited_emails: vec![],
        }
    }

    #[tokio::test]
    async fn rejects_unparsable_dates() {
        let f = fixture().await;

        let result = f
            .bookings
            .create(request(f.listing, "not-a-date", "2025-06-15"), f.guest)
            .await;

        assert!(matches!(result, Err(BookingError::InvalidDateFormat)));
    }

    #[tokio::test]
    async fn rejects_reversed_date_ranges() {
        let f = fixture().await;

        let result = f
            .bookings
            .create(request(f.listing, "2025-06-20", "2025-06-15"), f.guest)
            .await;

        assert!(matches!(result, Err(BookingError::InvalidDateRange)));
    }

    #[tokio::test]
    async fn rejects_bookings_without_guests() {
        let f = fixture().await;

        let mut req = request(f.listing, "2025-06-15", "2025-06-20");
        req.guests = 0;

        let result = f.bookings.create(req, f.guest).await;
        assert!(matches!(result, Err(BookingError::InvalidGuestCount)));
    }

    #[tokio::test]
    async fn rejects_overlapping_confirmed_bookings() {
        let f = fixture().await;

        f.bookings
            .create(request(f.listing, "2025-06-15", "2025-06-20"), f.guest)
            .await
            .expect("first booking succeeds");

        let result = f
            .bookings
            .create(request(f.listing, "2025-06-18", "2025-06-22"), f.guest)
            .await;

        assert!(matches!(result, Err(BookingError::DateConflict)));
    }

    #[tokio::test]
    async fn back_to_back_stays_do_not_conflict() {
        let f = fixture().await;

        f.bookings
            .create(request(f.listing, "2025-06-15", "2025-06-20"), f.guest)
            .await
            .expect("first booking succeeds");

        // Half-open intervals: a check-in on another stay's check-out day is fine
        f.bookings
            .create(request(f.listing, "2025-06-20", "2025-06-25"), f.guest)
            .await
            .expect("adjacent booking succeeds");
    }

    #[tokio::test]
    async fn concurrent_overlapping_requests_yield_one_booking() {
        let f = fixture().await;

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let bookings = f.bookings.clone();
                let listing = f.listing;
                let guest = f.guest;

                tokio::spawn(async move {
                    bookings
                        .create(request(listing, "2025-07-01", "2025-07-05"), guest)
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        let mut conflicts = 0;

        for task in tasks {
            match task.await.expect("task joins") {
                Ok(_) => successes += 1,
                Err(BookingError::DateConflict) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
    }

    #[tokio::test]
    async fn booking_awards_points_and_notifies_both_parties() {
        let f = fixture().await;

        let booking = f
            .bookings
            .create(request(f.listing, "2025-06-15", "2025-06-20"), f.guest)
            .await
            .expect("booking succeeds");

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.listing.title, "Seaside loft");

        let guest = f.db.user_by_id(f.guest).await.expect("guest exists");
        assert_eq!(guest.flow_points, BOOKING_POINTS);

        let guest_inbox = f
            .notifications
            .notifications_for(f.guest)
            .await
            .expect("guest inbox");
        assert_eq!(guest_inbox.len(), 1);
        assert_eq!(guest_inbox[0].kind, kinds::BOOKING_CONFIRMED);

        let host_inbox = f
            .notifications
            .notifications_for(f.host)
            .await
            .expect("host inbox");
        assert_eq!(host_inbox.len(), 1);
        assert_eq!(host_inbox[0].kind, kinds::NEW_BOOKING);
    }

    #[tokio::test]
    async fn bookings_by_user_are_ordered_by_check_in_descending() {
        let f = fixture().await;

        f.bookings
            .create(request(f.listing, "2025-06-01", "2025-06-05"), f.guest)
            .await
            .expect("booking succeeds");
        f.bookings
            .create(request(f.listing, "2025-08-01", "2025-08-05"), f.guest)
            .await
            .expect("booking succeeds");
        f.bookings
            .create(request(f.listing, "2025-07-01", "2025-07-05"), f.guest)
            .await
            .expect("booking succeeds");

        let bookings = f
            .bookings
            .bookings_by_user(f.guest)
            .await
            .expect("bookings listed");

        let check_ins: Vec<_> = bookings.iter().map(|b| b.check_in.to_string()).collect();
        assert_eq!(check_ins, ["2025-08-01", "2025-07-01", "2025-06-01"]);
    }

    #[tokio::test]
    async fn repeated_reads_return_identical_data() {
        let f = fixture().await;

        let created = f
            .bookings
            .create(request(f.listing, "2025-06-15", "2025-06-20"), f.guest)
            .await
            .expect("booking succeeds");

        let first = f
            .bookings
            .booking_by_id(created.id)
            .await
            .expect("booking exists");
        let second = f
            .bookings
            .booking_by_id(created.id)
            .await
            .expect("booking exists");

        assert_eq!(first.id, second.id);
        assert_eq!(first.check_in, second.check_in);
        assert_eq!(first.check_out, second.check_out);
        assert_eq!(first.total_price, second.total_price);
    }

    #[tokio::test]
    async fn all_bookings_spans_every_guest() {
        let f = fixture().await;

        let other = f
            .db
            .create_user(NewUser {
                email: "other@example.com".to_string(),
                name: "other".to_string(),
                password: "hash".to_string(),
                role: UserRole::Guest,
            })
            .await
            .expect("user is created");

        f.bookings
            .create(request(f.listing, "2025-06-01", "2025-06-05"), f.guest)
            .await
            .expect("booking succeeds");
        f.bookings
            .create(request(f.listing, "2025-06-10", "2025-06-15"), other.id)
            .await
            .expect("booking succeeds");

        let all = f.bookings.all_bookings().await.expect("bookings listed");

        assert_eq!(all.len(), 2);
        let guests: Vec<_> = all.iter().map(|b| b.user_id).collect();
        assert!(guests.contains(&f.guest));
        assert!(guests.contains(&other.id));
    }

    /// Delegates to a MemoryDatabase, except the loyalty and notification
    /// writes always fail
    struct FaultyDb {
        inner: Arc<MemoryDatabase>,
    }

    fn injected_failure() -> DatabaseError {
        DatabaseError::Internal("injected write failure".into())
    }

    #[async_trait]
    impl Database for FaultyDb {
        async fn set_user_loyalty(
            &self,
            _user_id: PrimaryKey,
            _points: i32,
            _tier: FlowTier,
        ) -> DbResult<UserData> {
            Err(injected_failure())
        }

        async fn create_notification(
            &self,
            _new_notification: NewNotification,
        ) -> DbResult<NotificationData> {
            Err(injected_failure())
        }

        async fn user_by_id(&self, user_id: PrimaryKey) -> DbResult<UserData> {
            self.inner.user_by_id(user_id).await
        }

        async fn user_by_email(&self, email: &str) -> DbResult<UserData> {
            self.inner.user_by_email(email).await
        }

        async fn user_by_name(&self, name: &str) -> DbResult<UserData> {
            self.inner.user_by_name(name).await
        }

        async fn create_user(&self, new_user: NewUser) -> DbResult<UserData> {
            self.inner.create_user(new_user).await
        }

        async fn update_user(&self, updated_user: UpdatedUser) -> DbResult<UserData> {
            self.inner.update_user(updated_user).await
        }

        async fn search_users_by_name(
            &self,
            query: &str,
            exclude: PrimaryKey,
            limit: i64,
        ) -> DbResult<Vec<UserData>> {
            self.inner.search_users_by_name(query, exclude, limit).await
        }

        async fn session_by_token(&self, token: &str) -> DbResult<SessionData> {
            self.inner.session_by_token(token).await
        }

        async fn create_session(&self, new_session: NewSession) -> DbResult<SessionData> {
            self.inner.create_session(new_session).await
        }

        async fn delete_session_by_token(&self, token: &str) -> DbResult<()> {
            self.inner.delete_session_by_token(token).await
        }

        async fn clear_expired_sessions(&self) -> DbResult<()> {
            self.inner.clear_expired_sessions().await
        }

        async fn listing_by_id(&self, listing_id: PrimaryKey) -> DbResult<ListingData> {
            self.inner.listing_by_id(listing_id).await
        }

        async fn search_listings(&self, filter: &ListingFilter) -> DbResult<Vec<ListingData>> {
            self.inner.search_listings(filter).await
        }

        async fn listings_by_host(&self, host_id: PrimaryKey) -> DbResult<Vec<ListingData>> {
            self.inner.listings_by_host(host_id).await
        }

        async fn create_listing(&self, new_listing: NewListing) -> DbResult<ListingData> {
            self.inner.create_listing(new_listing).await
        }

        async fn update_listing(&self, updated_listing: UpdatedListing) -> DbResult<ListingData> {
            self.inner.update_listing(updated_listing).await
        }

        async fn set_listing_rating(&self, listing_id: PrimaryKey, rating: f64) -> DbResult<()> {
            self.inner.set_listing_rating(listing_id, rating).await
        }

        async fn delete_listing(&self, listing_id: PrimaryKey) -> DbResult<()> {
            self.inner.delete_listing(listing_id).await
        }

        async fn booking_by_id(&self, booking_id: PrimaryKey) -> DbResult<BookingData> {
            self.inner.booking_by_id(booking_id).await
        }

        async fn list_bookings(&self) -> DbResult<Vec<BookingData>> {
            self.inner.list_bookings().await
        }

        async fn bookings_by_user(&self, user_id: PrimaryKey) -> DbResult<Vec<BookingData>> {
            self.inner.bookings_by_user(user_id).await
        }

        async fn confirmed_bookings_for_listing(
            &self,
            listing_id: PrimaryKey,
        ) -> DbResult<Vec<BookingData>> {
            self.inner.confirmed_bookings_for_listing(listing_id).await
        }

        async fn count_confirmed_bookings(&self, listing_id: PrimaryKey) -> DbResult<i64> {
            self.inner.count_confirmed_bookings(listing_id).await
        }

        async fn create_booking(&self, new_booking: NewBooking) -> DbResult<BookingData> {
            self.inner.create_booking(new_booking).await
        }

        async fn create_review(&self, new_review: NewReview) -> DbResult<ReviewData> {
            self.inner.create_review(new_review).await
        }

        async fn reviews_by_listing(&self, listing_id: PrimaryKey) -> DbResult<Vec<ReviewData>> {
            self.inner.reviews_by_listing(listing_id).await
        }

        async fn reviews_by_user(&self, user_id: PrimaryKey) -> DbResult<Vec<ReviewData>> {
            self.inner.reviews_by_user(user_id).await
        }

        async fn average_listing_rating(&self, listing_id: PrimaryKey) -> DbResult<Option<f64>> {
            self.inner.average_listing_rating(listing_id).await
        }

        async fn notifications_by_user(
            &self,
            user_id: PrimaryKey,
        ) -> DbResult<Vec<NotificationData>> {
            self.inner.notifications_by_user(user_id).await
        }

        async fn mark_notification_read(
            &self,
            notification_id: PrimaryKey,
        ) -> DbResult<NotificationData> {
            self.inner.mark_notification_read(notification_id).await
        }

        async fn mark_all_notifications_read(&self, user_id: PrimaryKey) -> DbResult<()> {
            self.inner.mark_all_notifications_read(user_id).await
        }

        async fn favorite_listings(&self, user_id: PrimaryKey) -> DbResult<Vec<ListingData>> {
            self.inner.favorite_listings(user_id).await
        }

        async fn is_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> DbResult<bool> {
            self.inner.is_favorite(user_id, listing_id).await
        }

        async fn add_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> DbResult<()> {
            self.inner.add_favorite(user_id, listing_id).await
        }

        async fn remove_favorite(
            &self,
            user_id: PrimaryKey,
            listing_id: PrimaryKey,
        ) -> DbResult<()> {
            self.inner.remove_favorite(user_id, listing_id).await
        }

        async fn friendship_by_id(&self, friendship_id: PrimaryKey) -> DbResult<FriendshipData> {
            self.inner.friendship_by_id(friendship_id).await
        }

        async fn friendship_between(
            &self,
            requester_id: PrimaryKey,
            addressee_id: PrimaryKey,
        ) -> DbResult<FriendshipData> {
            self.inner.friendship_between(requester_id, addressee_id).await
        }

        async fn create_friendship(
            &self,
            new_friendship: NewFriendship,
        ) -> DbResult<FriendshipData> {
            self.inner.create_friendship(new_friendship).await
        }

        async fn set_friendship_status(
            &self,
            friendship_id: PrimaryKey,
            status: FriendshipStatus,
        ) -> DbResult<FriendshipData> {
            self.inner.set_friendship_status(friendship_id, status).await
        }

        async fn delete_friendship(&self, friendship_id: PrimaryKey) -> DbResult<()> {
            self.inner.delete_friendship(friendship_id).await
        }

        async fn friendships_of(&self, user_id: PrimaryKey) -> DbResult<Vec<FriendshipData>> {
            self.inner.friendships_of(user_id).await
        }

        async fn pending_friendships_for(
            &self,
            user_id: PrimaryKey,
        ) -> DbResult<Vec<FriendshipData>> {
            self.inner.pending_friendships_for(user_id).await
        }
    }

    #[tokio::test]
    async fn booking_stands_when_side_effects_fail() {
        let inner = Arc::new(MemoryDatabase::default());

        let guest = inner
            .create_user(NewUser {
                email: "guest@example.com".to_string(),
                name: "guest".to_string(),
                password: "hash".to_string(),
                role: UserRole::Guest,
            })
            .await
            .expect("guest is created");

        let listing = inner
            .create_listing(NewListing {
                title: "Seaside loft".to_string(),
                location: "Valencia".to_string(),
                description: String::new(),
                image_url: None,
                price: 120.0,
                amenities: vec![],
                vibes: vec![],
                accessibility_features: vec![],
                travel_time: None,
                host_id: None,
            })
            .await
            .expect("listing is created");

        let db = Arc::new(FaultyDb {
            inner: inner.clone(),
        });
        let loyalty = Arc::new(Loyalty::new(&db));
        let notifications = Arc::new(NotificationManager::new(&db));
        let bookings = BookingManager::new(&db, &loyalty, &notifications);

        let booking = bookings
            .create(request(listing.id, "2025-06-15", "2025-06-20"), guest.id)
            .await
            .expect("booking stands even though its side effects fail");

        let stored = inner
            .booking_by_id(booking.id)
            .await
            .expect("booking was persisted");
        assert_eq!(stored.status, BookingStatus::Confirmed);

        let guest = inner.user_by_id(guest.id).await.expect("guest exists");
        assert_eq!(guest.flow_points, 0);

        let inbox = inner
            .notifications_by_user(guest.id)
            .await
            .expect("inbox is readable");
        assert!(inbox.is_empty());
    }
}
