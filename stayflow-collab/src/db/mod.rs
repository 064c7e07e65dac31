use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;
pub type BoxedDatabase = Box<dyn Database>;

/// Fallback image for listings created without one
pub const DEFAULT_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1564013799919-ab600027ffc6?auto=format&fit=crop&w=800&q=80";

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound { .. } => Ok(()),
                e => Err(e),
            },
        }
    }
}

/// Represents a type that can fetch and store stayflow data
#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_email(&self, email: &str) -> Result<UserData>;
    /// Case-insensitive lookup on the display name
    async fn user_by_name(&self, name: &str) -> Result<UserData>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;
    async fn update_user(&self, updated_user: UpdatedUser) -> Result<UserData>;
    /// Writes a new point total and the tier derived from it
    async fn set_user_loyalty(
        &self,
        user_id: PrimaryKey,
        points: i32,
        tier: FlowTier,
    ) -> Result<UserData>;
    async fn search_users_by_name(
        &self,
        query: &str,
        exclude: PrimaryKey,
        limit: i64,
    ) -> Result<Vec<UserData>>;

    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    async fn delete_session_by_token(&self, token: &str) -> Result<()>;
    async fn clear_expired_sessions(&self) -> Result<()>;

    async fn listing_by_id(&self, listing_id: PrimaryKey) -> Result<ListingData>;
    /// Returns listings matching the filter, in arbitrary but stable order.
    /// Ranking is applied by the caller.
    async fn search_listings(&self, filter: &ListingFilter) -> Result<Vec<ListingData>>;
    async fn listings_by_host(&self, host_id: PrimaryKey) -> Result<Vec<ListingData>>;
    async fn create_listing(&self, new_listing: NewListing) -> Result<ListingData>;
    async fn update_listing(&self, updated_listing: UpdatedListing) -> Result<ListingData>;
    async fn set_listing_rating(&self, listing_id: PrimaryKey, rating: f64) -> Result<()>;
    async fn delete_listing(&self, listing_id: PrimaryKey) -> Result<()>;

    async fn booking_by_id(&self, booking_id: PrimaryKey) -> Result<BookingData>;
    /// Every booking in the system, ordered by id
    async fn list_bookings(&self) -> Result<Vec<BookingData>>;
    /// Ordered by check-in descending
    async fn bookings_by_user(&self, user_id: PrimaryKey) -> Result<Vec<BookingData>>;
    async fn confirmed_bookings_for_listing(
        &self,
        listing_id: PrimaryKey,
    ) -> Result<Vec<BookingData>>;
    async fn count_confirmed_bookings(&self, listing_id: PrimaryKey) -> Result<i64>;
    async fn create_booking(&self, new_booking: NewBooking) -> Result<BookingData>;

    async fn create_review(&self, new_review: NewReview) -> Result<ReviewData>;
    async fn reviews_by_listing(&self, listing_id: PrimaryKey) -> Result<Vec<ReviewData>>;
    /// Newest first
    async fn reviews_by_user(&self, user_id: PrimaryKey) -> Result<Vec<ReviewData>>;
    /// Mean over all review ratings for the listing, None if there are no reviews
    async fn average_listing_rating(&self, listing_id: PrimaryKey) -> Result<Option<f64>>;

    async fn create_notification(
        &self,
        new_notification: NewNotification,
    ) -> Result<NotificationData>;
    /// Newest first
    async fn notifications_by_user(&self, user_id: PrimaryKey) -> Result<Vec<NotificationData>>;
    async fn mark_notification_read(&self, notification_id: PrimaryKey)
        -> Result<NotificationData>;
    async fn mark_all_notifications_read(&self, user_id: PrimaryKey) -> Result<()>;

    async fn favorite_listings(&self, user_id: PrimaryKey) -> Result<Vec<ListingData>>;
    async fn is_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> Result<bool>;
    async fn add_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> Result<()>;
    async fn remove_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> Result<()>;

    async fn friendship_by_id(&self, friendship_id: PrimaryKey) -> Result<FriendshipData>;
    /// Directed lookup, requester to addressee only
    async fn friendship_between(
        &self,
        requester_id: PrimaryKey,
        addressee_id: PrimaryKey,
    ) -> Result<FriendshipData>;
    async fn create_friendship(&self, new_friendship: NewFriendship) -> Result<FriendshipData>;
    async fn set_friendship_status(
        &self,
        friendship_id: PrimaryKey,
        status: FriendshipStatus,
    ) -> Result<FriendshipData>;
    async fn delete_friendship(&self, friendship_id: PrimaryKey) -> Result<()>;
    /// Accepted friendships in either direction
    async fn friendships_of(&self, user_id: PrimaryKey) -> Result<Vec<FriendshipData>>;
    /// Pending requests where the user is the addressee
    async fn pending_friendships_for(&self, user_id: PrimaryKey) -> Result<Vec<FriendshipData>>;
}

#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Default)]
pub struct UpdatedUser {
    pub id: PrimaryKey,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub user_id: PrimaryKey,
    pub expires_at: DateTime<Utc>,
}

/// Composable search criteria. Absent fields are no-ops.
#[derive(Debug, Default, Clone)]
pub struct ListingFilter {
    /// Case-insensitive substring match on title or location
    pub search: Option<String>,
    /// Substring containment against the listing's vibes
    pub vibe: Option<String>,
    /// Every tag must be contained in the listing's accessibility features
    pub accessibility: Vec<String>,
    /// Listings without a travel time are excluded when this is set
    pub max_travel_time: Option<f64>,
}

#[derive(Debug)]
pub struct NewListing {
    pub title: String,
    pub location: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: f64,
    pub amenities: Vec<String>,
    pub vibes: Vec<String>,
    pub accessibility_features: Vec<String>,
    pub travel_time: Option<f64>,
    /// The host creating the listing
    pub host_id: Option<PrimaryKey>,
}

#[derive(Debug, Default)]
pub struct UpdatedListing {
    pub id: PrimaryKey,
    pub title: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub amenities: Option<Vec<String>>,
    pub vibes: Option<Vec<String>>,
    pub accessibility_features: Option<Vec<String>>,
    pub travel_time: Option<f64>,
    pub status: Option<ListingStatus>,
}

#[derive(Debug)]
pub struct NewBooking {
    pub listing_id: PrimaryKey,
    pub user_id: PrimaryKey,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub total_price: f64,
    pub status: BookingStatus,
    pub is_split_pay: bool,
    pub invited_emails: Vec<String>,
}

#[derive(Debug)]
pub struct NewReview {
    pub listing_id: PrimaryKey,
    pub user_id: PrimaryKey,
    pub content: String,
    pub rating: i32,
    /// Snapshot of the author at creation time
    pub author_name: String,
    pub author_avatar: String,
}

#[derive(Debug)]
pub struct NewNotification {
    pub user_id: PrimaryKey,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

#[derive(Debug)]
pub struct NewFriendship {
    pub requester_id: PrimaryKey,
    pub addressee_id: PrimaryKey,
    pub status: FriendshipStatus,
}
