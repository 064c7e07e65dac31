use chrono::{DateTime, NaiveDate, Utc};

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// A stayflow account
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: PrimaryKey,
    pub email: String,
    /// Display name, unique case-insensitively
    pub name: String,
    pub password: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub flow_points: i32,
    pub flow_tier: FlowTier,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Guest,
    Host,
}

/// The loyalty tier, a pure function of the point total
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlowTier {
    Ripple,
    Wave,
    Surfer,
}

/// Login session data for authentication
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The session token, or key if you will
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// The user that is logged in
    pub user: UserData,
}

/// A property listed by a host
#[derive(Debug, Clone)]
pub struct ListingData {
    pub id: PrimaryKey,
    pub title: String,
    pub location: String,
    pub description: String,
    pub image_url: String,
    /// Price per night
    pub price: f64,
    /// Arithmetic mean of all review ratings, recomputed on review writes
    pub rating: f64,
    pub amenities: Vec<String>,
    pub vibes: Vec<String>,
    pub accessibility_features: Vec<String>,
    /// Travel time in minutes from the searched point of interest
    pub travel_time: Option<f64>,
    pub status: ListingStatus,
    pub host_id: Option<PrimaryKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    Available,
    Unavailable,
}

/// A reservation of a listing for a [check_in, check_out) date range
#[derive(Debug, Clone)]
pub struct BookingData {
    pub id: PrimaryKey,
    pub user_id: PrimaryKey,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub total_price: f64,
    pub status: BookingStatus,
    pub is_split_pay: bool,
    /// Emails invited to share payment. Recorded only, splitting is up to the guests.
    pub invited_emails: Vec<String>,
    pub listing: ListingData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// A review of a listing.
/// Author fields are a snapshot of the user at creation time.
#[derive(Debug, Clone)]
pub struct ReviewData {
    pub id: PrimaryKey,
    pub listing_id: PrimaryKey,
    pub user_id: PrimaryKey,
    pub content: String,
    pub rating: i32,
    pub author_name: String,
    pub author_avatar: String,
    pub created_at: DateTime<Utc>,
}

/// An append-only notification record. Clients poll for these.
#[derive(Debug, Clone)]
pub struct NotificationData {
    pub id: PrimaryKey,
    pub user_id: PrimaryKey,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// One direction of a friendship. An undirected relation is modeled as
/// a single directed row, so lookups must check both directions.
#[derive(Debug, Clone)]
pub struct FriendshipData {
    pub id: PrimaryKey,
    pub requester: UserData,
    pub addressee: UserData,
    pub status: FriendshipStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

/// Aggregate figures for a host's dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HostStatsData {
    pub active_listings: i64,
    pub total_bookings: i64,
    /// Sum of total_price over confirmed bookings only
    pub total_revenue: f64,
}

impl FlowTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ripple => "RIPPLE",
            Self::Wave => "WAVE",
            Self::Surfer => "SURFER",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "SURFER" => Self::Surfer,
            "WAVE" => Self::Wave,
            _ => Self::Ripple,
        }
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "GUEST",
            Self::Host => "HOST",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "HOST" => Self::Host,
            _ => Self::Guest,
        }
    }
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "unavailable" => Self::Unavailable,
            _ => Self::Available,
        }
    }
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "cancelled" => Self::Cancelled,
            _ => Self::Confirmed,
        }
    }
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "ACCEPTED" => Self::Accepted,
            _ => Self::Pending,
        }
    }
}
