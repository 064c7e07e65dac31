//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use serde::Serialize;
use stayflow_collab::{
    BookingData, FriendshipData, HostStatsData, ListingData, NotificationData, RankedListing,
    ReviewData, SessionData, UserData,
};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: i32,
    email: String,
    name: String,
    role: String,
    avatar: Option<String>,
    flow_points: i32,
    flow_tier: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    token: String,
    user: User,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    id: i32,
    title: String,
    location: String,
    description: String,
    image_url: String,
    price: f64,
    rating: f64,
    amenities: Vec<String>,
    vibes: Vec<String>,
    accessibility_features: Vec<String>,
    travel_time: Option<f64>,
    status: String,
    host_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoredListing {
    #[serde(flatten)]
    listing: Listing,
    /// Recommendation score the search results are ordered by
    score: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    id: i32,
    user_id: i32,
    check_in: String,
    check_out: String,
    guests: i32,
    total_price: f64,
    status: String,
    is_split_pay: bool,
    invited_emails: Vec<String>,
    listing: Listing,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    id: i32,
    listing_id: i32,
    user_id: i32,
    content: String,
    rating: i32,
    author_name: String,
    author_avatar: String,
    created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    id: i32,
    kind: String,
    title: String,
    message: String,
    link: Option<String>,
    read: bool,
    created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    id: i32,
    requester: User,
    addressee: User,
    status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostStats {
    active_listings: i64,
    total_bookings: i64,
    total_revenue: f64,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.as_str().to_string(),
            avatar: self.avatar.clone(),
            flow_points: self.flow_points,
            flow_tier: self.flow_tier.as_str().to_string(),
        }
    }
}

impl ToSerialized<LoginResult> for SessionData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            token: self.token.clone(),
            user: self.user.to_serialized(),
        }
    }
}

impl ToSerialized<Listing> for ListingData {
    fn to_serialized(&self) -> Listing {
        Listing {
            id: self.id,
            title: self.title.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            price: self.price,
            rating: self.rating,
            amenities: self.amenities.clone(),
            vibes: self.vibes.clone(),
            accessibility_features: self.accessibility_features.clone(),
            travel_time: self.travel_time,
            status: self.status.as_str().to_string(),
            host_id: self.host_id,
        }
    }
}

impl ToSerialized<ScoredListing> for RankedListing {
    fn to_serialized(&self) -> ScoredListing {
        ScoredListing {
            listing: self.listing.to_serialized(),
            score: self.score,
        }
    }
}

impl ToSerialized<Booking> for BookingData {
    fn to_serialized(&self) -> Booking {
        Booking {
            id: self.id,
            user_id: self.user_id,
            check_in: self.check_in.to_string(),
            check_out: self.check_out.to_string(),
            guests: self.guests,
            total_price: self.total_price,
            status: self.status.as_str().to_string(),
            is_split_pay: self.is_split_pay,
            invited_emails: self.invited_emails.clone(),
            listing: self.listing.to_serialized(),
        }
    }
}

impl ToSerialized<Review> for ReviewData {
    fn to_serialized(&self) -> Review {
        Review {
            id: self.id,
            listing_id: self.listing_id,
            user_id: self.user_id,
            content: self.content.clone(),
            rating: self.rating,
            author_name: self.author_name.clone(),
            author_avatar: self.author_avatar.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

impl ToSerialized<Notification> for NotificationData {
    fn to_serialized(&self) -> Notification {
        Notification {
            id: self.id,
            kind: self.kind.clone(),
            title: self.title.clone(),
            message: self.message.clone(),
            link: self.link.clone(),
            read: self.read,
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

impl ToSerialized<Friendship> for FriendshipData {
    fn to_serialized(&self) -> Friendship {
        Friendship {
            id: self.id,
            requester: self.requester.to_serialized(),
            addressee: self.addressee.to_serialized(),
            status: self.status.as_str().to_string(),
        }
    }
}

impl ToSerialized<HostStats> for HostStatsData {
    fn to_serialized(&self) -> HostStats {
        HostStats {
            active_listings: self.active_listings,
            total_bookings: self.total_bookings,
            total_revenue: self.total_revenue,
        }
    }
}
