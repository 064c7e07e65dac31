use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;

use crate::{
    tags, BookingData, BookingStatus, Database, DatabaseError, DatabaseResult, FlowTier,
    FriendshipData, FriendshipStatus, ListingData, ListingFilter, ListingStatus, NewBooking,
    NewFriendship, NewListing, NewNotification, NewReview, NewSession, NewUser, NotificationData,
    PrimaryKey, Result, ReviewData, SessionData, UpdatedListing, UpdatedUser, UserData, UserRole,
    DEFAULT_IMAGE_URL,
};

/// An in-memory database implementation, used by tests and local development.
/// Rows are stored with the same column encodings as the postgres
/// implementation, so the tag codec is exercised the same way.
#[derive(Default)]
pub struct MemoryDatabase {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    next_id: PrimaryKey,
    users: Vec<UserRec>,
    sessions: Vec<SessionRec>,
    listings: Vec<ListingRec>,
    bookings: Vec<BookingRec>,
    reviews: Vec<ReviewRec>,
    notifications: Vec<NotificationRec>,
    favorites: Vec<(PrimaryKey, PrimaryKey)>,
    friendships: Vec<FriendshipRec>,
}

#[derive(Clone)]
struct UserRec {
    id: PrimaryKey,
    email: String,
    name: String,
    password: String,
    role: String,
    avatar: Option<String>,
    flow_points: i32,
    flow_tier: String,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
struct SessionRec {
    id: PrimaryKey,
    token: String,
    user_id: PrimaryKey,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
struct ListingRec {
    id: PrimaryKey,
    title: String,
    location: String,
    description: String,
    image_url: String,
    price: f64,
    rating: f64,
    amenities: String,
    vibes: String,
    accessibility_features: String,
    travel_time: Option<f64>,
    status: String,
    host_id: Option<PrimaryKey>,
}

#[derive(Clone)]
struct BookingRec {
    id: PrimaryKey,
    listing_id: PrimaryKey,
    user_id: PrimaryKey,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: i32,
    total_price: f64,
    status: String,
    is_split_pay: bool,
    invited_emails: String,
}

#[derive(Clone)]
struct ReviewRec {
    id: PrimaryKey,
    listing_id: PrimaryKey,
    user_id: PrimaryKey,
    content: String,
    rating: i32,
    author_name: String,
    author_avatar: String,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
struct NotificationRec {
    id: PrimaryKey,
    user_id: PrimaryKey,
    kind: String,
    title: String,
    message: String,
    link: Option<String>,
    read: bool,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
struct FriendshipRec {
    id: PrimaryKey,
    requester_id: PrimaryKey,
    addressee_id: PrimaryKey,
    status: String,
}

impl State {
    fn next_id(&mut self) -> PrimaryKey {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, user_id: PrimaryKey) -> Result<UserRec> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })
    }

    fn listing(&self, listing_id: PrimaryKey) -> Result<ListingRec> {
        self.listings
            .iter()
            .find(|l| l.id == listing_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "listing",
                identifier: "id",
            })
    }

    fn booking_data(&self, rec: &BookingRec) -> Result<BookingData> {
        let listing = self.listing(rec.listing_id)?;

        Ok(BookingData {
            id: rec.id,
            user_id: rec.user_id,
            check_in: rec.check_in,
            check_out: rec.check_out,
            guests: rec.guests,
            total_price: rec.total_price,
            status: BookingStatus::from_str(&rec.status),
            is_split_pay: rec.is_split_pay,
            invited_emails: tags::decode(&rec.invited_emails),
            listing: listing_data(&listing),
        })
    }

    fn friendship_data(&self, rec: &FriendshipRec) -> Result<FriendshipData> {
        let requester = self.user(rec.requester_id)?;
        let addressee = self.user(rec.addressee_id)?;

        Ok(FriendshipData {
            id: rec.id,
            requester: user_data(&requester),
            addressee: user_data(&addressee),
            status: FriendshipStatus::from_str(&rec.status),
        })
    }
}

fn user_data(rec: &UserRec) -> UserData {
    UserData {
        id: rec.id,
        email: rec.email.clone(),
        name: rec.name.clone(),
        password: rec.password.clone(),
        role: UserRole::from_str(&rec.role),
        avatar: rec.avatar.clone(),
        flow_points: rec.flow_points,
        flow_tier: FlowTier::from_str(&rec.flow_tier),
        created_at: rec.created_at,
    }
}

fn listing_data(rec: &ListingRec) -> ListingData {
    ListingData {
        id: rec.id,
        title: rec.title.clone(),
        location: rec.location.clone(),
        description: rec.description.clone(),
        image_url: rec.image_url.clone(),
        price: rec.price,
        rating: rec.rating,
        amenities: tags::decode(&rec.amenities),
        vibes: tags::decode(&rec.vibes),
        accessibility_features: tags::decode(&rec.accessibility_features),
        travel_time: rec.travel_time,
        status: ListingStatus::from_str(&rec.status),
        host_id: rec.host_id,
    }
}

fn review_data(rec: &ReviewRec) -> ReviewData {
    ReviewData {
        id: rec.id,
        listing_id: rec.listing_id,
        user_id: rec.user_id,
        content: rec.content.clone(),
        rating: rec.rating,
        author_name: rec.author_name.clone(),
        author_avatar: rec.author_avatar.clone(),
        created_at: rec.created_at,
    }
}

fn notification_data(rec: &NotificationRec) -> NotificationData {
    NotificationData {
        id: rec.id,
        user_id: rec.user_id,
        kind: rec.kind.clone(),
        title: rec.title.clone(),
        message: rec.message.clone(),
        link: rec.link.clone(),
        read: rec.read,
        created_at: rec.created_at,
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        let state = self.state.read();
        state.user(user_id).map(|u| user_data(&u))
    }

    async fn user_by_email(&self, email: &str) -> Result<UserData> {
        let state = self.state.read();

        state
            .users
            .iter()
            .find(|u| u.email == email)
            .map(user_data)
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "email",
            })
    }

    async fn user_by_name(&self, name: &str) -> Result<UserData> {
        let state = self.state.read();

        state
            .users
            .iter()
            .find(|u| u.name.eq_ignore_ascii_case(name))
            .map(user_data)
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "name",
            })
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_email(&new_user.email)
            .await
            .conflict_or_ok("user", "email", &new_user.email)?;

        self.user_by_name(&new_user.name)
            .await
            .conflict_or_ok("user", "name", &new_user.name)?;

        let mut state = self.state.write();
        let rec = UserRec {
            id: state.next_id(),
            email: new_user.email,
            name: new_user.name,
            password: new_user.password,
            role: new_user.role.as_str().to_string(),
            avatar: None,
            flow_points: 0,
            flow_tier: FlowTier::Ripple.as_str().to_string(),
            created_at: Utc::now(),
        };

        state.users.push(rec.clone());
        Ok(user_data(&rec))
    }

    async fn update_user(&self, updated_user: UpdatedUser) -> Result<UserData> {
        let mut state = self.state.write();
        let rec = state
            .users
            .iter_mut()
            .find(|u| u.id == updated_user.id)
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })?;

        if let Some(name) = updated_user.name {
            rec.name = name;
        }
        if let Some(email) = updated_user.email {
            rec.email = email;
        }
        if let Some(password) = updated_user.password {
            rec.password = password;
        }
        if let Some(avatar) = updated_user.avatar {
            rec.avatar = Some(avatar);
        }

        Ok(user_data(rec))
    }

    async fn set_user_loyalty(
        &self,
        user_id: PrimaryKey,
        points: i32,
        tier: FlowTier,
    ) -> Result<UserData> {
        let mut state = self.state.write();
        let rec = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })?;

        rec.flow_points = points;
        rec.flow_tier = tier.as_str().to_string();

        Ok(user_data(rec))
    }

    async fn search_users_by_name(
        &self,
        query: &str,
        exclude: PrimaryKey,
        limit: i64,
    ) -> Result<Vec<UserData>> {
        let state = self.state.read();
        let query = query.to_lowercase();

        let mut users: Vec<_> = state
            .users
            .iter()
            .filter(|u| u.id != exclude && u.name.to_lowercase().contains(&query))
            .map(user_data)
            .collect();

        users.sort_by(|a, b| a.name.cmp(&b.name));
        users.truncate(limit as usize);

        Ok(users)
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let state = self.state.read();

        let rec = state
            .sessions
            .iter()
            .find(|s| s.token == token)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            })?;

        let user = state.user(rec.user_id)?;

        Ok(SessionData {
            id: rec.id,
            token: rec.token,
            expires_at: rec.expires_at,
            user: user_data(&user),
        })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_token(&new_session.token)
            .await
            .conflict_or_ok("session", "token", &new_session.token)?;

        let token = {
            let mut state = self.state.write();
            let rec = SessionRec {
                id: state.next_id(),
                token: new_session.token,
                user_id: new_session.user_id,
                expires_at: new_session.expires_at,
            };

            let token = rec.token.clone();
            state.sessions.push(rec);
            token
        };

        self.session_by_token(&token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        let _ = self.session_by_token(token).await?;

        let mut state = self.state.write();
        state.sessions.retain(|s| s.token != token);

        Ok(())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        let now = Utc::now();
        let mut state = self.state.write();
        state.sessions.retain(|s| s.expires_at > now);

        Ok(())
    }

    async fn listing_by_id(&self, listing_id: PrimaryKey) -> Result<ListingData> {
        let state = self.state.read();
        state.listing(listing_id).map(|l| listing_data(&l))
    }

    async fn search_listings(&self, filter: &ListingFilter) -> Result<Vec<ListingData>> {
        let state = self.state.read();
        let search = filter.search.as_ref().map(|s| s.to_lowercase());

        let listings = state
            .listings
            .iter()
            .filter(|l| {
                search.as_ref().map_or(true, |s| {
                    l.title.to_lowercase().contains(s) || l.location.to_lowercase().contains(s)
                })
            })
            .filter(|l| {
                filter
                    .vibe
                    .as_ref()
                    .map_or(true, |v| tags::contains(&tags::decode(&l.vibes), v))
            })
            .filter(|l| {
                filter
                    .max_travel_time
                    .map_or(true, |max| l.travel_time.is_some_and(|t| t <= max))
            })
            .filter(|l| {
                let features = tags::decode(&l.accessibility_features);
                filter
                    .accessibility
                    .iter()
                    .all(|tag| tags::contains(&features, tag))
            })
            .map(listing_data)
            .collect();

        Ok(listings)
    }

    async fn listings_by_host(&self, host_id: PrimaryKey) -> Result<Vec<ListingData>> {
        let state = self.state.read();

        Ok(state
            .listings
            .iter()
            .filter(|l| l.host_id == Some(host_id))
            .map(listing_data)
            .collect())
    }

    async fn create_listing(&self, new_listing: NewListing) -> Result<ListingData> {
        let mut state = self.state.write();
        let rec = ListingRec {
            id: state.next_id(),
            title: new_listing.title,
            location: new_listing.location,
            description: new_listing.description,
            image_url: new_listing
                .image_url
                .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            price: new_listing.price,
            rating: 0.0,
            amenities: tags::encode(&new_listing.amenities),
            vibes: tags::encode(&new_listing.vibes),
            accessibility_features: tags::encode(&new_listing.accessibility_features),
            travel_time: new_listing.travel_time,
            status: ListingStatus::Available.as_str().to_string(),
            host_id: new_listing.host_id,
        };

        state.listings.push(rec.clone());
        Ok(listing_data(&rec))
    }

    async fn update_listing(&self, updated_listing: UpdatedListing) -> Result<ListingData> {
        let mut state = self.state.write();
        let rec = state
            .listings
            .iter_mut()
            .find(|l| l.id == updated_listing.id)
            .ok_or(DatabaseError::NotFound {
                resource: "listing",
                identifier: "id",
            })?;

        if let Some(title) = updated_listing.title {
            rec.title = title;
        }
        if let Some(location) = updated_listing.location {
            rec.location = location;
        }
        if let Some(description) = updated_listing.description {
            rec.description = description;
        }
        if let Some(image_url) = updated_listing.image_url {
            rec.image_url = image_url;
        }
        if let Some(price) = updated_listing.price {
            rec.price = price;
        }
        if let Some(amenities) = updated_listing.amenities {
            rec.amenities = tags::encode(&amenities);
        }
        if let Some(vibes) = updated_listing.vibes {
            rec.vibes = tags::encode(&vibes);
        }
        if let Some(accessibility) = updated_listing.accessibility_features {
            rec.accessibility_features = tags::encode(&accessibility);
        }
        if let Some(travel_time) = updated_listing.travel_time {
            rec.travel_time = Some(travel_time);
        }
        if let Some(status) = updated_listing.status {
            rec.status = status.as_str().to_string();
        }

        Ok(listing_data(rec))
    }

    async fn set_listing_rating(&self, listing_id: PrimaryKey, rating: f64) -> Result<()> {
        let mut state = self.state.write();
        let rec = state
            .listings
            .iter_mut()
            .find(|l| l.id == listing_id)
            .ok_or(DatabaseError::NotFound {
                resource: "listing",
                identifier: "id",
            })?;

        rec.rating = rating;
        Ok(())
    }

    async fn delete_listing(&self, listing_id: PrimaryKey) -> Result<()> {
        let mut state = self.state.write();

        if !state.listings.iter().any(|l| l.id == listing_id) {
            return Err(DatabaseError::NotFound {
                resource: "listing",
                identifier: "id",
            });
        }

        state.listings.retain(|l| l.id != listing_id);
        state.favorites.retain(|(_, l)| *l != listing_id);

        Ok(())
    }

    async fn booking_by_id(&self, booking_id: PrimaryKey) -> Result<BookingData> {
        let state = self.state.read();

        let rec = state
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "booking",
                identifier: "id",
            })?;

        state.booking_data(&rec)
    }

    async fn list_bookings(&self) -> Result<Vec<BookingData>> {
        let state = self.state.read();
        state.bookings.iter().map(|b| state.booking_data(b)).collect()
    }

    async fn bookings_by_user(&self, user_id: PrimaryKey) -> Result<Vec<BookingData>> {
        let state = self.state.read();

        let mut bookings: Vec<_> = state
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .map(|b| state.booking_data(b))
            .collect::<Result<_>>()?;

        bookings.sort_by(|a, b| b.check_in.cmp(&a.check_in));
        Ok(bookings)
    }

    async fn confirmed_bookings_for_listing(
        &self,
        listing_id: PrimaryKey,
    ) -> Result<Vec<BookingData>> {
        let state = self.state.read();
        let confirmed = BookingStatus::Confirmed.as_str();

        let mut bookings: Vec<_> = state
            .bookings
            .iter()
            .filter(|b| b.listing_id == listing_id && b.status == confirmed)
            .map(|b| state.booking_data(b))
            .collect::<Result<_>>()?;

        bookings.sort_by_key(|b| b.check_in);
        Ok(bookings)
    }

    async fn count_confirmed_bookings(&self, listing_id: PrimaryKey) -> Result<i64> {
        let state = self.state.read();
        let confirmed = BookingStatus::Confirmed.as_str();

        Ok(state
            .bookings
            .iter()
            .filter(|b| b.listing_id == listing_id && b.status == confirmed)
            .count() as i64)
    }

    async fn create_booking(&self, new_booking: NewBooking) -> Result<BookingData> {
        let mut state = self.state.write();
        let _ = state.listing(new_booking.listing_id)?;

        let rec = BookingRec {
            id: state.next_id(),
            listing_id: new_booking.listing_id,
            user_id: new_booking.user_id,
            check_in: new_booking.check_in,
            check_out: new_booking.check_out,
            guests: new_booking.guests,
            total_price: new_booking.total_price,
            status: new_booking.status.as_str().to_string(),
            is_split_pay: new_booking.is_split_pay,
            invited_emails: tags::encode(&new_booking.invited_emails),
        };

        state.bookings.push(rec.clone());
        state.booking_data(&rec)
    }

    async fn create_review(&self, new_review: NewReview) -> Result<ReviewData> {
        let mut state = self.state.write();
        let _ = state.listing(new_review.listing_id)?;

        let rec = ReviewRec {
            id: state.next_id(),
            listing_id: new_review.listing_id,
            user_id: new_review.user_id,
            content: new_review.content,
            rating: new_review.rating,
            author_name: new_review.author_name,
            author_avatar: new_review.author_avatar,
            created_at: Utc::now(),
        };

        state.reviews.push(rec.clone());
        Ok(review_data(&rec))
    }

    async fn reviews_by_listing(&self, listing_id: PrimaryKey) -> Result<Vec<ReviewData>> {
        let state = self.state.read();

        let mut reviews: Vec<_> = state
            .reviews
            .iter()
            .filter(|r| r.listing_id == listing_id)
            .map(review_data)
            .collect();

        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn reviews_by_user(&self, user_id: PrimaryKey) -> Result<Vec<ReviewData>> {
        let state = self.state.read();

        let mut reviews: Vec<_> = state
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(review_data)
            .collect();

        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn average_listing_rating(&self, listing_id: PrimaryKey) -> Result<Option<f64>> {
        let state = self.state.read();

        let ratings: Vec<_> = state
            .reviews
            .iter()
            .filter(|r| r.listing_id == listing_id)
            .map(|r| r.rating as f64)
            .collect();

        if ratings.is_empty() {
            return Ok(None);
        }

        Ok(Some(ratings.iter().sum::<f64>() / ratings.len() as f64))
    }

    async fn create_notification(
        &self,
        new_notification: NewNotification,
    ) -> Result<NotificationData> {
        let mut state = self.state.write();

        let rec = NotificationRec {
            id: state.next_id(),
            user_id: new_notification.user_id,
            kind: new_notification.kind,
            title: new_notification.title,
            message: new_notification.message,
            link: new_notification.link,
            read: false,
            created_at: Utc::now(),
        };

        state.notifications.push(rec.clone());
        Ok(notification_data(&rec))
    }

    async fn notifications_by_user(&self, user_id: PrimaryKey) -> Result<Vec<NotificationData>> {
        let state = self.state.read();

        let mut notifications: Vec<_> = state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(notification_data)
            .collect();

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        notification_id: PrimaryKey,
    ) -> Result<NotificationData> {
        let mut state = self.state.write();
        let rec = state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or(DatabaseError::NotFound {
                resource: "notification",
                identifier: "id",
            })?;

        rec.read = true;
        Ok(notification_data(rec))
    }

    async fn mark_all_notifications_read(&self, user_id: PrimaryKey) -> Result<()> {
        let mut state = self.state.write();

        for rec in state.notifications.iter_mut() {
            if rec.user_id == user_id {
                rec.read = true;
            }
        }

        Ok(())
    }

    async fn favorite_listings(&self, user_id: PrimaryKey) -> Result<Vec<ListingData>> {
        let state = self.state.read();

        let listings = state
            .favorites
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, l)| state.listings.iter().find(|listing| listing.id == *l))
            .map(listing_data)
            .collect();

        Ok(listings)
    }

    async fn is_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> Result<bool> {
        let state = self.state.read();
        Ok(state.favorites.contains(&(user_id, listing_id)))
    }

    async fn add_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> Result<()> {
        let mut state = self.state.write();

        if !state.favorites.contains(&(user_id, listing_id)) {
            state.favorites.push((user_id, listing_id));
        }

        Ok(())
    }

    async fn remove_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> Result<()> {
        let mut state = self.state.write();
        state.favorites.retain(|f| *f != (user_id, listing_id));

        Ok(())
    }

    async fn friendship_by_id(&self, friendship_id: PrimaryKey) -> Result<FriendshipData> {
        let state = self.state.read();

        let rec = state
            .friendships
            .iter()
            .find(|f| f.id == friendship_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "friendship",
                identifier: "id",
            })?;

        state.friendship_data(&rec)
    }

    async fn friendship_between(
        &self,
        requester_id: PrimaryKey,
        addressee_id: PrimaryKey,
    ) -> Result<FriendshipData> {
        let state = self.state.read();

        let rec = state
            .friendships
            .iter()
            .find(|f| f.requester_id == requester_id && f.addressee_id == addressee_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "friendship",
                identifier: "requester:addressee",
            })?;

        state.friendship_data(&rec)
    }

    async fn create_friendship(&self, new_friendship: NewFriendship) -> Result<FriendshipData> {
        self.friendship_between(new_friendship.requester_id, new_friendship.addressee_id)
            .await
            .conflict_or_ok(
                "friendship",
                "requester:addressee",
                format!(
                    "{}:{}",
                    new_friendship.requester_id, new_friendship.addressee_id
                )
                .as_str(),
            )?;

        let mut state = self.state.write();
        let rec = FriendshipRec {
            id: state.next_id(),
            requester_id: new_friendship.requester_id,
            addressee_id: new_friendship.addressee_id,
            status: new_friendship.status.as_str().to_string(),
        };

        state.friendships.push(rec.clone());
        state.friendship_data(&rec)
    }

    async fn set_friendship_status(
        &self,
        friendship_id: PrimaryKey,
        status: FriendshipStatus,
    ) -> Result<FriendshipData> {
        {
            let mut state = self.state.write();
            let rec = state
                .friendships
                .iter_mut()
                .find(|f| f.id == friendship_id)
                .ok_or(DatabaseError::NotFound {
                    resource: "friendship",
                    identifier: "id",
                })?;

            rec.status = status.as_str().to_string();
        }

        self.friendship_by_id(friendship_id).await
    }

    async fn delete_friendship(&self, friendship_id: PrimaryKey) -> Result<()> {
        let mut state = self.state.write();

        if !state.friendships.iter().any(|f| f.id == friendship_id) {
            return Err(DatabaseError::NotFound {
                resource: "friendship",
                identifier: "id",
            });
        }

        state.friendships.retain(|f| f.id != friendship_id);
        Ok(())
    }

    async fn friendships_of(&self, user_id: PrimaryKey) -> Result<Vec<FriendshipData>> {
        let state = self.state.read();
        let accepted = FriendshipStatus::Accepted.as_str();

        state
            .friendships
            .iter()
            .filter(|f| {
                (f.requester_id == user_id || f.addressee_id == user_id) && f.status == accepted
            })
            .map(|f| state.friendship_data(f))
            .collect()
    }

    async fn pending_friendships_for(&self, user_id: PrimaryKey) -> Result<Vec<FriendshipData>> {
        let state = self.state.read();
        let pending = FriendshipStatus::Pending.as_str();

        state
            .friendships
            .iter()
            .filter(|f| f.addressee_id == user_id && f.status == pending)
            .map(|f| state.friendship_data(f))
            .collect()
    }
}
