use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{postgres::PgPoolOptions, prelude::FromRow, query, query_as, query_scalar};
use sqlx::{Error as SqlxError, PgPool};

use crate::{
    tags, BookingData, BookingStatus, Database, DatabaseError, DatabaseResult, FlowTier,
    FriendshipData, FriendshipStatus, IntoDatabaseError, ListingData, ListingFilter,
    ListingStatus, NewBooking, NewFriendship, NewListing, NewNotification, NewReview, NewSession,
    NewUser, NotificationData, PrimaryKey, Result, ReviewData, SessionData, UpdatedListing,
    UpdatedUser, UserData, UserRole, DEFAULT_IMAGE_URL,
};

/// A postgres database implementation for stayflow
pub struct PgDatabase {
    pool: PgPool,
}

#[derive(FromRow)]
struct UserRow {
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

#[derive(FromRow)]
struct ListingRow {
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

#[derive(FromRow)]
struct BookingRow {
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

#[derive(FromRow)]
struct SessionRow {
    id: PrimaryKey,
    token: String,
    user_id: PrimaryKey,
    expires_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ReviewRow {
    id: PrimaryKey,
    listing_id: PrimaryKey,
    user_id: PrimaryKey,
    content: String,
    rating: i32,
    author_name: String,
    author_avatar: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct NotificationRow {
    id: PrimaryKey,
    user_id: PrimaryKey,
    kind: String,
    title: String,
    message: String,
    link: Option<String>,
    read: bool,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct FriendshipRow {
    id: PrimaryKey,
    requester_id: PrimaryKey,
    addressee_id: PrimaryKey,
    status: String,
}

impl From<UserRow> for UserData {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            password: row.password,
            role: UserRole::from_str(&row.role),
            avatar: row.avatar,
            flow_points: row.flow_points,
            flow_tier: FlowTier::from_str(&row.flow_tier),
            created_at: row.created_at,
        }
    }
}

impl From<ListingRow> for ListingData {
    fn from(row: ListingRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            location: row.location,
            description: row.description,
            image_url: row.image_url,
            price: row.price,
            rating: row.rating,
            amenities: tags::decode(&row.amenities),
            vibes: tags::decode(&row.vibes),
            accessibility_features: tags::decode(&row.accessibility_features),
            travel_time: row.travel_time,
            status: ListingStatus::from_str(&row.status),
            host_id: row.host_id,
        }
    }
}

impl From<ReviewRow> for ReviewData {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            listing_id: row.listing_id,
            user_id: row.user_id,
            content: row.content,
            rating: row.rating,
            author_name: row.author_name,
            author_avatar: row.author_avatar,
            created_at: row.created_at,
        }
    }
}

impl From<NotificationRow> for NotificationData {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind,
            title: row.title,
            message: row.message,
            link: row.link,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }

    async fn booking_from_row(&self, row: BookingRow) -> Result<BookingData> {
        let listing = self.listing_by_id(row.listing_id).await?;

        Ok(BookingData {
            id: row.id,
            user_id: row.user_id,
            check_in: row.check_in,
            check_out: row.check_out,
            guests: row.guests,
            total_price: row.total_price,
            status: BookingStatus::from_str(&row.status),
            is_split_pay: row.is_split_pay,
            invited_emails: tags::decode(&row.invited_emails),
            listing,
        })
    }

    async fn bookings_from_rows(&self, rows: Vec<BookingRow>) -> Result<Vec<BookingData>> {
        let mut bookings = Vec::with_capacity(rows.len());

        for row in rows {
            bookings.push(self.booking_from_row(row).await?);
        }

        Ok(bookings)
    }

    async fn friendship_from_row(&self, row: FriendshipRow) -> Result<FriendshipData> {
        let requester = self.user_by_id(row.requester_id).await?;
        let addressee = self.user_by_id(row.addressee_id).await?;

        Ok(FriendshipData {
            id: row.id,
            requester,
            addressee,
            status: FriendshipStatus::from_str(&row.status),
        })
    }

    async fn friendships_from_rows(&self, rows: Vec<FriendshipRow>) -> Result<Vec<FriendshipData>> {
        let mut friendships = Vec::with_capacity(rows.len());

        for row in rows {
            friendships.push(self.friendship_from_row(row).await?);
        }

        Ok(friendships)
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("user", "id"))
    }

    async fn user_by_email(&self, email: &str) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("user", "email"))
    }

    async fn user_by_name(&self, name: &str) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE lower(name) = lower($1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("user", "name"))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_email(&new_user.email)
            .await
            .conflict_or_ok("user", "email", &new_user.email)?;

        self.user_by_name(&new_user.name)
            .await
            .conflict_or_ok("user", "name", &new_user.name)?;

        query_as::<_, UserRow>(
            "INSERT INTO users (email, name, password, role) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn update_user(&self, updated_user: UpdatedUser) -> Result<UserData> {
        let user = self.user_by_id(updated_user.id).await?;

        query(
            "UPDATE users SET name = $1, email = $2, password = $3, avatar = $4 WHERE id = $5",
        )
        .bind(updated_user.name.unwrap_or(user.name))
        .bind(updated_user.email.unwrap_or(user.email))
        .bind(updated_user.password.unwrap_or(user.password))
        .bind(updated_user.avatar.or(user.avatar))
        .bind(updated_user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.user_by_id(updated_user.id).await
    }

    async fn set_user_loyalty(
        &self,
        user_id: PrimaryKey,
        points: i32,
        tier: FlowTier,
    ) -> Result<UserData> {
        // Ensure user exists
        let _ = self.user_by_id(user_id).await?;

        query("UPDATE users SET flow_points = $1, flow_tier = $2 WHERE id = $3")
            .bind(points)
            .bind(tier.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.user_by_id(user_id).await
    }

    async fn search_users_by_name(
        &self,
        search: &str,
        exclude: PrimaryKey,
        limit: i64,
    ) -> Result<Vec<UserData>> {
        query_as::<_, UserRow>(
            "SELECT * FROM users
             WHERE name ILIKE '%' || $1 || '%' AND id != $2
             ORDER BY name LIMIT $3",
        )
        .bind(search)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(|e| e.any())
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let row = query_as::<_, SessionRow>("SELECT * FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("session", "token"))?;

        let user = self.user_by_id(row.user_id).await?;

        Ok(SessionData {
            id: row.id,
            token: row.token,
            expires_at: row.expires_at,
            user,
        })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_token(&new_session.token)
            .await
            .conflict_or_ok("session", "token", &new_session.token)?;

        let row = query_as::<_, SessionRow>(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&new_session.token)
        .bind(new_session.user_id)
        .bind(new_session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.session_by_token(&row.token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        // Ensure session exists
        let _ = self.session_by_token(token).await?;

        query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        query("DELETE FROM sessions WHERE timezone('UTC', now()) > expires_at")
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn listing_by_id(&self, listing_id: PrimaryKey) -> Result<ListingData> {
        query_as::<_, ListingRow>("SELECT * FROM listings WHERE id = $1")
            .bind(listing_id)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("listing", "id"))
    }

    async fn search_listings(&self, filter: &ListingFilter) -> Result<Vec<ListingData>> {
        let accessibility_patterns: Vec<String> = filter
            .accessibility
            .iter()
            .map(|tag| format!("%{}%", tag))
            .collect();

        query_as::<_, ListingRow>(
            "SELECT * FROM listings
             WHERE ($1::text IS NULL
                OR title ILIKE '%' || $1 || '%'
                OR location ILIKE '%' || $1 || '%')
               AND ($2::text IS NULL OR vibes LIKE '%' || $2 || '%')
               AND ($3::float8 IS NULL
                OR (travel_time IS NOT NULL AND travel_time <= $3))
               AND accessibility_features LIKE ALL($4::text[])
             ORDER BY id",
        )
        .bind(&filter.search)
        .bind(&filter.vibe)
        .bind(filter.max_travel_time)
        .bind(&accessibility_patterns)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(|e| e.any())
    }

    async fn listings_by_host(&self, host_id: PrimaryKey) -> Result<Vec<ListingData>> {
        query_as::<_, ListingRow>("SELECT * FROM listings WHERE host_id = $1 ORDER BY id")
            .bind(host_id)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(|e| e.any())
    }

    async fn create_listing(&self, new_listing: NewListing) -> Result<ListingData> {
        query_as::<_, ListingRow>(
            "INSERT INTO listings
                (title, location, description, image_url, price,
                 amenities, vibes, accessibility_features, travel_time, status, host_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(&new_listing.title)
        .bind(&new_listing.location)
        .bind(&new_listing.description)
        .bind(new_listing.image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL))
        .bind(new_listing.price)
        .bind(tags::encode(&new_listing.amenities))
        .bind(tags::encode(&new_listing.vibes))
        .bind(tags::encode(&new_listing.accessibility_features))
        .bind(new_listing.travel_time)
        .bind(ListingStatus::Available.as_str())
        .bind(new_listing.host_id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn update_listing(&self, updated_listing: UpdatedListing) -> Result<ListingData> {
        let listing = self.listing_by_id(updated_listing.id).await?;

        query(
            "UPDATE listings SET
                title = $1,
                location = $2,
                description = $3,
                image_url = $4,
                price = $5,
                amenities = $6,
                vibes = $7,
                accessibility_features = $8,
                travel_time = $9,
                status = $10
             WHERE id = $11",
        )
        .bind(updated_listing.title.unwrap_or(listing.title))
        .bind(updated_listing.location.unwrap_or(listing.location))
        .bind(updated_listing.description.unwrap_or(listing.description))
        .bind(updated_listing.image_url.unwrap_or(listing.image_url))
        .bind(updated_listing.price.unwrap_or(listing.price))
        .bind(tags::encode(
            &updated_listing.amenities.unwrap_or(listing.amenities),
        ))
        .bind(tags::encode(&updated_listing.vibes.unwrap_or(listing.vibes)))
        .bind(tags::encode(
            &updated_listing
                .accessibility_features
                .unwrap_or(listing.accessibility_features),
        ))
        .bind(updated_listing.travel_time.or(listing.travel_time))
        .bind(updated_listing.status.unwrap_or(listing.status).as_str())
        .bind(updated_listing.id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.listing_by_id(updated_listing.id).await
    }

    async fn set_listing_rating(&self, listing_id: PrimaryKey, rating: f64) -> Result<()> {
        // Ensure listing exists
        let _ = self.listing_by_id(listing_id).await?;

        query("UPDATE listings SET rating = $1 WHERE id = $2")
            .bind(rating)
            .bind(listing_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn delete_listing(&self, listing_id: PrimaryKey) -> Result<()> {
        // Ensure listing exists
        let _ = self.listing_by_id(listing_id).await?;

        query("DELETE FROM listings WHERE id = $1")
            .bind(listing_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn booking_by_id(&self, booking_id: PrimaryKey) -> Result<BookingData> {
        let row = query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("booking", "id"))?;

        self.booking_from_row(row).await
    }

    async fn list_bookings(&self) -> Result<Vec<BookingData>> {
        let rows = query_as::<_, BookingRow>("SELECT * FROM bookings ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.bookings_from_rows(rows).await
    }

    async fn bookings_by_user(&self, user_id: PrimaryKey) -> Result<Vec<BookingData>> {
        let rows = query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY check_in DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.bookings_from_rows(rows).await
    }

    async fn confirmed_bookings_for_listing(
        &self,
        listing_id: PrimaryKey,
    ) -> Result<Vec<BookingData>> {
        let rows = query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE listing_id = $1 AND status = $2 ORDER BY check_in",
        )
        .bind(listing_id)
        .bind(BookingStatus::Confirmed.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.bookings_from_rows(rows).await
    }

    async fn count_confirmed_bookings(&self, listing_id: PrimaryKey) -> Result<i64> {
        query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings WHERE listing_id = $1 AND status = $2",
        )
        .bind(listing_id)
        .bind(BookingStatus::Confirmed.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_booking(&self, new_booking: NewBooking) -> Result<BookingData> {
        // Ensure listing exists
        let _ = self.listing_by_id(new_booking.listing_id).await?;

        let row = query_as::<_, BookingRow>(
            "INSERT INTO bookings
                (listing_id, user_id, check_in, check_out, guests,
                 total_price, status, is_split_pay, invited_emails)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(new_booking.listing_id)
        .bind(new_booking.user_id)
        .bind(new_booking.check_in)
        .bind(new_booking.check_out)
        .bind(new_booking.guests)
        .bind(new_booking.total_price)
        .bind(new_booking.status.as_str())
        .bind(new_booking.is_split_pay)
        .bind(tags::encode(&new_booking.invited_emails))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.booking_from_row(row).await
    }

    async fn create_review(&self, new_review: NewReview) -> Result<ReviewData> {
        // Ensure listing exists
        let _ = self.listing_by_id(new_review.listing_id).await?;

        query_as::<_, ReviewRow>(
            "INSERT INTO reviews
                (listing_id, user_id, content, rating, author_name, author_avatar)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(new_review.listing_id)
        .bind(new_review.user_id)
        .bind(&new_review.content)
        .bind(new_review.rating)
        .bind(&new_review.author_name)
        .bind(&new_review.author_avatar)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn reviews_by_listing(&self, listing_id: PrimaryKey) -> Result<Vec<ReviewData>> {
        query_as::<_, ReviewRow>(
            "SELECT * FROM reviews WHERE listing_id = $1 ORDER BY created_at DESC",
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(|e| e.any())
    }

    async fn reviews_by_user(&self, user_id: PrimaryKey) -> Result<Vec<ReviewData>> {
        query_as::<_, ReviewRow>(
            "SELECT * FROM reviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(|e| e.any())
    }

    async fn average_listing_rating(&self, listing_id: PrimaryKey) -> Result<Option<f64>> {
        query_scalar::<_, Option<f64>>(
            "SELECT AVG(rating)::float8 FROM reviews WHERE listing_id = $1",
        )
        .bind(listing_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_notification(
        &self,
        new_notification: NewNotification,
    ) -> Result<NotificationData> {
        query_as::<_, NotificationRow>(
            "INSERT INTO notifications (user_id, kind, title, message, link)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(new_notification.user_id)
        .bind(&new_notification.kind)
        .bind(&new_notification.title)
        .bind(&new_notification.message)
        .bind(&new_notification.link)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn notifications_by_user(&self, user_id: PrimaryKey) -> Result<Vec<NotificationData>> {
        query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(|e| e.any())
    }

    async fn mark_notification_read(
        &self,
        notification_id: PrimaryKey,
    ) -> Result<NotificationData> {
        query_as::<_, NotificationRow>(
            "UPDATE notifications SET read = true WHERE id = $1 RETURNING *",
        )
        .bind(notification_id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.not_found_or("notification", "id"))
    }

    async fn mark_all_notifications_read(&self, user_id: PrimaryKey) -> Result<()> {
        query("UPDATE notifications SET read = true WHERE user_id = $1 AND read = false")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn favorite_listings(&self, user_id: PrimaryKey) -> Result<Vec<ListingData>> {
        query_as::<_, ListingRow>(
            "SELECT listings.* FROM listings
                INNER JOIN favorites ON favorites.listing_id = listings.id
             WHERE favorites.user_id = $1
             ORDER BY listings.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(|e| e.any())
    }

    async fn is_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> Result<bool> {
        let result =
            query("SELECT user_id FROM favorites WHERE user_id = $1 AND listing_id = $2")
                .bind(user_id)
                .bind(listing_id)
                .fetch_one(&self.pool)
                .await;

        match result {
            Ok(_) => Ok(true),
            Err(SqlxError::RowNotFound) => Ok(false),
            Err(e) => Err(e.any()),
        }
    }

    async fn add_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> Result<()> {
        query(
            "INSERT INTO favorites (user_id, listing_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())
        .map(|_| ())
    }

    async fn remove_favorite(&self, user_id: PrimaryKey, listing_id: PrimaryKey) -> Result<()> {
        query("DELETE FROM favorites WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id)
            .bind(listing_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn friendship_by_id(&self, friendship_id: PrimaryKey) -> Result<FriendshipData> {
        let row = query_as::<_, FriendshipRow>("SELECT * FROM friendships WHERE id = $1")
            .bind(friendship_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("friendship", "id"))?;

        self.friendship_from_row(row).await
    }

    async fn friendship_between(
        &self,
        requester_id: PrimaryKey,
        addressee_id: PrimaryKey,
    ) -> Result<FriendshipData> {
        let row = query_as::<_, FriendshipRow>(
            "SELECT * FROM friendships WHERE requester_id = $1 AND addressee_id = $2",
        )
        .bind(requester_id)
        .bind(addressee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("friendship", "requester:addressee"))?;

        self.friendship_from_row(row).await
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

        let row = query_as::<_, FriendshipRow>(
            "INSERT INTO friendships (requester_id, addressee_id, status)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(new_friendship.requester_id)
        .bind(new_friendship.addressee_id)
        .bind(new_friendship.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.friendship_from_row(row).await
    }

    async fn set_friendship_status(
        &self,
        friendship_id: PrimaryKey,
        status: FriendshipStatus,
    ) -> Result<FriendshipData> {
        // Ensure friendship exists
        let _ = self.friendship_by_id(friendship_id).await?;

        query("UPDATE friendships SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(friendship_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.friendship_by_id(friendship_id).await
    }

    async fn delete_friendship(&self, friendship_id: PrimaryKey) -> Result<()> {
        // Ensure friendship exists
        let _ = self.friendship_by_id(friendship_id).await?;

        query("DELETE FROM friendships WHERE id = $1")
            .bind(friendship_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn friendships_of(&self, user_id: PrimaryKey) -> Result<Vec<FriendshipData>> {
        let rows = query_as::<_, FriendshipRow>(
            "SELECT * FROM friendships
             WHERE (requester_id = $1 OR addressee_id = $1) AND status = $2
             ORDER BY id",
        )
        .bind(user_id)
        .bind(FriendshipStatus::Accepted.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.friendships_from_rows(rows).await
    }

    async fn pending_friendships_for(&self, user_id: PrimaryKey) -> Result<Vec<FriendshipData>> {
        let rows = query_as::<_, FriendshipRow>(
            "SELECT * FROM friendships
             WHERE addressee_id = $1 AND status = $2
             ORDER BY id",
        )
        .bind(user_id)
        .bind(FriendshipStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.friendships_from_rows(rows).await
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}
