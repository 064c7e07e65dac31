use std::sync::Arc;

use thiserror::Error;

use crate::{Database, DatabaseError, Loyalty, NewReview, PrimaryKey, ReviewData};

/// Fallback avatar for authors that never set one
const DEFAULT_AVATAR: &str = "https://i.pravatar.cc/150?u=default";

/// Creates and reads reviews. Creating one snapshots the author, awards
/// loyalty points, and recomputes the listing's stored rating.
pub struct ReviewManager<Db> {
    db: Arc<Db>,
    loyalty: Arc<Loyalty<Db>>,
}

#[derive(Debug)]
pub struct ReviewRequest {
    pub listing_id: PrimaryKey,
    pub content: String,
    pub rating: i32,
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Rating must be between 1 and 5")]
    InvalidRating,
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

impl<Db> ReviewManager<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>, loyalty: &Arc<Loyalty<Db>>) -> Self {
        Self {
            db: db.clone(),
            loyalty: loyalty.clone(),
        }
    }

    /// Creates a review as the given user.
    ///
    /// Author name and avatar are copied from the user record at creation
    /// time, so later renames don't rewrite review history. The listing's
    /// rating is recomputed as the mean over all of its reviews, not
    /// incrementally.
    pub async fn create(
        &self,
        request: ReviewRequest,
        user_id: PrimaryKey,
    ) -> Result<ReviewData, ReviewError> {
        if !(1..=5).contains(&request.rating) {
            return Err(ReviewError::InvalidRating);
        }

        let user = self.db.user_by_id(user_id).await?;

        let points = Loyalty::<Db>::review_points(&request.content);

        let review = self
            .db
            .create_review(NewReview {
                listing_id: request.listing_id,
                user_id,
                content: request.content,
                rating: request.rating,
                author_name: user.name,
                author_avatar: user.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            })
            .await?;

        self.loyalty
            .award(user_id, points)
            .await
            .map_err(ReviewError::Db)?;

        let rating = self
            .db
            .average_listing_rating(request.listing_id)
            .await?
            .unwrap_or(review.rating as f64);

        self.db
            .set_listing_rating(request.listing_id, rating)
            .await?;

        Ok(review)
    }

    pub async fn reviews_by_listing(
        &self,
        listing_id: PrimaryKey,
    ) -> Result<Vec<ReviewData>, DatabaseError> {
        self.db.reviews_by_listing(listing_id).await
    }

    /// Everything a user has written, newest first
    pub async fn reviews_by_user(
        &self,
        user_id: PrimaryKey,
    ) -> Result<Vec<ReviewData>, DatabaseError> {
        self.db.reviews_by_user(user_id).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        FlowTier, ListingData, MemoryDatabase, NewListing, NewUser, UpdatedUser, UserData,
        UserRole, REVIEW_POINTS,
    };

    struct Fixture {
        db: Arc<MemoryDatabase>,
        reviews: ReviewManager<MemoryDatabase>,
        user: UserData,
        listing: ListingData,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(MemoryDatabase::default());

        let user = db
            .create_user(NewUser {
                email: "guest@example.com".to_string(),
                name: "guest".to_string(),
                password: "hash".to_string(),
                role: UserRole::Guest,
            })
            .await
            .expect("user is created");

        let listing = db
            .create_listing(NewListing {
                title: "Quiet cottage".to_string(),
                location: "Girona".to_string(),
                description: String::new(),
                image_url: None,
                price: 80.0,
                amenities: vec![],
                vibes: vec![],
                accessibility_features: vec![],
                travel_time: None,
                host_id: None,
            })
            .await
            .expect("listing is created");

        let loyalty = Arc::new(Loyalty::new(&db));
        let reviews = ReviewManager::new(&db, &loyalty);

        Fixture {
            db,
            reviews,
            user,
            listing,
        }
    }

    fn request(listing_id: PrimaryKey, rating: i32) -> ReviewRequest {
        ReviewRequest {
            listing_id,
            content: "Nice stay.".to_string(),
            rating,
        }
    }

    #[tokio::test]
    async fn out_of_range_ratings_are_rejected() {
        let f = fixture().await;

        let result = f.reviews.create(request(f.listing.id, 0), f.user.id).await;
        assert!(matches!(result, Err(ReviewError::InvalidRating)));

        let result = f.reviews.create(request(f.listing.id, 6), f.user.id).await;
        assert!(matches!(result, Err(ReviewError::InvalidRating)));
    }

    #[tokio::test]
    async fn listing_rating_is_recomputed_as_the_full_mean() {
        let f = fixture().await;

        for rating in [4, 5, 3] {
            f.reviews
                .create(request(f.listing.id, rating), f.user.id)
                .await
                .expect("review is created");
        }

        let listing = f.db.listing_by_id(f.listing.id).await.expect("listing exists");
        assert!((listing.rating - 4.0).abs() < f64::EPSILON);

        f.reviews
            .create(request(f.listing.id, 2), f.user.id)
            .await
            .expect("review is created");

        let listing = f.db.listing_by_id(f.listing.id).await.expect("listing exists");
        assert!((listing.rating - 3.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn review_awards_points_with_detail_bonus() {
        let f = fixture().await;

        f.reviews
            .create(request(f.listing.id, 5), f.user.id)
            .await
            .expect("review is created");

        let user = f.db.user_by_id(f.user.id).await.expect("user exists");
        assert_eq!(user.flow_points, REVIEW_POINTS);
        assert_eq!(user.flow_tier, FlowTier::Ripple);

        let detailed = ReviewRequest {
            listing_id: f.listing.id,
            content: "A wonderful stay with a spotless kitchen and the friendliest host we've met."
                .to_string(),
            rating: 5,
        };

        f.reviews
            .create(detailed, f.user.id)
            .await
            .expect("review is created");

        let user = f.db.user_by_id(f.user.id).await.expect("user exists");
        assert_eq!(user.flow_points, 500 + 700);
        assert_eq!(user.flow_tier, FlowTier::Wave);
    }

    #[tokio::test]
    async fn author_fields_are_a_snapshot() {
        let f = fixture().await;

        let review = f
            .reviews
            .create(request(f.listing.id, 4), f.user.id)
            .await
            .expect("review is created");

        assert_eq!(review.author_name, "guest");

        f.db.update_user(UpdatedUser {
            id: f.user.id,
            name: Some("renamed".to_string()),
            ..Default::default()
        })
        .await
        .expect("user is renamed");

        let reviews = f
            .reviews
            .reviews_by_listing(f.listing.id)
            .await
            .expect("reviews listed");

        assert_eq!(reviews[0].author_name, "guest");
    }

    #[tokio::test]
    async fn reviews_by_user_only_returns_the_authors_own() {
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

        f.reviews
            .create(request(f.listing.id, 4), f.user.id)
            .await
            .expect("review is created");
        f.reviews
            .create(request(f.listing.id, 5), f.user.id)
            .await
            .expect("review is created");
        f.reviews
            .create(request(f.listing.id, 3), other.id)
            .await
            .expect("review is created");

        let mine = f
            .reviews
            .reviews_by_user(f.user.id)
            .await
            .expect("reviews listed");

        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|r| r.user_id == f.user.id));
    }
}
