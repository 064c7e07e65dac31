use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::{Database, DatabaseError, FlowTier, PrimaryKey, UserData};

/// Points awarded for every confirmed booking, regardless of price or length
pub const BOOKING_POINTS: i32 = 1000;
/// Base points awarded for writing a review
pub const REVIEW_POINTS: i32 = 500;
/// Bonus for a review whose trimmed content exceeds [`DETAILED_REVIEW_THRESHOLD`] chars
pub const DETAILED_REVIEW_BONUS: i32 = 200;
pub const DETAILED_REVIEW_THRESHOLD: usize = 50;

const WAVE_THRESHOLD: i32 = 1000;
const SURFER_THRESHOLD: i32 = 5000;

/// Awards FlowPoints and keeps the stored tier in sync with the point total.
/// Every point-awarding path must go through [`Loyalty::award`], since the
/// tier is never derived on read.
pub struct Loyalty<Db> {
    db: Arc<Db>,
    /// Serializes awards per user, so two concurrent awards can't lose an increment
    locks: DashMap<PrimaryKey, Arc<Mutex<()>>>,
}

impl FlowTier {
    /// Derives the tier from a point total
    pub fn for_points(points: i32) -> Self {
        if points >= SURFER_THRESHOLD {
            Self::Surfer
        } else if points >= WAVE_THRESHOLD {
            Self::Wave
        } else {
            Self::Ripple
        }
    }
}

impl<Db> Loyalty<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self {
            db: db.clone(),
            locks: Default::default(),
        }
    }

    /// Adds points to a user's total and re-derives their tier
    pub async fn award(&self, user_id: PrimaryKey, points: i32) -> Result<UserData, DatabaseError> {
        let lock = self
            .locks
            .entry(user_id)
            .or_insert_with(Default::default)
            .clone();

        let _guard = lock.lock().await;

        let user = self.db.user_by_id(user_id).await?;
        let total = user.flow_points + points;

        self.db
            .set_user_loyalty(user_id, total, FlowTier::for_points(total))
            .await
    }

    /// Points for a review: a flat base, plus a bonus for detailed content.
    /// Whitespace padding doesn't count towards the bonus.
    pub fn review_points(content: &str) -> i32 {
        let mut points = REVIEW_POINTS;

        if content.trim().chars().count() > DETAILED_REVIEW_THRESHOLD {
            points += DETAILED_REVIEW_BONUS;
        }

        points
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MemoryDatabase;
    use crate::{NewUser, UserRole};

    async fn user_with_db() -> (Arc<MemoryDatabase>, UserData) {
        let db = Arc::new(MemoryDatabase::default());
        let user = db
            .create_user(NewUser {
                email: "surfer@example.com".to_string(),
                name: "surfer".to_string(),
                password: "hash".to_string(),
                role: UserRole::Guest,
            })
            .await
            .expect("user is created");

        (db, user)
    }

    #[test]
    fn tier_thresholds() {
        assert_eq!(FlowTier::for_points(0), FlowTier::Ripple);
        assert_eq!(FlowTier::for_points(999), FlowTier::Ripple);
        assert_eq!(FlowTier::for_points(1000), FlowTier::Wave);
        assert_eq!(FlowTier::for_points(4999), FlowTier::Wave);
        assert_eq!(FlowTier::for_points(5000), FlowTier::Surfer);
    }

    #[tokio::test]
    async fn award_updates_points_and_tier_together() {
        let (db, user) = user_with_db().await;
        let loyalty = Loyalty::new(&db);

        let updated = loyalty.award(user.id, 999).await.expect("points awarded");
        assert_eq!(updated.flow_points, 999);
        assert_eq!(updated.flow_tier, FlowTier::Ripple);

        let updated = loyalty.award(user.id, 1).await.expect("points awarded");
        assert_eq!(updated.flow_points, 1000);
        assert_eq!(updated.flow_tier, FlowTier::Wave);

        let updated = loyalty.award(user.id, 4000).await.expect("points awarded");
        assert_eq!(updated.flow_points, 5000);
        assert_eq!(updated.flow_tier, FlowTier::Surfer);
    }

    #[tokio::test]
    async fn concurrent_awards_do_not_lose_increments() {
        let (db, user) = user_with_db().await;
        let loyalty = Arc::new(Loyalty::new(&db));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let loyalty = loyalty.clone();
                tokio::spawn(async move { loyalty.award(user.id, 100).await })
            })
            .collect();

        for task in tasks {
            task.await.expect("task joins").expect("award succeeds");
        }

        let user = db.user_by_id(user.id).await.expect("user exists");
        assert_eq!(user.flow_points, 1000);
        assert_eq!(user.flow_tier, FlowTier::Wave);
    }

    #[test]
    fn detailed_reviews_earn_a_bonus() {
        let short = "Great place!";
        let padded = format!("ok{}", " ".repeat(100));
        let detailed = "The host was lovely and the view of the bay made every morning special.";

        assert_eq!(Loyalty::<MemoryDatabase>::review_points(short), 500);
        assert_eq!(Loyalty::<MemoryDatabase>::review_points(&padded), 500);
        assert_eq!(Loyalty::<MemoryDatabase>::review_points(detailed), 700);
    }
}
