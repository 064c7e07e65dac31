use std::sync::Arc;

use crate::{
    Database, DatabaseError, HostStatsData, ListingData, ListingFilter, NewListing, PrimaryKey,
    UpdatedListing, UserData,
};

/// Queries and mutates listings, and ranks search results.
pub struct ListingManager<Db> {
    db: Arc<Db>,
}

/// A listing with its recommendation score attached
#[derive(Debug, Clone)]
pub struct RankedListing {
    pub listing: ListingData,
    pub score: f64,
}

/// The recommendation score. A raw popularity bonus would let high-volume,
/// mediocre listings dominate, so the booking count is log-dampened:
/// rating 3.0 with 20 bookings scores ~9.6 while rating 4.5 with 10
/// bookings scores ~9.7, keeping quality and volume in tension.
pub fn recommendation_score(rating: f64, confirmed_bookings: i64) -> f64 {
    rating + 1.5 * ((confirmed_bookings + 1) as f64).log2()
}

impl<Db> ListingManager<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    /// Filters listings and ranks them by recommendation score, best first.
    /// Ties keep the underlying query order, which is stable.
    pub async fn search(&self, filter: &ListingFilter) -> Result<Vec<RankedListing>, DatabaseError> {
        let listings = self.db.search_listings(filter).await?;

        let mut ranked = Vec::with_capacity(listings.len());

        for listing in listings {
            let confirmed = self.db.count_confirmed_bookings(listing.id).await?;
            let score = recommendation_score(listing.rating, confirmed);

            ranked.push(RankedListing { listing, score });
        }

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(ranked)
    }

    pub async fn listing_by_id(&self, listing_id: PrimaryKey) -> Result<ListingData, DatabaseError> {
        self.db.listing_by_id(listing_id).await
    }

    pub async fn create_listing(&self, new_listing: NewListing) -> Result<ListingData, DatabaseError> {
        self.db.create_listing(new_listing).await
    }

    pub async fn update_listing(
        &self,
        updated_listing: UpdatedListing,
    ) -> Result<ListingData, DatabaseError> {
        self.db.update_listing(updated_listing).await
    }

    pub async fn delete_listing(&self, listing_id: PrimaryKey) -> Result<(), DatabaseError> {
        self.db.delete_listing(listing_id).await
    }

    pub async fn listings_by_host(
        &self,
        host_id: PrimaryKey,
    ) -> Result<Vec<ListingData>, DatabaseError> {
        self.db.listings_by_host(host_id).await
    }

    /// Aggregates for the host dashboard. The booking count and revenue
    /// both cover confirmed bookings only.
    pub async fn host_stats(&self, host_id: PrimaryKey) -> Result<HostStatsData, DatabaseError> {
        let listings = self.db.listings_by_host(host_id).await?;

        let mut stats = HostStatsData {
            active_listings: listings.len() as i64,
            ..Default::default()
        };

        for listing in listings {
            let confirmed = self.db.confirmed_bookings_for_listing(listing.id).await?;

            stats.total_bookings += confirmed.len() as i64;
            stats.total_revenue += confirmed.iter().map(|b| b.total_price).sum::<f64>();
        }

        Ok(stats)
    }

    /// Adds the listing to the user's favorites, or removes it if it
    /// already is one. Returns the updated user.
    pub async fn toggle_favorite(
        &self,
        user_id: PrimaryKey,
        listing_id: PrimaryKey,
    ) -> Result<UserData, DatabaseError> {
        // Ensure the listing exists before touching the relation
        let _ = self.db.listing_by_id(listing_id).await?;

        if self.db.is_favorite(user_id, listing_id).await? {
            self.db.remove_favorite(user_id, listing_id).await?;
        } else {
            self.db.add_favorite(user_id, listing_id).await?;
        }

        self.db.user_by_id(user_id).await
    }

    pub async fn favorites(&self, user_id: PrimaryKey) -> Result<Vec<ListingData>, DatabaseError> {
        self.db.favorite_listings(user_id).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        BookingStatus, MemoryDatabase, NewBooking, NewUser, UserRole, DEFAULT_IMAGE_URL,
    };
    use chrono::NaiveDate;

    async fn listing(
        db: &Arc<MemoryDatabase>,
        title: &str,
        location: &str,
        vibes: &[&str],
        accessibility: &[&str],
        travel_time: Option<f64>,
        host_id: Option<PrimaryKey>,
    ) -> ListingData {
        db.create_listing(NewListing {
            title: title.to_string(),
            location: location.to_string(),
            description: String::new(),
            image_url: None,
            price: 100.0,
            amenities: vec![],
            vibes: vibes.iter().map(|v| v.to_string()).collect(),
            accessibility_features: accessibility.iter().map(|a| a.to_string()).collect(),
            travel_time,
            host_id,
        })
        .await
        .expect("listing is created")
    }

    async fn confirmed_booking(
        db: &Arc<MemoryDatabase>,
        listing_id: PrimaryKey,
        start: &str,
        nights: u64,
        price: f64,
    ) {
        let check_in = NaiveDate::parse_from_str(start, "%Y-%m-%d").expect("valid date");
        let check_out = check_in + chrono::Duration::days(nights as i64);

        db.create_booking(NewBooking {
            listing_id,
            user_id: 1,
            check_in,
            check_out,
            guests: 1,
            total_price: price,
            status: BookingStatus::Confirmed,
            is_split_pay: false,
            invited_emails: vec![],
        })
        .await
        .expect("booking is created");
    }

    #[test]
    fn score_balances_quality_and_volume() {
        let a = recommendation_score(5.0, 0);
        let b = recommendation_score(4.5, 10);
        let c = recommendation_score(3.0, 20);

        assert!((a - 5.0).abs() < 0.01);
        assert!((b - 9.69).abs() < 0.01);
        assert!((c - 9.59).abs() < 0.01);
        assert!(b > c && c > a);
    }

    #[tokio::test]
    async fn ranking_matches_the_worked_example() {
        let db = Arc::new(MemoryDatabase::default());
        let listings = ListingManager::new(&db);

        let a = listing(&db, "Pristine cabin", "Asturias", &[], &[], None, None).await;
        let b = listing(&db, "Popular flat", "Madrid", &[], &[], None, None).await;
        let c = listing(&db, "Party hostel", "Madrid", &[], &[], None, None).await;

        db.set_listing_rating(a.id, 5.0).await.expect("rating set");
        db.set_listing_rating(b.id, 4.5).await.expect("rating set");
        db.set_listing_rating(c.id, 3.0).await.expect("rating set");

        for i in 0..10 {
            let start = format!("2025-03-{:02}", i + 1);
            confirmed_booking(&db, b.id, &start, 1, 100.0).await;
        }
        for i in 0..20 {
            let start = format!("2025-04-{:02}", i + 1);
            confirmed_booking(&db, c.id, &start, 1, 100.0).await;
        }

        let ranked = listings
            .search(&ListingFilter::default())
            .await
            .expect("search succeeds");

        let order: Vec<_> = ranked.iter().map(|r| r.listing.id).collect();
        assert_eq!(order, [b.id, c.id, a.id]);

        // Repeated identical input keeps the same order
        let again = listings
            .search(&ListingFilter::default())
            .await
            .expect("search succeeds");
        let order_again: Vec<_> = again.iter().map(|r| r.listing.id).collect();
        assert_eq!(order, order_again);
    }

    #[tokio::test]
    async fn filters_compose_with_and_semantics() {
        let db = Arc::new(MemoryDatabase::default());
        let listings = ListingManager::new(&db);

        listing(
            &db,
            "Luxury villa",
            "Marbella",
            &["Luxury"],
            &["Step-free access", "Elevator"],
            Some(10.0),
            None,
        )
        .await;
        listing(
            &db,
            "Mountain cabin",
            "Huesca",
            &["Adventure"],
            &["Step-free access"],
            Some(90.0),
            None,
        )
        .await;
        listing(&db, "City loft", "Marbella", &["Luxury"], &[], None, None).await;

        // Substring vibe filter: "Lux" matches "Luxury"
        let filter = ListingFilter {
            vibe: Some("Lux".to_string()),
            ..Default::default()
        };
        let found = listings.search(&filter).await.expect("search succeeds");
        assert_eq!(found.len(), 2);

        // Case-insensitive text search on title or location
        let filter = ListingFilter {
            search: Some("marbella".to_string()),
            ..Default::default()
        };
        let found = listings.search(&filter).await.expect("search succeeds");
        assert_eq!(found.len(), 2);

        // Accessibility tags are ANDed
        let filter = ListingFilter {
            accessibility: vec!["Step-free access".to_string(), "Elevator".to_string()],
            ..Default::default()
        };
        let found = listings.search(&filter).await.expect("search succeeds");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].listing.title, "Luxury villa");

        // Travel time filter excludes listings without one
        let filter = ListingFilter {
            max_travel_time: Some(30.0),
            ..Default::default()
        };
        let found = listings.search(&filter).await.expect("search succeeds");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].listing.title, "Luxury villa");

        // Filters compose
        let filter = ListingFilter {
            search: Some("villa".to_string()),
            vibe: Some("Luxury".to_string()),
            accessibility: vec!["Elevator".to_string()],
            max_travel_time: Some(30.0),
        };
        let found = listings.search(&filter).await.expect("search succeeds");
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn host_stats_count_confirmed_revenue_only() {
        let db = Arc::new(MemoryDatabase::default());
        let listings = ListingManager::new(&db);

        let host = db
            .create_user(NewUser {
                email: "host@example.com".to_string(),
                name: "host".to_string(),
                password: "hash".to_string(),
                role: UserRole::Host,
            })
            .await
            .expect("host is created");

        let first = listing(&db, "First", "Sevilla", &[], &[], None, Some(host.id)).await;
        let second = listing(&db, "Second", "Sevilla", &[], &[], None, Some(host.id)).await;
        listing(&db, "Someone else's", "Sevilla", &[], &[], None, None).await;

        confirmed_booking(&db, first.id, "2025-05-01", 3, 300.0).await;
        confirmed_booking(&db, first.id, "2025-05-10", 2, 200.0).await;
        confirmed_booking(&db, second.id, "2025-05-01", 1, 150.0).await;

        let stats = listings.host_stats(host.id).await.expect("stats computed");

        assert_eq!(stats.active_listings, 2);
        assert_eq!(stats.total_bookings, 3);
        assert!((stats.total_revenue - 650.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn toggling_a_favorite_twice_restores_the_original_state() {
        let db = Arc::new(MemoryDatabase::default());
        let listings = ListingManager::new(&db);

        let user = db
            .create_user(NewUser {
                email: "guest@example.com".to_string(),
                name: "guest".to_string(),
                password: "hash".to_string(),
                role: UserRole::Guest,
            })
            .await
            .expect("user is created");

        let target = listing(&db, "Loft", "Bilbao", &[], &[], None, None).await;

        listings
            .toggle_favorite(user.id, target.id)
            .await
            .expect("toggled on");
        let favorites = listings.favorites(user.id).await.expect("favorites listed");
        assert_eq!(favorites.len(), 1);

        listings
            .toggle_favorite(user.id, target.id)
            .await
            .expect("toggled off");
        let favorites = listings.favorites(user.id).await.expect("favorites listed");
        assert!(favorites.is_empty());
    }

    #[tokio::test]
    async fn listings_without_an_image_get_the_fallback() {
        let db = Arc::new(MemoryDatabase::default());

        let created = listing(&db, "Loft", "Bilbao", &[], &[], None, None).await;

        assert_eq!(created.image_url, DEFAULT_IMAGE_URL);
    }
}
