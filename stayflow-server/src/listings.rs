use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
    Json,
};
use stayflow_collab::{ListingFilter, ListingStatus, NewListing, UpdatedListing};

use crate::{
    auth::Session,
    errors::{ServerError, ServerResult},
    schemas::{ListingQuery, NewListingSchema, UpdateListingSchema, ValidatedJson},
    serialized::{HostStats, Listing, Review, ScoredListing, ToSerialized, User},
    Router, ServerContext,
};

impl From<ListingQuery> for ListingFilter {
    fn from(query: ListingQuery) -> Self {
        Self {
            search: query.search,
            vibe: query.vibe,
            accessibility: query
                .accessibility
                .map(|csv| stayflow_collab::tags::decode(&csv))
                .unwrap_or_default(),
            max_travel_time: query.max_travel_time,
        }
    }
}

/// Ensures the caller owns the listing before mutating it
async fn ensure_owner(
    context: &ServerContext,
    session: &Session,
    listing_id: i32,
) -> ServerResult<()> {
    let listing = context.stayflow.listings.listing_by_id(listing_id).await?;

    if listing.host_id != Some(session.user().id) {
        return Err(ServerError::Forbidden(
            "Only the host of this listing can modify it".to_string(),
        ));
    }

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/listings",
    tag = "listings",
    params(ListingQuery),
    responses(
        (status = 200, body = Vec<ScoredListing>)
    )
)]
async fn search_listings(
    State(context): State<ServerContext>,
    Query(query): Query<ListingQuery>,
) -> ServerResult<Json<Vec<ScoredListing>>> {
    let ranked = context.stayflow.listings.search(&query.into()).await?;

    Ok(Json(ranked.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/listings/{id}",
    tag = "listings",
    responses(
        (status = 200, body = Listing),
        (status = 404, description = "Listing doesn't exist")
    )
)]
async fn listing(
    State(context): State<ServerContext>,
    Path(listing_id): Path<i32>,
) -> ServerResult<Json<Listing>> {
    let listing = context.stayflow.listings.listing_by_id(listing_id).await?;

    Ok(Json(listing.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/listings",
    tag = "listings",
    request_body = NewListingSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Listing)
    )
)]
async fn create_listing(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewListingSchema>,
) -> ServerResult<Json<Listing>> {
    let listing = context
        .stayflow
        .listings
        .create_listing(NewListing {
            title: body.title,
            location: body.location,
            description: body.description.unwrap_or_default(),
            image_url: body.image_url,
            price: body.price,
            amenities: body.amenities.unwrap_or_default(),
            vibes: body.vibes.unwrap_or_default(),
            accessibility_features: body.accessibility_features.unwrap_or_default(),
            travel_time: body.travel_time,
            host_id: Some(session.user().id),
        })
        .await?;

    Ok(Json(listing.to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/v1/listings/{id}",
    tag = "listings",
    request_body = UpdateListingSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Listing),
        (status = 403, description = "Caller is not the host of this listing")
    )
)]
async fn update_listing(
    session: Session,
    State(context): State<ServerContext>,
    Path(listing_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<UpdateListingSchema>,
) -> ServerResult<Json<Listing>> {
    ensure_owner(&context, &session, listing_id).await?;

    let listing = context
        .stayflow
        .listings
        .update_listing(UpdatedListing {
            id: listing_id,
            title: body.title,
            location: body.location,
            description: body.description,
            image_url: body.image_url,
            price: body.price,
            amenities: body.amenities,
            vibes: body.vibes,
            accessibility_features: body.accessibility_features,
            travel_time: body.travel_time,
            status: body.status.as_deref().map(ListingStatus::from_str),
        })
        .await?;

    Ok(Json(listing.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/listings/{id}",
    tag = "listings",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Listing was deleted"),
        (status = 403, description = "Caller is not the host of this listing")
    )
)]
async fn delete_listing(
    session: Session,
    State(context): State<ServerContext>,
    Path(listing_id): Path<i32>,
) -> ServerResult<()> {
    ensure_owner(&context, &session, listing_id).await?;

    context.stayflow.listings.delete_listing(listing_id).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/listings/{id}/reviews",
    tag = "listings",
    responses(
        (status = 200, body = Vec<Review>)
    )
)]
async fn listing_reviews(
    State(context): State<ServerContext>,
    Path(listing_id): Path<i32>,
) -> ServerResult<Json<Vec<Review>>> {
    // Surface a 404 for unknown listings instead of an empty list
    let _ = context.stayflow.listings.listing_by_id(listing_id).await?;

    let reviews = context.stayflow.reviews.reviews_by_listing(listing_id).await?;

    Ok(Json(reviews.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/hosts/listings",
    tag = "hosts",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Listing>)
    )
)]
async fn host_listings(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Listing>>> {
    let listings = context
        .stayflow
        .listings
        .listings_by_host(session.user().id)
        .await?;

    Ok(Json(listings.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/hosts/stats",
    tag = "hosts",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = HostStats)
    )
)]
async fn host_stats(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<HostStats>> {
    let stats = context
        .stayflow
        .listings
        .host_stats(session.user().id)
        .await?;

    Ok(Json(stats.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/favorites",
    tag = "favorites",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Listing>)
    )
)]
async fn favorites(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Listing>>> {
    let favorites = context
        .stayflow
        .listings
        .favorites(session.user().id)
        .await?;

    Ok(Json(favorites.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/v1/favorites/{listing_id}",
    tag = "favorites",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User, description = "Favorite was toggled")
    )
)]
async fn toggle_favorite(
    session: Session,
    State(context): State<ServerContext>,
    Path(listing_id): Path<i32>,
) -> ServerResult<Json<User>> {
    let user = context
        .stayflow
        .listings
        .toggle_favorite(session.user().id, listing_id)
        .await?;

    Ok(Json(user.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(search_listings))
        .route("/", post(create_listing))
        .route("/:id", get(listing))
        .route("/:id", patch(update_listing))
        .route("/:id", delete(delete_listing))
        .route("/:id/reviews", get(listing_reviews))
}

pub fn hosts_router() -> Router {
    Router::new()
        .route("/listings", get(host_listings))
        .route("/stats", get(host_stats))
}

pub fn favorites_router() -> Router {
    Router::new()
        .route("/", get(favorites))
        .route("/:listing_id", put(toggle_favorite))
}
