use axum::{extract::State, routing::post, Json};
use stayflow_collab::ReviewRequest;

use crate::{
    auth::Session,
    errors::ServerResult,
    schemas::{NewReviewSchema, ValidatedJson},
    serialized::{Review, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/v1/reviews",
    tag = "reviews",
    request_body = NewReviewSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Review),
        (status = 400, description = "Rating is outside 1 to 5"),
        (status = 404, description = "Listing doesn't exist")
    )
)]
async fn create_review(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewReviewSchema>,
) -> ServerResult<Json<Review>> {
    let review = context
        .stayflow
        .reviews
        .create(
            ReviewRequest {
                listing_id: body.listing_id,
                content: body.content,
                rating: body.rating,
            },
            session.user().id,
        )
        .await?;

    Ok(Json(review.to_serialized()))
}

pub fn router() -> Router {
    Router::new().route("/", post(create_review))
}
