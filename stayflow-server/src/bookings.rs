use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json,
};
use stayflow_collab::BookingRequest;

use crate::{
    auth::Session,
    errors::{ServerError, ServerResult},
    schemas::{NewBookingSchema, ValidatedJson},
    serialized::{Booking, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/v1/bookings",
    tag = "bookings",
    request_body = NewBookingSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Booking),
        (status = 404, description = "Listing doesn't exist"),
        (status = 409, description = "The requested dates overlap an existing booking")
    )
)]
async fn create_booking(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewBookingSchema>,
) -> ServerResult<Json<Booking>> {
    let booking = context
        .stayflow
        .bookings
        .create(
            BookingRequest {
                listing_id: body.listing_id,
                check_in: body.check_in,
                check_out: body.check_out,
                guests: body.guests,
                total_price: body.total_price,
                is_split_pay: body.is_split_pay.unwrap_or(false),
                invited_emails: body.invited_emails.unwrap_or_default(),
            },
            session.user().id,
        )
        .await?;

    Ok(Json(booking.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/bookings",
    tag = "bookings",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Booking>, description = "The caller's bookings, most recent check-in first")
    )
)]
async fn my_bookings(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Booking>>> {
    let bookings = context
        .stayflow
        .bookings
        .bookings_by_user(session.user().id)
        .await?;

    Ok(Json(bookings.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/bookings/{id}",
    tag = "bookings",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Booking),
        (status = 404, description = "Booking doesn't exist")
    )
)]
async fn booking(
    session: Session,
    State(context): State<ServerContext>,
    Path(booking_id): Path<i32>,
) -> ServerResult<Json<Booking>> {
    let booking = context.stayflow.bookings.booking_by_id(booking_id).await?;

    let is_guest = booking.user_id == session.user().id;
    let is_host = booking.listing.host_id == Some(session.user().id);

    if !is_guest && !is_host {
        return Err(ServerError::NotFound {
            resource: "booking",
            identifier: "id",
        });
    }

    Ok(Json(booking.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_booking))
        .route("/", get(my_bookings))
        .route("/:id", get(booking))
}
