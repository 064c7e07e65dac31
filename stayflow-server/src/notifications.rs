use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json,
};

use crate::{
    auth::Session,
    errors::ServerResult,
    serialized::{Notification, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/v1/notifications",
    tag = "notifications",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Notification>, description = "The caller's notifications, newest first")
    )
)]
async fn notifications(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Notification>>> {
    let notifications = context
        .stayflow
        .notifications
        .notifications_for(session.user().id)
        .await?;

    Ok(Json(notifications.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/notifications/{id}/read",
    tag = "notifications",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Notification),
        (status = 404, description = "Notification doesn't exist")
    )
)]
async fn mark_read(
    _session: Session,
    State(context): State<ServerContext>,
    Path(notification_id): Path<i32>,
) -> ServerResult<Json<Notification>> {
    let notification = context
        .stayflow
        .notifications
        .mark_read(notification_id)
        .await?;

    Ok(Json(notification.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/notifications/read",
    tag = "notifications",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "All of the caller's notifications were marked as read")
    )
)]
async fn mark_all_read(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<()> {
    context
        .stayflow
        .notifications
        .mark_all_read(session.user().id)
        .await?;

    Ok(())
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(notifications))
        .route("/read", post(mark_all_read))
        .route("/:id/read", post(mark_read))
}
