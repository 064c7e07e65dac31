use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json,
};

use crate::{
    auth::Session,
    errors::ServerResult,
    schemas::{FriendRequestSchema, UserSearchQuery, ValidatedJson},
    serialized::{Friendship, ToSerialized, User},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/v1/friends",
    tag = "friends",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<User>, description = "Users the caller has an accepted friendship with")
    )
)]
async fn friends(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<User>>> {
    let friends = context
        .stayflow
        .friends
        .friends_of(session.user().id)
        .await?;

    Ok(Json(friends.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/friends/requests",
    tag = "friends",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Friendship>, description = "Pending requests addressed to the caller")
    )
)]
async fn pending_requests(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Friendship>>> {
    let pending = context
        .stayflow
        .friends
        .pending_for(session.user().id)
        .await?;

    Ok(Json(pending.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/friends/requests",
    tag = "friends",
    request_body = FriendRequestSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Friendship),
        (status = 400, description = "Caller tried to befriend themselves"),
        (status = 404, description = "Addressee doesn't exist")
    )
)]
async fn send_request(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<FriendRequestSchema>,
) -> ServerResult<Json<Friendship>> {
    let friendship = context
        .stayflow
        .friends
        .send_request(session.user().id, body.addressee_id)
        .await?;

    Ok(Json(friendship.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/friends/requests/{id}/accept",
    tag = "friends",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Friendship),
        (status = 403, description = "Caller is not the addressee of this request")
    )
)]
async fn accept_request(
    session: Session,
    State(context): State<ServerContext>,
    Path(friendship_id): Path<i32>,
) -> ServerResult<Json<Friendship>> {
    let friendship = context
        .stayflow
        .friends
        .accept(friendship_id, session.user().id)
        .await?;

    Ok(Json(friendship.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/friends/requests/{id}",
    tag = "friends",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Request was rejected"),
        (status = 403, description = "Caller is not the addressee of this request")
    )
)]
async fn reject_request(
    session: Session,
    State(context): State<ServerContext>,
    Path(friendship_id): Path<i32>,
) -> ServerResult<()> {
    context
        .stayflow
        .friends
        .reject(friendship_id, session.user().id)
        .await?;

    Ok(())
}

#[utoipa::path(
    delete,
    path = "/v1/friends/{user_id}",
    tag = "friends",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Friendship was removed"),
        (status = 404, description = "No friendship with that user")
    )
)]
async fn remove_friend(
    session: Session,
    State(context): State<ServerContext>,
    Path(user_id): Path<i32>,
) -> ServerResult<()> {
    context
        .stayflow
        .friends
        .remove(user_id, session.user().id)
        .await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/friends/search",
    tag = "friends",
    params(UserSearchQuery),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<User>, description = "Users matching the query, the caller excluded")
    )
)]
async fn search_users(
    session: Session,
    State(context): State<ServerContext>,
    Query(query): Query<UserSearchQuery>,
) -> ServerResult<Json<Vec<User>>> {
    let users = context
        .stayflow
        .friends
        .search_users(&query.query, session.user().id)
        .await?;

    Ok(Json(users.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(friends))
        .route("/search", get(search_users))
        .route("/requests", get(pending_requests))
        .route("/requests", post(send_request))
        .route("/requests/:id/accept", post(accept_request))
        .route("/requests/:id", delete(reject_request))
        .route("/:user_id", delete(remove_friend))
}
