use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 64))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 2, max = 128))]
    pub name: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
    /// "HOST" registers a host account, anything else a guest
    pub role: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileSchema {
    #[validate(length(min = 2, max = 128))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 64))]
    pub password: Option<String>,
    #[validate(url)]
    pub avatar: Option<String>,
}

/// Query parameters accepted by the listing search
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    /// Case-insensitive substring match on title or location
    pub search: Option<String>,
    /// Substring containment against the listing's vibes
    pub vibe: Option<String>,
    /// Comma-separated accessibility tags, all of which must match
    pub accessibility: Option<String>,
    pub max_travel_time: Option<f64>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewListingSchema {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1, max = 256))]
    pub location: String,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub amenities: Option<Vec<String>>,
    pub vibes: Option<Vec<String>>,
    pub accessibility_features: Option<Vec<String>>,
    #[validate(range(min = 0.0))]
    pub travel_time: Option<f64>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateListingSchema {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub location: Option<String>,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub amenities: Option<Vec<String>>,
    pub vibes: Option<Vec<String>>,
    pub accessibility_features: Option<Vec<String>>,
    #[validate(range(min = 0.0))]
    pub travel_time: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewBookingSchema {
    pub listing_id: i32,
    /// YYYY-MM-DD
    pub check_in: String,
    /// YYYY-MM-DD
    pub check_out: String,
    #[validate(range(min = 1))]
    pub guests: i32,
    /// Computed by the client and trusted as-is
    #[validate(range(min = 0.0))]
    pub total_price: f64,
    pub is_split_pay: Option<bool>,
    pub invited_emails: Option<Vec<String>>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewReviewSchema {
    pub listing_id: i32,
    #[validate(length(min = 1, max = 4096))]
    pub content: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FriendRequestSchema {
    pub addressee_id: i32,
}

/// Query parameters for the friend user search
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchQuery {
    pub query: String,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}
