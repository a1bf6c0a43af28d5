use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use dayplan_core::error::ApiError;
use dayplan_core::preferences::{Preferences, PreferencesInput};

use super::OkResponse;
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/preferences",
        get(get_preferences).post(save_preferences),
    )
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PreferencesResponse {
    pub preferences: Option<Preferences>,
}

/// Save the user's preferences, replacing any earlier submission
#[utoipa::path(
    post,
    path = "/api/preferences",
    request_body = PreferencesInput,
    responses(
        (status = 200, description = "Preferences stored", body = OkResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Database error", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "preferences"
)]
pub async fn save_preferences(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(input): AppJson<PreferencesInput>,
) -> Result<Json<OkResponse>, AppError> {
    state.store.ensure_user(&user.user_id).await?;

    let preferences = input.validate()?;
    state
        .store
        .upsert_preferences(&user.user_id, &preferences)
        .await?;

    tracing::info!(user_id = %user.user_id, "preferences saved");
    Ok(OkResponse::ok())
}

/// Fetch the user's preferences (`null` until first saved)
#[utoipa::path(
    get,
    path = "/api/preferences",
    responses(
        (status = 200, description = "Stored preferences or null", body = PreferencesResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Database error", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "preferences"
)]
pub async fn get_preferences(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<PreferencesResponse>, AppError> {
    let preferences = state.store.get_preferences(&user.user_id).await?;
    Ok(Json(PreferencesResponse { preferences }))
}
