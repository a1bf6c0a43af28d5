use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use dayplan_core::error::ApiError;
use dayplan_core::weather::WeatherSummary;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/weather", get(current_weather))
}

/// Current weather for the city in the user's preferences
#[utoipa::path(
    get,
    path = "/api/weather",
    responses(
        (status = 200, description = "Normalized weather summary", body = WeatherSummary),
        (status = 400, description = "No city set in preferences", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Weather provider failure", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "weather"
)]
pub async fn current_weather(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<WeatherSummary>, AppError> {
    let city = state
        .store
        .get_preferences(&user.user_id)
        .await?
        .and_then(|p| p.city)
        .ok_or_else(|| AppError::Validation {
            message: "No city set in your preferences".to_string(),
            field: Some("city".to_string()),
            received: None,
            docs_hint: Some("POST /api/preferences with a city".to_string()),
        })?;

    let weather = state.weather.current(&city).await?;
    Ok(Json(weather))
}
