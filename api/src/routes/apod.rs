use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use dayplan_core::apod::Apod;
use dayplan_core::error::ApiError;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/apod", get(astronomy_picture))
}

/// Astronomy picture of the day (public)
#[utoipa::path(
    get,
    path = "/api/apod",
    responses(
        (status = 200, description = "Today's picture", body = Apod),
        (status = 500, description = "Picture provider failure", body = ApiError)
    ),
    tag = "apod"
)]
pub async fn astronomy_picture(State(state): State<AppState>) -> Result<Json<Apod>, AppError> {
    Ok(Json(state.apod.today().await?))
}
