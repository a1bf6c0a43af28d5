use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

pub mod apod;
pub mod health;
pub mod plan;
pub mod preferences;
pub mod system;
pub mod tasks;
pub mod weather;

/// Body returned by writes that have nothing else to report
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> axum::Json<Self> {
        axum::Json(Self { ok: true })
    }
}

/// Optional `?date=YYYY-MM-DD`; absent means today
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

impl DateQuery {
    pub fn or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(today)
    }
}

/// The current calendar day (UTC)
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// All API routes with the request-level layers applied.
pub fn app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(health::router())
        .merge(system::router())
        .merge(tasks::router())
        .merge(preferences::router())
        .merge(plan::router())
        .merge(weather::router())
        .merge(apod::router())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound {
        resource: format!("Route {}", uri.path()),
    }
}

fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    AppError::Internal("request handler panicked".to_string()).into_response()
}
