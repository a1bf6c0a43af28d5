use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(status_banner))
}

/// Response for GET /
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatusBanner {
    pub name: String,
    pub status: String,
    pub version: String,
}

/// Service banner
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner", body = StatusBanner)
    ),
    tag = "system"
)]
pub async fn status_banner() -> Json<StatusBanner> {
    Json(StatusBanner {
        name: "Dayplan API".to_string(),
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn banner_is_public() {
        let (status, body) = TestApp::new().get("/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["name"], "Dayplan API");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (status, body) = TestApp::new().get("/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
}
