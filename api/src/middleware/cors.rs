use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Build the CORS layer.
///
/// - Origins: `origins` when configured, otherwise any origin
/// - Methods: GET, POST, DELETE, OPTIONS
/// - Headers: Authorization, Content-Type
/// - Max age: 3600s
pub fn build_cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let allow_origin = match origins {
        Some(origins) => AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        ),
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("authorization"),
            HeaderName::from_static("content-type"),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;

    async fn ok() -> StatusCode {
        StatusCode::OK
    }

    async fn preflight(layer: CorsLayer, origin: &str) -> axum::response::Response {
        Router::new()
            .route("/api/tasks", get(ok))
            .layer(layer)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/tasks")
                    .header("origin", origin)
                    .header("access-control-request-method", "DELETE")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed")
    }

    #[tokio::test]
    async fn unconfigured_origins_allow_any() {
        let response = preflight(build_cors_layer(None), "https://anywhere.example").await;
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .expect("allow-origin header should exist"),
            "*"
        );
    }

    #[tokio::test]
    async fn configured_origins_are_enforced() {
        let origins = vec!["https://app.example".to_string()];
        let allowed = preflight(build_cors_layer(Some(&origins)), "https://app.example").await;
        assert_eq!(
            allowed
                .headers()
                .get("access-control-allow-origin")
                .expect("allow-origin header should exist"),
            "https://app.example"
        );

        let denied = preflight(build_cors_layer(Some(&origins)), "https://evil.example").await;
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }
}
