use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::JwksVerifier;
use crate::config::{Config, ConfigError};
use crate::providers::{ChatCompletionClient, NasaApodClient, OpenWeatherClient};
use crate::store::PgStore;

mod auth;
mod config;
mod error;
mod extract;
mod middleware;
mod providers;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dayplan API",
        version = "0.1.0",
        description = "Daily planning backend: tasks, preferences and AI-generated schedules."
    ),
    paths(
        routes::health::health_check,
        routes::system::status_banner,
        routes::tasks::create_task,
        routes::tasks::list_tasks,
        routes::tasks::delete_task,
        routes::preferences::save_preferences,
        routes::preferences::get_preferences,
        routes::plan::generate_plan,
        routes::plan::get_plan,
        routes::weather::current_weather,
        routes::apod::astronomy_picture,
    ),
    components(schemas(
        HealthResponse,
        routes::OkResponse,
        routes::system::StatusBanner,
        routes::tasks::TaskListResponse,
        routes::preferences::PreferencesResponse,
        routes::plan::GeneratedPlanResponse,
        routes::plan::StoredPlanResponse,
        dayplan_core::error::ApiError,
        dayplan_core::tasks::Task,
        dayplan_core::tasks::TaskInput,
        dayplan_core::preferences::Preferences,
        dayplan_core::preferences::PreferencesInput,
        dayplan_core::preferences::PeakFocus,
        dayplan_core::preferences::CommuteMode,
        dayplan_core::plan::DayPlan,
        dayplan_core::plan::ScheduleItem,
        dayplan_core::weather::WeatherSummary,
        dayplan_core::apod::Apod,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dayplan_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "Dayplan API failed to start");
        return Err(err);
    }
    Ok(())
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("../migrations").run(&pool).await?;

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    for (key, env_var) in [
        (&config.auth_secret_key, "AUTH_SECRET_KEY"),
        (&config.openweather_api_key, "OPENWEATHER_API_KEY"),
        (&config.nasa_api_key, "NASA_API_KEY"),
        (&config.completion_api_key, "COMPLETION_API_KEY"),
    ] {
        if key.is_none() {
            tracing::warn!(env_var, "not set; requests that need it will fail");
        }
    }

    let app_state = state::AppState {
        store: Arc::new(PgStore::new(pool)),
        auth: Arc::new(JwksVerifier::new(
            http.clone(),
            config.auth_jwks_url.clone(),
            config.auth_secret_key.clone(),
        )),
        weather: Arc::new(OpenWeatherClient::new(
            http.clone(),
            config.openweather_api_key.clone(),
            config.openweather_base_url.clone(),
        )),
        apod: Arc::new(NasaApodClient::new(
            http.clone(),
            config.nasa_api_key.clone(),
            config.nasa_base_url.clone(),
        )),
        completion: Arc::new(ChatCompletionClient::new(
            http,
            config.completion_api_key.clone(),
            config.completion_base_url.clone(),
            config.completion_model.clone(),
        )),
    };

    let cors_layer = middleware::cors::build_cors_layer(config.cors_origins.as_deref());

    let app = routes::app(app_state, cors_layer)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Dayplan API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
