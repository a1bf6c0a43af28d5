use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use dayplan_core::apod::Apod;
use dayplan_core::error::ApiError;
use dayplan_core::plan::DayPlan;
use dayplan_core::preferences::Preferences;
use dayplan_core::prompt::build_prompt;
use dayplan_core::repair::recover_plan;
use dayplan_core::weather::WeatherSummary;

use super::{DateQuery, today};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/plan", post(generate_plan).get(get_plan))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GeneratedPlanResponse {
    pub plan: DayPlan,
    pub apod: Apod,
    /// `null` when the weather lookup failed or no city is set
    pub weather: Option<WeatherSummary>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StoredPlanResponse {
    #[schema(value_type = Option<Object>)]
    pub plan: Option<serde_json::Value>,
}

/// Generate today's plan from stored tasks, preferences and live weather
///
/// Weather and the astronomy picture are best effort. The plan is persisted
/// before returning; a failed write is logged and the plan is still returned.
#[utoipa::path(
    post,
    path = "/api/plan",
    responses(
        (status = 200, description = "Generated plan", body = GeneratedPlanResponse),
        (status = 400, description = "No tasks for today or no preferences saved", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Completion model or parse failure", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "plan"
)]
pub async fn generate_plan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<GeneratedPlanResponse>, AppError> {
    state.store.ensure_user(&user.user_id).await?;
    let date = today();

    let (preferences, tasks) = tokio::try_join!(
        state.store.get_preferences(&user.user_id),
        state.store.list_tasks(&user.user_id, date),
    )?;

    if tasks.is_empty() {
        return Err(AppError::Validation {
            message: "Add at least one task for today before generating a plan".to_string(),
            field: Some("tasks".to_string()),
            received: None,
            docs_hint: Some("POST /api/tasks with {title, duration, importance}".to_string()),
        });
    }
    let preferences = preferences.ok_or_else(|| AppError::Validation {
        message: "Save your preferences before generating a plan".to_string(),
        field: Some("preferences".to_string()),
        received: None,
        docs_hint: Some("POST /api/preferences with the full preferences object".to_string()),
    })?;

    let (weather, apod) = tokio::join!(
        weather_or_none(&state, &preferences),
        apod_or_placeholder(&state),
    );

    let prompt = build_prompt(&tasks, Some(&preferences), weather.as_ref())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let raw = state.completion.complete(&prompt).await?;
    let recovery = recover_plan(&raw)?;

    tracing::info!(
        user_id = %user.user_id,
        stage = ?recovery.stage,
        items = recovery.plan.schedule.len(),
        "plan recovered from completion"
    );

    match serde_json::to_value(&recovery.plan) {
        Ok(plan_json) => {
            if let Err(err) = state
                .store
                .upsert_plan(&user.user_id, date, &plan_json)
                .await
            {
                tracing::warn!(user_id = %user.user_id, error = %err, "failed to persist plan");
            }
        }
        Err(err) => {
            tracing::warn!(user_id = %user.user_id, error = %err, "failed to serialize plan");
        }
    }

    Ok(Json(GeneratedPlanResponse {
        plan: recovery.plan,
        apod,
        weather,
    }))
}

async fn weather_or_none(state: &AppState, preferences: &Preferences) -> Option<WeatherSummary> {
    let city = preferences.city.as_deref()?;
    match state.weather.current(city).await {
        Ok(weather) => Some(weather),
        Err(err) => {
            tracing::warn!(city, error = %err, "weather unavailable, planning without it");
            None
        }
    }
}

async fn apod_or_placeholder(state: &AppState) -> Apod {
    state.apod.today().await.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "astronomy picture unavailable");
        Apod::unavailable()
    })
}

/// Fetch the stored plan for a day (`null` if none was generated)
#[utoipa::path(
    get,
    path = "/api/plan",
    params(DateQuery),
    responses(
        (status = 200, description = "Stored plan or null", body = StoredPlanResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Database error", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "plan"
)]
pub async fn get_plan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<DateQuery>,
) -> Result<Json<StoredPlanResponse>, AppError> {
    let plan = state
        .store
        .get_plan(&user.user_id, query.or_today())
        .await?;
    Ok(Json(StoredPlanResponse { plan }))
}
