use axum::extract::{Path, Query, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use dayplan_core::error::ApiError;
use dayplan_core::tasks::{Task, TaskInput};

use super::{DateQuery, OkResponse, today};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", delete(delete_task))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

/// Add a task to a day (today unless `date` is given)
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = TaskInput,
    responses(
        (status = 200, description = "Task stored", body = OkResponse),
        (status = 400, description = "Invalid field", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Database error", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(input): AppJson<TaskInput>,
) -> Result<Json<OkResponse>, AppError> {
    state.store.ensure_user(&user.user_id).await?;

    let task = input.validate(today())?.into_task(&user.user_id);
    state.store.insert_task(&task).await?;

    tracing::info!(
        user_id = %user.user_id,
        task_id = %task.id,
        date = %task.date,
        "task created"
    );
    Ok(OkResponse::ok())
}

/// List the user's tasks for one day
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(DateQuery),
    responses(
        (status = 200, description = "Tasks for the day, in creation order", body = TaskListResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Database error", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<DateQuery>,
) -> Result<Json<TaskListResponse>, AppError> {
    let tasks = state
        .store
        .list_tasks(&user.user_id, query.or_today())
        .await?;
    Ok(Json(TaskListResponse { tasks }))
}

/// Delete one of the user's tasks
///
/// Tasks owned by another user are reported as not found.
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = OkResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No such task for this user", body = ApiError),
        (status = 500, description = "Database error", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    state.store.ensure_user(&user.user_id).await?;

    let not_found = || AppError::NotFound {
        resource: format!("Task {id}"),
    };
    let task_id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    if !state.store.delete_task(&user.user_id, task_id).await? {
        return Err(not_found());
    }

    tracing::info!(user_id = %user.user_id, task_id = %task_id, "task deleted");
    Ok(OkResponse::ok())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn created_tasks_are_listed_for_today() {
        let app = TestApp::new();
        let token = app.token("user_a");

        let (status, body) = app
            .post(
                "/api/tasks",
                Some(&token),
                json!({"title": "Write report", "duration": 90, "importance": "high"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
        assert!(app.store.has_user("user_a"));

        app.post("/api/tasks", Some(&token), json!({"title": "Call mum", "duration": 15}))
            .await;

        let (status, body) = app.get("/api/tasks", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        let tasks = body["tasks"].as_array().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0]["title"], "Write report");
        assert_eq!(tasks[0]["durationMinutes"], 90);
        assert_eq!(tasks[1]["importance"], "medium");
        assert!(tasks[0].get("owner").is_none());
    }

    #[tokio::test]
    async fn tasks_for_other_days_are_not_listed_today() {
        let app = TestApp::new();
        let token = app.token("user_a");
        app.post(
            "/api/tasks",
            Some(&token),
            json!({"title": "Dentist", "duration": 60, "date": "2020-01-02"}),
        )
        .await;

        let (_, today) = app.get("/api/tasks", Some(&token)).await;
        assert_eq!(today["tasks"].as_array().unwrap().len(), 0);

        let (_, that_day) = app.get("/api/tasks?date=2020-01-02", Some(&token)).await;
        assert_eq!(that_day["tasks"][0]["title"], "Dentist");
    }

    #[tokio::test]
    async fn invalid_fields_are_rejected_with_field_name() {
        let app = TestApp::new();
        let token = app.token("user_a");

        let (status, body) = app
            .post("/api/tasks", Some(&token), json!({"title": "", "duration": 30}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "title");

        let (status, body) = app
            .post("/api/tasks", Some(&token), json!({"title": "Gym", "duration": -10}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "duration");

        let (status, body) = app
            .post("/api/tasks", Some(&token), json!({"title": "Gym", "duration": "ten"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(app.store.task_count(), 0);
    }

    #[tokio::test]
    async fn deleting_another_users_task_is_not_found() {
        let app = TestApp::new();
        let owner = app.token("owner");
        let intruder = app.token("intruder");

        app.post("/api/tasks", Some(&owner), json!({"title": "Secret", "duration": 20}))
            .await;
        let (_, body) = app.get("/api/tasks", Some(&owner)).await;
        let id = body["tasks"][0]["id"].as_str().unwrap().to_string();

        let (status, body) = app.delete(&format!("/api/tasks/{id}"), Some(&intruder)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert_eq!(app.store.task_count(), 1);

        let (status, _) = app.delete(&format!("/api/tasks/{id}"), Some(&owner)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.store.task_count(), 0);

        let (status, _) = app.delete(&format!("/api/tasks/{id}"), Some(&owner)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_task_id_is_not_found() {
        let app = TestApp::new();
        let token = app.token("user_a");
        let (status, _) = app.delete("/api/tasks/not-a-uuid", Some(&token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn task_routes_require_a_valid_token() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/tasks", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, body) = app.get("/api/tasks", Some("forged.token.value")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authentication failed");
    }
}
