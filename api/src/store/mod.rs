//! Persistence gateway.
//!
//! Handlers talk to a [`Store`]; production uses [`PgStore`], tests use
//! the in-memory store. Pool connections are checked out per call and
//! returned when the handle drops, on success and error paths alike.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use dayplan_core::preferences::Preferences;
use dayplan_core::tasks::Task;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored row is malformed: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert the user row if it does not exist yet. Idempotent.
    async fn ensure_user(&self, user_id: &str) -> Result<(), StoreError>;

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError>;

    /// Tasks for one user and day, in creation order
    async fn list_tasks(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Task>, StoreError>;

    /// Delete a task owned by `user_id`. Returns false when no such task exists for that user.
    async fn delete_task(&self, user_id: &str, task_id: Uuid) -> Result<bool, StoreError>;

    async fn get_preferences(&self, user_id: &str) -> Result<Option<Preferences>, StoreError>;

    /// Replace the user's preferences, creating the row on first write
    async fn upsert_preferences(
        &self,
        user_id: &str,
        preferences: &Preferences,
    ) -> Result<(), StoreError>;

    async fn get_plan(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<serde_json::Value>, StoreError>;

    /// Store the plan for `(user_id, date)`, overwriting any earlier one
    async fn upsert_plan(
        &self,
        user_id: &str,
        date: NaiveDate,
        plan: &serde_json::Value,
    ) -> Result<(), StoreError>;
}
