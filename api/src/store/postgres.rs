use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use dayplan_core::preferences::{CommuteMode, PeakFocus, Preferences};
use dayplan_core::tasks::Task;

use super::{Store, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    user_id: String,
    title: String,
    duration_minutes: i32,
    importance: String,
    task_date: NaiveDate,
}

impl TaskRow {
    fn into_task(self) -> Task {
        Task {
            id: self.id,
            owner: self.user_id,
            title: self.title,
            duration_minutes: self.duration_minutes,
            importance: self.importance,
            date: self.task_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PreferencesRow {
    wake_time: String,
    sleep_time: String,
    peak_focus: String,
    city: Option<String>,
    break_style: Option<String>,
    break_interval_minutes: i32,
    max_work_hours: f64,
    commute_mode: String,
}

impl TryFrom<PreferencesRow> for Preferences {
    type Error = StoreError;

    fn try_from(row: PreferencesRow) -> Result<Self, Self::Error> {
        let peak_focus = row
            .peak_focus
            .parse::<PeakFocus>()
            .map_err(|_| StoreError::Corrupt(format!("peak_focus '{}'", row.peak_focus)))?;
        let commute_mode = row
            .commute_mode
            .parse::<CommuteMode>()
            .map_err(|_| StoreError::Corrupt(format!("commute_mode '{}'", row.commute_mode)))?;

        Ok(Preferences {
            wake_time: row.wake_time,
            sleep_time: row.sleep_time,
            peak_focus,
            city: row.city,
            break_style: row.break_style,
            break_interval_minutes: row.break_interval_minutes,
            max_work_hours: row.max_work_hours,
            commute_mode,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ensure_user(&self, user_id: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, user_id, title, duration_minutes, importance, task_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(task.id)
        .bind(&task.owner)
        .bind(&task.title)
        .bind(task.duration_minutes)
        .bind(&task.importance)
        .bind(task.date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_tasks(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, user_id, title, duration_minutes, importance, task_date
            FROM tasks
            WHERE user_id = $1 AND task_date = $2
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TaskRow::into_task).collect())
    }

    async fn delete_task(&self, user_id: &str, task_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_preferences(&self, user_id: &str) -> Result<Option<Preferences>, StoreError> {
        let row = sqlx::query_as::<_, PreferencesRow>(
            r#"
            SELECT wake_time, sleep_time, peak_focus, city, break_style,
                   break_interval_minutes, max_work_hours, commute_mode
            FROM preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Preferences::try_from).transpose()
    }

    async fn upsert_preferences(
        &self,
        user_id: &str,
        preferences: &Preferences,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO preferences (
                user_id, wake_time, sleep_time, peak_focus, city, break_style,
                break_interval_minutes, max_work_hours, commute_mode
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                wake_time = EXCLUDED.wake_time,
                sleep_time = EXCLUDED.sleep_time,
                peak_focus = EXCLUDED.peak_focus,
                city = EXCLUDED.city,
                break_style = EXCLUDED.break_style,
                break_interval_minutes = EXCLUDED.break_interval_minutes,
                max_work_hours = EXCLUDED.max_work_hours,
                commute_mode = EXCLUDED.commute_mode,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(&preferences.wake_time)
        .bind(&preferences.sleep_time)
        .bind(preferences.peak_focus.as_str())
        .bind(&preferences.city)
        .bind(&preferences.break_style)
        .bind(preferences.break_interval_minutes)
        .bind(preferences.max_work_hours)
        .bind(preferences.commute_mode.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_plan(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let plan = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT plan_json FROM plans WHERE user_id = $1 AND plan_date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(plan)
    }

    async fn upsert_plan(
        &self,
        user_id: &str,
        date: NaiveDate,
        plan: &serde_json::Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO plans (user_id, plan_date, plan_json)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, plan_date) DO UPDATE SET
                plan_json = EXCLUDED.plan_json,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(plan)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
