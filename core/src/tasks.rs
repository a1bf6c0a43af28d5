use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::validation::ValidationError;

pub const DEFAULT_IMPORTANCE: &str = "medium";

/// A task the user wants fitted into one day's plan.
/// Tasks are never edited in place: they are created, listed and deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task ID (UUIDv7)
    pub id: Uuid,
    /// Subject of the identity-provider token that created the task
    #[serde(skip)]
    pub owner: String,
    pub title: String,
    pub duration_minutes: i32,
    /// Free-text tag such as "high", "medium" or "low"
    pub importance: String,
    /// Calendar day the task belongs to
    pub date: NaiveDate,
}

/// Validated input for a new task
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub duration_minutes: i32,
    pub importance: String,
    pub date: NaiveDate,
}

impl NewTask {
    pub fn into_task(self, owner: &str) -> Task {
        Task {
            id: Uuid::now_v7(),
            owner: owner.to_string(),
            title: self.title,
            duration_minutes: self.duration_minutes,
            importance: self.importance,
            date: self.date,
        }
    }
}

const MAX_DURATION_MINUTES: f64 = 24.0 * 60.0;

/// Raw body of `POST /api/tasks`, before validation
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TaskInput {
    pub title: Option<String>,
    /// Duration in minutes
    pub duration: Option<f64>,
    pub importance: Option<String>,
    /// Defaults to the current day
    pub date: Option<NaiveDate>,
}

impl TaskInput {
    pub fn validate(self, today: NaiveDate) -> Result<NewTask, ValidationError> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ValidationError::new("title", "title must be a non-empty string")
                    .with_received(self.title.clone().map(serde_json::Value::String))
            })?
            .to_string();

        let duration = self.duration.ok_or_else(|| {
            ValidationError::new("duration", "duration is required (minutes)")
        })?;
        if !duration.is_finite()
            || duration <= 0.0
            || duration.fract() != 0.0
            || duration > MAX_DURATION_MINUTES
        {
            return Err(ValidationError::new(
                "duration",
                "duration must be a whole number of minutes between 1 and 1440",
            )
            .with_received(serde_json::Number::from_f64(duration).map(serde_json::Value::Number)));
        }

        let importance = self
            .importance
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| DEFAULT_IMPORTANCE.to_string());

        Ok(NewTask {
            title,
            duration_minutes: duration as i32,
            importance,
            date: self.date.unwrap_or(today),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn validate_fills_importance_and_date_defaults() {
        let input = TaskInput {
            title: Some("  Write report ".to_string()),
            duration: Some(45.0),
            ..Default::default()
        };
        let task = input.validate(today()).unwrap();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.duration_minutes, 45);
        assert_eq!(task.importance, "medium");
        assert_eq!(task.date, today());
    }

    #[test]
    fn validate_rejects_blank_title() {
        let input = TaskInput {
            title: Some("   ".to_string()),
            duration: Some(30.0),
            ..Default::default()
        };
        let err = input.validate(today()).unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn validate_rejects_non_positive_and_fractional_durations() {
        for bad in [0.0, -5.0, 12.5, 2000.0] {
            let input = TaskInput {
                title: Some("Gym".to_string()),
                duration: Some(bad),
                ..Default::default()
            };
            let err = input.validate(today()).unwrap_err();
            assert_eq!(err.field, "duration", "duration {bad} should be rejected");
        }
    }

    #[test]
    fn validate_requires_duration() {
        let input = TaskInput {
            title: Some("Gym".to_string()),
            ..Default::default()
        };
        assert_eq!(input.validate(today()).unwrap_err().field, "duration");
    }
}
