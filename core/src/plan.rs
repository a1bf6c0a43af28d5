use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Summary used whenever the model's own summary could not be recovered.
pub const FALLBACK_SUMMARY: &str = "Daily schedule generated based on your preferences and tasks.";

pub const DEFAULT_TIME: &str = "09:00";
pub const DEFAULT_ACTIVITY: &str = "Task";
pub const DEFAULT_DURATION: &str = "30";
pub const DEFAULT_KIND: &str = "task";

/// A generated plan for one day: the payload stored in `plans.plan_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DayPlan {
    pub schedule: Vec<ScheduleItem>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleItem {
    /// `HH:MM`
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default = "default_activity")]
    pub activity: String,
    /// Minutes, as the model chose to write them (`"45"`, `45`, `"45m"`)
    #[serde(default = "default_duration")]
    #[schema(value_type = Object)]
    pub duration: ItemDuration,
    /// `task`, `break` or `meal`
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemDuration {
    Minutes(serde_json::Number),
    Text(String),
}

impl From<&str> for ItemDuration {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

pub fn default_time() -> String {
    DEFAULT_TIME.to_string()
}

pub fn default_activity() -> String {
    DEFAULT_ACTIVITY.to_string()
}

pub fn default_duration() -> ItemDuration {
    ItemDuration::from(DEFAULT_DURATION)
}

pub fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

impl ScheduleItem {
    pub fn new(time: &str, activity: &str, duration: &str, kind: &str) -> Self {
        Self {
            time: time.to_string(),
            activity: activity.to_string(),
            duration: duration.into(),
            kind: kind.to_string(),
        }
    }
}

impl DayPlan {
    /// Builds a plan whose summary is [`FALLBACK_SUMMARY`].
    pub fn with_fallback_summary(schedule: Vec<ScheduleItem>) -> Self {
        Self {
            schedule,
            summary: FALLBACK_SUMMARY.to_string(),
        }
    }

    /// The canned morning returned when nothing usable can be scraped.
    pub fn example() -> Self {
        Self::with_fallback_summary(vec![
            ScheduleItem::new("09:00", "Morning Task", "60", "task"),
            ScheduleItem::new("10:00", "Break", "15", "break"),
            ScheduleItem::new("10:15", "Work Session", "90", "task"),
            ScheduleItem::new("11:45", "Lunch", "60", "meal"),
        ])
    }
}
