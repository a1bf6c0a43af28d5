use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PeakFocus {
    Morning,
    Afternoon,
    Evening,
}

impl PeakFocus {
    pub const ALL: [Self; 3] = [Self::Morning, Self::Afternoon, Self::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommuteMode {
    None,
    Walk,
    Bike,
    Public,
    Car,
}

impl CommuteMode {
    pub const ALL: [Self; 5] = [Self::None, Self::Walk, Self::Bike, Self::Public, Self::Car];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Walk => "walk",
            Self::Bike => "bike",
            Self::Public => "public",
            Self::Car => "car",
        }
    }
}

macro_rules! impl_tag {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or(())
            }
        }
    };
}

impl_tag!(PeakFocus);
impl_tag!(CommuteMode);

/// One user's scheduling preferences. Exactly one row per user; a new
/// submission replaces every field of the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// `HH:MM`, 24-hour
    pub wake_time: String,
    /// `HH:MM`, 24-hour
    pub sleep_time: String,
    pub peak_focus: PeakFocus,
    pub city: Option<String>,
    pub break_style: Option<String>,
    pub break_interval_minutes: i32,
    pub max_work_hours: f64,
    pub commute_mode: CommuteMode,
}

/// Raw body of `POST /api/preferences`
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesInput {
    pub wake_time: Option<String>,
    pub sleep_time: Option<String>,
    pub peak_focus: Option<String>,
    pub city: Option<String>,
    pub break_style: Option<String>,
    pub break_interval_minutes: Option<f64>,
    pub max_work_hours: Option<f64>,
    pub commute_mode: Option<String>,
}

impl PreferencesInput {
    pub fn validate(self) -> Result<Preferences, ValidationError> {
        let wake_time = clock_time("wakeTime", self.wake_time.as_deref())?;
        let sleep_time = clock_time("sleepTime", self.sleep_time.as_deref())?;
        let peak_focus =
            tag::<PeakFocus>("peakFocus", self.peak_focus.as_deref(), &PeakFocus::ALL)?;
        let commute_mode =
            tag::<CommuteMode>("commuteMode", self.commute_mode.as_deref(), &CommuteMode::ALL)?;

        let break_interval_minutes = match self.break_interval_minutes {
            Some(m) if m.is_finite() && m > 0.0 && m.fract() == 0.0 && m <= 24.0 * 60.0 => m as i32,
            other => {
                return Err(ValidationError::new(
                    "breakIntervalMinutes",
                    "breakIntervalMinutes must be a positive whole number of minutes",
                )
                .with_received(number(other)));
            }
        };

        let max_work_hours = match self.max_work_hours {
            Some(h) if h.is_finite() && h > 0.0 && h <= 24.0 => h,
            other => {
                return Err(ValidationError::new(
                    "maxWorkHours",
                    "maxWorkHours must be greater than 0 and at most 24",
                )
                .with_received(number(other)));
            }
        };

        Ok(Preferences {
            wake_time,
            sleep_time,
            peak_focus,
            city: non_blank(self.city),
            break_style: non_blank(self.break_style),
            break_interval_minutes,
            max_work_hours,
            commute_mode,
        })
    }
}

/// Parse a strict `HH:MM` 24-hour clock time.
fn clock_time(field: &str, value: Option<&str>) -> Result<String, ValidationError> {
    let raw = value.map(str::trim).unwrap_or_default();
    let valid = raw.len() == 5 && NaiveTime::parse_from_str(raw, "%H:%M").is_ok();
    if !valid {
        return Err(ValidationError::new(field, format!("{field} must be a 24-hour HH:MM time"))
            .with_received(value.map(|v| serde_json::Value::String(v.to_string()))));
    }
    Ok(raw.to_string())
}

fn tag<T: FromStr + fmt::Display>(
    field: &str,
    value: Option<&str>,
    allowed: &[T],
) -> Result<T, ValidationError> {
    value.and_then(|v| v.parse::<T>().ok()).ok_or_else(|| {
        let options: Vec<String> = allowed.iter().map(ToString::to_string).collect();
        ValidationError::new(field, format!("{field} must be one of: {}", options.join(", ")))
            .with_received(value.map(|v| serde_json::Value::String(v.to_string())))
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn number(value: Option<f64>) -> Option<serde_json::Value> {
    value
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
}
