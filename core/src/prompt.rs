//! Renders the instruction sent to the completion model.

use thiserror::Error;

use crate::preferences::Preferences;
use crate::tasks::Task;
use crate::weather::WeatherSummary;

const FALLBACK_WAKE_TIME: &str = "09:00";
const FALLBACK_SLEEP_TIME: &str = "23:00";
const FALLBACK_BREAK_INTERVAL: i32 = 30;
const FALLBACK_TASK_MINUTES: i32 = 30;
const UNKNOWN: &str = "unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("at least one task is required to build a plan")]
    NoTasks,
}

/// Build the planning instruction for `tasks`, in order.
///
/// Missing preferences and weather fall back to fixed defaults, so the only
/// failure is an empty task list.
pub fn build_prompt(
    tasks: &[Task],
    preferences: Option<&Preferences>,
    weather: Option<&WeatherSummary>,
) -> Result<String, PromptError> {
    if tasks.is_empty() {
        return Err(PromptError::NoTasks);
    }

    let tasks_text = tasks
        .iter()
        .map(|t| format!("- {}", task_line(t)))
        .collect::<Vec<_>>()
        .join("\n");

    let wake = preferences.map_or(FALLBACK_WAKE_TIME, |p| p.wake_time.as_str());
    let sleep = preferences.map_or(FALLBACK_SLEEP_TIME, |p| p.sleep_time.as_str());
    let break_interval = preferences.map_or(FALLBACK_BREAK_INTERVAL, |p| p.break_interval_minutes);

    let mut constraint_lines = vec![
        format!("Wake time: {wake}"),
        format!("Sleep time: {sleep}"),
        format!("Break interval: every {break_interval} minutes"),
    ];
    if let Some(p) = preferences {
        constraint_lines.push(format!("Peak focus: {}", p.peak_focus));
        constraint_lines.push(format!("Max work hours: {}", p.max_work_hours));
        constraint_lines.push(format!("Commute: {}", p.commute_mode));
        if let Some(style) = &p.break_style {
            constraint_lines.push(format!("Break style: {style}"));
        }
    }
    let constraints_text = constraint_lines.join("\n");

    let description = weather
        .and_then(|w| w.description.as_deref())
        .unwrap_or(UNKNOWN);
    let temperature = weather
        .and_then(|w| w.temperature)
        .map_or_else(|| UNKNOWN.to_string(), |t| format!("{t}°C"));

    Ok(format!(
        r#"You are a daily planning assistant. Build a realistic schedule for today.

Tasks (title – duration – importance):
{tasks_text}

{constraints_text}
Weather: {description}, {temperature}

Respond with JSON in exactly this shape:
{{"schedule": [{{"time": "HH:MM", "activity": "string", "duration": "minutes", "type": "task|break|meal"}}], "summary": "string"}}

Return ONLY the raw JSON object. No prose, no explanations, no markdown code fences."#
    ))
}

fn task_line(task: &Task) -> String {
    let title = Some(task.title.trim())
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled");
    let minutes = Some(task.duration_minutes)
        .filter(|m| *m > 0)
        .unwrap_or(FALLBACK_TASK_MINUTES);
    let importance = Some(task.importance.trim())
        .filter(|i| !i.is_empty())
        .unwrap_or(crate::tasks::DEFAULT_IMPORTANCE);
    format!("{title} – {minutes}m – {importance}")
}
