//! Recovery of a [`DayPlan`] from raw completion text.
//!
//! Completions are untrusted text: they arrive wrapped in markdown fences,
//! surrounded by prose, or cut off mid-array. Recovery runs an ordered
//! cascade of stages. Each stage rewrites the text it was handed and tries a
//! structured parse; on failure it hands the rewritten text to the next one.
//! When every parse fails, fields are scraped by pattern, and only text with
//! no trace of a schedule is rejected outright.

use std::iter;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::plan::{
    DayPlan, FALLBACK_SUMMARY, ItemDuration, ScheduleItem, default_activity, default_duration,
    default_kind, default_time,
};

const SCHEDULE_KEY: &str = "\"schedule\"";
const SUMMARY_KEY: &str = "\"summary\"";
const PREVIEW_CHARS: usize = 200;

/// Which stage of the cascade produced the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStage {
    Direct,
    MarkdownUnwrap,
    BraceExtraction,
    TruncationRepair,
    FieldScrape,
    ExampleFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recovery {
    pub plan: DayPlan,
    pub stage: RepairStage,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepairError {
    /// The text carried nothing schedule-shaped. `preview` is its first 200 characters.
    #[error("AI response contained no recoverable schedule: {preview}")]
    Unrecoverable { preview: String },
}

type Stage = fn(String) -> Result<DayPlan, String>;

const PARSE_CASCADE: [(RepairStage, Stage); 4] = [
    (RepairStage::Direct, parse),
    (RepairStage::MarkdownUnwrap, unwrap_stage),
    (RepairStage::BraceExtraction, brace_stage),
    (RepairStage::TruncationRepair, truncation_stage),
];

/// Recover a plan from `raw`, preferring any structurally valid schedule
/// over an error.
pub fn recover_plan(raw: &str) -> Result<Recovery, RepairError> {
    let mut text = raw.to_string();
    for (stage, attempt) in PARSE_CASCADE {
        match attempt(text) {
            Ok(plan) => return Ok(Recovery { plan, stage }),
            Err(rest) => text = rest,
        }
    }

    if !raw.contains(SCHEDULE_KEY) {
        return Err(RepairError::Unrecoverable {
            preview: raw.chars().take(PREVIEW_CHARS).collect(),
        });
    }

    Ok(match scrape_fields(raw) {
        Some(plan) => Recovery {
            plan,
            stage: RepairStage::FieldScrape,
        },
        None => Recovery {
            plan: DayPlan::example(),
            stage: RepairStage::ExampleFallback,
        },
    })
}

fn parse(text: String) -> Result<DayPlan, String> {
    serde_json::from_str(&text).map_err(|_| text)
}

/// Parse `rewritten` unless it is identical to what the previous stage already tried.
fn reparse(previous: String, rewritten: String) -> Result<DayPlan, String> {
    if rewritten == previous {
        Err(rewritten)
    } else {
        parse(rewritten)
    }
}

fn unwrap_stage(text: String) -> Result<DayPlan, String> {
    let rewritten = strip_fences(&text);
    reparse(text, rewritten)
}

fn brace_stage(text: String) -> Result<DayPlan, String> {
    let rewritten = brace_span(&text).to_string();
    reparse(text, rewritten)
}

fn truncation_stage(text: String) -> Result<DayPlan, String> {
    if !looks_truncated(&text) {
        return Err(text);
    }
    let rewritten = repair_truncation(&text);
    reparse(text, rewritten)
}

/// Strip a leading ```` ``` ```` or ```` ```json ```` fence and a trailing fence.
pub fn strip_fences(text: &str) -> String {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim().to_string()
}

/// The greedy span from the first `{` to the last `}`, or `text` when there is none.
pub fn brace_span(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn looks_truncated(text: &str) -> bool {
    text.contains(SCHEDULE_KEY) && !text.contains(SUMMARY_KEY)
}

/// Close a completion that was cut off inside its schedule array.
///
/// Keeps everything up to the last complete schedule item, closes the
/// array, adds the fallback summary and closes the object.
pub fn repair_truncation(text: &str) -> String {
    let body = &text[text.find('{').unwrap_or(0)..];
    let mut repaired = body[..complete_prefix_len(body)].trim_end().to_string();
    if repaired.ends_with(',') {
        repaired.pop();
    }

    let balance = Balance::of(&repaired);
    repaired.extend(iter::repeat_n(']', balance.square));
    if !repaired.contains(SUMMARY_KEY) {
        repaired.push_str(&format!(", {SUMMARY_KEY}: \"{FALLBACK_SUMMARY}\""));
    }
    repaired.extend(iter::repeat_n('}', balance.curly));
    repaired
}

/// Length of the prefix of `body` ending after the schedule array's last
/// complete element (or at the array's close, if it did close).
fn complete_prefix_len(body: &str) -> usize {
    let Some(array_start) = body
        .find(SCHEDULE_KEY)
        .and_then(|key| body[key..].find('[').map(|offset| key + offset))
    else {
        return body.len();
    };

    let mut cut = array_start + 1;
    let mut depth = 1usize;
    let mut scanner = JsonScanner::default();
    for (offset, c) in body[cut..].char_indices() {
        if !scanner.is_structural(c) {
            continue;
        }
        let at = array_start + 1 + offset;
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth <= 1 {
                    cut = at + 1;
                }
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    cut
}

/// Tracks whether the scan position is inside a JSON string literal.
#[derive(Default)]
struct JsonScanner {
    in_string: bool,
    escaped: bool,
}

impl JsonScanner {
    /// Feed one character; true when it sits outside any string literal.
    fn is_structural(&mut self, c: char) -> bool {
        if self.in_string {
            match c {
                _ if self.escaped => self.escaped = false,
                '\\' => self.escaped = true,
                '"' => self.in_string = false,
                _ => {}
            }
            false
        } else if c == '"' {
            self.in_string = true;
            false
        } else {
            true
        }
    }
}

/// Unmatched opening brackets outside string literals.
struct Balance {
    square: usize,
    curly: usize,
}

impl Balance {
    fn of(text: &str) -> Self {
        let mut scanner = JsonScanner::default();
        let (mut square, mut curly) = (0isize, 0isize);
        for c in text.chars().filter(|c| scanner.is_structural(*c)) {
            match c {
                '[' => square += 1,
                ']' => square -= 1,
                '{' => curly += 1,
                '}' => curly -= 1,
                _ => {}
            }
        }
        Self {
            square: square.max(0) as usize,
            curly: curly.max(0) as usize,
        }
    }
}

struct FieldPatterns {
    time: Regex,
    activity: Regex,
    duration: Regex,
    kind: Regex,
}

impl FieldPatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            time: Regex::new(r#""time"\s*:\s*"([^"]*)""#)?,
            activity: Regex::new(r#""activity"\s*:\s*"([^"]*)""#)?,
            duration: Regex::new(r#""duration"\s*:\s*(?:"([^"]*)"|(\d+(?:\.\d+)?))"#)?,
            kind: Regex::new(r#""type"\s*:\s*"([^"]*)""#)?,
        })
    }
}

static FIELD_PATTERNS: LazyLock<Option<FieldPatterns>> =
    LazyLock::new(|| FieldPatterns::compile().ok());

/// Build items positionally from independent per-field matches. The item
/// count is the smallest per-field match count, which may be zero.
///
/// Returns `None` only when the patterns are unavailable.
fn scrape_fields(text: &str) -> Option<DayPlan> {
    let patterns = FIELD_PATTERNS.as_ref()?;

    let times = captures(&patterns.time, text);
    let activities = captures(&patterns.activity, text);
    let durations = duration_captures(&patterns.duration, text);
    let kinds = captures(&patterns.kind, text);

    let count = times
        .len()
        .min(activities.len())
        .min(durations.len())
        .min(kinds.len());

    let schedule = (0..count)
        .map(|i| ScheduleItem {
            time: times[i].clone().unwrap_or_else(default_time),
            activity: activities[i].clone().unwrap_or_else(default_activity),
            duration: durations[i].clone().unwrap_or_else(default_duration),
            kind: kinds[i].clone().unwrap_or_else(default_kind),
        })
        .collect();

    Some(DayPlan::with_fallback_summary(schedule))
}

/// One entry per match: the trimmed capture, `None` when it is empty.
fn captures(pattern: &Regex, text: &str) -> Vec<Option<String>> {
    pattern
        .captures_iter(text)
        .map(|caps| caps.get(1).and_then(|m| non_empty(m.as_str())))
        .collect()
}

/// Quoted durations stay text; bare numbers stay numbers.
fn duration_captures(pattern: &Regex, text: &str) -> Vec<Option<ItemDuration>> {
    pattern
        .captures_iter(text)
        .map(|caps| match (caps.get(1), caps.get(2)) {
            (Some(quoted), _) => non_empty(quoted.as_str()).map(ItemDuration::Text),
            (None, Some(bare)) => bare.as_str().parse().ok().map(ItemDuration::Minutes),
            (None, None) => None,
        })
        .collect()
}

fn non_empty(raw: &str) -> Option<String> {
    Some(raw.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}
