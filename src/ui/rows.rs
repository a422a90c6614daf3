use chrono::{Local, TimeZone};

use crate::common::{Message, UNKNOWN_LOCATION};
use crate::engine::VisibleMessage;

/// Longest preview shown on a card, in characters.
pub const PREVIEW_CHARS: usize = 150;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;

/// One board card, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub id: String,
    pub preview_text: String,
    pub time_ago_label: String,
    pub fade_level: u8,
    pub days_remaining: u32,
    pub full_text: String,
    pub timestamp: i64,
    pub location: String,
}

impl DisplayRow {
    pub fn from_visible(visible: &VisibleMessage, now: i64) -> Self {
        let message = &visible.message;
        Self {
            id: message.id.clone(),
            preview_text: preview(&message.text),
            time_ago_label: time_ago_label(now - message.timestamp),
            fade_level: visible.fade_level,
            days_remaining: visible.days_remaining,
            full_text: message.text.clone(),
            timestamp: message.timestamp,
            location: message.location.clone(),
        }
    }
}

pub fn rows_from(visible: &[VisibleMessage], now: i64) -> Vec<DisplayRow> {
    visible
        .iter()
        .map(|item| DisplayRow::from_visible(item, now))
        .collect()
}

/// Cuts `text` to [`PREVIEW_CHARS`] characters followed by `...`.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Largest whole unit elapsed: "3 days ago", "1 hour ago", "just now".
pub fn time_ago_label(elapsed_ms: i64) -> String {
    let days = elapsed_ms / DAY_MS;
    let hours = elapsed_ms / HOUR_MS;
    let minutes = elapsed_ms / MINUTE_MS;

    if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "just now".to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// Detail view lines for a message: when it was posted and where from.
pub fn detail_lines(message: &Message) -> (String, String) {
    (
        format_posted_at(message.timestamp, &Local),
        format_origin(&message.location),
    )
}

/// `"3:05 PM, October 19, 2026"` in the given zone.
pub fn format_posted_at<Tz>(timestamp: i64, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match zone.timestamp_millis_opt(timestamp).single() {
        Some(at) => at.format("%-I:%M %p, %B %-d, %Y").to_string(),
        None => format!("{timestamp} ms"),
    }
}

pub fn format_origin(location: &str) -> String {
    let location = location.trim();
    if location.is_empty() {
        format!("from {UNKNOWN_LOCATION}")
    } else {
        format!("from {location}")
    }
}
