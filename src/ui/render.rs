use std::fmt::Write;

use crate::common::{LoadError, Message};
use crate::engine::{MAX_FADE_LEVEL, PurgeReport};

use super::rows::{DisplayRow, detail_lines};
use super::state::{BoardState, MSG_EMPTY_BOARD, MSG_LOAD_FAILED};

/// Bar that shrinks as a card fades: seven blocks when fresh, one when old.
pub fn fade_bar(level: u8) -> String {
    let level = level.clamp(1, MAX_FADE_LEVEL);
    let solid = usize::from(MAX_FADE_LEVEL - level + 1);
    let faded = usize::from(MAX_FADE_LEVEL) - solid;
    format!("{}{}", "█".repeat(solid), "░".repeat(faded))
}

pub fn render_row(row: &DisplayRow) -> String {
    format!(
        "{} {}\n    {} · {} left · {}",
        fade_bar(row.fade_level),
        row.preview_text,
        row.time_ago_label,
        days_left(row.days_remaining),
        row.id
    )
}

/// Renders the whole board as text.
pub fn render_board(state: &BoardState) -> String {
    if let Some(error) = &state.load_error {
        return error.clone();
    }
    if !state.loaded {
        return "loading messages...".to_string();
    }
    if state.rows.is_empty() {
        return MSG_EMPTY_BOARD.to_string();
    }

    let mut out = String::new();
    for row in &state.rows {
        let _ = writeln!(out, "{}", render_row(row));
    }
    out
}

pub fn render_detail(message: &Message) -> String {
    let (posted_at, origin) = detail_lines(message);
    format!("{}\n\n{posted_at}\n{origin}", message.text)
}

/// Summary line for a purge pass. Store errors collapse to the generic
/// load failure text.
pub fn render_purge_outcome(outcome: &Result<PurgeReport, LoadError>) -> String {
    match outcome {
        Ok(report) => format!(
            "{} expired message(s) removed, {} failed",
            report.removed,
            report.failures.len()
        ),
        Err(_) => MSG_LOAD_FAILED.to_string(),
    }
}

fn days_left(days: u32) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}
