use crate::common::BoardEvent;

use super::rows::DisplayRow;

pub const MSG_RELEASED: &str = "your message has been released into the void...";
pub const MSG_NOT_READY: &str = "not ready to send?";
pub const MSG_SEND_FAILED: &str = "failed to send message. please try again.";
pub const MSG_LOAD_FAILED: &str = "failed to load messages. please try again.";
pub const MSG_OPEN_FAILED: &str = "the board is unavailable right now. please try again.";
pub const MSG_EMPTY_BOARD: &str = "no messages yet. be the first to share something unsent...";

/// Short feedback line shown after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_success: bool,
}

/// Local state of the board view.
#[derive(Debug, Default)]
pub struct BoardState {
    pub rows: Vec<DisplayRow>,
    pub status: Option<Status>,
    pub load_error: Option<String>,
    /// Set after the first successful refresh.
    pub loaded: bool,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: BoardEvent) {
        match event {
            BoardEvent::Submitted(_) => self.set_status(MSG_RELEASED, true),
            BoardEvent::Rejected(reason) => self.set_status(&reason, false),
            BoardEvent::Refreshed(rows) => {
                self.rows = rows;
                self.load_error = None;
                self.loaded = true;
            }
            BoardEvent::LoadFailed(reason) => self.load_error = Some(reason),
        }
    }

    pub fn take_status(&mut self) -> Option<Status> {
        self.status.take()
    }

    fn set_status(&mut self, text: &str, is_success: bool) {
        self.status = Some(Status {
            text: text.to_string(),
            is_success,
        });
    }
}
