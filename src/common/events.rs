use crate::common::types::Message;
use crate::ui::DisplayRow;

/// Events emitted by the board worker for the UI.
#[derive(Debug, Clone)]
pub enum BoardEvent {
    Submitted(Message),
    /// Submission was refused. Carries text that is safe to show the user.
    Rejected(String),
    Refreshed(Vec<DisplayRow>),
    /// Loading failed. Carries text that is safe to show the user.
    LoadFailed(String),
}
