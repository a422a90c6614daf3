/// Commands the UI sends to the board worker.
#[derive(Debug, Clone)]
pub enum BoardCommand {
    Submit {
        text: String,
        location: Option<String>,
    },
    /// Reload the board immediately.
    Refresh,
    /// The board view became visible (true) or hidden (false). Auto refresh
    /// only ticks while visible.
    SetVisible(bool),
}
