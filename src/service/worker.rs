use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::common::{BoardCommand, BoardEvent, SubmitError};
use crate::engine::RetentionEngine;
use crate::ui::rows::rows_from;
use crate::ui::state::{MSG_LOAD_FAILED, MSG_NOT_READY, MSG_SEND_FAILED};

/// `tokio::time::interval` rejects a zero period.
const MIN_REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// Serial command loop between the UI and the retention engine.
///
/// Each command runs to completion before the next one is read. While the
/// board is visible an interval reloads it every `refresh_period`.
pub struct BoardWorker {
    engine: Arc<RetentionEngine>,
    event_sender: mpsc::Sender<BoardEvent>,
    command_receiver: mpsc::Receiver<BoardCommand>,
    refresh_period: Duration,
    visible: bool,
    default_location: Option<String>,
}

impl BoardWorker {
    pub fn new(
        engine: Arc<RetentionEngine>,
        event_sender: mpsc::Sender<BoardEvent>,
        command_receiver: mpsc::Receiver<BoardCommand>,
        refresh_period: Duration,
    ) -> Self {
        Self {
            engine,
            event_sender,
            command_receiver,
            refresh_period: refresh_period.max(MIN_REFRESH_PERIOD),
            visible: false,
            default_location: None,
        }
    }

    /// Start with the board already on screen.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Location used for submissions that carry no hint.
    pub fn default_location(mut self, location: Option<String>) -> Self {
        self.default_location = location;
        self
    }

    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.refresh_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!(
            "Board worker started (refresh every {}s)",
            self.refresh_period.as_secs()
        );

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    if let Some(command) = command {
                        if matches!(command, BoardCommand::SetVisible(true)) {
                            ticker.reset();
                        }
                        self.handle_command(command).await;
                    } else {
                        break;
                    }
                }
                _ = ticker.tick(), if self.visible => {
                    self.refresh().await;
                }
            }
        }

        self.engine.wait_for_purges().await;
        log::info!("Board worker stopped");
    }

    async fn handle_command(&mut self, command: BoardCommand) {
        match command {
            BoardCommand::Submit { text, location } => {
                let hint = location.or_else(|| self.default_location.clone());
                match self.engine.submit(&text, hint.as_deref()).await {
                    Ok(message) => {
                        self.emit(BoardEvent::Submitted(message)).await;
                        if self.visible {
                            self.refresh().await;
                        }
                    }
                    Err(SubmitError::EmptyMessage) => {
                        self.emit(BoardEvent::Rejected(MSG_NOT_READY.to_string()))
                            .await;
                    }
                    Err(err) => {
                        log::error!("Failed to submit message: {err}");
                        self.emit(BoardEvent::Rejected(MSG_SEND_FAILED.to_string()))
                            .await;
                    }
                }
            }
            BoardCommand::Refresh => self.refresh().await,
            BoardCommand::SetVisible(visible) => {
                let became_visible = visible && !self.visible;
                self.visible = visible;
                if became_visible {
                    self.refresh().await;
                }
            }
        }
    }

    async fn refresh(&mut self) {
        let now = self.engine.now();
        match self.engine.load_visible(now).await {
            Ok(visible) => {
                self.emit(BoardEvent::Refreshed(rows_from(&visible, now)))
                    .await;
            }
            Err(err) => {
                log::error!("Failed to load messages: {err}");
                self.emit(BoardEvent::LoadFailed(MSG_LOAD_FAILED.to_string()))
                    .await;
            }
        }
    }

    async fn emit(&self, event: BoardEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to notify UI: {err}");
        }
    }
}
