//! Ephemeral anonymous message board.
//!
//! Messages are kept for seven days, shown newest first and fade a little
//! with every day of age. Expired messages are purged while the board loads.

pub mod common;
pub mod config;
pub mod engine;
pub mod service;
pub mod storage;
pub mod ui;

pub use common::{Message, StoreError, SubmitError};
pub use engine::{RetentionEngine, VisibleMessage};
pub use storage::{MessageRecord, MessageStore};
