pub mod fade;
pub mod retention;

pub use fade::{DAY_MS, MAX_FADE_LEVEL, RETENTION_WINDOW_MS, days_remaining, fade_level};
pub use retention::{PurgeReport, RetentionEngine, VisibleMessage, partition};
