pub mod clock;
pub mod commands;
pub mod error;
pub mod events;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::BoardCommand;
pub use error::{LoadError, PurgeFailure, StoreError, SubmitError};
pub use events::BoardEvent;
pub use types::{Location, Message, UNKNOWN_LOCATION};
