pub mod render;
pub mod rows;
pub mod state;

pub use rows::DisplayRow;
pub use state::BoardState;
