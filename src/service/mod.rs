pub mod worker;

pub use worker::BoardWorker;
