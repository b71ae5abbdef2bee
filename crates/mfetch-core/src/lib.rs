pub mod config;
pub mod logging;

pub mod callbacks;
pub mod classify;
pub mod control;
pub mod error;
pub mod fetch;
pub mod interface;
pub mod layout;
pub mod queue;
pub mod recovery;
pub mod scheduler;

pub use error::EngineError;
pub use scheduler::{RunOutcome, Scheduler};
