//! Utility functions and types for the fusion evaluator.

pub mod error;
pub mod logging;

pub use error::Error;
pub use logging::init_logging;
