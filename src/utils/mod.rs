//! Utility functions and types for the supply monitor.

pub mod error;
mod fs;
mod logging;
pub mod types;

pub use error::Error;
pub use fs::*;
pub use logging::init_logging;
#[cfg(test)]
pub(crate) use logging::init_test_logging;
pub use types::*;
