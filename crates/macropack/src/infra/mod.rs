//! Infrastructure adapters for configuration, filesystem IO, and logging.

pub mod config;
pub mod fs;
pub mod logging;
