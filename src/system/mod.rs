//! System integration: logging initialization.

pub mod logging;

pub use logging::initialize_logging;
