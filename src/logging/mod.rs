//! Logging and observability
//!
//! Structured logging via `tracing`: a console layer that is always
//! on, plus an optional rotating JSON file layer for deployments that
//! keep local logs.

pub mod structured;

pub use structured::{init_logging, LoggingGuard};
