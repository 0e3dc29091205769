//! Logging for the pdb-guard binaries: human readable console logs on stderr
//! and, optionally, JSON logs in rolling files. Everything is configured from
//! CLI arguments and environment variables, see [`TelemetryOptions`].
pub mod logging;

pub use logging::{TelemetryOptions, Tracing};
