//! Pick'em Service Library
//!
//! Exposes the command-line surface, configuration and report file sink so
//! the binary stays thin and the pieces can be driven from tests.

pub mod cli;
pub mod config;
pub mod report_sink;

pub use cli::Cli;
pub use config::Config;
pub use report_sink::ReportFileSink;
