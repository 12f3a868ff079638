//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `spec` - Print the config specification
//! - `check` - Validate the API and application keys
//! - `discover` - Print the stream catalog
//! - `read` - Extract data from streams

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{config_spec, parse_stream_list, Runner};
