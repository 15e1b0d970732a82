//! CLI module
//!
//! Command-line interface for walking paginated endpoints.
//!
//! # Commands
//!
//! - `fetch` - Print every item of an endpoint
//! - `pages` - Print one summary line per page
//! - `validate` - Check an endpoint definition

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, TraverseArgs};
pub use runner::Runner;
