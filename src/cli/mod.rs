//! Command-line interface: clap types, output formatting, and command
//! implementations.

pub mod commands;
pub mod context;
pub mod output;
pub mod types;

pub use context::AppContext;
pub use types::{Cli, Commands};
