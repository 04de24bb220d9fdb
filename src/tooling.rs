//! Tooling & Integration Layer
//!
//! Command-line front end over the session API.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
