//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `migrate` - Database migrations
//! - `register` - Register a new account
//! - `restore-password` - Restore a forgotten password

pub mod args;

pub use args::{Cli, Commands};
