//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// signup-flow - self-service account registration and password restore
#[derive(Parser, Debug)]
#[command(name = "signup-flow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run database migrations
    Migrate(MigrateArgs),

    /// Register a new account
    Register(RegisterArgs),

    /// Restore a forgotten password
    RestorePassword(RestoreArgs),
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
}

/// Arguments for the register command
#[derive(Parser, Debug)]
pub struct RegisterArgs {
    /// Username for the new account
    #[arg(long)]
    pub username: String,

    /// Email address for the new account
    #[arg(long)]
    pub email: String,

    /// Initial password
    #[arg(long)]
    pub password: String,
}

/// Arguments for the restore-password command
#[derive(Parser, Debug)]
pub struct RestoreArgs {
    /// Email address of the account to restore
    #[arg(long)]
    pub email: String,
}
