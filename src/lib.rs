//! Self-service account lifecycle flows.
//!
//! User self-registration and forgotten-password recovery, executed as a
//! two-phase collect/validate/commit interaction against a user store,
//! followed by best-effort notification. The presentation layer drives the
//! session controller and owns screen transitions; everything user-visible
//! it needs is exposed through outcomes, flags, and action visibility.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Account entities and password value objects
//! - **validation**: Named rule contexts over field rules
//! - **services**: Workflow engine and the action session controller
//! - **infra**: User store, credential vault, mail notifier, database
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Apply the database schema
//! cargo run -- migrate up
//!
//! # Register an account
//! cargo run -- register --username alice --email alice@example.com --password 'SecurePass123!'
//!
//! # Mail a fresh password to an account
//! cargo run -- restore-password --email alice@example.com
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod validation;

// Re-export commonly used types at crate root
pub use config::Config;
pub use domain::{LoginInfo, UserAccount};
pub use errors::{FlowError, FlowResult, StoreError, StoreResult};
pub use services::{
    AccountManager, AccountService, Disposition, FlowKind, FlowParameters, Outcome,
    SessionController, SessionState,
};
