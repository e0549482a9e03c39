//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - User store (in-memory and database backed)
//! - Credential hashing
//! - Outbound mail
//! - Database connection and migrations

pub mod credentials;
pub mod db;
pub mod notifier;
pub mod store;

pub use credentials::{CredentialVault, PasswordService};
pub use db::{Database, Migrator};
pub use notifier::{EmailMessage, Notifier, NotifyError, SmtpNotifier};
pub use store::{DbUserStore, MemoryStore, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use credentials::MockPasswordService;
#[cfg(any(test, feature = "test-utils"))]
pub use notifier::MockNotifier;
#[cfg(any(test, feature = "test-utils"))]
pub use store::MockUserStore;
