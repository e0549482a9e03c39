//! Commands module - CLI command implementations.
//!
//! Each command is implemented in its own module for separation of concerns.

use std::sync::Arc;

use crate::config::Config;
use crate::errors::{FlowError, FlowResult, StoreError};
use crate::infra::{CredentialVault, Database, DbUserStore, SmtpNotifier};
use crate::services::AccountManager;

pub mod migrate;
pub mod register;
pub mod restore;

/// Build the workflow engine on top of the configured database.
pub(crate) async fn build_engine(config: &Config) -> FlowResult<AccountManager<DbUserStore>> {
    let db = Database::connect(config)
        .await
        .map_err(|e| FlowError::from(StoreError::from(e)))?;

    let store = Arc::new(DbUserStore::new(db.get_connection()));
    let passwords = Arc::new(CredentialVault::new());
    let notifier = Arc::new(SmtpNotifier::new(config.smtp.clone()));

    Ok(AccountManager::new(
        store,
        passwords,
        notifier,
        config.clone(),
    ))
}
