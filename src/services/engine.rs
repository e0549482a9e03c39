//! Account workflow engine.
//!
//! Business logic for registration and password restore: idempotency
//! lookups, the two-step commit of account and login-info, and best-effort
//! notification. Persistence mechanics, credential hashing, and mail
//! transport live behind the `UserStore`, `PasswordService` and `Notifier`
//! collaborator traits.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, DEFAULT_ROLE, PASSWORD_PROVIDER, SAVE_CONTEXT};
use crate::domain::GeneratedPassword;
use crate::errors::{FlowError, FlowResult, StoreError};
use crate::infra::{Notifier, NotifyError, PasswordService, UserStore};
use crate::validation::validate_in_context;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Enumerated result of a workflow execution.
///
/// `AlreadyExists` and `NotFound` are expected results, not failures; the
/// session controller maps them to message views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    AlreadyExists,
    PasswordReset,
    NotFound,
}

/// Account workflow operations.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a new local account.
    async fn register(&self, username: &str, email: &str, password: &str)
        -> FlowResult<Outcome>;

    /// Reset the credential of the account registered under `email`.
    async fn restore_password(&self, email: &str) -> FlowResult<Outcome>;
}

/// Concrete implementation of `AccountService` over a user store.
pub struct AccountManager<S: UserStore> {
    store: Arc<S>,
    passwords: Arc<dyn PasswordService>,
    notifier: Arc<dyn Notifier>,
    config: Config,
}

impl<S: UserStore> AccountManager<S> {
    /// Create a new engine instance with its collaborators.
    pub fn new(
        store: Arc<S>,
        passwords: Arc<dyn PasswordService>,
        notifier: Arc<dyn Notifier>,
        config: Config,
    ) -> Self {
        Self {
            store,
            passwords,
            notifier,
            config,
        }
    }

    /// Notification is best-effort: transport failures and timeouts are
    /// logged and swallowed, bounded by the configured timeout so the
    /// workflow never stalls on the mail transport.
    async fn notify<F>(&self, send: F, what: &'static str)
    where
        F: Future<Output = Result<(), NotifyError>> + Send,
    {
        match tokio::time::timeout(self.config.notify_timeout(), send).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "failed to send {}", what),
            Err(_) => tracing::warn!(
                timeout_secs = self.config.notify_timeout_secs,
                "timed out sending {}",
                what
            ),
        }
    }
}

#[async_trait]
impl<S: UserStore> AccountService for AccountManager<S> {
    async fn register(&self, username: &str, email: &str, password: &str)
        -> FlowResult<Outcome> {
        // field rules run on the parameter screen; re-check the essentials
        // in case the engine is driven directly
        if username.trim().is_empty() || email.trim().is_empty() {
            return Err(FlowError::invalid_argument(
                "UserName and Email address are not specified",
            ));
        }

        // idempotency is keyed on the username
        if self.store.find_by_username(username).await?.is_some() {
            tracing::debug!(username, "registration found an existing login");
            return Ok(Outcome::AlreadyExists);
        }

        let mut account = self.store.create().await?;
        account.username = username.to_string();
        account.email = email.to_string();
        account.active = true;
        self.passwords.set_password(&mut account, password)?;

        if !self.store.assign_role(&mut account, DEFAULT_ROLE).await? {
            tracing::warn!(role = DEFAULT_ROLE, "role not found, skipping assignment");
        }

        // the account must satisfy the save rules before anything becomes
        // durable; a rejected account is never committed
        let report = validate_in_context(SAVE_CONTEXT, &account);
        if !report.is_valid() {
            return Err(FlowError::Validation(report));
        }

        self.store.save(&account).await?;
        match self.store.commit().await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation(constraint)) => {
                // lost the race against a concurrent registration
                tracing::debug!(username, constraint = %constraint, "commit hit a uniqueness constraint");
                return Ok(Outcome::AlreadyExists);
            }
            Err(err) => return Err(err.into()),
        }

        // second saga step: the login-info provider key is the account's
        // durable identifier, available only after the first commit
        let provider_key = account.id.to_string();
        self.store
            .create_login_info(&account, PASSWORD_PROVIDER, &provider_key)
            .await?;
        if let Err(err) = self.store.commit().await {
            tracing::warn!(username, error = %err, "login-info commit failed, retrying");
            if let Err(retry_err) = self.store.commit().await {
                tracing::error!(
                    username,
                    error = %retry_err,
                    "login-info commit failed after retry; account is missing its login info"
                );
                return Err(retry_err.into());
            }
        }

        self.notify(
            self.notifier.send_registration_email(email),
            "registration email",
        )
        .await;

        tracing::info!(username, "account registered");
        Ok(Outcome::Created)
    }

    async fn restore_password(&self, email: &str) -> FlowResult<Outcome> {
        let Some(mut account) = self.store.find_by_email(email).await? else {
            tracing::debug!(email, "no account for the restore request");
            return Ok(Outcome::NotFound);
        };

        let generated = GeneratedPassword::random();
        self.passwords.set_password(&mut account, generated.as_str())?;
        self.passwords.force_change_on_next_logon(&mut account);

        self.store.save(&account).await?;
        self.store.commit().await?;

        self.notify(
            self.notifier
                .send_password_reset_email(email, generated.as_str(), &account.username),
            "password reset email",
        )
        .await;

        tracing::info!(username = %account.username, "password reset");
        Ok(Outcome::PasswordReset)
    }
}
