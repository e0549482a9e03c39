//! User store abstraction.
//!
//! The store follows a stage-then-commit contract: `create` hands out a
//! blank account with a store-assigned identifier, `save` stages field
//! values, and `commit` makes all staged work durable at once. A failed
//! commit leaves the staged work in place so the caller can retry it.
//!
//! Login-info records can only be created for accounts that have already
//! been committed: their provider user key is the account's durable
//! identifier, so the account must survive a commit first.

use async_trait::async_trait;

use crate::domain::{LoginInfo, UserAccount};
use crate::errors::StoreResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

mod db;
mod entities;
mod memory;

pub use db::DbUserStore;
pub use memory::MemoryStore;

/// User store trait for dependency injection.
///
/// Usernames and emails are unique across committed accounts; violations
/// surface as `StoreError::UniqueViolation` at commit time, which is also
/// how concurrent registrations collapse to a single winner.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a committed account by username.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>>;

    /// Find a committed account by exact email address.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>>;

    /// Hand out a blank account with a fresh identifier.
    /// Nothing is staged until `save`.
    async fn create(&self) -> StoreResult<UserAccount>;

    /// Stage the account's current field values for the next commit.
    /// Saving the same account again replaces its staged values.
    async fn save(&self, account: &UserAccount) -> StoreResult<()>;

    /// Assign the named role to the account. Returns `false` when the role
    /// does not exist; the account is left unchanged in that case.
    async fn assign_role(&self, account: &mut UserAccount, role_name: &str) -> StoreResult<bool>;

    /// Stage a login-info record for a committed account. Fails with
    /// `StoreError::NotPersisted` when the account has no durable
    /// identifier yet.
    async fn create_login_info(
        &self,
        account: &UserAccount,
        provider: &str,
        provider_user_key: &str,
    ) -> StoreResult<LoginInfo>;

    /// Make all staged work durable.
    async fn commit(&self) -> StoreResult<()>;
}
