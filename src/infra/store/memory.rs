//! In-memory user store.
//!
//! Mirrors the database store's stage-then-commit behavior, including the
//! commit-time uniqueness check. Used by the integration tests and as a
//! lightweight backend where no database is available.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{LoginInfo, UserAccount};
use crate::errors::{StoreError, StoreResult};

use super::UserStore;

#[derive(Default)]
struct Inner {
    committed: HashMap<Uuid, UserAccount>,
    roles: HashSet<String>,
    staged_accounts: Vec<UserAccount>,
    staged_login_infos: Vec<(Uuid, LoginInfo)>,
}

/// In-memory implementation of `UserStore`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose role registry contains the given role names.
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: RwLock::new(Inner {
                roles: roles.into_iter().map(Into::into).collect(),
                ..Default::default()
            }),
        }
    }

    /// Number of committed accounts.
    pub async fn account_count(&self) -> usize {
        self.inner.read().await.committed.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        let inner = self.inner.read().await;
        Ok(inner
            .committed
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let inner = self.inner.read().await;
        Ok(inner.committed.values().find(|a| a.email == email).cloned())
    }

    async fn create(&self) -> StoreResult<UserAccount> {
        Ok(UserAccount::new(Uuid::new_v4()))
    }

    async fn save(&self, account: &UserAccount) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        match inner
            .staged_accounts
            .iter_mut()
            .find(|entry| entry.id == account.id)
        {
            Some(staged) => *staged = account.clone(),
            None => inner.staged_accounts.push(account.clone()),
        }
        Ok(())
    }

    async fn assign_role(&self, account: &mut UserAccount, role_name: &str) -> StoreResult<bool> {
        let inner = self.inner.read().await;
        if inner.roles.contains(role_name) {
            account.role = Some(role_name.to_string());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn create_login_info(
        &self,
        account: &UserAccount,
        provider: &str,
        provider_user_key: &str,
    ) -> StoreResult<LoginInfo> {
        let mut inner = self.inner.write().await;
        if !inner.committed.contains_key(&account.id) {
            return Err(StoreError::NotPersisted(account.id));
        }
        let info = LoginInfo {
            provider: provider.to_string(),
            provider_user_key: provider_user_key.to_string(),
        };
        inner.staged_login_infos.push((account.id, info.clone()));
        Ok(info)
    }

    async fn commit(&self) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        // check constraints before mutating anything, so a failed commit
        // keeps the staged work intact for a retry
        for staged in &inner.staged_accounts {
            if inner
                .committed
                .values()
                .any(|a| a.id != staged.id && a.username == staged.username)
            {
                return Err(StoreError::UniqueViolation(format!(
                    "username '{}'",
                    staged.username
                )));
            }
            if inner
                .committed
                .values()
                .any(|a| a.id != staged.id && a.email == staged.email)
            {
                return Err(StoreError::UniqueViolation(format!(
                    "email '{}'",
                    staged.email
                )));
            }
        }
        if let Some((id, _)) = inner
            .staged_login_infos
            .iter()
            .find(|(id, _)| !inner.committed.contains_key(id))
        {
            return Err(StoreError::NotPersisted(*id));
        }

        let staged_accounts: Vec<_> = inner.staged_accounts.drain(..).collect();
        for mut account in staged_accounts {
            account.updated_at = chrono::Utc::now();
            inner.committed.insert(account.id, account);
        }

        let staged_login_infos: Vec<_> = inner.staged_login_infos.drain(..).collect();
        for (id, info) in staged_login_infos {
            if let Some(account) = inner.committed.get_mut(&id) {
                account.login_infos.push(info);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn stage_account(store: &MemoryStore, username: &str, email: &str) -> UserAccount {
        let mut account = store.create().await.unwrap();
        account.username = username.to_string();
        account.email = email.to_string();
        account.active = true;
        store.save(&account).await.unwrap();
        account
    }

    #[tokio::test]
    async fn test_commit_makes_account_findable() {
        let store = MemoryStore::new();
        stage_account(&store, "alice", "alice@example.com").await;
        store.commit().await.unwrap();

        let found = store.find_by_username("alice").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().email, "alice@example.com");
        assert!(store
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_staged_account_is_not_visible_before_commit() {
        let store = MemoryStore::new();
        stage_account(&store, "alice", "alice@example.com").await;

        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected_at_commit() {
        let store = MemoryStore::new();
        stage_account(&store, "alice", "alice@example.com").await;
        store.commit().await.unwrap();

        stage_account(&store, "alice", "other@example.com").await;
        let err = store.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_staged_work_for_retry() {
        let store = MemoryStore::new();
        stage_account(&store, "alice", "alice@example.com").await;
        store.commit().await.unwrap();

        let mut second = stage_account(&store, "alice", "bob@example.com").await;
        assert!(store.commit().await.is_err());

        // correcting the staged values lets the retry succeed
        second.username = "bob".to_string();
        store.save(&second).await.unwrap();
        store.commit().await.unwrap();
        assert_eq!(store.account_count().await, 2);
    }

    #[tokio::test]
    async fn test_login_info_requires_committed_account() {
        let store = MemoryStore::new();
        let account = stage_account(&store, "alice", "alice@example.com").await;

        let err = store
            .create_login_info(&account, "Password", "key")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotPersisted(_)));
    }

    #[tokio::test]
    async fn test_login_info_commits_onto_account() {
        let store = MemoryStore::new();
        let account = stage_account(&store, "alice", "alice@example.com").await;
        store.commit().await.unwrap();

        store
            .create_login_info(&account, "Password", &account.id.to_string())
            .await
            .unwrap();
        store.commit().await.unwrap();

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.login_infos.len(), 1);
        assert_eq!(found.login_infos[0].provider, "Password");
        assert_eq!(found.login_infos[0].provider_user_key, account.id.to_string());
    }

    #[tokio::test]
    async fn test_assign_role_tolerates_missing_role() {
        let store = MemoryStore::with_roles(["Default"]);
        let mut account = store.create().await.unwrap();

        assert!(store.assign_role(&mut account, "Default").await.unwrap());
        assert_eq!(account.role.as_deref(), Some("Default"));

        assert!(!store.assign_role(&mut account, "Admin").await.unwrap());
        assert_eq!(account.role.as_deref(), Some("Default"));
    }
}
