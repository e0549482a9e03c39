//! SeaORM-backed user store.
//!
//! Staged work is held in memory and flushed inside a single transaction on
//! `commit`. Uniqueness lives in the schema (unique columns on username and
//! email); a violated constraint surfaces as `StoreError::UniqueViolation`
//! via `DbErr::sql_err`, which is how concurrent registrations for the same
//! username collapse to one winner.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{LoginInfo, UserAccount};
use crate::errors::{StoreError, StoreResult};

use super::entities::{account, login_info, role};
use super::UserStore;

#[derive(Default)]
struct Staged {
    accounts: Vec<UserAccount>,
    login_infos: Vec<(Uuid, LoginInfo)>,
}

/// Database-backed implementation of `UserStore`.
pub struct DbUserStore {
    db: DatabaseConnection,
    staged: Mutex<Staged>,
}

impl DbUserStore {
    /// Create new store instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            staged: Mutex::new(Staged::default()),
        }
    }

    async fn load(&self, model: account::Model) -> StoreResult<UserAccount> {
        let login_infos = login_info::Entity::find()
            .filter(login_info::Column::AccountId.eq(model.id))
            .all(&self.db)
            .await
            .map_err(StoreError::from)?
            .into_iter()
            .map(LoginInfo::from)
            .collect();

        Ok(model.into_account(login_infos))
    }

    async fn flush_account(
        txn: &DatabaseTransaction,
        account: &UserAccount,
    ) -> StoreResult<()> {
        let existing = account::Entity::find_by_id(account.id)
            .one(txn)
            .await
            .map_err(StoreError::from)?;

        match existing {
            Some(model) => {
                let mut active: account::ActiveModel = model.into();
                active.username = Set(account.username.clone());
                active.email = Set(account.email.clone());
                active.password_hash = Set(account.password_hash.clone());
                active.active = Set(account.active);
                active.role = Set(account.role.clone());
                active.must_change_password = Set(account.must_change_password);
                active.updated_at = Set(chrono::Utc::now());
                active.update(txn).await.map_err(StoreError::from)?;
            }
            None => {
                account::ActiveModel {
                    id: Set(account.id),
                    username: Set(account.username.clone()),
                    email: Set(account.email.clone()),
                    password_hash: Set(account.password_hash.clone()),
                    active: Set(account.active),
                    role: Set(account.role.clone()),
                    must_change_password: Set(account.must_change_password),
                    created_at: Set(account.created_at),
                    updated_at: Set(chrono::Utc::now()),
                }
                .insert(txn)
                .await
                .map_err(StoreError::from)?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl UserStore for DbUserStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        let found = account::Entity::find()
            .filter(account::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(StoreError::from)?;

        match found {
            Some(model) => Ok(Some(self.load(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let found = account::Entity::find()
            .filter(account::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(StoreError::from)?;

        match found {
            Some(model) => Ok(Some(self.load(model).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self) -> StoreResult<UserAccount> {
        Ok(UserAccount::new(Uuid::new_v4()))
    }

    async fn save(&self, account: &UserAccount) -> StoreResult<()> {
        let mut staged = self.staged.lock().await;
        match staged
            .accounts
            .iter_mut()
            .find(|entry| entry.id == account.id)
        {
            Some(existing) => *existing = account.clone(),
            None => staged.accounts.push(account.clone()),
        }
        Ok(())
    }

    async fn assign_role(&self, account: &mut UserAccount, role_name: &str) -> StoreResult<bool> {
        let found = role::Entity::find()
            .filter(role::Column::Name.eq(role_name))
            .one(&self.db)
            .await
            .map_err(StoreError::from)?;

        match found {
            Some(model) => {
                account.role = Some(model.name);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_login_info(
        &self,
        account: &UserAccount,
        provider: &str,
        provider_user_key: &str,
    ) -> StoreResult<LoginInfo> {
        let durable = account::Entity::find_by_id(account.id)
            .one(&self.db)
            .await
            .map_err(StoreError::from)?;
        if durable.is_none() {
            return Err(StoreError::NotPersisted(account.id));
        }

        let info = LoginInfo {
            provider: provider.to_string(),
            provider_user_key: provider_user_key.to_string(),
        };
        self.staged
            .lock()
            .await
            .login_infos
            .push((account.id, info.clone()));
        Ok(info)
    }

    async fn commit(&self) -> StoreResult<()> {
        let (accounts, login_infos) = {
            let staged = self.staged.lock().await;
            (staged.accounts.clone(), staged.login_infos.clone())
        };
        if accounts.is_empty() && login_infos.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await.map_err(StoreError::from)?;

        for account in &accounts {
            Self::flush_account(&txn, account).await?;
        }
        for (account_id, info) in &login_infos {
            login_info::ActiveModel {
                id: Set(Uuid::new_v4()),
                account_id: Set(*account_id),
                provider: Set(info.provider.clone()),
                provider_user_key: Set(info.provider_user_key.clone()),
                created_at: Set(chrono::Utc::now()),
            }
            .insert(&txn)
            .await
            .map_err(StoreError::from)?;
        }

        txn.commit().await.map_err(StoreError::from)?;

        // durable now; drop the staged work
        let mut staged = self.staged.lock().await;
        staged.accounts.clear();
        staged.login_infos.clear();
        Ok(())
    }
}
