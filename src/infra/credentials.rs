//! Password service collaborator.
//!
//! The engine never touches the stored hash directly; credential writes go
//! through this trait.

use crate::domain::{Password, UserAccount};
use crate::errors::FlowResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Credential operations on an account.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait PasswordService: Send + Sync {
    /// Hash the plaintext and store it as the account's credential.
    fn set_password(&self, account: &mut UserAccount, plain_text: &str) -> FlowResult<()>;

    /// Require a password change on the account's next logon.
    fn force_change_on_next_logon(&self, account: &mut UserAccount);
}

/// Argon2-backed implementation of `PasswordService`.
#[derive(Default)]
pub struct CredentialVault;

impl CredentialVault {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordService for CredentialVault {
    fn set_password(&self, account: &mut UserAccount, plain_text: &str) -> FlowResult<()> {
        account.password_hash = Password::new(plain_text)?.into_string();
        Ok(())
    }

    fn force_change_on_next_logon(&self, account: &mut UserAccount) {
        account.must_change_password = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_set_password_stores_verifiable_hash() {
        let vault = CredentialVault::new();
        let mut account = UserAccount::new(Uuid::new_v4());

        vault.set_password(&mut account, "SecurePass123!").unwrap();

        let stored = Password::from_hash(account.password_hash.clone());
        assert!(stored.verify("SecurePass123!"));
        assert!(!stored.verify("other"));
    }

    #[test]
    fn test_force_change_sets_flag() {
        let vault = CredentialVault::new();
        let mut account = UserAccount::new(Uuid::new_v4());
        assert!(!account.must_change_password);

        vault.force_change_on_next_logon(&mut account);
        assert!(account.must_change_password);
    }
}
