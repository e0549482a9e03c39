//! Account domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::EMAIL_RE;

/// A user account as held by the user store.
///
/// Usernames and email addresses are unique across all accounts; the store
/// enforces both at commit time. The credential is an opaque hash written
/// only through the password service. Accounts are created by registration,
/// mutated by password restore, and never deleted by these flows.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserAccount {
    pub id: Uuid,
    #[validate(length(min = 1, message = "UserName is required"))]
    pub username: String,
    #[validate(
        length(min = 1, message = "Email is required"),
        regex(path = *EMAIL_RE, message = "Must be a valid Email")
    )]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub active: bool,
    /// Name of the assigned role, if any
    pub role: Option<String>,
    /// Forces a password change on the next logon (set by password restore)
    pub must_change_password: bool,
    pub login_infos: Vec<LoginInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Association between an account and an authentication provider key.
///
/// Exactly one record is created per locally registered account, with the
/// account's persisted identifier as the provider user key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInfo {
    pub provider: String,
    pub provider_user_key: String,
}

impl UserAccount {
    /// Create a blank, inactive account with the given identifier.
    /// Field values are filled in by the registration flow before saving.
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: String::new(),
            email: String::new(),
            password_hash: String::new(),
            active: false,
            role: None,
            must_change_password: false,
            login_infos: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a login-info record exists for the given provider.
    pub fn has_login_info(&self, provider: &str) -> bool {
        self.login_infos.iter().any(|li| li.provider == provider)
    }
}
