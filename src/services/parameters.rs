//! Flow parameter capture objects.
//!
//! Short-lived input holders for the logon-screen flows. A parameters value
//! is created when a session opens and discarded when it closes. The
//! outcome flags are set by the session controller after the engine runs
//! and are read back by the presentation layer.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{validate_in_context, ValidationReport, EMAIL_RE};

/// The two self-service flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Register,
    RestorePassword,
}

/// Input for the registration flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterParameters {
    #[validate(length(min = 1, message = "UserName is required"))]
    pub username: String,
    #[validate(
        length(min = 1, message = "Email is required"),
        regex(path = *EMAIL_RE, message = "Must be a valid Email")
    )]
    pub email: String,
    #[serde(skip_serializing)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Set by the controller when registration found an existing login
    #[serde(default)]
    pub user_already_exists: bool,
}

/// Input for the password restore flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RestorePasswordParameters {
    #[validate(
        length(min = 1, message = "Email is required"),
        regex(path = *EMAIL_RE, message = "Must be a valid Email")
    )]
    pub email: String,
    /// Set by the controller when no account matched the email
    #[serde(default)]
    pub user_not_found: bool,
}

/// Parameters of the currently open flow, dispatched by pattern match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FlowParameters {
    Register(RegisterParameters),
    RestorePassword(RestorePasswordParameters),
}

impl FlowParameters {
    /// Fresh, empty parameters for a flow.
    pub fn for_kind(kind: FlowKind) -> Self {
        match kind {
            FlowKind::Register => FlowParameters::Register(RegisterParameters::default()),
            FlowKind::RestorePassword => {
                FlowParameters::RestorePassword(RestorePasswordParameters::default())
            }
        }
    }

    pub fn kind(&self) -> FlowKind {
        match self {
            FlowParameters::Register(_) => FlowKind::Register,
            FlowParameters::RestorePassword(_) => FlowKind::RestorePassword,
        }
    }

    /// Evaluate the flow's field rules under a named context.
    pub fn validate_in(&self, context: &str) -> ValidationReport {
        match self {
            FlowParameters::Register(p) => validate_in_context(context, p),
            FlowParameters::RestorePassword(p) => validate_in_context(context, p),
        }
    }

    pub fn as_register(&self) -> Option<&RegisterParameters> {
        match self {
            FlowParameters::Register(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_register_mut(&mut self) -> Option<&mut RegisterParameters> {
        match self {
            FlowParameters::Register(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_restore_password(&self) -> Option<&RestorePasswordParameters> {
        match self {
            FlowParameters::RestorePassword(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_restore_password_mut(&mut self) -> Option<&mut RestorePasswordParameters> {
        match self {
            FlowParameters::RestorePassword(p) => Some(p),
            _ => None,
        }
    }
}
