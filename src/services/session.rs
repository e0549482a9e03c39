//! Logon-screen action session controller.
//!
//! Drives the two-phase collect/validate/commit interaction: a session is
//! opened for a flow kind, the presentation layer fills the parameters, and
//! accept either closes the session, hands credentials to the logon
//! collaborator, or routes to a message view.
//!
//! State machine: `Idle → ParametersOpen → Committing → { Closed | MessageShown }`.
//! `Closed` is terminal; a new session must be opened for the next flow.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{MSG_ALREADY_REGISTERED, MSG_USER_NOT_FOUND, REGISTER_USER_CONTEXT};
use crate::errors::{FlowError, FlowResult};

use super::engine::{AccountService, Outcome};
use super::parameters::{FlowKind, FlowParameters};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Session-establishment collaborator invoked after a successful
/// registration hands the fresh credentials over for an automatic logon.
/// Injected explicitly at construction; the controller holds no
/// process-wide state.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait LogonHandoff: Send + Sync {
    async fn logon(&self, username: &str, password: &str) -> FlowResult<()>;
}

/// Lifecycle of one parameter-collection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ParametersOpen,
    Committing,
    MessageShown,
    Closed,
}

/// How an accepted session was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The session closed without further action.
    Closed,
    /// Registration succeeded and the credentials were handed to the
    /// logon collaborator.
    AutoLogon,
    /// A message view replaced the parameter screen; the session stays
    /// open until the message is dismissed.
    MessageShown,
}

/// Named actions exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    RegisterUser,
    RestorePassword,
    AcceptParameters,
    CancelParameters,
}

/// Orchestrates one interactive account-flow session at a time.
pub struct SessionController {
    engine: Arc<dyn AccountService>,
    logon: Arc<dyn LogonHandoff>,
    state: SessionState,
    params: Option<FlowParameters>,
    message: Option<&'static str>,
}

impl SessionController {
    pub fn new(engine: Arc<dyn AccountService>, logon: Arc<dyn LogonHandoff>) -> Self {
        Self {
            engine,
            logon,
            state: SessionState::Idle,
            params: None,
            message: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The message presented by the message view, while one is shown.
    pub fn message(&self) -> Option<&str> {
        self.message
    }

    /// Parameters of the open session, also readable on the message view
    /// so the outcome flags can be inspected.
    pub fn parameters(&self) -> Option<&FlowParameters> {
        self.params.as_ref()
    }

    /// Mutable access for the presentation layer to fill in fields;
    /// only available while the parameter screen is open.
    pub fn parameters_mut(&mut self) -> Option<&mut FlowParameters> {
        if self.state == SessionState::ParametersOpen {
            self.params.as_mut()
        } else {
            None
        }
    }

    /// Open a parameter-collection session for a flow.
    pub fn open_session(&mut self, kind: FlowKind) -> FlowResult<()> {
        match self.state {
            SessionState::Idle | SessionState::Closed => {
                self.params = Some(FlowParameters::for_kind(kind));
                self.message = None;
                self.state = SessionState::ParametersOpen;
                Ok(())
            }
            _ => Err(FlowError::SessionBusy),
        }
    }

    /// Validate the collected parameters and run the matching workflow.
    ///
    /// Any rule violation aborts the transition and leaves the session on
    /// the parameter screen; the returned report carries the per-field
    /// details for inline rendering. On the message view, accept dismisses
    /// the message and closes the session.
    pub async fn accept(&mut self) -> FlowResult<Disposition> {
        if self.state == SessionState::MessageShown {
            self.close();
            return Ok(Disposition::Closed);
        }
        if self.state != SessionState::ParametersOpen {
            return Err(FlowError::NoOpenSession);
        }
        let Some(params) = self.params.clone() else {
            return Err(FlowError::NoOpenSession);
        };

        let report = params.validate_in(REGISTER_USER_CONTEXT);
        if !report.is_valid() {
            return Err(FlowError::Validation(report));
        }

        self.state = SessionState::Committing;
        let result = match &params {
            FlowParameters::Register(p) => {
                self.engine.register(&p.username, &p.email, &p.password).await
            }
            FlowParameters::RestorePassword(p) => self.engine.restore_password(&p.email).await,
        };
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                // back to the parameter screen so the user can correct or retry
                self.state = SessionState::ParametersOpen;
                return Err(err);
            }
        };

        match outcome {
            Outcome::AlreadyExists => {
                if let Some(p) = self.params.as_mut().and_then(FlowParameters::as_register_mut) {
                    p.user_already_exists = true;
                }
                self.show_message(MSG_ALREADY_REGISTERED);
                Ok(Disposition::MessageShown)
            }
            Outcome::Created => {
                if let FlowParameters::Register(p) = &params {
                    if let Err(err) = self.logon.logon(&p.username, &p.password).await {
                        // the account exists; the user can still log on manually
                        tracing::warn!(error = %err, "auto-logon after registration failed");
                    }
                }
                self.close();
                Ok(Disposition::AutoLogon)
            }
            Outcome::NotFound => {
                if let Some(p) = self
                    .params
                    .as_mut()
                    .and_then(FlowParameters::as_restore_password_mut)
                {
                    p.user_not_found = true;
                }
                self.show_message(MSG_USER_NOT_FOUND);
                Ok(Disposition::MessageShown)
            }
            Outcome::PasswordReset => {
                self.close();
                Ok(Disposition::Closed)
            }
        }
    }

    /// Discard the open parameters without running the workflow.
    pub fn cancel(&mut self) -> FlowResult<()> {
        if self.state != SessionState::ParametersOpen {
            return Err(FlowError::NoOpenSession);
        }
        self.close();
        Ok(())
    }

    /// Actions currently visible to the presentation layer. All of them
    /// are hidden once the caller is authenticated.
    pub fn available_actions(&self, authenticated: bool) -> Vec<SessionAction> {
        if authenticated {
            return Vec::new();
        }
        match self.state {
            SessionState::Idle | SessionState::Closed => vec![
                SessionAction::RegisterUser,
                SessionAction::RestorePassword,
            ],
            SessionState::ParametersOpen => vec![
                SessionAction::AcceptParameters,
                SessionAction::CancelParameters,
            ],
            // the message view offers only its accept button
            SessionState::MessageShown => vec![SessionAction::AcceptParameters],
            SessionState::Committing => Vec::new(),
        }
    }

    fn show_message(&mut self, message: &'static str) {
        self.message = Some(message);
        self.state = SessionState::MessageShown;
    }

    fn close(&mut self) {
        self.params = None;
        self.message = None;
        self.state = SessionState::Closed;
    }
}
