//! Application services layer - Use cases and business logic.
//!
//! The workflow engine executes the account flows against the store and
//! notifier collaborators; the session controller wraps them in the
//! two-phase collect/validate/commit interaction the presentation layer
//! drives. Both depend on abstractions (traits) for dependency inversion.

mod engine;
mod parameters;
mod session;

pub use engine::{AccountManager, AccountService, Outcome};
pub use parameters::{
    FlowKind, FlowParameters, RegisterParameters, RestorePasswordParameters,
};
pub use session::{
    Disposition, LogonHandoff, SessionAction, SessionController, SessionState,
};

#[cfg(any(test, feature = "test-utils"))]
pub use engine::MockAccountService;
#[cfg(any(test, feature = "test-utils"))]
pub use session::MockLogonHandoff;
