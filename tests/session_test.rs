//! Session controller state machine tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use signup_flow::config::{Config, SmtpSettings};
use signup_flow::errors::{FlowError, FlowResult, StoreError};
use signup_flow::infra::{CredentialVault, MemoryStore, MockNotifier, UserStore};
use signup_flow::services::{
    AccountManager, Disposition, FlowKind, FlowParameters, LogonHandoff, MockAccountService,
    MockLogonHandoff, Outcome, SessionAction, SessionController, SessionState,
};

fn controller_with(engine: MockAccountService, logon: MockLogonHandoff) -> SessionController {
    SessionController::new(Arc::new(engine), Arc::new(logon))
}

fn fill_register(
    controller: &mut SessionController,
    username: &str,
    email: &str,
    password: &str,
) {
    let params = controller
        .parameters_mut()
        .and_then(FlowParameters::as_register_mut)
        .expect("register parameters must be open");
    params.username = username.to_string();
    params.email = email.to_string();
    params.password = password.to_string();
}

fn fill_restore(controller: &mut SessionController, email: &str) {
    let params = controller
        .parameters_mut()
        .and_then(FlowParameters::as_restore_password_mut)
        .expect("restore parameters must be open");
    params.email = email.to_string();
}

// =============================================================================
// Opening and cancelling
// =============================================================================

#[tokio::test]
async fn test_open_session_creates_matching_parameters() {
    let mut controller = controller_with(MockAccountService::new(), MockLogonHandoff::new());

    controller.open_session(FlowKind::Register).unwrap();
    assert_eq!(controller.state(), SessionState::ParametersOpen);
    assert!(controller.parameters().unwrap().as_register().is_some());
}

#[tokio::test]
async fn test_only_one_session_at_a_time() {
    let mut controller = controller_with(MockAccountService::new(), MockLogonHandoff::new());

    controller.open_session(FlowKind::Register).unwrap();
    let err = controller.open_session(FlowKind::RestorePassword).unwrap_err();
    assert!(matches!(err, FlowError::SessionBusy));
}

#[tokio::test]
async fn test_cancel_discards_parameters_without_engine_call() {
    // no engine expectations: an engine call would panic the mock
    let mut controller = controller_with(MockAccountService::new(), MockLogonHandoff::new());

    controller.open_session(FlowKind::Register).unwrap();
    fill_register(&mut controller, "alice", "alice@example.com", "SecurePass123!");
    controller.cancel().unwrap();

    assert_eq!(controller.state(), SessionState::Closed);
    assert!(controller.parameters().is_none());
}

#[tokio::test]
async fn test_closed_session_allows_a_fresh_one() {
    let mut controller = controller_with(MockAccountService::new(), MockLogonHandoff::new());

    controller.open_session(FlowKind::Register).unwrap();
    controller.cancel().unwrap();
    controller.open_session(FlowKind::RestorePassword).unwrap();

    assert_eq!(controller.state(), SessionState::ParametersOpen);
    assert!(controller
        .parameters()
        .unwrap()
        .as_restore_password()
        .is_some());
}

// =============================================================================
// Validation gating
// =============================================================================

#[tokio::test]
async fn test_accept_with_invalid_email_aborts_without_engine_call() {
    let mut controller = controller_with(MockAccountService::new(), MockLogonHandoff::new());

    controller.open_session(FlowKind::Register).unwrap();
    fill_register(&mut controller, "alice", "not-an-email", "SecurePass123!");

    let err = controller.accept().await.unwrap_err();
    assert!(matches!(err, FlowError::Validation(_)));
    assert_eq!(controller.state(), SessionState::ParametersOpen);
}

#[tokio::test]
async fn test_accept_with_short_password_aborts() {
    let mut controller = controller_with(MockAccountService::new(), MockLogonHandoff::new());

    controller.open_session(FlowKind::Register).unwrap();
    fill_register(&mut controller, "alice", "alice@example.com", "Pw1!");

    let err = controller.accept().await.unwrap_err();
    let FlowError::Validation(report) = err else {
        panic!("expected a validation error");
    };
    assert!(report.violations().iter().any(|v| v.field == "password"));
    assert_eq!(controller.state(), SessionState::ParametersOpen);
}

// =============================================================================
// Register dispositions
// =============================================================================

#[tokio::test]
async fn test_register_created_hands_credentials_to_logon_and_closes() {
    let mut engine = MockAccountService::new();
    engine
        .expect_register()
        .times(1)
        .withf(|u, e, p| u == "alice" && e == "alice@example.com" && p == "SecurePass123!")
        .returning(|_, _, _| Ok(Outcome::Created));

    let mut logon = MockLogonHandoff::new();
    logon
        .expect_logon()
        .times(1)
        .withf(|u, p| u == "alice" && p == "SecurePass123!")
        .returning(|_, _| Ok(()));

    let mut controller = controller_with(engine, logon);
    controller.open_session(FlowKind::Register).unwrap();
    fill_register(&mut controller, "alice", "alice@example.com", "SecurePass123!");

    let disposition = controller.accept().await.unwrap();
    assert_eq!(disposition, Disposition::AutoLogon);
    assert_eq!(controller.state(), SessionState::Closed);
    assert!(controller.parameters().is_none());
}

#[tokio::test]
async fn test_register_already_exists_routes_to_message_view() {
    let mut engine = MockAccountService::new();
    engine
        .expect_register()
        .returning(|_, _, _| Ok(Outcome::AlreadyExists));
    // no logon expectation: a handoff would panic the mock

    let mut controller = controller_with(engine, MockLogonHandoff::new());
    controller.open_session(FlowKind::Register).unwrap();
    fill_register(&mut controller, "alice", "alice@example.com", "SecurePass123!");

    let disposition = controller.accept().await.unwrap();
    assert_eq!(disposition, Disposition::MessageShown);
    assert_eq!(controller.state(), SessionState::MessageShown);
    assert_eq!(
        controller.message(),
        Some("The login with the entered UserName or Email was already registered within the system")
    );
    let params = controller.parameters().unwrap().as_register().unwrap();
    assert!(params.user_already_exists);
}

#[tokio::test]
async fn test_accepting_the_message_view_closes_the_session() {
    let mut engine = MockAccountService::new();
    engine
        .expect_register()
        .returning(|_, _, _| Ok(Outcome::AlreadyExists));

    let mut controller = controller_with(engine, MockLogonHandoff::new());
    controller.open_session(FlowKind::Register).unwrap();
    fill_register(&mut controller, "alice", "alice@example.com", "SecurePass123!");
    controller.accept().await.unwrap();

    let disposition = controller.accept().await.unwrap();
    assert_eq!(disposition, Disposition::Closed);
    assert_eq!(controller.state(), SessionState::Closed);
    assert!(controller.message().is_none());
}

#[tokio::test]
async fn test_failed_auto_logon_still_closes_the_session() {
    let mut engine = MockAccountService::new();
    engine
        .expect_register()
        .returning(|_, _, _| Ok(Outcome::Created));

    let mut logon = MockLogonHandoff::new();
    logon
        .expect_logon()
        .returning(|_, _| Err(FlowError::invalid_argument("logon rejected")));

    let mut controller = controller_with(engine, logon);
    controller.open_session(FlowKind::Register).unwrap();
    fill_register(&mut controller, "alice", "alice@example.com", "SecurePass123!");

    let disposition = controller.accept().await.unwrap();
    assert_eq!(disposition, Disposition::AutoLogon);
    assert_eq!(controller.state(), SessionState::Closed);
}

// =============================================================================
// Restore dispositions
// =============================================================================

#[tokio::test]
async fn test_restore_not_found_routes_to_message_view() {
    let mut engine = MockAccountService::new();
    engine
        .expect_restore_password()
        .withf(|email| email == "nouser@example.com")
        .returning(|_| Ok(Outcome::NotFound));

    let mut controller = controller_with(engine, MockLogonHandoff::new());
    controller.open_session(FlowKind::RestorePassword).unwrap();
    fill_restore(&mut controller, "nouser@example.com");

    let disposition = controller.accept().await.unwrap();
    assert_eq!(disposition, Disposition::MessageShown);
    assert_eq!(
        controller.message(),
        Some("Cannot find registered user by the provided email address!")
    );
    let params = controller
        .parameters()
        .unwrap()
        .as_restore_password()
        .unwrap();
    assert!(params.user_not_found);
}

#[tokio::test]
async fn test_restore_reset_closes_the_session() {
    let mut engine = MockAccountService::new();
    engine
        .expect_restore_password()
        .returning(|_| Ok(Outcome::PasswordReset));

    let mut controller = controller_with(engine, MockLogonHandoff::new());
    controller.open_session(FlowKind::RestorePassword).unwrap();
    fill_restore(&mut controller, "alice@example.com");

    let disposition = controller.accept().await.unwrap();
    assert_eq!(disposition, Disposition::Closed);
    assert_eq!(controller.state(), SessionState::Closed);
}

// =============================================================================
// Engine failures
// =============================================================================

#[tokio::test]
async fn test_engine_error_returns_to_the_parameter_screen() {
    let mut engine = MockAccountService::new();
    engine.expect_register().returning(|_, _, _| {
        Err(FlowError::Store(StoreError::backend("connection reset")))
    });

    let mut controller = controller_with(engine, MockLogonHandoff::new());
    controller.open_session(FlowKind::Register).unwrap();
    fill_register(&mut controller, "alice", "alice@example.com", "SecurePass123!");

    let err = controller.accept().await.unwrap_err();
    assert!(matches!(err, FlowError::Store(_)));
    assert_eq!(controller.state(), SessionState::ParametersOpen);
}

// =============================================================================
// Action visibility
// =============================================================================

#[tokio::test]
async fn test_action_visibility_follows_session_state() {
    let mut engine = MockAccountService::new();
    engine
        .expect_register()
        .returning(|_, _, _| Ok(Outcome::AlreadyExists));

    let mut controller = controller_with(engine, MockLogonHandoff::new());

    assert_eq!(
        controller.available_actions(false),
        vec![SessionAction::RegisterUser, SessionAction::RestorePassword]
    );

    controller.open_session(FlowKind::Register).unwrap();
    assert_eq!(
        controller.available_actions(false),
        vec![
            SessionAction::AcceptParameters,
            SessionAction::CancelParameters
        ]
    );

    fill_register(&mut controller, "alice", "alice@example.com", "SecurePass123!");
    controller.accept().await.unwrap();
    assert_eq!(
        controller.available_actions(false),
        vec![SessionAction::AcceptParameters]
    );
}

#[tokio::test]
async fn test_no_actions_for_authenticated_callers() {
    let mut controller = controller_with(MockAccountService::new(), MockLogonHandoff::new());
    assert!(controller.available_actions(true).is_empty());

    controller.open_session(FlowKind::Register).unwrap();
    assert!(controller.available_actions(true).is_empty());
}

// =============================================================================
// Full stack over the in-memory store
// =============================================================================

/// Records the credentials handed over for automatic logon.
#[derive(Default)]
struct RecordingLogon {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl LogonHandoff for RecordingLogon {
    async fn logon(&self, username: &str, password: &str) -> FlowResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((username.to_string(), password.to_string()));
        Ok(())
    }
}

fn full_stack_controller(
    store: Arc<MemoryStore>,
    logon: Arc<RecordingLogon>,
) -> SessionController {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_send_registration_email()
        .returning(|_| Ok(()));
    notifier
        .expect_send_password_reset_email()
        .returning(|_, _, _| Ok(()));

    let config = Config {
        database_url: "postgres://localhost/unused".to_string(),
        notify_timeout_secs: 1,
        smtp: SmtpSettings {
            host: None,
            port: 587,
            username: None,
            password: None,
            from: "noreply@example.com".to_string(),
        },
    };

    let engine = AccountManager::new(
        store,
        Arc::new(CredentialVault::new()),
        Arc::new(notifier),
        config,
    );
    SessionController::new(Arc::new(engine), logon)
}

#[tokio::test]
async fn test_full_registration_session() {
    let store = Arc::new(MemoryStore::with_roles(["Default"]));
    let logon = Arc::new(RecordingLogon::default());
    let mut controller = full_stack_controller(store.clone(), logon.clone());

    controller.open_session(FlowKind::Register).unwrap();
    fill_register(&mut controller, "alice", "alice@example.com", "SecurePass123!");

    let disposition = controller.accept().await.unwrap();
    assert_eq!(disposition, Disposition::AutoLogon);

    let account = store.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(account.login_infos.len(), 1);
    assert_eq!(
        *logon.calls.lock().unwrap(),
        vec![("alice".to_string(), "SecurePass123!".to_string())]
    );

    // repeating the registration in a new session shows the message view
    controller.open_session(FlowKind::Register).unwrap();
    fill_register(&mut controller, "alice", "alice2@example.com", "SecurePass123!");
    let disposition = controller.accept().await.unwrap();
    assert_eq!(disposition, Disposition::MessageShown);
    assert_eq!(store.account_count().await, 1);
}
