//! Integration tests for the session controller and the full handshake
//! flow, against a scripted provider client and a recording host.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use authsync::prelude::*;
use authsync::{AuthsyncError, PersistedSession, SessionError};
use tokio::sync::watch;

// =========================================================================
// Mock provider client and host
// =========================================================================

type Payload = Result<Option<DecodedHash>, ProviderError>;

/// Answers each provider call from a queue the test fills in advance.
///
/// Empty queues fall back to what a real provider does for a visitor with
/// no session: `check_session` fails with `login_required`, `parse_hash`
/// finds nothing, `user_info` fails.
#[derive(Default)]
struct ScriptedClient {
    check_session: Mutex<VecDeque<Payload>>,
    parse_hash: Mutex<VecDeque<Payload>>,
    user_info: Mutex<VecDeque<Result<UserProfile, ProviderError>>>,

    options: Mutex<Option<ClientOptions>>,
    authorize_calls: AtomicUsize,
    parse_hash_calls: AtomicUsize,
    logouts: Mutex<Vec<LogoutOptions>>,
    tokens_seen: Mutex<Vec<String>>,

    /// When set, `user_info` samples `is_authenticating` mid-flight.
    observer: Mutex<Option<watch::Receiver<SessionState>>>,
    authenticating_during_fetch: Mutex<Vec<bool>>,
}

impl ScriptedClient {
    fn on_check_session(&self, result: Payload) {
        self.check_session.lock().unwrap().push_back(result);
    }

    fn on_parse_hash(&self, result: Payload) {
        self.parse_hash.lock().unwrap().push_back(result);
    }

    fn on_user_info(&self, result: Result<UserProfile, ProviderError>) {
        self.user_info.lock().unwrap().push_back(result);
    }
}

impl IdentityClient for ScriptedClient {
    async fn check_session(&self, _options: &CheckSessionOptions) -> Payload {
        self.check_session
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::with_code("login_required")))
    }

    fn authorize(&self) {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn parse_hash(&self) -> Payload {
        self.parse_hash_calls.fetch_add(1, Ordering::SeqCst);
        self.parse_hash.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }

    fn logout(&self, options: &LogoutOptions) {
        self.logouts.lock().unwrap().push(options.clone());
    }

    async fn user_info(
        &self,
        access_token: &str,
    ) -> Result<UserProfile, ProviderError> {
        self.tokens_seen.lock().unwrap().push(access_token.to_string());
        if let Some(rx) = self.observer.lock().unwrap().as_ref() {
            let flag = rx.borrow().is_authenticating;
            self.authenticating_during_fetch.lock().unwrap().push(flag);
        }
        self.user_info
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::with_status(500)))
    }
}

/// Records every navigation request.
struct RecordingHost {
    origin: Option<String>,
    routes: Mutex<Vec<String>>,
}

impl RecordingHost {
    fn browser() -> Self {
        Self {
            origin: Some("https://app.example.org".into()),
            routes: Mutex::new(Vec::new()),
        }
    }

    fn server_render() -> Self {
        Self {
            origin: None,
            routes: Mutex::new(Vec::new()),
        }
    }

    fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Host for RecordingHost {
    fn origin(&self) -> Option<String> {
        self.origin.clone()
    }

    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

/// A store that reads the published state from inside each write.
#[derive(Default)]
struct ObservingStorage {
    inner: MemoryStorage,
    observer: Mutex<Option<watch::Receiver<SessionState>>>,
    users_seen_on_write: Mutex<Vec<Option<String>>>,
}

impl SessionStorage for ObservingStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        if let Some(rx) = self.observer.lock().unwrap().as_ref() {
            let user = rx.borrow().user_id().map(str::to_string);
            self.users_seen_on_write.lock().unwrap().push(user);
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        self.inner.remove_item(key)
    }
}

// =========================================================================
// Helpers
// =========================================================================

type TestController =
    SessionController<Arc<ScriptedClient>, Arc<RecordingHost>, Arc<MemoryStorage>>;

struct Harness {
    client: Arc<ScriptedClient>,
    host: Arc<RecordingHost>,
    storage: Arc<MemoryStorage>,
}

impl Harness {
    fn new(host: RecordingHost) -> Self {
        Self {
            client: Arc::new(ScriptedClient::default()),
            host: Arc::new(host),
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    fn config() -> AuthConfig {
        AuthConfig::new("tenant.example.com", "client-123")
    }

    fn build(&self) -> TestController {
        let client = Arc::clone(&self.client);
        SessionController::builder(Self::config())
            .storage(Arc::clone(&self.storage))
            .build(Arc::clone(&self.host), |options| {
                *client.options.lock().unwrap() = Some(options);
                Arc::clone(&client)
            })
            .expect("controller should build")
    }

    async fn mount(&self) -> TestController {
        let client = Arc::clone(&self.client);
        SessionController::builder(Self::config())
            .storage(Arc::clone(&self.storage))
            .mount(Arc::clone(&self.host), |_| client)
            .await
            .expect("controller should mount")
    }
}

fn tokens(expires_in: Option<u64>) -> DecodedHash {
    DecodedHash {
        access_token: Some("access-abc".into()),
        id_token: Some("id-abc".into()),
        expires_in,
        token_type: Some("Bearer".into()),
        ..DecodedHash::default()
    }
}

// =========================================================================
// Mount → silent check
// =========================================================================

#[tokio::test]
async fn test_mount_silent_check_with_tokens_logs_in() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_check_session(Ok(Some(tokens(Some(3600)))));
    h.client.on_user_info(Ok(UserProfile::new("abc")));

    let controller = h.mount().await;

    assert!(!controller.is_authenticating());
    assert!(controller.is_authenticated());
    assert_eq!(controller.user().map(|u| u.sub), Some("abc".to_string()));
    assert_eq!(controller.user_id().as_deref(), Some("abc"));
    assert_eq!(controller.error_type(), None);
    assert_eq!(controller.auth_result(), Some(tokens(Some(3600))));
    // The profile was fetched with the payload's access token.
    assert_eq!(*h.client.tokens_seen.lock().unwrap(), vec!["access-abc"]);
    // A silent restore doesn't navigate.
    assert!(h.host.routes().is_empty());
}

#[tokio::test]
async fn test_mount_silent_check_error_records_check_session() {
    let h = Harness::new(RecordingHost::browser());
    h.client
        .on_check_session(Err(ProviderError::with_code("login_required")));

    let controller = h.mount().await;

    assert_eq!(controller.error_type(), Some(ErrorType::CheckSession));
    assert_eq!(
        controller.error(),
        Some(ProviderError::with_code("login_required"))
    );
    assert!(controller.user().is_none());
    assert!(!controller.is_authenticated());
    // The in-flight flag is paired even on the error path.
    assert!(!controller.is_authenticating());
}

#[tokio::test]
async fn test_restore_session_without_tokens_is_incomplete() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_check_session(Ok(Some(DecodedHash {
        access_token: Some("access-only".into()),
        ..DecodedHash::default()
    })));
    let controller = h.build();

    let outcome = controller.restore_session().await;

    assert_eq!(outcome, HandshakeOutcome::Incomplete);
    assert_eq!(controller.state(), SessionState::default());
    assert!(h.client.tokens_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_restore_session_profile_failure_records_user_info() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_check_session(Ok(Some(tokens(Some(3600)))));
    h.client.on_user_info(Err(ProviderError::with_status(401)));
    let controller = h.build();

    let outcome = controller.restore_session().await;

    assert_eq!(outcome, HandshakeOutcome::Failed(ErrorType::UserInfo));
    assert_eq!(controller.error_type(), Some(ErrorType::UserInfo));
    assert!(!controller.is_authenticating());
}

// =========================================================================
// Login command
// =========================================================================

#[tokio::test]
async fn test_login_calls_authorize_without_state_change() {
    let h = Harness::new(RecordingHost::browser());
    let controller = h.build();
    let mut rx = controller.subscribe();

    controller.login();

    assert_eq!(h.client.authorize_calls.load(Ordering::SeqCst), 1);
    assert!(!rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), SessionState::default());
}

// =========================================================================
// Callback handling
// =========================================================================

#[tokio::test]
async fn test_callback_with_tokens_logs_in_and_navigates() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_parse_hash(Ok(Some(tokens(Some(60)))));
    h.client.on_user_info(Ok(UserProfile::new("abc")));
    let controller = h.build();

    let outcome = controller
        .handle_authentication(CallbackOptions::redirect_to("/dashboard"))
        .await;

    assert_eq!(outcome, HandshakeOutcome::Authenticated);
    assert!(outcome.is_authenticated());
    assert_eq!(controller.user_id().as_deref(), Some("abc"));
    assert!(!controller.is_authenticating());
    assert_eq!(h.host.routes(), vec!["/dashboard"]);
}

#[tokio::test]
async fn test_callback_profile_failure_records_user_info() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_parse_hash(Ok(Some(tokens(Some(60)))));
    h.client.on_user_info(Err(ProviderError::with_status(401)));
    let controller = h.build();

    let outcome = controller
        .handle_authentication(CallbackOptions::default())
        .await;

    assert_eq!(outcome, HandshakeOutcome::Failed(ErrorType::UserInfo));
    assert_eq!(controller.error_type(), Some(ErrorType::UserInfo));
    assert_eq!(controller.error(), Some(ProviderError::with_status(401)));
    assert!(controller.user().is_none());
    assert!(!controller.is_authenticating());
    // Navigation happens on failure too.
    assert_eq!(h.host.routes(), vec!["/"]);
}

#[tokio::test]
async fn test_callback_parse_error_records_auth_result() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_parse_hash(Err(ProviderError {
        error: Some("access_denied".into()),
        error_description: Some("User did not authorize the request".into()),
        ..ProviderError::default()
    }));
    let controller = h.build();

    let outcome = controller
        .handle_authentication(CallbackOptions::default())
        .await;

    assert_eq!(outcome, HandshakeOutcome::Failed(ErrorType::AuthResult));
    assert!(!outcome.is_authenticated());
    assert_eq!(controller.error_type(), Some(ErrorType::AuthResult));
    assert_eq!(
        controller.error().and_then(|e| e.error),
        Some("access_denied".to_string())
    );
    assert_eq!(h.host.routes(), vec!["/"]);
}

#[tokio::test]
async fn test_callback_without_payload_or_error_changes_nothing() {
    let h = Harness::new(RecordingHost::browser());
    let controller = h.build();

    let outcome = controller
        .handle_authentication(CallbackOptions::default())
        .await;

    assert_eq!(outcome, HandshakeOutcome::Incomplete);
    assert_eq!(controller.state(), SessionState::default());
    assert_eq!(h.host.routes(), vec!["/"]);
}

#[tokio::test]
async fn test_callback_without_browser_context_is_skipped() {
    let h = Harness::new(RecordingHost::server_render());
    h.client.on_parse_hash(Ok(Some(tokens(Some(60)))));
    let controller = h.build();

    let outcome = controller
        .handle_authentication(CallbackOptions::default())
        .await;

    assert_eq!(outcome, HandshakeOutcome::Skipped);
    assert_eq!(h.client.parse_hash_calls.load(Ordering::SeqCst), 0);
    assert!(h.host.routes().is_empty());
    assert_eq!(controller.state(), SessionState::default());
}

#[tokio::test]
async fn test_callback_is_authenticating_while_profile_fetch_in_flight() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_parse_hash(Ok(Some(tokens(Some(60)))));
    h.client.on_user_info(Ok(UserProfile::new("abc")));
    let controller = h.build();
    *h.client.observer.lock().unwrap() = Some(controller.subscribe());

    controller
        .handle_authentication(CallbackOptions::default())
        .await;

    assert_eq!(*h.client.authenticating_during_fetch.lock().unwrap(), vec![true]);
    assert!(!controller.is_authenticating());
}

// =========================================================================
// Logout command
// =========================================================================

#[tokio::test]
async fn test_logout_clears_session_storage_and_navigates_home() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_check_session(Ok(Some(tokens(Some(3600)))));
    h.client.on_user_info(Ok(UserProfile::new("abc")));
    let controller = h.mount().await;
    assert!(!controller.persisted().unwrap().is_empty());

    controller.logout();

    assert_eq!(
        *h.client.logouts.lock().unwrap(),
        vec![LogoutOptions {
            return_to: "https://app.example.org".into()
        }]
    );
    assert!(controller.user().is_none());
    assert!(controller.auth_result().is_none());
    assert!(!controller.is_authenticated());
    assert!(h.storage.is_empty());
    assert_eq!(h.host.routes(), vec!["/"]);
}

#[tokio::test]
async fn test_logout_without_browser_context_returns_to_fallback_origin() {
    let h = Harness::new(RecordingHost::server_render());
    let controller = h.build();

    controller.logout();

    assert_eq!(controller.callback_domain(), "http://localhost:8000");
    assert_eq!(
        h.client.logouts.lock().unwrap()[0].return_to,
        "http://localhost:8000"
    );
}

// =========================================================================
// Construction
// =========================================================================

#[tokio::test]
async fn test_build_derives_client_options_from_host_origin() {
    let h = Harness::new(RecordingHost::browser());

    let _controller = h.build();

    let options = h.client.options.lock().unwrap().clone().expect("options");
    assert_eq!(options.redirect_uri, "https://app.example.org/auth0_callback");
    assert_eq!(options.audience, "https://tenant.example.com/api/v2/");
    assert_eq!(options.client_id, "client-123");
}

#[tokio::test]
async fn test_build_with_empty_client_id_returns_error() {
    let result = SessionController::builder(AuthConfig::new("tenant.example.com", ""))
        .build(RecordingHost::browser(), |_| ScriptedClient::default());

    assert!(matches!(result, Err(AuthsyncError::Identity(_))));
}

#[tokio::test]
async fn test_build_does_not_contact_provider() {
    let h = Harness::new(RecordingHost::browser());

    let controller = h.build();

    assert!(h.client.tokens_seen.lock().unwrap().is_empty());
    assert_eq!(controller.state(), SessionState::default());
}

// =========================================================================
// Queries and subscription
// =========================================================================

#[tokio::test]
async fn test_subscriber_observes_login() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_check_session(Ok(Some(tokens(Some(3600)))));
    h.client.on_user_info(Ok(UserProfile::new("abc")));
    let controller = h.build();
    let mut rx = controller.subscribe();

    controller.restore_session().await;

    assert!(rx.has_changed().unwrap());
    let seen = rx.borrow_and_update().clone();
    assert_eq!(seen.user_id(), Some("abc"));
    assert!(!seen.is_authenticating);
}

#[tokio::test]
async fn test_is_authenticated_false_when_payload_has_no_expiry() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_check_session(Ok(Some(tokens(None))));
    h.client.on_user_info(Ok(UserProfile::new("abc")));

    let controller = h.mount().await;

    // Logged in, but the session expired the instant it began.
    assert_eq!(controller.user_id().as_deref(), Some("abc"));
    assert!(!controller.is_authenticated());
}

#[tokio::test]
async fn test_login_after_error_keeps_last_error_fields() {
    // A login leaves the error fields as they were; only the login fields
    // change.
    let h = Harness::new(RecordingHost::browser());
    h.client
        .on_check_session(Err(ProviderError::with_code("login_required")));
    h.client.on_parse_hash(Ok(Some(tokens(Some(60)))));
    h.client.on_user_info(Ok(UserProfile::new("abc")));
    let controller = h.mount().await;

    controller
        .handle_authentication(CallbackOptions::default())
        .await;

    assert!(controller.is_authenticated());
    assert_eq!(controller.error_type(), Some(ErrorType::CheckSession));
}

#[tokio::test]
async fn test_persisted_mirror_matches_state_after_login() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_check_session(Ok(Some(tokens(Some(3600)))));
    h.client.on_user_info(Ok(UserProfile::new("abc")));

    let controller = h.mount().await;

    let persisted = PersistedSession::load(&h.storage).unwrap();
    assert_eq!(persisted.expires_at, controller.state().expires_at);
    assert_eq!(persisted.user, controller.user());
}

#[tokio::test]
async fn test_dispatch_unknown_host_action_leaves_state() {
    let h = Harness::new(RecordingHost::browser());
    h.client.on_check_session(Ok(Some(tokens(Some(3600)))));
    h.client.on_user_info(Ok(UserProfile::new("abc")));
    let controller = h.mount().await;
    let before = controller.state();

    let action: Action =
        serde_json::from_str(r#"{ "type": "silentRenew" }"#).unwrap();
    controller.dispatch(action);

    assert_eq!(controller.state(), before);
}

#[tokio::test]
async fn test_dispatch_persists_while_subscribers_can_read() {
    let client = Arc::new(ScriptedClient::default());
    client.on_check_session(Ok(Some(tokens(Some(3600)))));
    client.on_user_info(Ok(UserProfile::new("abc")));
    let storage = Arc::new(ObservingStorage::default());
    let controller = SessionController::builder(Harness::config())
        .storage(Arc::clone(&storage))
        .build(RecordingHost::browser(), |_| Arc::clone(&client))
        .expect("controller should build");
    *storage.observer.lock().unwrap() = Some(controller.subscribe());

    let outcome = controller.restore_session().await;

    assert_eq!(outcome, HandshakeOutcome::Authenticated);
    // Both keys were written before the login was published.
    assert_eq!(*storage.users_seen_on_write.lock().unwrap(), vec![None, None]);
    assert_eq!(controller.user_id().as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_check_session_error_kept_as_provider_sent_it() {
    let raw = serde_json::json!({
        "error": "login_required",
        "error_description": "Login required",
        "original": { "status": 400 }
    });
    let h = Harness::new(RecordingHost::browser());
    h.client
        .on_check_session(Err(serde_json::from_value(raw.clone()).unwrap()));

    let controller = h.mount().await;

    let error = controller.error().expect("error should be recorded");
    assert_eq!(error.to_string(), "Login required");
    assert_eq!(serde_json::to_value(&error).unwrap(), raw);
}
