//! The session controller: drives the handshake and owns the state.
//!
//! The controller ties the layers together. It holds the provider client,
//! the host, the storage, and the one [`SessionState`] for this mount, and
//! turns each provider call's outcome into reducer actions:
//!
//! ```text
//! mount ──→ restore_session() ──→ check_session ──┬─→ user_info ──→ Login
//!                                                 └─→ Error("checkSession")
//!
//! login() ──→ authorize  (browser leaves the app)
//!
//! callback route ──→ handle_authentication() ──→ parse_hash ──┬─→ user_info ──→ Login
//!                                                             ├─→ Error("authResult")
//!                                                             └─→ (nothing to do)
//!
//! logout() ──→ client logout ──→ Logout ──→ navigate("/")
//! ```
//!
//! # Sharing the state
//!
//! The state lives in a `tokio::sync::watch` channel. The controller holds
//! the sending half and is the only writer. Hosts read a snapshot with
//! [`state()`](SessionController::state) or hold a receiver from
//! [`subscribe()`](SessionController::subscribe) and re-render when it
//! changes.

use authsync_identity::{
    AuthConfig, CheckSessionOptions, ClientOptions, DecodedHash, ErrorType,
    IdentityClient, LogoutOptions, ProviderError, UserProfile,
};
use authsync_session::{
    Action, MemoryStorage, PersistedSession, SessionState, SessionStorage,
    reduce,
};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{AuthsyncError, Host};

/// Where [`logout()`](SessionController::logout) sends the app.
pub const POST_LOGOUT_ROUTE: &str = "/";

// ---------------------------------------------------------------------------
// Options and outcomes
// ---------------------------------------------------------------------------

/// Options for handling the provider's redirect back to the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallbackOptions {
    /// Route to navigate to once the callback has been processed,
    /// whatever the outcome. Default: `"/"`.
    pub post_login_route: String,
}

impl Default for CallbackOptions {
    fn default() -> Self {
        Self {
            post_login_route: "/".to_string(),
        }
    }
}

impl CallbackOptions {
    /// Options that land on `route` once the callback is handled.
    pub fn redirect_to(route: impl Into<String>) -> Self {
        Self {
            post_login_route: route.into(),
        }
    }
}

/// How a handshake step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "errorType", rename_all = "camelCase")]
pub enum HandshakeOutcome {
    /// Tokens and profile were obtained; the session is logged in.
    Authenticated,

    /// The step failed. The error is recorded in the session state under
    /// this tag.
    Failed(ErrorType),

    /// The provider returned neither a usable payload nor an error (e.g.
    /// the callback route was visited with no handshake in progress).
    /// Nothing is recorded in the session state.
    Incomplete,

    /// There was no browser context, so the step wasn't attempted.
    Skipped,
}

impl HandshakeOutcome {
    /// The success indicator: `true` only for
    /// [`Authenticated`](Self::Authenticated).
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and mounting a [`SessionController`].
///
/// # Example
///
/// ```rust,ignore
/// use authsync::prelude::*;
///
/// let controller = SessionController::builder(config)
///     .storage(FileStorage::new("session.json"))
///     .mount(host, |options| MyClient::new(options))
///     .await?;
/// ```
pub struct SessionControllerBuilder<S = MemoryStorage> {
    config: AuthConfig,
    storage: S,
}

impl SessionControllerBuilder<MemoryStorage> {
    /// Creates a builder that mirrors the session into process memory.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            storage: MemoryStorage::new(),
        }
    }
}

impl<S: SessionStorage> SessionControllerBuilder<S> {
    /// Sets where the expiry and profile are persisted.
    pub fn storage<T: SessionStorage>(
        self,
        storage: T,
    ) -> SessionControllerBuilder<T> {
        SessionControllerBuilder {
            config: self.config,
            storage,
        }
    }

    /// Creates the controller without contacting the provider.
    ///
    /// The client options are derived from the configuration and the
    /// host's origin, then handed to `make_client` to construct the
    /// provider client.
    ///
    /// # Errors
    /// Returns [`AuthsyncError::Identity`] if the configuration can't
    /// produce client options.
    pub fn build<C, H, F>(
        self,
        host: H,
        make_client: F,
    ) -> Result<SessionController<C, H, S>, AuthsyncError>
    where
        C: IdentityClient,
        H: Host,
        F: FnOnce(ClientOptions) -> C,
    {
        let origin = host.origin();
        let options = self.config.client_options(origin.as_deref())?;
        let callback_domain = AuthConfig::callback_domain(origin.as_deref());

        tracing::debug!(
            domain = %options.domain,
            redirect_uri = %options.redirect_uri,
            "creating identity client"
        );
        let client = make_client(options);

        let (state, _) = watch::channel(SessionState::default());
        Ok(SessionController {
            client,
            host,
            storage: self.storage,
            callback_domain,
            state,
            writer: Mutex::new(()),
        })
    }

    /// Creates the controller and immediately attempts a silent session
    /// restore, as a host does when the provider component mounts.
    ///
    /// # Errors
    /// Same as [`build`](Self::build). A failed silent check is not an
    /// error; it is recorded in the session state.
    pub async fn mount<C, H, F>(
        self,
        host: H,
        make_client: F,
    ) -> Result<SessionController<C, H, S>, AuthsyncError>
    where
        C: IdentityClient,
        H: Host,
        F: FnOnce(ClientOptions) -> C,
    {
        let controller = self.build(host, make_client)?;
        controller.restore_session().await;
        Ok(controller)
    }
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Owns the session state for one mounted app and drives the handshake.
///
/// One instance per mount; dropping it discards the in-memory state (the
/// persisted expiry and profile stay in storage).
pub struct SessionController<C, H, S = MemoryStorage> {
    client: C,
    host: H,
    storage: S,
    /// The app's own origin: the logout return destination.
    callback_domain: String,
    state: watch::Sender<SessionState>,
    /// Serializes dispatches so each transition starts from the previous one.
    writer: Mutex<()>,
}

impl SessionController<(), (), MemoryStorage> {
    /// Creates a new builder.
    pub fn builder(config: AuthConfig) -> SessionControllerBuilder {
        SessionControllerBuilder::new(config)
    }
}

impl<C, H, S: SessionStorage> SessionController<C, H, S> {
    /// Applies one action through the reducer and notifies subscribers.
    ///
    /// The handshake commands dispatch for you; this is exposed for hosts
    /// that replay actions of their own (e.g. decoded from script).
    pub fn dispatch(&self, action: Action) {
        tracing::debug!(action = action.kind(), "dispatching session action");
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // Storage I/O happens here, outside the channel's write lock.
        let current = self.state.borrow().clone();
        let next = reduce(&current, action, &self.storage);
        self.state.send_replace(next);
    }

    /// Reads the persisted expiry and profile back from storage.
    ///
    /// # Errors
    /// Returns [`AuthsyncError::Session`] if a stored value is unreadable.
    pub fn persisted(&self) -> Result<PersistedSession, AuthsyncError> {
        Ok(PersistedSession::load(&self.storage)?)
    }

    /// Marks a handshake step as in flight until the returned guard drops.
    fn begin_step(&self) -> AuthenticatingGuard<'_, C, H, S> {
        self.dispatch(Action::ToggleAuthenticating);
        AuthenticatingGuard { controller: self }
    }
}

impl<C, H, S> SessionController<C, H, S>
where
    C: IdentityClient,
    H: Host,
    S: SessionStorage,
{
    // -- Commands ---------------------------------------------------------

    /// Tries to re-establish the provider session without user interaction.
    ///
    /// On success the profile is fetched and the session logged in. A
    /// failed check is recorded as a `checkSession` error.
    ///
    /// Don't overlap this with [`handle_authentication`](Self::handle_authentication)
    /// on the same controller; see [`is_authenticating`](Self::is_authenticating).
    pub async fn restore_session(&self) -> HandshakeOutcome {
        let step = self.begin_step();
        let result = self
            .client
            .check_session(&CheckSessionOptions::default())
            .await;
        let outcome = self.complete(result, ErrorType::CheckSession).await;
        drop(step);

        tracing::info!(?outcome, "silent session check finished");
        outcome
    }

    /// Sends the browser to the provider's login page. No local state
    /// changes; the app is navigated away.
    pub fn login(&self) {
        tracing::info!("redirecting to identity provider");
        self.client.authorize();
    }

    /// Completes the handshake on the callback route.
    ///
    /// Parses the provider's redirect payload, fetches the profile, and
    /// logs the session in. Whatever the outcome, the host is then sent to
    /// `options.post_login_route`. Without a browser context nothing
    /// happens and [`HandshakeOutcome::Skipped`] is returned.
    pub async fn handle_authentication(
        &self,
        options: CallbackOptions,
    ) -> HandshakeOutcome {
        if self.host.origin().is_none() {
            tracing::debug!("no browser context, skipping callback handling");
            return HandshakeOutcome::Skipped;
        }

        let step = self.begin_step();
        let result = self.client.parse_hash().await;
        let outcome = self.complete(result, ErrorType::AuthResult).await;
        drop(step);

        tracing::info!(?outcome, route = %options.post_login_route, "callback handled");
        self.host.navigate(&options.post_login_route);
        outcome
    }

    /// Logs out at the provider, clears the local session, and returns
    /// the app to `/`.
    ///
    /// Not atomic: the provider call comes first, but it has no failure
    /// path, so the local session is always cleared.
    pub fn logout(&self) {
        self.client.logout(&LogoutOptions {
            return_to: self.callback_domain.clone(),
        });
        self.dispatch(Action::Logout);
        tracing::info!("logged out");
        self.host.navigate(POST_LOGOUT_ROUTE);
    }

    // -- Queries ----------------------------------------------------------

    /// True while a handshake step is in flight.
    ///
    /// The flag is toggled, not counted: two steps awaited concurrently
    /// (e.g. under `join!`) cancel each other out and it reads `false`
    /// while both are pending. Run one step at a time.
    pub fn is_authenticating(&self) -> bool {
        self.state.borrow().is_authenticating
    }

    /// True if the session's expiry is strictly in the future.
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    /// The logged-in user's subject identifier.
    pub fn user_id(&self) -> Option<String> {
        self.state.borrow().user_id().map(str::to_string)
    }

    /// The last successful handshake payload.
    pub fn auth_result(&self) -> Option<DecodedHash> {
        self.state.borrow().auth_result.clone()
    }

    pub fn error_type(&self) -> Option<ErrorType> {
        self.state.borrow().error_type
    }

    pub fn error(&self) -> Option<ProviderError> {
        self.state.borrow().error.clone()
    }

    /// A snapshot of the whole state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every state change from now on.
    ///
    /// Release any `Ref` from [`borrow()`](watch::Receiver::borrow) before
    /// calling a command on the same thread: publishing a new state waits
    /// for outstanding borrows.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The app origin used as the logout return destination.
    pub fn callback_domain(&self) -> &str {
        &self.callback_domain
    }

    // -- Handshake internals ----------------------------------------------

    /// Turns a provider payload (or error) into state: fetch the profile
    /// and log in, record the error under `failure`, or do nothing.
    async fn complete(
        &self,
        result: Result<Option<DecodedHash>, ProviderError>,
        failure: ErrorType,
    ) -> HandshakeOutcome {
        match result {
            Ok(Some(payload)) if payload.has_tokens() => {
                self.set_session(payload).await
            }
            Err(error) => self.fail(failure, error),
            Ok(_) => {
                // Neither tokens nor an error. Left unrecorded on purpose:
                // the caller sees `Incomplete` and decides.
                tracing::debug!(step = %failure, "provider returned no usable payload");
                HandshakeOutcome::Incomplete
            }
        }
    }

    async fn set_session(&self, payload: DecodedHash) -> HandshakeOutcome {
        let access_token = payload.access_token.clone().unwrap_or_default();

        match self.client.user_info(&access_token).await {
            Ok(user) => {
                tracing::info!(user_id = %user.sub, "session established");
                self.dispatch(Action::Login {
                    auth_result: Some(payload),
                    user: Some(user),
                });
                HandshakeOutcome::Authenticated
            }
            Err(error) => self.fail(ErrorType::UserInfo, error),
        }
    }

    fn fail(&self, error_type: ErrorType, error: ProviderError) -> HandshakeOutcome {
        tracing::warn!(%error_type, %error, "handshake step failed");
        self.dispatch(Action::Error { error_type, error });
        HandshakeOutcome::Failed(error_type)
    }
}

/// Flips `is_authenticating` back when a handshake step ends.
///
/// Every step that flips it on holds one of these, so the flag is paired
/// on every path out of the step, including early returns and a dropped
/// future. Pairing is per step; steps on one controller must not overlap.
struct AuthenticatingGuard<'a, C, H, S: SessionStorage> {
    controller: &'a SessionController<C, H, S>,
}

impl<C, H, S: SessionStorage> Drop for AuthenticatingGuard<'_, C, H, S> {
    fn drop(&mut self) {
        self.controller.dispatch(Action::ToggleAuthenticating);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_options_default_route_is_root() {
        assert_eq!(CallbackOptions::default().post_login_route, "/");
    }

    #[test]
    fn test_callback_options_deserializes_with_defaults() {
        let options: CallbackOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, CallbackOptions::default());

        let options: CallbackOptions =
            serde_json::from_str(r#"{ "postLoginRoute": "/account" }"#).unwrap();
        assert_eq!(options, CallbackOptions::redirect_to("/account"));
    }

    #[test]
    fn test_handshake_outcome_success_indicator() {
        assert!(HandshakeOutcome::Authenticated.is_authenticated());
        assert!(!HandshakeOutcome::Failed(ErrorType::UserInfo).is_authenticated());
        assert!(!HandshakeOutcome::Incomplete.is_authenticated());
        assert!(!HandshakeOutcome::Skipped.is_authenticated());
    }

    #[test]
    fn test_handshake_outcome_serializes_error_tag() {
        let json =
            serde_json::to_value(HandshakeOutcome::Failed(ErrorType::AuthResult)).unwrap();

        assert_eq!(json, serde_json::json!({ "outcome": "failed", "errorType": "authResult" }));
    }
}
