//! The identity-provider client seam.
//!
//! authsync doesn't speak OAuth itself. The provider's own client library
//! does (Auth0's `WebAuth`, a Keycloak adapter, a test double...). This
//! module defines the [`IdentityClient`] trait: the five calls the session
//! controller needs, each returning its result as a value instead of
//! through a completion callback.
//!
//! # Why a trait?
//!
//! The controller only cares THAT a silent check can be attempted, not HOW
//! the provider does it (hidden iframe, refresh token, cookie). A trait
//! lets the same controller run against a real binding in the browser and
//! a scripted client in tests.

use std::future::Future;
use std::sync::Arc;

use crate::{CheckSessionOptions, DecodedHash, LogoutOptions, ProviderError, UserProfile};

/// The capabilities the session controller consumes from a provider client.
///
/// # Trait bounds
///
/// - `Send + Sync` → the client can be shared with whatever task drives
///   the controller.
/// - `'static` → the client owns its configuration; it lives as long as
///   the controller that holds it.
///
/// The async methods return `impl Future + Send` so implementations can
/// simply write `async fn`.
///
/// # Example
///
/// ```rust
/// use authsync_identity::{
///     CheckSessionOptions, DecodedHash, IdentityClient, LogoutOptions,
///     ProviderError, UserProfile,
/// };
///
/// /// A client for a provider that is always logged out.
/// struct LoggedOut;
///
/// impl IdentityClient for LoggedOut {
///     async fn check_session(
///         &self,
///         _options: &CheckSessionOptions,
///     ) -> Result<Option<DecodedHash>, ProviderError> {
///         Err(ProviderError::with_code("login_required"))
///     }
///
///     fn authorize(&self) {}
///
///     async fn parse_hash(&self) -> Result<Option<DecodedHash>, ProviderError> {
///         Ok(None)
///     }
///
///     fn logout(&self, _options: &LogoutOptions) {}
///
///     async fn user_info(
///         &self,
///         _access_token: &str,
///     ) -> Result<UserProfile, ProviderError> {
///         Err(ProviderError::with_status(401))
///     }
/// }
/// ```
pub trait IdentityClient: Send + Sync + 'static {
    /// Attempts to re-establish a session without user interaction.
    ///
    /// # Returns
    /// - `Ok(Some(payload))` — the provider still has a session
    /// - `Ok(None)` — the provider answered but sent nothing usable
    /// - `Err(error)` — the check failed (typically `login_required`)
    fn check_session(
        &self,
        options: &CheckSessionOptions,
    ) -> impl Future<Output = Result<Option<DecodedHash>, ProviderError>> + Send;

    /// Starts the redirect-based login. The browser navigates to the
    /// provider; there is no result to report.
    fn authorize(&self);

    /// Parses the payload the provider left on the callback route.
    ///
    /// Same result shape as [`check_session`](Self::check_session):
    /// `Ok(None)` means the callback URL carried neither a payload nor an
    /// error.
    fn parse_hash(
        &self,
    ) -> impl Future<Output = Result<Option<DecodedHash>, ProviderError>> + Send;

    /// Ends the provider session and redirects to `options.return_to`.
    /// Has no failure path.
    fn logout(&self, options: &LogoutOptions);

    /// Fetches the profile of the user the access token belongs to.
    fn user_info(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<UserProfile, ProviderError>> + Send;
}

/// A shared client is still a client. Hosts that also need the client
/// outside the controller (or tests that inspect it afterwards) hand over
/// an `Arc`.
impl<T: IdentityClient> IdentityClient for Arc<T> {
    fn check_session(
        &self,
        options: &CheckSessionOptions,
    ) -> impl Future<Output = Result<Option<DecodedHash>, ProviderError>> + Send {
        (**self).check_session(options)
    }

    fn authorize(&self) {
        (**self).authorize();
    }

    fn parse_hash(
        &self,
    ) -> impl Future<Output = Result<Option<DecodedHash>, ProviderError>> + Send {
        (**self).parse_hash()
    }

    fn logout(&self, options: &LogoutOptions) {
        (**self).logout(options);
    }

    fn user_info(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<UserProfile, ProviderError>> + Send {
        (**self).user_info(access_token)
    }
}
