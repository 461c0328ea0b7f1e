//! The session state: what the application currently knows about its login.
//!
//! There is exactly one `SessionState` per mounted controller. It is only
//! ever replaced by the [`reduce`](crate::reduce) function, so every
//! change to it is one of the five [`Action`](crate::Action)s.

use authsync_identity::{DecodedHash, ErrorType, ProviderError, UserProfile};
use serde::{Deserialize, Serialize};

use crate::reducer::now_millis;

/// The client-side authentication state.
///
/// The controller's state machine is read off these fields rather than
/// stored as a separate enum:
///
/// ```text
///   Idle ──(step begins)──→ Authenticating ──(login)──→ Authenticated
///     ↑                            │
///     └────────(logout)────────────┴──(error)──→ Errored
/// ```
///
/// - **Authenticating**: `is_authenticating` is set.
/// - **Authenticated**: `user` and `expires_at` present, expiry in the
///   future.
/// - **Errored**: `error_type`/`error` set and `user` cleared.
///
/// `user`, `expires_at` and `auth_result` are always set together and
/// cleared together; the reducer never leaves them half-populated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// The decoded profile of the logged-in user.
    pub user: Option<UserProfile>,

    /// Absolute expiry of the current session, in epoch milliseconds.
    pub expires_at: Option<u64>,

    /// True while a handshake step is in flight.
    pub is_authenticating: bool,

    /// The last successful handshake payload.
    pub auth_result: Option<DecodedHash>,

    /// Which handshake step failed most recently.
    pub error_type: Option<ErrorType>,

    /// The provider's error record from that step.
    pub error: Option<ProviderError>,
}

impl SessionState {
    /// Returns `true` if the session expires strictly after `now_ms`.
    ///
    /// An expiry equal to `now_ms` counts as expired.
    pub fn is_authenticated_at(&self, now_ms: u64) -> bool {
        self.expires_at.is_some_and(|expires_at| now_ms < expires_at)
    }

    /// [`is_authenticated_at`](Self::is_authenticated_at) against the
    /// wall clock.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(now_millis())
    }

    /// The logged-in user's subject identifier.
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.sub.as_str())
    }

    /// Returns `true` if the last handshake step recorded an error.
    pub fn is_errored(&self) -> bool {
        self.error_type.is_some()
    }
}
