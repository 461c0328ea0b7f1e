//! The actions that drive the session reducer.

use authsync_identity::{DecodedHash, ErrorType, ProviderError, UserProfile};
use serde::{Deserialize, Serialize};

/// One state transition request.
///
/// `#[serde(tag = "type")]` gives actions the same shape hosts dispatch
/// them in from script or over a message bus:
///
/// ```json
/// { "type": "error", "errorType": "checkSession", "error": { "code": "login_required" } }
/// ```
///
/// Any `type` this crate doesn't know decodes to [`Action::Unknown`],
/// which the reducer treats as "leave the state alone".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    /// A handshake completed: store the payload and the profile, and
    /// compute the expiry from `auth_result.expires_in`.
    Login {
        auth_result: Option<DecodedHash>,
        user: Option<UserProfile>,
    },

    /// Forget the user and the payload.
    Logout,

    /// Flip `is_authenticating`. Relative, not absolute: callers pair
    /// each flip on with a flip off.
    ToggleAuthenticating,

    /// A handshake step failed. Clears the login fields and records which
    /// step failed and why.
    Error {
        error_type: ErrorType,
        error: ProviderError,
    },

    /// An action type this version doesn't recognize.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// The action's wire tag, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Logout => "logout",
            Self::ToggleAuthenticating => "toggleAuthenticating",
            Self::Error { .. } => "error",
            Self::Unknown => "unknown",
        }
    }
}
