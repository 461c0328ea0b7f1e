//! Data the identity provider hands back during a handshake.
//!
//! Every type here is shaped after what the provider's client library
//! actually returns, which is why the serde attributes use the provider's
//! camelCase spelling (`accessToken`, `expiresIn`, `statusCode`). Keeping
//! the wire spelling means a payload captured from the browser can be fed
//! straight into these types with `serde_json::from_str`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// DecodedHash — the handshake payload
// ---------------------------------------------------------------------------

/// The decoded result of a handshake: tokens plus expiry metadata.
///
/// The provider delivers this either from the callback URL fragment
/// (`parse_hash`) or from a background request (`check_session`). Every
/// field is optional because the provider omits what it didn't issue. A
/// payload is only usable for login when [`has_tokens`](Self::has_tokens)
/// is true.
///
/// `#[serde(default)]` on the struct lets a partial JSON object
/// deserialize, filling in `None` for anything missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecodedHash {
    /// Bearer token for the provider's APIs (including the profile
    /// endpoint).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// The signed identity token (a JWT).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Claims decoded from `id_token`, as the provider reports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_payload: Option<Value>,

    /// Opaque application state carried through the redirect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_state: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// The anti-forgery `state` value echoed back by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Lifetime of the access token in **seconds**.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Any other keys the provider put in the payload, kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DecodedHash {
    /// Returns `true` if the payload carries both an access token and an
    /// identity token. Empty strings count as absent.
    pub fn has_tokens(&self) -> bool {
        let present =
            |token: &Option<String>| token.as_deref().is_some_and(|t| !t.is_empty());
        present(&self.access_token) && present(&self.id_token)
    }
}

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// A user profile as returned by the provider's profile endpoint.
///
/// Only `sub` is guaranteed. The common OIDC claims get typed fields; every
/// other claim lands in `extra` via `#[serde(flatten)]`, so nothing the
/// provider sends is lost when the profile is persisted and read back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Subject identifier: the provider's stable id for this user.
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// All remaining claims, keyed by claim name.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Creates a profile carrying only a subject identifier.
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderError
// ---------------------------------------------------------------------------

/// An error record reported by the provider's client library.
///
/// Providers are inconsistent about which fields they fill: an OAuth
/// redirect error uses `error`/`errorDescription`, a silent check uses
/// `code`/`description`, and an HTTP failure only has `statusCode`. All of
/// them are optional and kept verbatim so the host can render whichever
/// the provider sent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// Machine-readable code, e.g. `"login_required"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// HTTP status of the failed provider request, if there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Everything else the provider reported (`error_description`,
    /// `original`, ...), kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProviderError {
    /// Shorthand for an error that only has a `code`.
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Shorthand for an error that only has an HTTP status.
    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::default()
        }
    }
}

/// Prints the most human-friendly field available: a description first,
/// then a code, then the HTTP status.
impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw_description = self.extra.get("error_description").and_then(Value::as_str);
        if let Some(text) = self
            .description
            .as_deref()
            .or(self.error_description.as_deref())
            .or(raw_description)
        {
            return f.write_str(text);
        }
        if let Some(code) = self.code.as_ref().or(self.error.as_ref()) {
            return f.write_str(code);
        }
        match self.status_code {
            Some(status) => write!(f, "provider request failed with status {status}"),
            None => f.write_str("unknown provider error"),
        }
    }
}

impl std::error::Error for ProviderError {}

// ---------------------------------------------------------------------------
// ErrorType — which handshake step failed
// ---------------------------------------------------------------------------

/// Tags which handshake step produced the error stored in the session.
///
/// Serialized (and displayed) with the tag names hosts already match on:
/// `"checkSession"`, `"userInfo"`, `"authResult"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    /// The silent session check on mount failed.
    CheckSession,
    /// The profile fetch failed after a structurally valid payload.
    UserInfo,
    /// The redirect payload itself signalled an error (e.g. consent denied).
    AuthResult,
}

impl ErrorType {
    /// The wire tag for this step.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckSession => "checkSession",
            Self::UserInfo => "userInfo",
            Self::AuthResult => "authResult",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Call options
// ---------------------------------------------------------------------------

/// Options for a silent session check. Empty by default; any keys set here
/// are passed through to the provider untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckSessionOptions {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Options for the provider's logout call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutOptions {
    /// Where the provider should send the browser after logging out.
    pub return_to: String,
}
