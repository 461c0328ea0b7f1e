//! Host configuration and the client options derived from it.
//!
//! The host supplies three things: the provider domain, the client id, and
//! (optionally) a JSON object of provider-specific overrides. Everything
//! else the provider client needs is derived here:
//!
//! ```text
//! origin ──→ callback domain ──→ redirect URI   ({origin}/auth0_callback)
//! domain ──────────────────────→ audience       (https://{domain}/api/v2/)
//! params ──────────────────────→ overrides applied last, key by key
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::IdentityError;

/// Origin used when there is no browser context (e.g. server rendering),
/// so the derived URIs are still well-formed.
pub const FALLBACK_ORIGIN: &str = "http://localhost:8000";

/// Path of the callback route the provider redirects back to.
pub const DEFAULT_CALLBACK_PATH: &str = "/auth0_callback";

/// Path appended to the provider domain to form the default audience.
pub const DEFAULT_AUDIENCE_PATH: &str = "/api/v2/";

/// Implicit flow: ask for both tokens in the redirect fragment.
pub const DEFAULT_RESPONSE_TYPE: &str = "token id_token";

pub const DEFAULT_SCOPE: &str = "openid profile email";

// ---------------------------------------------------------------------------
// AuthConfig
// ---------------------------------------------------------------------------

/// Configuration accepted when the session controller is created.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// The identity provider's tenant domain, e.g. `"tenant.example.com"`.
    pub domain: String,

    /// The application's client identifier at the provider.
    pub client_id: String,

    /// Provider-specific option overrides. Must be a JSON object when set;
    /// its keys use the provider's camelCase option names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl AuthConfig {
    /// Creates a configuration with no overrides.
    pub fn new(domain: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            params: None,
        }
    }

    /// Sets the provider-specific overrides.
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// The application's own origin, used as the redirect base and as the
    /// logout return destination. Falls back to [`FALLBACK_ORIGIN`] when
    /// `origin` is `None`.
    pub fn callback_domain(origin: Option<&str>) -> String {
        origin
            .map(|o| o.trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| FALLBACK_ORIGIN.to_string())
    }

    /// Derives the options the identity client is built from.
    ///
    /// # Errors
    /// - [`IdentityError::InvalidConfig`] if `domain` or `client_id` is
    ///   empty, or `params` isn't a JSON object.
    /// - [`IdentityError::Options`] if an override has the wrong type for
    ///   the option it names.
    pub fn client_options(
        &self,
        origin: Option<&str>,
    ) -> Result<ClientOptions, IdentityError> {
        let domain = self.domain.trim();
        if domain.is_empty() {
            return Err(IdentityError::InvalidConfig("domain is empty".into()));
        }
        if self.client_id.trim().is_empty() {
            return Err(IdentityError::InvalidConfig("client id is empty".into()));
        }

        let callback_domain = Self::callback_domain(origin);
        let base = ClientOptions {
            domain: domain.to_string(),
            client_id: self.client_id.clone(),
            redirect_uri: format!("{callback_domain}{DEFAULT_CALLBACK_PATH}"),
            audience: format!("https://{domain}{DEFAULT_AUDIENCE_PATH}"),
            response_type: DEFAULT_RESPONSE_TYPE.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            extra: Map::new(),
        };

        let Some(params) = &self.params else {
            return Ok(base);
        };
        let Value::Object(overrides) = params else {
            return Err(IdentityError::InvalidConfig(
                "params must be a JSON object".into(),
            ));
        };

        // Overlay key by key: the same "spread the overrides last" rule the
        // provider documents for its own options object.
        let mut merged = match serde_json::to_value(&base)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }

        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}

// ---------------------------------------------------------------------------
// ClientOptions
// ---------------------------------------------------------------------------

/// The options object the identity client is constructed with.
///
/// Serializes to the provider's own option names (`clientID`,
/// `redirectUri`, `responseType`), so it can be handed to a client binding
/// as-is. Overrides that don't name a known option are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    pub domain: String,

    #[serde(rename = "clientID")]
    pub client_id: String,

    pub redirect_uri: String,

    pub audience: String,

    pub response_type: String,

    pub scope: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
