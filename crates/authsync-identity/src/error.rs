//! Error types for the identity layer.

/// Errors that can occur while turning an [`AuthConfig`](crate::AuthConfig)
/// into [`ClientOptions`](crate::ClientOptions).
///
/// Failures reported by the provider itself during a handshake are NOT
/// represented here. Those arrive as [`ProviderError`](crate::ProviderError)
/// values and are recorded in the session state, not propagated.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The configuration is unusable as given, e.g. an empty domain or a
    /// `params` override that isn't a JSON object.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A provider parameter override had the wrong shape for the option it
    /// names (for example a number where `scope` expects a string).
    #[error("invalid client options: {0}")]
    Options(#[from] serde_json::Error),
}
