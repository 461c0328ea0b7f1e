//! Unified error type for authsync.

use authsync_identity::IdentityError;
use authsync_session::SessionError;

/// Top-level error that wraps the crate-specific errors.
///
/// Provider failures during a handshake are NOT errors at this level:
/// they become `Error` transitions in the session state. What remains is
/// configuration trouble and storage trouble.
#[derive(Debug, thiserror::Error)]
pub enum AuthsyncError {
    /// The configuration couldn't produce client options.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The persisted mirror couldn't be read.
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_identity_error() {
        let err = IdentityError::InvalidConfig("domain is empty".into());
        let authsync_err: AuthsyncError = err.into();
        assert!(matches!(authsync_err, AuthsyncError::Identity(_)));
        assert!(authsync_err.to_string().contains("domain is empty"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::Storage("quota exceeded".into());
        let authsync_err: AuthsyncError = err.into();
        assert!(matches!(authsync_err, AuthsyncError::Session(_)));
    }
}
