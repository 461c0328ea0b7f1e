//! # authsync
//!
//! Login and session state for single-page applications whose
//! authentication is handled by a third-party identity provider.
//!
//! authsync keeps a small client-side record of the login (profile,
//! expiry, in-flight flag, last error) and keeps it in step with the
//! provider's redirect-based OAuth handshake. The host application
//! implements two traits, [`Host`] (navigation) and [`IdentityClient`]
//! (the provider's client library), and drives a [`SessionController`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use authsync::prelude::*;
//!
//! let controller = SessionController::builder(AuthConfig::new(
//!     "tenant.example.com",
//!     "client-123",
//! ))
//! .mount(my_host, |options| MyProviderClient::new(options))
//! .await?;
//!
//! // Later, on the callback route:
//! let outcome = controller
//!     .handle_authentication(CallbackOptions::default())
//!     .await;
//! ```

mod controller;
mod error;
mod host;

pub use controller::{
    CallbackOptions, HandshakeOutcome, POST_LOGOUT_ROUTE, SessionController,
    SessionControllerBuilder,
};
pub use error::AuthsyncError;
pub use host::Host;

pub use authsync_identity::{
    AuthConfig, CheckSessionOptions, ClientOptions, DecodedHash, ErrorType,
    IdentityClient, IdentityError, LogoutOptions, ProviderError, UserProfile,
};
pub use authsync_session::{
    Action, FileStorage, MemoryStorage, NoStorage, PersistedSession,
    SessionError, SessionState, SessionStorage,
};

/// Everything a host needs in one import.
pub mod prelude {
    pub use crate::{
        Action, AuthConfig, AuthsyncError, CallbackOptions, ClientOptions,
        DecodedHash, ErrorType, FileStorage, HandshakeOutcome, Host,
        IdentityClient, LogoutOptions, MemoryStorage, NoStorage,
        ProviderError, SessionController, SessionState, SessionStorage,
        UserProfile,
    };
    pub use authsync_identity::CheckSessionOptions;
}
