//! Identity-provider vocabulary for authsync.
//!
//! This crate defines everything the session layer needs to know about the
//! third-party identity provider, without knowing which provider it is:
//!
//! - **Types** ([`DecodedHash`], [`UserProfile`], [`ProviderError`],
//!   [`ErrorType`]) — what the provider hands back during a handshake.
//! - **Configuration** ([`AuthConfig`], [`ClientOptions`]) — what the host
//!   application supplies, and the client options derived from it.
//! - **Client** ([`IdentityClient`] trait) — the five calls the session
//!   controller makes into the provider's client library.
//! - **Errors** ([`IdentityError`]) — what can go wrong while deriving the
//!   client options.
//!
//! # Architecture
//!
//! ```text
//! Controller (authsync)  ← drives the handshake
//!     ↕
//! Session (authsync-session)  ← reducer + persisted mirror
//!     ↕
//! Identity (this crate)  ← payloads, profiles, client trait
//! ```
//!
//! The OAuth protocol itself (token validation, network calls, the hidden
//! iframe used for silent checks) is the provider client's job. Nothing in
//! this crate talks to the network.

mod client;
mod config;
mod error;
mod types;

pub use client::IdentityClient;
pub use config::{
    AuthConfig, ClientOptions, DEFAULT_AUDIENCE_PATH, DEFAULT_CALLBACK_PATH,
    DEFAULT_RESPONSE_TYPE, DEFAULT_SCOPE, FALLBACK_ORIGIN,
};
pub use error::IdentityError;
pub use types::{
    CheckSessionOptions, DecodedHash, ErrorType, LogoutOptions,
    ProviderError, UserProfile,
};
