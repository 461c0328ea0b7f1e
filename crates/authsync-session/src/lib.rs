//! Client-side authentication state for authsync.
//!
//! This crate holds the small piece of state a single-page application
//! keeps about its login:
//!
//! 1. **State** — who is logged in, until when, and what went wrong last
//!    ([`SessionState`])
//! 2. **Transitions** — a pure reducer over five action variants
//!    ([`Action`], [`reduce`])
//! 3. **Persistence** — mirroring the expiry and the profile into a
//!    key-value store that survives a reload ([`SessionStorage`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Controller (above)  ← dispatches actions as the handshake progresses
//!     ↕
//! Session Layer (this crate)  ← computes the next state, mirrors two keys
//!     ↕
//! Identity Layer (below)  ← provides DecodedHash, UserProfile, ProviderError
//! ```

mod action;
mod error;
mod reducer;
mod state;
mod storage;

pub use action::Action;
pub use error::SessionError;
pub use reducer::{now_millis, reduce, reduce_at};
pub use state::SessionState;
pub use storage::{
    EXPIRES_AT_KEY, FileStorage, MemoryStorage, NoStorage, PersistedSession,
    SessionStorage, USER_KEY,
};
