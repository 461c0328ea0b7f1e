//! The session reducer: `(state, action) → next state`.
//!
//! Every transition is computed from the prior state and the action alone.
//! The only outside read is the wall clock, for the `Login` expiry. The only
//! side effect is mirroring `expires_at` and `user` into storage on
//! `Login` and `Logout`.
//!
//! | Action | Transition | Storage |
//! |---|---|---|
//! | `Login` | set `user`, `expires_at`, `auth_result` | write both keys |
//! | `Logout` | clear `user`, `expires_at`, `auth_result` | remove both keys |
//! | `ToggleAuthenticating` | flip `is_authenticating` | — |
//! | `Error` | clear login fields, set `error_type`, `error` | — |
//! | `Unknown` | unchanged | — |

use std::time::{SystemTime, UNIX_EPOCH};

use authsync_identity::{DecodedHash, UserProfile};

use crate::{Action, EXPIRES_AT_KEY, SessionState, SessionStorage, USER_KEY};

/// Current wall-clock time in epoch milliseconds.
///
/// A clock set before 1970 reads as 0, which makes every session expired
/// rather than panicking.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Applies `action` to `state` using the wall clock.
pub fn reduce<S: SessionStorage + ?Sized>(
    state: &SessionState,
    action: Action,
    storage: &S,
) -> SessionState {
    reduce_at(state, action, now_millis(), storage)
}

/// Applies `action` to `state` as if the current time were `now_ms`.
///
/// Never fails. A storage error is logged and the in-memory transition
/// still happens.
pub fn reduce_at<S: SessionStorage + ?Sized>(
    state: &SessionState,
    action: Action,
    now_ms: u64,
    storage: &S,
) -> SessionState {
    tracing::trace!(action = action.kind(), "reducing session action");

    match action {
        Action::Login { auth_result, user } => {
            let expires_at = expiry_from(auth_result.as_ref(), now_ms);
            persist_login(storage, expires_at, user.as_ref());

            SessionState {
                user,
                expires_at: Some(expires_at),
                auth_result,
                ..state.clone()
            }
        }
        Action::Logout => {
            for key in [EXPIRES_AT_KEY, USER_KEY] {
                if let Err(e) = storage.remove_item(key) {
                    tracing::warn!(key, error = %e, "failed to clear persisted session value");
                }
            }

            SessionState {
                user: None,
                expires_at: None,
                auth_result: None,
                ..state.clone()
            }
        }
        Action::ToggleAuthenticating => SessionState {
            is_authenticating: !state.is_authenticating,
            ..state.clone()
        },
        Action::Error { error_type, error } => SessionState {
            user: None,
            expires_at: None,
            auth_result: None,
            error_type: Some(error_type),
            error: Some(error),
            ..state.clone()
        },
        Action::Unknown => state.clone(),
    }
}

/// `now + expires_in seconds`. A missing payload or `expires_in` yields
/// `now`: a session that is already expired.
fn expiry_from(auth_result: Option<&DecodedHash>, now_ms: u64) -> u64 {
    let expires_in = auth_result.and_then(|r| r.expires_in).unwrap_or(0);
    now_ms.saturating_add(expires_in.saturating_mul(1000))
}

fn persist_login<S: SessionStorage + ?Sized>(
    storage: &S,
    expires_at: u64,
    user: Option<&UserProfile>,
) {
    let user_json = match serde_json::to_string(&user) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize user profile for storage");
            return;
        }
    };

    let writes = [
        (EXPIRES_AT_KEY, expires_at.to_string()),
        (USER_KEY, user_json),
    ];
    for (key, value) in writes {
        if let Err(e) = storage.set_item(key, &value) {
            tracing::warn!(key, error = %e, "failed to persist session value");
        }
    }
}
