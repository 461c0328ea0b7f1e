//! Walks a full login lifecycle against an in-process stand-in provider:
//! failed silent check, redirect login, callback, reload with silent
//! restore, logout.
//!
//! Run with `RUST_LOG=debug cargo run -p silent-login` to see every
//! dispatched action.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use authsync::prelude::*;
use authsync::PersistedSession;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Stand-in provider
// ---------------------------------------------------------------------------

/// Provider-side state shared by every client instance, the way the real
/// provider's cookie outlives a page reload.
#[derive(Default)]
struct ProviderSide {
    logged_in: AtomicBool,
    pending_redirect: AtomicBool,
}

struct DemoClient {
    provider: Arc<ProviderSide>,
    options: ClientOptions,
}

impl DemoClient {
    fn payload(&self) -> DecodedHash {
        DecodedHash {
            access_token: Some(format!("at.{}", self.options.client_id)),
            id_token: Some("eyJhbGciOiJSUzI1NiJ9.demo".into()),
            expires_in: Some(7200),
            token_type: Some("Bearer".into()),
            scope: Some(self.options.scope.clone()),
            ..DecodedHash::default()
        }
    }
}

impl IdentityClient for DemoClient {
    async fn check_session(
        &self,
        _options: &CheckSessionOptions,
    ) -> Result<Option<DecodedHash>, ProviderError> {
        if self.provider.logged_in.load(Ordering::SeqCst) {
            Ok(Some(self.payload()))
        } else {
            Err(ProviderError {
                code: Some("login_required".into()),
                description: Some("Login required".into()),
                ..ProviderError::default()
            })
        }
    }

    fn authorize(&self) {
        println!("  [provider] login page for {}", self.options.redirect_uri);
        // The user types their password; the provider redirects back.
        self.provider.logged_in.store(true, Ordering::SeqCst);
        self.provider.pending_redirect.store(true, Ordering::SeqCst);
    }

    async fn parse_hash(&self) -> Result<Option<DecodedHash>, ProviderError> {
        if self.provider.pending_redirect.swap(false, Ordering::SeqCst) {
            Ok(Some(self.payload()))
        } else {
            Ok(None)
        }
    }

    fn logout(&self, options: &LogoutOptions) {
        println!("  [provider] logged out, returning to {}", options.return_to);
        self.provider.logged_in.store(false, Ordering::SeqCst);
    }

    async fn user_info(
        &self,
        access_token: &str,
    ) -> Result<UserProfile, ProviderError> {
        if !access_token.starts_with("at.") {
            return Err(ProviderError::with_status(401));
        }
        let mut profile = UserProfile::new("demo|1001");
        profile.name = Some("Ada Lovelace".into());
        profile.email = Some("ada@example.org".into());
        profile.email_verified = Some(true);
        Ok(profile)
    }
}

// ---------------------------------------------------------------------------
// Console host
// ---------------------------------------------------------------------------

struct ConsoleHost {
    route: Mutex<String>,
}

impl ConsoleHost {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            route: Mutex::new("/".into()),
        })
    }

    fn route(&self) -> String {
        self.route
            .lock()
            .map(|route| route.clone())
            .unwrap_or_default()
    }
}

impl Host for ConsoleHost {
    fn origin(&self) -> Option<String> {
        Some("http://localhost:3000".into())
    }

    fn navigate(&self, route: &str) {
        println!("  [host] navigate → {route}");
        if let Ok(mut current) = self.route.lock() {
            *current = route.to_string();
        }
    }
}

fn print_state(label: &str, state: &SessionState) {
    println!("\n== {label}");
    match serde_json::to_string_pretty(state) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "failed to render state"),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), AuthsyncError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let provider = Arc::new(ProviderSide::default());
    let storage_path = std::env::temp_dir().join("authsync-silent-login.json");
    let config = AuthConfig::new("tenant.example.com", "demo-client");
    let host = ConsoleHost::new();
    let client = |provider: &Arc<ProviderSide>| {
        let provider = Arc::clone(provider);
        move |options: ClientOptions| DemoClient { provider, options }
    };

    // First visit: no provider session yet.
    let controller = SessionController::builder(config.clone())
        .storage(FileStorage::new(&storage_path))
        .mount(Arc::clone(&host), client(&provider))
        .await?;
    print_state("after mount (first visit)", &controller.state());

    // The user clicks "log in", the provider redirects back to the
    // callback route.
    controller.login();
    let outcome = controller
        .handle_authentication(CallbackOptions::redirect_to("/profile"))
        .await;
    println!("\ncallback outcome: {outcome:?}, now at {}", host.route());
    print_state("after callback", &controller.state());
    drop(controller);

    // Reload: the persisted mirror is available before the provider answers.
    let persisted = PersistedSession::load(&FileStorage::new(&storage_path))?;
    println!(
        "\npersisted before reload: user={:?} expires_at={:?}",
        persisted.user.as_ref().map(|u| u.sub.as_str()),
        persisted.expires_at
    );

    let controller = SessionController::builder(config)
        .storage(FileStorage::new(&storage_path))
        .mount(Arc::clone(&host), client(&provider))
        .await?;
    println!(
        "\nafter reload: authenticated={} user_id={:?}",
        controller.is_authenticated(),
        controller.user_id()
    );

    controller.logout();
    print_state("after logout", &controller.state());
    println!("\nroute after logout: {}", host.route());
    println!(
        "\npersisted after logout: {:?}",
        controller.persisted()?
    );

    Ok(())
}
