//! The host environment seam: where the app lives and how it navigates.

use std::sync::Arc;

/// The two things the controller needs from the application shell.
///
/// In a browser this is `window.location` plus the router. During server
/// rendering there is no location, so [`origin`](Self::origin) returns
/// `None` and the controller falls back to a fixed localhost origin (and
/// skips callback handling).
pub trait Host: Send + Sync + 'static {
    /// The app's origin, `scheme://host[:port]`, or `None` without a
    /// browser context.
    fn origin(&self) -> Option<String>;

    /// Moves the app to `route` (e.g. `"/"` after logout).
    fn navigate(&self, route: &str);
}

impl<H: Host> Host for Arc<H> {
    fn origin(&self) -> Option<String> {
        (**self).origin()
    }

    fn navigate(&self, route: &str) {
        (**self).navigate(route);
    }
}
