//! Hook invoked when the session can no longer be recovered
//!
//! A browser front-end would navigate to the sign-in page here. The client
//! calls the navigator after clearing the stored credentials and before
//! returning the error to the caller whose request triggered the refresh.

use tracing::warn;

/// Receives the route the application should move to
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Default navigator: records the redirect in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        warn!(route, "Session ended, sign-in required");
    }
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect(&self, route: &str) {
        self(route);
    }
}
