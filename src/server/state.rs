use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::ServerSettings;
use crate::coordinator::SessionCoordinator;
use crate::oauth::AuthClient;

/// Shared state for route handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) client: Arc<AuthClient>,
    pub(crate) sessions: Arc<SessionCoordinator>,
    pub(crate) settings: ServerSettings,
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.settings.cookie_key.clone()
    }
}
