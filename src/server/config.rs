use axum_extra::extract::cookie::Key;

use crate::config::AppConfig;
use crate::error::Error;
use crate::oauth::AuthClient;

/// Cookie settings shared by every handler.
#[derive(Clone)]
pub(crate) struct ServerSettings {
    pub(crate) cookie_key: Key,
    pub(crate) secure_cookies: bool,
}

impl ServerSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            secure_cookies: true,
        }
    }
}

/// HTTP layer configuration.
///
/// Use [`from_env()`](ServerConfig::from_env) alongside [`AppConfig`], or
/// [`new()`](ServerConfig::new) with `with_*` methods for full control.
pub struct ServerConfig {
    pub(super) client: AuthClient,
    pub(super) settings: ServerSettings,
}

impl ServerConfig {
    /// Create config with the required `AuthClient`.
    #[must_use]
    pub fn new(client: AuthClient) -> Self {
        Self {
            client,
            settings: ServerSettings::defaults(),
        }
    }

    /// Build from loaded app settings plus environment.
    ///
    /// # Optional env vars
    /// - `COOKIE_KEY`: cookie encryption key bytes (at least 64); an
    ///   ephemeral key is generated when unset
    /// - `DEV_COOKIES`: set to `"1"` or `"true"` to drop the `Secure` flag
    ///
    /// Otherwise cookies are marked `Secure` only when the redirect URI is `https`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `COOKIE_KEY` is set but too short.
    pub fn from_env(app: &AppConfig) -> Result<Self, Error> {
        Self::from_lookup(app, |key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(
        app: &AppConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let cookie_key = match lookup("COOKIE_KEY") {
            Some(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                Error::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            None => {
                tracing::warn!("COOKIE_KEY not set, cookies will not survive a restart");
                Key::generate()
            }
        };

        let dev_cookies = matches!(lookup("DEV_COOKIES").as_deref(), Some("1") | Some("true"));
        if dev_cookies {
            tracing::warn!("DEV_COOKIES enabled, cookies are sent without the Secure flag");
        }
        let secure = !dev_cookies && app.redirect_uri.scheme() == "https";

        Ok(Self::new(AuthClient::new(app.oauth_config()))
            .with_cookie_key(cookie_key)
            .with_secure_cookies(secure))
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }
}
