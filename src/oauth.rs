use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::Rng;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, ErrorKind};
use crate::types::AccountUri;

/// Upper bound on each outbound provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Registered application credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    client_id: String,
    client_secret: String,
}

impl Credential {
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn has_secret(&self) -> bool {
        !self.client_secret.is_empty()
    }

    /// `Authorization` header value for the token endpoint.
    ///
    /// `Basic base64(client_id:client_secret)`
    #[must_use]
    pub fn basic_authorization(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Spotify `OAuth2` configuration.
///
/// Required fields are constructor parameters; endpoints default to Spotify's
/// and can be overridden for tests or proxies.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) credential: Credential,
    pub(crate) redirect_uri: Url,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) profile_url: Url,
    pub(crate) currently_playing_url: Url,
    pub(crate) scopes: Vec<String>,
    pub(crate) timeout: Duration,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(credential: Credential, redirect_uri: Url) -> Self {
        Self {
            credential,
            redirect_uri,
            auth_url: Url::parse("https://accounts.spotify.com/authorize")
                .expect("valid default URL"),
            token_url: Url::parse("https://accounts.spotify.com/api/token")
                .expect("valid default URL"),
            profile_url: Url::parse("https://api.spotify.com/v1/me").expect("valid default URL"),
            currently_playing_url: Url::parse(
                "https://api.spotify.com/v1/me/player/currently-playing",
            )
            .expect("valid default URL"),
            scopes: vec![
                "user-read-private".into(),
                "user-read-email".into(),
                "user-read-currently-playing".into(),
            ],
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn with_profile_url(mut self, url: Url) -> Self {
        self.profile_url = url;
        self
    }

    #[must_use]
    pub fn with_currently_playing_url(mut self, url: Url) -> Self {
        self.currently_playing_url = url;
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Per-request timeout (default: 10 s).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    #[must_use]
    pub fn profile_url(&self) -> &Url {
        &self.profile_url
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Consent-page URL plus the `state` value to remember until the callback.
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Tokens issued by the token endpoint. Never mutated after the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub scope: String,
}

/// The authenticated provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct Account {
    pub uri: AccountUri,
    pub profile_image_url: Option<String>,
}

/// Track currently playing on the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct NowPlaying {
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub album_art_url: Option<String>,
}

/// Result of a completed code exchange.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Authenticated {
    pub token: Token,
    pub account: Account,
}

// ── Wire shapes ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ImageJson {
    url: String,
}

#[derive(Deserialize)]
struct ProviderErrorJson {
    status: u16,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ProfileJson {
    #[serde(default)]
    images: Vec<ImageJson>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    error: Option<ProviderErrorJson>,
}

#[derive(Deserialize)]
struct NamedJson {
    name: String,
}

#[derive(Deserialize)]
struct AlbumJson {
    name: String,
    #[serde(default)]
    images: Vec<ImageJson>,
}

#[derive(Deserialize)]
struct TrackJson {
    name: String,
    album: AlbumJson,
    #[serde(default)]
    artists: Vec<NamedJson>,
}

#[derive(Deserialize)]
struct CurrentlyPlayingJson {
    #[serde(default)]
    item: Option<TrackJson>,
    #[serde(default)]
    error: Option<ProviderErrorJson>,
}

// ── Client ─────────────────────────────────────────────────────────

/// `OAuth2` authorization-code client for Spotify.
pub struct AuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl AuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the consent-page URL with a fresh `state` value.
    #[must_use]
    pub fn authorization_url(&self) -> AuthorizationRequest {
        let state = generate_state();
        let scope = self.config.scopes.join(" ");

        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", self.config.credential.client_id())
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &scope)
            .append_pair("state", &state);

        AuthorizationRequest {
            url: url.into(),
            state,
        }
    }

    /// Start a single-use exchange.
    #[must_use]
    pub fn exchange(&self) -> CodeExchange<'_> {
        CodeExchange {
            client: self,
            state: ExchangeState::AwaitingCode,
        }
    }

    /// Exchange `code` and fetch the account in one call.
    ///
    /// # Errors
    ///
    /// See [`CodeExchange::complete`].
    pub async fn authenticate(&self, code: &str) -> Result<Authenticated, Error> {
        self.exchange().complete(code).await
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] on network failure, timeout or a 5xx/429 status;
    /// [`Error::Rejected`] when the endpoint refuses the code or credentials;
    /// [`Error::Protocol`] when the body is not a usable token.
    pub async fn exchange_code(&self, code: &str) -> Result<Token, Error> {
        const OP: &str = "token exchange";

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .header(
                reqwest::header::AUTHORIZATION,
                self.config.credential.basic_authorization(),
            )
            .form(&params)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| Error::transport(OP, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(OP, &e))?;
        if !status.is_success() {
            return Err(status_error(OP, status.as_u16(), body));
        }

        let token: Token =
            serde_json::from_str(&body).map_err(|e| Error::protocol(OP, e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(Error::protocol(OP, "empty access_token"));
        }
        Ok(token)
    }

    /// Fetch the account behind `access_token`.
    ///
    /// # Errors
    ///
    /// [`Error::TokenExpired`] on HTTP 401 or an embedded status 401;
    /// [`Error::Transport`] / [`Error::Rejected`] for other provider errors;
    /// [`Error::Protocol`] when the body cannot be decoded.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<Account, Error> {
        const OP: &str = "profile request";

        let (status, body) = self.get_json(OP, &self.config.profile_url, access_token).await?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::TokenExpired);
        }

        let profile: ProfileJson =
            serde_json::from_str(&body).map_err(|e| Error::protocol(OP, e.to_string()))?;

        if let Some(err) = profile.error {
            return Err(embedded_error(OP, err));
        }
        if !status.is_success() {
            return Err(status_error(OP, status.as_u16(), body));
        }

        let uri = profile
            .uri
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::protocol(OP, "missing uri"))?;

        Ok(Account {
            uri: AccountUri(uri),
            profile_image_url: profile.images.into_iter().next().map(|i| i.url),
        })
    }

    /// Fetch the track currently playing, or `None` when nothing is.
    ///
    /// # Errors
    ///
    /// Same classification as [`fetch_profile`](Self::fetch_profile).
    pub async fn currently_playing(&self, access_token: &str) -> Result<Option<NowPlaying>, Error> {
        const OP: &str = "currently-playing request";

        let (status, body) = self
            .get_json(OP, &self.config.currently_playing_url, access_token)
            .await?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::TokenExpired);
        }
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(None);
        }

        let playing: CurrentlyPlayingJson =
            serde_json::from_str(&body).map_err(|e| Error::protocol(OP, e.to_string()))?;

        if let Some(err) = playing.error {
            return Err(embedded_error(OP, err));
        }
        if !status.is_success() {
            return Err(status_error(OP, status.as_u16(), body));
        }

        Ok(playing.item.map(|track| NowPlaying {
            title: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album: track.album.name,
            album_art_url: track.album.images.into_iter().next().map(|i| i.url),
        }))
    }

    /// Bearer GET; returns the status and raw body for the caller to classify.
    async fn get_json(
        &self,
        operation: &'static str,
        url: &Url,
        access_token: &str,
    ) -> Result<(StatusCode, String), Error> {
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(access_token)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| Error::transport(operation, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(operation, &e))?;
        Ok((status, body))
    }
}

// ── Exchange state machine ─────────────────────────────────────────

/// Where a [`CodeExchange`] currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    AwaitingCode,
    ExchangingToken,
    FetchingProfile,
    Authenticated,
    TokenExpired,
    Failed(ErrorKind),
}

impl ExchangeState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Authenticated | Self::TokenExpired | Self::Failed(_)
        )
    }
}

/// One authorization code → token → account run.
///
/// A code is single-use, so an exchange runs at most once.
pub struct CodeExchange<'a> {
    client: &'a AuthClient,
    state: ExchangeState,
}

impl CodeExchange<'_> {
    #[must_use]
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Run the exchange to a terminal state.
    ///
    /// # Errors
    ///
    /// Any error from [`AuthClient::exchange_code`] or
    /// [`AuthClient::fetch_profile`]; [`Error::Protocol`] if this exchange
    /// has already run.
    pub async fn complete(&mut self, code: &str) -> Result<Authenticated, Error> {
        self.complete_with_cancel(code, &CancellationToken::new())
            .await
    }

    /// Like [`complete`](Self::complete), but stops early once `cancel` fires.
    ///
    /// # Errors
    ///
    /// [`Error::Cancelled`] when cancelled, otherwise as `complete`.
    pub async fn complete_with_cancel(
        &mut self,
        code: &str,
        cancel: &CancellationToken,
    ) -> Result<Authenticated, Error> {
        if self.state != ExchangeState::AwaitingCode {
            return Err(Error::protocol(
                "code exchange",
                format!("exchange already in state {:?}", self.state),
            ));
        }

        let result = self.run(code, cancel).await;
        let terminal = match &result {
            Ok(_) => ExchangeState::Authenticated,
            Err(Error::TokenExpired) => ExchangeState::TokenExpired,
            Err(e) => ExchangeState::Failed(e.kind()),
        };
        self.transition(terminal);
        result
    }

    async fn run(&mut self, code: &str, cancel: &CancellationToken) -> Result<Authenticated, Error> {
        let client = self.client;

        self.transition(ExchangeState::ExchangingToken);
        let token = cancel
            .run_until_cancelled(client.exchange_code(code))
            .await
            .ok_or(Error::Cancelled {
                operation: "token exchange",
            })??;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled {
                operation: "profile request",
            });
        }

        self.transition(ExchangeState::FetchingProfile);
        let account = cancel
            .run_until_cancelled(client.fetch_profile(&token.access_token))
            .await
            .ok_or(Error::Cancelled {
                operation: "profile request",
            })??;

        Ok(Authenticated { token, account })
    }

    fn transition(&mut self, next: ExchangeState) {
        tracing::debug!(from = ?self.state, to = ?next, "code exchange transition");
        self.state = next;
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Generates a random `state` parameter for `OAuth2`.
///
/// Returns a 22-character URL-safe string (16 random bytes → base64url).
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: [u8; 16] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Maps a non-success HTTP status onto the error taxonomy.
fn status_error(operation: &'static str, status: u16, detail: String) -> Error {
    if status == 429 || status >= 500 {
        Error::Transport {
            operation,
            detail: format!("HTTP {status}: {detail}"),
        }
    } else {
        Error::Rejected {
            operation,
            status,
            detail,
        }
    }
}

fn embedded_error(operation: &'static str, err: ProviderErrorJson) -> Error {
    if err.status == 401 {
        Error::TokenExpired
    } else {
        status_error(operation, err.status, err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> OAuthConfig {
        OAuthConfig::new(
            Credential::new("abc", "xyz"),
            "http://localhost:8080/callback".parse().unwrap(),
        )
    }

    #[test]
    fn test_basic_authorization_header() {
        let credential = Credential::new("abc", "xyz");
        assert_eq!(credential.basic_authorization(), "Basic YWJjOnh5eg==");
    }

    #[test]
    fn test_credential_debug_hides_secret() {
        let debug = format!("{:?}", Credential::new("abc", "xyz"));
        assert!(debug.contains("abc"));
        assert!(!debug.contains("xyz"));
    }

    #[test]
    fn test_authorization_url_contains_params() {
        let client = AuthClient::new(test_config());
        let req = client.authorization_url();

        assert!(req.url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(req.url.contains("response_type=code"));
        assert!(req.url.contains("client_id=abc"));
        assert!(req.url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fcallback"));
        assert!(req.url.contains("scope=user-read-private+user-read-email"));
        assert!(req.url.contains(&format!("state={}", req.state)));
        assert!(!req.url.contains("xyz"));
    }

    #[test]
    fn test_state_unique_per_call() {
        let client = AuthClient::new(test_config());
        assert_ne!(client.authorization_url().state, client.authorization_url().state);
        assert_eq!(generate_state().len(), 22);
    }

    #[test]
    fn test_config_defaults_and_overrides() {
        let config = test_config();
        assert_eq!(config.token_url().as_str(), "https://accounts.spotify.com/api/token");
        assert_eq!(config.profile_url().as_str(), "https://api.spotify.com/v1/me");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);

        let config = config
            .with_token_url("http://127.0.0.1:9/api/token".parse().unwrap())
            .with_scopes(vec!["user-read-private".into()])
            .with_timeout(Duration::from_secs(2));
        assert_eq!(config.token_url().as_str(), "http://127.0.0.1:9/api/token");
        assert_eq!(config.scopes(), &["user-read-private"]);
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_token_optional_fields_default_empty() {
        let token: Token = serde_json::from_str(r#"{"access_token":"tok1"}"#).unwrap();
        assert_eq!(token.access_token, "tok1");
        assert!(token.refresh_token.is_empty());
        assert!(token.scope.is_empty());
    }

    #[test]
    fn test_status_error_classification() {
        assert_eq!(status_error("op", 503, String::new()).kind(), ErrorKind::Transport);
        assert_eq!(status_error("op", 429, String::new()).kind(), ErrorKind::Transport);
        assert_eq!(status_error("op", 400, String::new()).kind(), ErrorKind::Auth);
        let expired = ProviderErrorJson {
            status: 401,
            message: "The access token expired".into(),
        };
        assert!(matches!(embedded_error("op", expired), Error::TokenExpired));
    }

    #[test]
    fn test_new_exchange_awaits_code() {
        let client = AuthClient::new(test_config());
        let exchange = client.exchange();
        assert_eq!(exchange.state(), ExchangeState::AwaitingCode);
        assert!(!exchange.state().is_terminal());
        assert!(ExchangeState::Failed(ErrorKind::Transport).is_terminal());
    }
}
