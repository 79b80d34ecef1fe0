use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::error::Error;
use crate::oauth::{Credential, OAuthConfig};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Process-wide settings, loaded once at start-up and never mutated.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AppConfig {
    pub credential: Credential,
    pub port: u16,
    pub redirect_uri: Url,
    pub scopes: Option<Vec<String>>,
}

impl AppConfig {
    /// Create config with defaults for everything but the credential.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            port: DEFAULT_PORT,
            redirect_uri: default_redirect_uri(DEFAULT_PORT),
            scopes: None,
        }
    }

    /// Load credentials from a JSON file: `{"client_id": ..., "client_secret": ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file is unreadable, malformed, or has
    /// empty credentials.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let credential = read_credential_file(path.as_ref())?;
        Ok(Self::new(credential))
    }

    /// Create config from environment variables.
    ///
    /// # Env vars
    /// - `TUNEHOST_CLIENT_ID` / `TUNEHOST_CLIENT_SECRET`: credentials; when
    ///   either is unset they come from the file below instead
    /// - `TUNEHOST_CONFIG`: credentials file (default `config.json`)
    /// - `TUNEHOST_PORT`: listen port (default 8080)
    /// - `TUNEHOST_REDIRECT_URI`: callback URL (default `http://localhost:<port>/callback`)
    /// - `TUNEHOST_SCOPES`: comma-separated OAuth2 scopes
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if credentials are missing or a value is invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let credential = match (lookup("TUNEHOST_CLIENT_ID"), lookup("TUNEHOST_CLIENT_SECRET")) {
            (Some(id), Some(secret)) => checked_credential(Credential::new(id, secret))?,
            _ => {
                let path = lookup("TUNEHOST_CONFIG")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
                read_credential_file(&path)?
            }
        };

        let port = match lookup("TUNEHOST_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("TUNEHOST_PORT: {e}")))?,
            None => DEFAULT_PORT,
        };

        let redirect_uri = match lookup("TUNEHOST_REDIRECT_URI") {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("TUNEHOST_REDIRECT_URI: {e}")))?,
            None => default_redirect_uri(port),
        };

        let scopes = lookup("TUNEHOST_SCOPES").map(|s| {
            s.split(',')
                .map(|scope| scope.trim().to_string())
                .filter(|scope| !scope.is_empty())
                .collect()
        });

        Ok(Self {
            credential,
            port,
            redirect_uri,
            scopes,
        })
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_redirect_uri(mut self, uri: Url) -> Self {
        self.redirect_uri = uri;
        self
    }

    /// The `OAuth2` client configuration derived from these settings.
    #[must_use]
    pub fn oauth_config(&self) -> OAuthConfig {
        let config = OAuthConfig::new(self.credential.clone(), self.redirect_uri.clone());
        match &self.scopes {
            Some(scopes) => config.with_scopes(scopes.clone()),
            None => config,
        }
    }
}

#[derive(Deserialize)]
struct CredentialFile {
    client_id: String,
    client_secret: String,
}

fn read_credential_file(path: &Path) -> Result<Credential, Error> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    let file: CredentialFile = serde_json::from_str(&raw)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    checked_credential(Credential::new(file.client_id, file.client_secret))
}

fn checked_credential(credential: Credential) -> Result<Credential, Error> {
    if credential.client_id().is_empty() {
        return Err(Error::Config("client_id is required".into()));
    }
    if !credential.has_secret() {
        return Err(Error::Config("client_secret is required".into()));
    }
    Ok(credential)
}

fn default_redirect_uri(port: u16) -> Url {
    Url::parse(&format!("http://localhost:{port}/callback")).expect("valid default URL")
}
