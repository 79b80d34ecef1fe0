use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::error::{Error, ErrorKind};

/// Handler errors for the HTTP layer.
///
/// Internal detail is logged, never sent to the browser.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No usable access token or account cookie.
    #[error("Not authenticated")]
    Unauthenticated,

    /// OAuth2 callback problem (state mismatch, provider error, missing code).
    #[error("Login failed: {0}")]
    Login(&'static str),

    /// Unknown hosting session.
    #[error("Session not found")]
    NotFound,

    /// Provider call failed.
    #[error(transparent)]
    Provider(#[from] Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => Redirect::to("/login").into_response(),
            Self::Login(code) => {
                tracing::warn!(code, "OAuth login failed");
                let encoded = urlencoding::encode(code);
                Redirect::to(&format!("/login?error={encoded}")).into_response()
            }
            Self::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            Self::Provider(ref err) => match err.kind() {
                ErrorKind::Auth => {
                    tracing::info!(error = %err, "provider rejected credentials, restarting login");
                    Redirect::to("/login").into_response()
                }
                ErrorKind::Transport | ErrorKind::Cancelled => {
                    tracing::warn!(error = %err, "provider unavailable");
                    (StatusCode::SERVICE_UNAVAILABLE, "Upstream unavailable").into_response()
                }
                ErrorKind::Protocol | ErrorKind::Config => {
                    tracing::error!(error = %err, "provider call failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    #[test]
    fn test_token_expired_redirects_to_login() {
        let response = ServerError::Provider(Error::TokenExpired).into_response();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[LOCATION], "/login");
    }

    #[test]
    fn test_transport_error_is_503() {
        let err = Error::Transport {
            operation: "profile request",
            detail: "connection refused".into(),
        };
        let response = ServerError::Provider(err).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_login_error_carries_code() {
        let response = ServerError::Login("state_mismatch").into_response();
        assert_eq!(response.headers()[LOCATION], "/login?error=state_mismatch");
    }
}
