/// Broad classification of an [`Error`], used by callers to pick a recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, DNS or timeout failure. Safe to retry.
    Transport,
    /// Malformed or unexpected response. Retrying will not help.
    Protocol,
    /// Expired token or rejected code. The user must restart the login flow.
    Auth,
    /// Missing or invalid configuration. Fatal at start-up.
    Config,
    /// The caller abandoned the exchange.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{operation} failed: {detail}")]
    Transport {
        operation: &'static str,
        detail: String,
    },

    #[error("{operation} returned an invalid response: {detail}")]
    Protocol {
        operation: &'static str,
        detail: String,
    },

    #[error("{operation} rejected with HTTP {status}: {detail}")]
    Rejected {
        operation: &'static str,
        status: u16,
        detail: String,
    },

    #[error("access token expired")]
    TokenExpired,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Protocol { .. } | Self::InvalidSessionId(_) => ErrorKind::Protocol,
            Self::Rejected { .. } | Self::TokenExpired => ErrorKind::Auth,
            Self::Config(_) => ErrorKind::Config,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Whether repeating the same call might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    #[cfg(feature = "oauth")]
    pub(crate) fn transport(operation: &'static str, err: &reqwest::Error) -> Self {
        let detail = if err.is_timeout() {
            "timed out".to_string()
        } else {
            err.to_string()
        };
        Self::Transport { operation, detail }
    }

    #[cfg(feature = "oauth")]
    pub(crate) fn protocol(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Protocol {
            operation,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_retryable() {
        let transport = Error::Transport {
            operation: "token exchange",
            detail: "connection refused".into(),
        };
        assert!(transport.is_retryable());
        assert!(!Error::TokenExpired.is_retryable());
        let protocol = Error::Protocol {
            operation: "profile request",
            detail: "bad json".into(),
        };
        assert!(!protocol.is_retryable());
        assert!(!Error::Config("missing client_id".into()).is_retryable());
    }

    #[test]
    fn test_rejected_code_is_auth() {
        let err = Error::Rejected {
            operation: "token exchange",
            status: 400,
            detail: "invalid_grant".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(Error::TokenExpired.kind(), ErrorKind::Auth);
    }

    #[test]
    fn test_display_names_operation() {
        let err = Error::Cancelled {
            operation: "profile request",
        };
        assert_eq!(err.to_string(), "profile request cancelled");
    }
}
