use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Provider account URI (e.g. `spotify:user:1`).
///
/// Stable per provider account; the join key between login and hosting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct AccountUri(pub String);

impl AccountUri {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountUri {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Public hosting session identifier.
///
/// Guaranteed non-empty ASCII alphanumeric by construction.
/// Use `"aB3dE5gH7jK9mN1".parse::<SessionId>()` or `SessionId::try_from(string)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps a string the generator built from the alphanumeric alphabet.
    pub(crate) fn from_generated(s: String) -> Self {
        debug_assert!(is_valid_session_id(&s));
        Self(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for SessionId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if is_valid_session_id(&s) {
            Ok(Self(s))
        } else {
            Err(Error::InvalidSessionId(s))
        }
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

fn is_valid_session_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_session_id() {
        assert!("aB3dE5gH7jK9mN1".parse::<SessionId>().is_ok());
        assert!("x".parse::<SessionId>().is_ok());
    }

    #[test]
    fn invalid_session_id() {
        assert!("".parse::<SessionId>().is_err());
        assert!("abc-def".parse::<SessionId>().is_err());
        assert!("abc def".parse::<SessionId>().is_err());
        assert!("ümlaut".parse::<SessionId>().is_err());
    }

    #[test]
    fn session_id_serde_rejects_invalid() {
        let parsed: SessionId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(parsed.as_str(), "abc123");
        assert!(serde_json::from_str::<SessionId>("\"../etc\"").is_err());
    }

    #[test]
    fn account_uri_from_str() {
        let uri = AccountUri::from("spotify:user:1");
        assert_eq!(uri.to_string(), "spotify:user:1");
        assert_eq!(serde_json::to_string(&uri).unwrap(), "\"spotify:user:1\"");
    }
}
