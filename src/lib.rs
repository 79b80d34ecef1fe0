#![doc = include_str!("../README.md")]

#[cfg(feature = "oauth")]
pub mod config;
pub mod coordinator;
pub mod error;
#[cfg(feature = "oauth")]
pub mod oauth;
#[cfg(feature = "server")]
pub mod server;
pub mod session_id;
pub mod store;
pub mod types;

// Re-exports for convenient access
#[cfg(feature = "oauth")]
pub use config::AppConfig;
pub use coordinator::SessionCoordinator;
pub use error::{Error, ErrorKind};
#[cfg(feature = "oauth")]
pub use oauth::{
    Account, AuthClient, Authenticated, AuthorizationRequest, CodeExchange, Credential,
    ExchangeState, NowPlaying, OAuthConfig, Token,
};
pub use session_id::{SESSION_ID_LENGTH, SessionIdGenerator};
pub use store::KeyValueStore;
pub use types::{AccountUri, SessionId};
