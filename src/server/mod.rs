//! Axum front end for the login flow and hosting sessions.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tunehost::{AppConfig, SessionCoordinator};
//! use tunehost::server::{ServerConfig, router};
//!
//! let app_config = AppConfig::from_env()?;
//! let server_config = ServerConfig::from_env(&app_config)?;
//! let app = router(server_config, Arc::new(SessionCoordinator::default()));
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod routes;
mod state;

pub use config::ServerConfig;
pub use error::ServerError;
pub use routes::router;

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
