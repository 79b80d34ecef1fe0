use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::PrivateCookieJar;

use super::cookies;
use super::error::ServerError;
use super::state::AppState;
use crate::types::AccountUri;

/// Access token read from the encrypted cookie set by `/callback`.
///
/// Rejects with a redirect to `/login` when absent.
#[derive(Debug, Clone)]
pub(crate) struct AccessToken(pub(crate) String);

impl FromRequestParts<AppState> for AccessToken {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = private_jar(parts, state).await?;
        cookies::value(&jar, cookies::ACCESS_TOKEN_COOKIE)
            .map(Self)
            .ok_or(ServerError::Unauthenticated)
    }
}

/// Account recorded by the last successful profile fetch.
#[derive(Debug, Clone)]
pub(crate) struct SignedInAccount {
    pub(crate) uri: AccountUri,
    pub(crate) profile_image_url: Option<String>,
}

impl FromRequestParts<AppState> for SignedInAccount {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = private_jar(parts, state).await?;
        let uri = cookies::value(&jar, cookies::ACCOUNT_URI_COOKIE)
            .ok_or(ServerError::Unauthenticated)?;
        Ok(Self {
            uri: AccountUri(uri),
            profile_image_url: cookies::value(&jar, cookies::PROFILE_PICTURE_COOKIE),
        })
    }
}

async fn private_jar(parts: &mut Parts, state: &AppState) -> Result<PrivateCookieJar, ServerError> {
    PrivateCookieJar::from_request_parts(parts, state)
        .await
        .map_err(|_| ServerError::Unauthenticated)
}
