use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};

use super::config::ServerConfig;
use super::cookies;
use super::error::ServerError;
use super::extractor::{AccessToken, SignedInAccount};
use super::state::AppState;
use crate::coordinator::SessionCoordinator;
use crate::error::ErrorKind;
use crate::types::{AccountUri, SessionId};

/// Create the application router.
///
/// `sessions` is shared so the caller can keep a handle for inspection.
pub fn router(config: ServerConfig, sessions: Arc<SessionCoordinator>) -> Router {
    let state = AppState {
        client: Arc::new(config.client),
        sessions,
        settings: config.settings,
    };

    Router::new()
        .route("/", get(home))
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/logout", get(logout).post(logout))
        .route("/host", post(host))
        .route("/sessions/{session_id}", get(lookup_session))
        .route("/now-playing", get(now_playing))
        .with_state(state)
}

// ── Login ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginParams {
    error: Option<String>,
}

#[derive(Serialize)]
struct LoginFailed {
    error: String,
    login_url: &'static str,
}

async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(params): Query<LoginParams>,
) -> Response {
    // A failed attempt lands here with ?error=; bouncing straight back to the
    // provider would loop, so report it instead.
    if let Some(error) = params.error {
        let body = LoginFailed {
            error,
            login_url: "/login",
        };
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    }

    let auth_req = state.client.authorization_url();
    let state_cookie = cookies::state_cookie(&auth_req.state, state.settings.secure_cookies);

    (jar.add(state_cookie), Redirect::to(&auth_req.url)).into_response()
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn callback(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(PrivateCookieJar, Redirect), ServerError> {
    if let Some(error) = &params.error {
        tracing::warn!(error = %error, "authorization denied by provider");
        return Err(ServerError::Login("access_denied"));
    }

    let code = params.code.ok_or(ServerError::Login("missing_code"))?;
    let received_state = params.state.ok_or(ServerError::Login("state_mismatch"))?;
    let stored_state =
        cookies::value(&jar, cookies::STATE_COOKIE).ok_or(ServerError::Login("state_mismatch"))?;
    if received_state != stored_state {
        return Err(ServerError::Login("state_mismatch"));
    }

    let mut exchange = state.client.exchange();
    let authenticated = exchange.complete(&code).await.inspect_err(|e| {
        tracing::error!(error = %e, state = ?exchange.state(), "code exchange failed");
    })?;

    let secure = state.settings.secure_cookies;
    let token = &authenticated.token;
    let account = &authenticated.account;

    let mut jar = jar
        .remove(cookies::removal(cookies::STATE_COOKIE))
        .add(cookies::access_token_cookie(&token.access_token, secure))
        .add(cookies::account_uri_cookie(account.uri.as_str(), secure));
    if !token.refresh_token.is_empty() {
        jar = jar.add(cookies::refresh_token_cookie(&token.refresh_token, secure));
    }
    if let Some(url) = &account.profile_image_url {
        jar = jar.add(cookies::profile_picture_cookie(url, secure));
    }

    tracing::info!(account = %account.uri, "OAuth2 login successful");

    Ok((jar, Redirect::to("/")))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Redirect) {
    let jar = [
        cookies::STATE_COOKIE,
        cookies::ACCESS_TOKEN_COOKIE,
        cookies::REFRESH_TOKEN_COOKIE,
        cookies::ACCOUNT_URI_COOKIE,
        cookies::PROFILE_PICTURE_COOKIE,
    ]
    .into_iter()
    .fold(jar, |jar, name| jar.remove(cookies::removal(name)));

    (jar, Redirect::to("/login"))
}

// ── Home ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HomeResponse {
    account_uri: AccountUri,
    profile_image_url: Option<String>,
    session_id: Option<SessionId>,
}

async fn home(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    AccessToken(access_token): AccessToken,
) -> Result<Response, ServerError> {
    let account = match state.client.fetch_profile(&access_token).await {
        Ok(account) => account,
        Err(e) if e.kind() == ErrorKind::Auth => {
            tracing::info!(error = %e, "stored access token no longer valid");
            let jar = jar.remove(cookies::removal(cookies::ACCESS_TOKEN_COOKIE));
            return Ok((jar, Redirect::to("/login")).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let secure = state.settings.secure_cookies;
    let mut jar = jar.add(cookies::account_uri_cookie(account.uri.as_str(), secure));
    if let Some(url) = &account.profile_image_url {
        jar = jar.add(cookies::profile_picture_cookie(url, secure));
    }

    let body = HomeResponse {
        session_id: state.sessions.lookup_session_by_account(&account.uri),
        account_uri: account.uri,
        profile_image_url: account.profile_image_url,
    };
    Ok((jar, Json(body)).into_response())
}

// ── Hosting ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HostResponse {
    session_id: SessionId,
    account_uri: AccountUri,
    profile_image_url: Option<String>,
}

async fn host(State(state): State<AppState>, account: SignedInAccount) -> Json<HostResponse> {
    let session_id = state.sessions.create_session(&account.uri);
    Json(HostResponse {
        session_id,
        account_uri: account.uri,
        profile_image_url: account.profile_image_url,
    })
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: SessionId,
    account_uri: AccountUri,
}

async fn lookup_session(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session_id: SessionId = raw.parse().map_err(|_| ServerError::NotFound)?;
    let account_uri = state
        .sessions
        .lookup_account_by_session(&session_id)
        .ok_or(ServerError::NotFound)?;
    Ok(Json(SessionResponse {
        session_id,
        account_uri,
    }))
}

// ── Now playing ────────────────────────────────────────────────────

async fn now_playing(
    State(state): State<AppState>,
    AccessToken(access_token): AccessToken,
) -> Result<Response, ServerError> {
    match state.client.currently_playing(&access_token).await? {
        Some(track) => Ok(Json(track).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
