//! Session authentication.
//!
//! A successful login mints a random token, stores only its SHA-256 digest,
//! and hands the raw token to the client in the `scholar_session` cookie.
//! Requests may present the token either as that cookie or as
//! `Authorization: Bearer <token>`. [`require_session`] resolves it to an
//! [`Actor`] and inserts it into the request extensions for the API layer.

use axum::{
  Extension, Json,
  extract::{Request, State},
  http::{HeaderMap, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};
use scholar_api::password;
use scholar_core::{
  access::Actor,
  session::Session,
  store::PortalStore,
  user::{User, normalize_email},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{AppState, error::Error};

pub const SESSION_COOKIE: &str = "scholar_session";

// ─── Tokens ───────────────────────────────────────────────────────────────────

/// Mint a fresh random token. Returns `(token, digest)`; only the digest is
/// ever persisted.
pub fn new_token() -> (String, String) {
  let mut raw = [0u8; 32];
  OsRng.fill_bytes(&mut raw);
  let token = URL_SAFE_NO_PAD.encode(raw);
  let digest = hash_token(&token);
  (token, digest)
}

pub fn hash_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// The session token carried by a request, bearer header first.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty());
  bearer.or_else(|| cookie_value(headers, SESSION_COOKIE))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(k, v)| *k == name && !v.is_empty())
    .map(|(_, v)| v)
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
  format!(
    "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}"
  )
}

// ─── Middleware ───────────────────────────────────────────────────────────────

/// Resolve a raw token to the acting user. Expired sessions are removed on
/// sight; sessions of deleted accounts are rejected.
pub async fn resolve_session<S>(
  state: &AppState<S>,
  token: &str,
) -> Result<Actor, Error>
where
  S: PortalStore,
{
  let digest = hash_token(token);
  let session = state
    .store
    .get_session(&digest)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;

  if session.is_expired(Utc::now()) {
    state.store.delete_session(&digest).await.map_err(Error::store)?;
    tracing::debug!(user_id = %session.user_id, "expired session rejected");
    return Err(Error::Unauthorized);
  }

  let user = state
    .store
    .get_user(session.user_id)
    .await
    .map_err(Error::store)?
    .filter(User::is_active)
    .ok_or(Error::Unauthorized)?;

  Ok(Actor { user_id: user.user_id, role: user.role })
}

/// Reject requests without a live session; otherwise attach the [`Actor`].
pub async fn require_session<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: PortalStore + 'static,
{
  let token = session_token(req.headers())
    .ok_or(Error::Unauthorized)?
    .to_owned();
  let actor = resolve_session(&state, &token).await?;
  req.extensions_mut().insert(actor);
  Ok(next.run(req).await)
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`: sets the session cookie and returns the account.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Response, Error>
where
  S: PortalStore + 'static,
{
  let email = normalize_email(&body.email);
  let user = state
    .store
    .find_user_by_email(&email)
    .await
    .map_err(Error::store)?
    .filter(User::is_active);

  let Some(user) = user.filter(|u| password::verify(&body.password, &u.password_hash))
  else {
    tracing::info!(%email, "login rejected");
    return Err(Error::Unauthorized);
  };

  let ttl = Duration::hours(state.config.session_ttl_hours);
  let now = Utc::now();
  let (token, token_hash) = new_token();
  state
    .store
    .create_session(Session {
      token_hash,
      user_id: user.user_id,
      created_at: now,
      expires_at: now + ttl,
    })
    .await
    .map_err(Error::store)?;

  tracing::info!(user_id = %user.user_id, "login");
  let cookie = session_cookie(&token, ttl.num_seconds());
  Ok(([(header::SET_COOKIE, cookie)], Json(user)).into_response())
}

/// `POST /auth/logout`: revokes the presented session and clears the cookie.
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: PortalStore + 'static,
{
  if let Some(token) = session_token(&headers) {
    state
      .store
      .delete_session(&hash_token(token))
      .await
      .map_err(Error::store)?;
  }
  Ok(
    (
      StatusCode::NO_CONTENT,
      [(header::SET_COOKIE, session_cookie("", 0))],
    )
      .into_response(),
  )
}

/// `GET /auth/me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<Actor>,
) -> Result<Json<User>, Error>
where
  S: PortalStore + 'static,
{
  let user = state
    .store
    .get_user(actor.user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;
  Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
  pub current_password: String,
  pub new_password:     String,
}

/// `POST /auth/password`
pub async fn change_password<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<Actor>,
  Json(body): Json<ChangePasswordBody>,
) -> Result<StatusCode, Error>
where
  S: PortalStore + 'static,
{
  let user = state
    .store
    .get_user(actor.user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;
  if !password::verify(&body.current_password, &user.password_hash) {
    return Err(Error::Forbidden);
  }
  password::validate(&body.new_password)?;

  let phc = password::hash(&body.new_password)?;
  state
    .store
    .set_password_hash(user.user_id, phc)
    .await
    .map_err(Error::store)?;

  tracing::info!(user_id = %user.user_id, "password changed");
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn tokens_are_unique_and_hashed() {
    let (a, ha) = new_token();
    let (b, hb) = new_token();
    assert_ne!(a, b);
    assert_eq!(a.len(), 43);
    assert_eq!(ha, hash_token(&a));
    assert_ne!(ha, hb);
    assert_eq!(ha.len(), 64);
  }

  #[test]
  fn bearer_takes_precedence_over_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      HeaderValue::from_static("theme=dark; scholar_session=from-cookie"),
    );
    assert_eq!(session_token(&headers), Some("from-cookie"));

    headers.insert(
      header::AUTHORIZATION,
      HeaderValue::from_static("Bearer from-header"),
    );
    assert_eq!(session_token(&headers), Some("from-header"));
  }

  #[test]
  fn missing_or_empty_token_is_none() {
    let mut headers = HeaderMap::new();
    assert_eq!(session_token(&headers), None);
    headers.insert(header::COOKIE, HeaderValue::from_static("scholar_session="));
    assert_eq!(session_token(&headers), None);
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert_eq!(session_token(&headers), None);
  }
}
