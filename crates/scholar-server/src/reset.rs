//! Password reset by emailed single-use token.
//!
//! | Method | Path                           | Notes |
//! |--------|--------------------------------|-------|
//! | `POST` | `/auth/password-reset`         | Always 202 |
//! | `POST` | `/auth/password-reset/confirm` | 204; revokes every session |

use axum::{Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use scholar_api::password;
use scholar_core::{
  session::PasswordReset,
  store::PortalStore,
  user::{User, normalize_email},
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{hash_token, new_token},
  error::Error,
  mail,
};

#[derive(Debug, Deserialize)]
pub struct RequestBody {
  pub email: String,
}

/// `POST /auth/password-reset`
///
/// The response never reveals whether the address belongs to an account.
pub async fn request<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RequestBody>,
) -> Result<StatusCode, Error>
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

  let Some(user) = user else {
    tracing::info!(%email, "password reset requested for unknown account");
    return Ok(StatusCode::ACCEPTED);
  };

  let now = Utc::now();
  let (token, token_hash) = new_token();
  state
    .store
    .create_password_reset(PasswordReset {
      token_hash,
      user_id: user.user_id,
      created_at: now,
      expires_at: now + Duration::minutes(state.config.reset_ttl_minutes),
      used_at: None,
    })
    .await
    .map_err(Error::store)?;

  let message = mail::reset_message(&user.email, &state.config.base_url, &token);
  if let Err(e) = state.mailer.send(message) {
    tracing::warn!(user_id = %user.user_id, error = %e, "reset mail not delivered");
  } else {
    tracing::info!(user_id = %user.user_id, "password reset issued");
  }
  Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
  pub token:        String,
  pub new_password: String,
}

/// `POST /auth/password-reset/confirm`
pub async fn confirm<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<ConfirmBody>,
) -> Result<StatusCode, Error>
where
  S: PortalStore + 'static,
{
  password::validate(&body.new_password)?;
  let phc = password::hash(&body.new_password)?;

  let digest = hash_token(body.token.trim());
  let reset = state
    .store
    .redeem_password_reset(&digest, Utc::now())
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::BadRequest("invalid or expired reset token".into()))?;

  state
    .store
    .set_password_hash(reset.user_id, phc)
    .await
    .map_err(Error::store)?;
  state
    .store
    .delete_user_sessions(reset.user_id)
    .await
    .map_err(Error::store)?;

  tracing::info!(user_id = %reset.user_id, "password reset completed");
  Ok(StatusCode::NO_CONTENT)
}
