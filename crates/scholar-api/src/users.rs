//! Handlers for `/users` endpoints.
//!
//! | Method   | Path          | Notes |
//! |----------|---------------|-------|
//! | `GET`    | `/users`      | Admin only; optional `?role=` |
//! | `POST`   | `/users`      | Admin only; body: [`CreateBody`] |
//! | `GET`    | `/users/:id`  | Admin, or the user themself |
//! | `DELETE` | `/users/:id`  | Admin only; soft delete + session revocation |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use scholar_core::{
  access::Actor,
  store::PortalStore,
  user::{NewUser, Role, User, normalize_email},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::{ApiError, allow, require},
  password,
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role: Option<Role>,
}

/// `GET /users[?role=<role>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: PortalStore,
{
  allow(actor.is_admin())?;
  let users = store.list_users(params.role).await.map_err(ApiError::store)?;
  Ok(Json(users))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub email:    String,
  pub name:     String,
  pub role:     Role,
  pub password: String,
}

/// `POST /users`: returns 201 + the new account; 409 if the email is taken.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PortalStore,
{
  allow(actor.is_admin())?;
  require("name", &body.name)?;
  let email = normalize_email(&body.email);
  if !email.contains('@') {
    return Err(ApiError::BadRequest(format!("invalid email: {email:?}")));
  }
  password::validate(&body.password)?;

  let existing = store
    .find_user_by_email(&email)
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::Conflict(format!("{email} is already registered")));
  }

  let user = store
    .create_user(NewUser {
      email,
      name: body.name.trim().to_owned(),
      role: body.role,
      password_hash: password::hash(&body.password)?,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = %user.user_id, role = user.role.as_ref(), "user created");
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /users/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: PortalStore,
{
  allow(actor.is_admin() || actor.user_id == id)?;
  let user = store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /users/:id`: soft delete. The account keeps its row so that
/// authored content still resolves, but it can no longer sign in and its
/// scholar profile drops out of upcoming views.
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PortalStore,
{
  allow(actor.is_admin())?;
  if actor.user_id == id {
    return Err(ApiError::BadRequest("cannot delete your own account".into()));
  }

  let deleted = store.soft_delete_user(id).await.map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("user {id} not found")));
  }
  store.delete_user_sessions(id).await.map_err(ApiError::store)?;

  tracing::info!(user_id = %id, "user soft-deleted");
  Ok(StatusCode::NO_CONTENT)
}
