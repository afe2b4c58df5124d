//! Handlers for `/scholars` profile endpoints.
//!
//! | Method | Path                     | Notes |
//! |--------|--------------------------|-------|
//! | `GET`  | `/scholars`              | Scoped by role |
//! | `POST` | `/scholars`              | Admin only; links a scholar-role account |
//! | `GET`  | `/scholars/:id`          | Admin, assigned supervisor, or owner |
//! | `PUT`  | `/scholars/:id`          | Admin or assigned supervisor |
//! | `POST` | `/scholars/:id/courses`  | Admin or assigned supervisor |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use scholar_core::{
  access::{self, Actor},
  scholar::{Course, Coursework, LinkedScholar, NewScholar, Scholar},
  store::PortalStore,
  user::Role,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, allow, require};

/// Fetch a scholar or 404.
pub(crate) async fn load<S: PortalStore>(
  store: &S,
  id: Uuid,
) -> Result<Scholar, ApiError> {
  store
    .get_scholar(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("scholar {id} not found")))
}

/// Apply `edit` to a scholar the actor may manage, as one atomic store
/// update. Nothing is written if the access check or `edit` fails.
pub(crate) async fn edit_managed<S, T, F>(
  store: &S,
  actor: Actor,
  id: Uuid,
  edit: F,
) -> Result<T, ApiError>
where
  S: PortalStore,
  F: FnOnce(&mut Scholar) -> Result<T, ApiError> + Send + 'static,
  T: Send + 'static,
{
  store
    .update_scholar(id, move |scholar| {
      allow(access::can_manage_scholar(&actor, scholar))?;
      edit(scholar)
    })
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("scholar {id} not found")))?
}

/// Require that `id` names an active account holding `role`.
async fn require_account<S: PortalStore>(
  store: &S,
  id: Uuid,
  role: Role,
) -> Result<(), ApiError> {
  let user = store.get_user(id).await.map_err(ApiError::store)?;
  match user {
    Some(u) if u.is_active() && u.role == role => Ok(()),
    _ => Err(ApiError::BadRequest(format!(
      "{id} is not an active {} account",
      role.as_ref()
    ))),
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /scholars`: admins see every profile (including those whose account
/// was deleted), supervisors see their own scholars, scholars see themselves.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<LinkedScholar>>, ApiError>
where
  S: PortalStore,
{
  let scope = actor.scope();
  let mut scholars = store.list_linked_scholars().await.map_err(ApiError::store)?;
  scholars.retain(|l| scope.admits_linked(l));
  Ok(Json(scholars))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub user_id:           Uuid,
  pub supervisor_id:     Option<Uuid>,
  pub enrollment_number: String,
  pub department:        String,
  pub research_area:     Option<String>,
  pub joined_on:         Option<NaiveDate>,
}

/// `POST /scholars`: returns 201 + the new profile.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PortalStore,
{
  allow(actor.is_admin())?;
  require("enrollment_number", &body.enrollment_number)?;
  require("department", &body.department)?;
  require_account(store.as_ref(), body.user_id, Role::Scholar).await?;
  if let Some(sup) = body.supervisor_id {
    require_account(store.as_ref(), sup, Role::Supervisor).await?;
  }

  let existing = store
    .find_scholar_by_user(body.user_id)
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::Conflict(format!(
      "account {} already has a scholar profile",
      body.user_id
    )));
  }

  let scholar = store
    .create_scholar(NewScholar {
      user_id:           body.user_id,
      supervisor_id:     body.supervisor_id,
      enrollment_number: body.enrollment_number,
      department:        body.department,
      research_area:     body.research_area,
      joined_on:         body.joined_on,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(scholar_id = %scholar.scholar_id, "scholar profile created");
  Ok((StatusCode::CREATED, Json(scholar)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /scholars/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<Json<Scholar>, ApiError>
where
  S: PortalStore,
{
  let scholar = load(store.as_ref(), id).await?;
  allow(access::can_view_scholar(&actor, &scholar))?;
  Ok(Json(scholar))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateBody {
  pub enrollment_number: Option<String>,
  pub department:        Option<String>,
  pub research_area:     Option<String>,
  pub joined_on:         Option<NaiveDate>,
  /// Reassigning the supervisor is reserved for admins.
  pub supervisor_id:     Option<Uuid>,
}

/// `PUT /scholars/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Scholar>, ApiError>
where
  S: PortalStore,
{
  if let Some(sup) = body.supervisor_id {
    allow(actor.is_admin())?;
    require_account(store.as_ref(), sup, Role::Supervisor).await?;
  }
  if let Some(n) = &body.enrollment_number {
    require("enrollment_number", n)?;
  }
  if let Some(d) = &body.department {
    require("department", d)?;
  }

  let scholar = edit_managed(store.as_ref(), actor, id, move |scholar| {
    if body.supervisor_id.is_some() {
      scholar.supervisor_id = body.supervisor_id;
    }
    if let Some(n) = body.enrollment_number {
      scholar.enrollment_number = n;
    }
    if let Some(d) = body.department {
      scholar.department = d;
    }
    if body.research_area.is_some() {
      scholar.research_area = body.research_area;
    }
    if body.joined_on.is_some() {
      scholar.joined_on = body.joined_on;
    }
    Ok(scholar.clone())
  })
  .await?;
  Ok(Json(scholar))
}

// ─── Coursework ───────────────────────────────────────────────────────────────

/// `POST /scholars/:id/courses`: body: a [`Course`]. Returns the updated
/// coursework record.
pub async fn add_course<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
  Json(course): Json<Course>,
) -> Result<Json<Coursework>, ApiError>
where
  S: PortalStore,
{
  require("code", &course.code)?;
  require("title", &course.title)?;
  if !(course.credits.is_finite() && course.credits > 0.0) {
    return Err(ApiError::BadRequest("credits must be positive".into()));
  }

  let coursework = edit_managed(store.as_ref(), actor, id, move |scholar| {
    let coursework = scholar.coursework.get_or_insert_with(Coursework::default);
    if coursework.courses.iter().any(|c| c.code == course.code) {
      return Err(ApiError::Conflict(format!(
        "course {} already recorded",
        course.code
      )));
    }
    coursework.courses.push(course);
    Ok(coursework.clone())
  })
  .await?;
  Ok(Json(coursework))
}
