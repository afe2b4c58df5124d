//! Handlers for department events and their comment threads.
//!
//! | Method   | Path                  | Notes |
//! |----------|-----------------------|-------|
//! | `GET`    | `/events`             | `?upcoming=true` hides past events |
//! | `POST`   | `/events`             | Admins and supervisors |
//! | `GET`    | `/events/:id`         | Event with its comments |
//! | `DELETE` | `/events/:id`         | Admin or creator |
//! | `GET`    | `/events/:id/comments`| Oldest first |
//! | `POST`   | `/events/:id/comments`| Any signed-in user |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use scholar_core::{
  access::{self, Actor},
  forum::{Comment, Event, NewEvent},
  store::PortalStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, allow, require};

async fn load<S: PortalStore>(store: &S, id: Uuid) -> Result<Event, ApiError> {
  store
    .get_event(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  #[serde(default)]
  pub upcoming: bool,
}

/// `GET /events[?upcoming=true]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Extension(_actor): Extension<Actor>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: PortalStore,
{
  let after = params.upcoming.then(Utc::now);
  let events = store.list_events(after).await.map_err(ApiError::store)?;
  Ok(Json(events))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:       String,
  #[serde(default)]
  pub description: String,
  pub starts_at:   DateTime<Utc>,
  #[serde(default)]
  pub location:    Option<String>,
}

/// `POST /events`: returns 201 + the event.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PortalStore,
{
  allow(access::can_create_event(&actor))?;
  require("title", &body.title)?;

  let event = store
    .create_event(NewEvent {
      title:       body.title.trim().to_owned(),
      description: body.description,
      starts_at:   body.starts_at,
      location:    body.location,
      created_by:  actor.user_id,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(event_id = %event.event_id, "event created");
  Ok((StatusCode::CREATED, Json(event)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct EventDetail {
  #[serde(flatten)]
  pub event:    Event,
  pub comments: Vec<Comment>,
}

/// `GET /events/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Extension(_actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<Json<EventDetail>, ApiError>
where
  S: PortalStore,
{
  let event = load(store.as_ref(), id).await?;
  let comments = store.list_comments(id).await.map_err(ApiError::store)?;
  Ok(Json(EventDetail { event, comments }))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /events/:id`: comments go with it.
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PortalStore,
{
  let event = load(store.as_ref(), id).await?;
  allow(access::can_delete_event(&actor, &event))?;
  store.delete_event(id).await.map_err(ApiError::store)?;

  tracing::info!(event_id = %id, "event deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Comments ─────────────────────────────────────────────────────────────────

/// `GET /events/:id/comments`
pub async fn list_comments<S>(
  State(store): State<Arc<S>>,
  Extension(_actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: PortalStore,
{
  load(store.as_ref(), id).await?;
  let comments = store.list_comments(id).await.map_err(ApiError::store)?;
  Ok(Json(comments))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body: String,
}

/// `POST /events/:id/comments`: returns 201 + the comment.
pub async fn add_comment<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PortalStore,
{
  require("body", &body.body)?;
  load(store.as_ref(), id).await?;
  let comment = store
    .add_comment(id, actor.user_id, body.body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}
