//! Handlers for discussion threads.
//!
//! | Method | Path                 | Notes |
//! |--------|----------------------|-------|
//! | `GET`  | `/threads`           | Newest first |
//! | `POST` | `/threads`           | Title + opening post |
//! | `GET`  | `/threads/:id`       | Thread with its posts |
//! | `POST` | `/threads/:id/posts` | Reply |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use scholar_core::{
  access::Actor,
  forum::{Post, Thread},
  store::PortalStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, require};

async fn load<S: PortalStore>(store: &S, id: Uuid) -> Result<Thread, ApiError> {
  store
    .get_thread(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("thread {id} not found")))
}

#[derive(Debug, Serialize)]
pub struct ThreadDetail {
  pub thread: Thread,
  pub posts:  Vec<Post>,
}

/// `GET /threads`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Extension(_actor): Extension<Actor>,
) -> Result<Json<Vec<Thread>>, ApiError>
where
  S: PortalStore,
{
  let threads = store.list_threads().await.map_err(ApiError::store)?;
  Ok(Json(threads))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title: String,
  pub body:  String,
}

/// `POST /threads`: returns 201 + the thread with its opening post.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PortalStore,
{
  require("title", &body.title)?;
  require("body", &body.body)?;

  let thread = store
    .create_thread(body.title.trim().to_owned(), actor.user_id)
    .await
    .map_err(ApiError::store)?;
  let post = store
    .add_post(thread.thread_id, actor.user_id, body.body)
    .await
    .map_err(ApiError::store)?;

  Ok((StatusCode::CREATED, Json(ThreadDetail { thread, posts: vec![post] })))
}

/// `GET /threads/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Extension(_actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<Json<ThreadDetail>, ApiError>
where
  S: PortalStore,
{
  let thread = load(store.as_ref(), id).await?;
  let posts = store.list_posts(id).await.map_err(ApiError::store)?;
  Ok(Json(ThreadDetail { thread, posts }))
}

#[derive(Debug, Deserialize)]
pub struct PostBody {
  pub body: String,
}

/// `POST /threads/:id/posts`: returns 201 + the post.
pub async fn add_post<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
  Json(body): Json<PostBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PortalStore,
{
  require("body", &body.body)?;
  load(store.as_ref(), id).await?;
  let post = store
    .add_post(id, actor.user_id, body.body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(post)))
}
