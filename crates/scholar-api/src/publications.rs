//! Handlers for scholar publications.
//!
//! | Method   | Path                         | Notes |
//! |----------|------------------------------|-------|
//! | `GET`    | `/scholars/:id/publications` | Newest year first |
//! | `POST`   | `/scholars/:id/publications` | Owner, supervisor, or admin |
//! | `DELETE` | `/publications/:id`          | Same rule as `POST` |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{Datelike, Utc};
use scholar_core::{
  access::{self, Actor},
  publication::{NewPublication, Publication, PublicationKind},
  store::PortalStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::{ApiError, allow, require},
  scholars,
};

/// `GET /scholars/:id/publications`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Publication>>, ApiError>
where
  S: PortalStore,
{
  let scholar = scholars::load(store.as_ref(), id).await?;
  allow(access::can_view_scholar(&actor, &scholar))?;
  let pubs = store.list_publications(id).await.map_err(ApiError::store)?;
  Ok(Json(pubs))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:   String,
  #[serde(default)]
  pub authors: Vec<String>,
  #[serde(default)]
  pub venue:   String,
  pub year:    i32,
  #[serde(default)]
  pub kind:    PublicationKind,
  #[serde(default)]
  pub doi:     Option<String>,
}

/// `POST /scholars/:id/publications`: returns 201 + the stored record.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PortalStore,
{
  let scholar = scholars::load(store.as_ref(), id).await?;
  allow(access::can_contribute(&actor, &scholar))?;
  require("title", &body.title)?;
  let latest = Utc::now().year() + 1;
  if !(1900..=latest).contains(&body.year) {
    return Err(ApiError::BadRequest(format!(
      "year must be between 1900 and {latest}"
    )));
  }

  let publication = store
    .add_publication(NewPublication {
      scholar_id: id,
      title:      body.title.trim().to_owned(),
      authors:    body.authors,
      venue:      body.venue,
      year:       body.year,
      kind:       body.kind,
      doi:        body.doi.filter(|d| !d.trim().is_empty()),
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(publication)))
}

/// `DELETE /publications/:id`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PortalStore,
{
  let publication = store
    .get_publication(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("publication {id} not found")))?;
  let scholar = scholars::load(store.as_ref(), publication.scholar_id).await?;
  allow(access::can_contribute(&actor, &scholar))?;

  store.delete_publication(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
