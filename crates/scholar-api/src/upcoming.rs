//! `GET /upcoming/:category[?now=<rfc3339>]`
//!
//! Returns, for every scholar the caller can see, the single nearest record
//! of the requested category that is still ahead and not yet held, sorted by
//! date. `category` is one of `meetings`, `milestones`, `all`.

use std::{str::FromStr, sync::Arc};

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use scholar_core::{
  access::Actor,
  store::PortalStore,
  upcoming::{Category, UpcomingEntry, find_nearest_upcoming},
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct Params {
  /// Reference instant; defaults to the time of the request.
  pub now: Option<DateTime<Utc>>,
}

pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(category): Path<String>,
  Query(params): Query<Params>,
) -> Result<Json<Vec<UpcomingEntry>>, ApiError>
where
  S: PortalStore,
{
  let category = Category::from_str(&category)
    .map_err(|_| ApiError::BadRequest(format!("unknown category: {category}")))?;
  let now = params.now.unwrap_or_else(Utc::now);

  let linked = store.list_linked_scholars().await.map_err(ApiError::store)?;
  let scope = actor.scope();
  let entries = find_nearest_upcoming(
    &linked,
    now,
    |s| category.extract(s),
    |l| scope.admits_linked(l),
  );

  tracing::debug!(
    ?category,
    scholars = linked.len(),
    entries = entries.len(),
    "upcoming computed"
  );
  Ok(Json(entries))
}
