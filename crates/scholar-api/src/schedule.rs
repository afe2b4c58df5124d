//! Handlers for doctoral-committee meetings and thesis milestones.
//!
//! | Method | Path                                            | Notes |
//! |--------|-------------------------------------------------|-------|
//! | `POST` | `/scholars/:id/meetings`                        | 201 + new meeting |
//! | `POST` | `/scholars/:id/meetings/:meeting_id/occurred`   | Mark as held |
//! | `POST` | `/scholars/:id/meetings/:meeting_id/reschedule` | 409 once held |
//! | `PUT`  | `/scholars/:id/milestones/:kind`                | Schedule or move |
//! | `POST` | `/scholars/:id/milestones/:kind/occurred`       | Mark as reached |
//!
//! All of these require manage access to the scholar. Each write is a single
//! atomic edit of the profile document in the store.

use std::{str::FromStr, sync::Arc};

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use scholar_core::{
  access::Actor,
  scholar::{DcMeeting, MilestoneKind, Schedule},
  store::PortalStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, scholars::edit_managed};

fn parse_kind(raw: &str) -> Result<MilestoneKind, ApiError> {
  MilestoneKind::from_str(raw)
    .map_err(|_| scholar_core::Error::UnknownMilestone(raw.to_owned()).into())
}

// ─── Meetings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScheduleBody {
  pub scheduled_at: DateTime<Utc>,
  #[serde(default)]
  pub agenda:       Option<String>,
}

/// `POST /scholars/:id/meetings`
pub async fn schedule_meeting<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
  Json(body): Json<ScheduleBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PortalStore,
{
  let meeting = edit_managed(store.as_ref(), actor, id, move |scholar| {
    Ok(scholar.schedule_meeting(body.scheduled_at, body.agenda).clone())
  })
  .await?;

  tracing::info!(
    scholar_id = %id,
    meeting_id = %meeting.meeting_id,
    "meeting scheduled"
  );
  Ok((StatusCode::CREATED, Json(meeting)))
}

#[derive(Debug, Deserialize, Default)]
pub struct OccurredBody {
  /// Defaults to the time of the request.
  #[serde(default)]
  pub occurred_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub minutes:     Option<String>,
}

/// `POST /scholars/:id/meetings/:meeting_id/occurred`
pub async fn meeting_occurred<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path((id, meeting_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<OccurredBody>,
) -> Result<Json<DcMeeting>, ApiError>
where
  S: PortalStore,
{
  let occurred_at = body.occurred_at.unwrap_or_else(Utc::now);
  let meeting = edit_managed(store.as_ref(), actor, id, move |scholar| {
    let meeting = scholar.meeting_mut(meeting_id)?;
    meeting.schedule.mark_occurred(occurred_at);
    if body.minutes.is_some() {
      meeting.minutes = body.minutes;
    }
    Ok(meeting.clone())
  })
  .await?;
  Ok(Json(meeting))
}

#[derive(Debug, Deserialize)]
pub struct RescheduleBody {
  pub scheduled_at: DateTime<Utc>,
}

/// `POST /scholars/:id/meetings/:meeting_id/reschedule`
pub async fn reschedule_meeting<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path((id, meeting_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<RescheduleBody>,
) -> Result<Json<DcMeeting>, ApiError>
where
  S: PortalStore,
{
  let meeting = edit_managed(store.as_ref(), actor, id, move |scholar| {
    let meeting = scholar.meeting_mut(meeting_id)?;
    meeting.schedule.reschedule(body.scheduled_at)?;
    Ok(meeting.clone())
  })
  .await?;
  Ok(Json(meeting))
}

// ─── Milestones ───────────────────────────────────────────────────────────────

/// `PUT /scholars/:id/milestones/:kind`: body: `{ "scheduled_at": ... }`.
pub async fn schedule_milestone<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path((id, kind)): Path<(Uuid, String)>,
  Json(body): Json<RescheduleBody>,
) -> Result<Json<Schedule>, ApiError>
where
  S: PortalStore,
{
  let kind = parse_kind(&kind)?;
  let schedule = edit_managed(store.as_ref(), actor, id, move |scholar| {
    Ok(scholar.schedule_milestone(kind, body.scheduled_at)?)
  })
  .await?;

  tracing::info!(scholar_id = %id, milestone = %kind, "milestone scheduled");
  Ok(Json(schedule))
}

/// `POST /scholars/:id/milestones/:kind/occurred`
pub async fn milestone_occurred<S>(
  State(store): State<Arc<S>>,
  Extension(actor): Extension<Actor>,
  Path((id, kind)): Path<(Uuid, String)>,
  Json(body): Json<OccurredBody>,
) -> Result<Json<Schedule>, ApiError>
where
  S: PortalStore,
{
  let kind = parse_kind(&kind)?;
  let occurred_at = body.occurred_at.unwrap_or_else(Utc::now);
  let schedule = edit_managed(store.as_ref(), actor, id, move |scholar| {
    let schedule = scholar.milestone_mut(kind)?;
    schedule.mark_occurred(occurred_at);
    Ok(schedule.clone())
  })
  .await?;
  Ok(Json(schedule))
}
