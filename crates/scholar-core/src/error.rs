//! Error types for `scholar-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::scholar::MilestoneKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("meeting not found: {0}")]
  MeetingNotFound(Uuid),

  #[error("milestone {0} has not been scheduled")]
  MilestoneNotScheduled(MilestoneKind),

  #[error("record has already occurred and cannot be rescheduled")]
  AlreadyOccurred,

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown milestone kind: {0:?}")]
  UnknownMilestone(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
