//! Scholarly publications attached to a scholar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationKind {
  #[default]
  Journal,
  Conference,
  BookChapter,
  Patent,
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
  pub publication_id: Uuid,
  pub scholar_id:     Uuid,
  pub title:          String,
  /// In byline order.
  pub authors:        Vec<String>,
  pub venue:          String,
  pub year:           i32,
  pub kind:           PublicationKind,
  pub doi:            Option<String>,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::add_publication`].
#[derive(Debug, Clone)]
pub struct NewPublication {
  pub scholar_id: Uuid,
  pub title:      String,
  pub authors:    Vec<String>,
  pub venue:      String,
  pub year:       i32,
  pub kind:       PublicationKind,
  pub doi:        Option<String>,
}
