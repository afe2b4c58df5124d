//! Events with comments, and free-form discussion threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Events ──────────────────────────────────────────────────────────────────

/// A department event or meeting announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:    Uuid,
  pub title:       String,
  pub description: String,
  pub starts_at:   DateTime<Utc>,
  pub location:    Option<String>,
  pub created_by:  Uuid,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
  pub title:       String,
  pub description: String,
  pub starts_at:   DateTime<Utc>,
  pub location:    Option<String>,
  pub created_by:  Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub event_id:   Uuid,
  pub author_id:  Uuid,
  pub body:       String,
  pub created_at: DateTime<Utc>,
}

// ─── Threads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
  pub thread_id:  Uuid,
  pub title:      String,
  pub author_id:  Uuid,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:    Uuid,
  pub thread_id:  Uuid,
  pub author_id:  Uuid,
  pub body:       String,
  pub created_at: DateTime<Utc>,
}
