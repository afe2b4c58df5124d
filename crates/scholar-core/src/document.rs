//! Uploaded files. Bytes live on disk, addressed by content hash; only
//! metadata is stored in the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub document_id:  Uuid,
  pub scholar_id:   Uuid,
  /// Sanitised client-supplied file name, used for `Content-Disposition`.
  pub file_name:    String,
  pub media_type:   String,
  /// SHA-256 hex digest; also the blob's file name on disk.
  pub content_hash: String,
  pub size:         u64,
  pub uploaded_by:  Uuid,
  pub uploaded_at:  DateTime<Utc>,
}
