//! Content hashing and ETags for uploaded documents.
//!
//! A document's ETag is its SHA-256 content hash, so two uploads of the same
//! bytes share both a blob on disk and an ETag.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
  hex::encode(Sha256::digest(bytes))
}

/// Quoted strong ETag for a content hash.
pub fn etag_for(content_hash: &str) -> String { format!("\"{content_hash}\"") }

/// Whether `If-None-Match` names `etag` (or `*`).
///
/// Some clients send tags without the surrounding quotes; both forms match.
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  let bare = etag.trim_matches('"');
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(|t| t.trim().trim_start_matches("W/").trim_matches('"'))
    .any(|t| t == "*" || t == bare)
}
