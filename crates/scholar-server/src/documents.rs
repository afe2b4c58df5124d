//! Scholar document upload and download.
//!
//! | Method   | Path                           | Notes |
//! |----------|--------------------------------|-------|
//! | `POST`   | `/documents/scholars/:id`      | Raw body; `?name=<file name>` |
//! | `GET`    | `/documents/scholars/:id`      | Metadata, newest first |
//! | `GET`    | `/documents/:doc_id`           | Bytes; honours `If-None-Match` |
//! | `DELETE` | `/documents/:doc_id`           | Admin or assigned supervisor |
//!
//! Bytes live under `upload_dir`, one file per distinct content hash. Rows in
//! the store point at blobs by hash, so identical uploads share a file and a
//! blob is only unlinked when its last row goes. Uploads and deletions hold
//! the blob store's lock while they touch both the file and its rows.

use std::{
  io,
  path::{Path as FsPath, PathBuf},
};

use axum::{
  Extension, Json,
  body::{Body, to_bytes},
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use scholar_core::{
  access::{self, Actor},
  document::Document,
  scholar::Scholar,
  store::PortalStore,
};
use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::{AppState, error::Error, etag};

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";
const MAX_FILE_NAME: usize = 255;

// ─── Blob storage ─────────────────────────────────────────────────────────────

/// Content-addressed files on local disk.
#[derive(Debug)]
pub struct BlobStore {
  root: PathBuf,
  lock: Mutex<()>,
}

impl BlobStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into(), lock: Mutex::new(()) }
  }

  pub fn root(&self) -> &FsPath { &self.root }

  /// Held across a blob write or removal and the matching document-row
  /// change, so reference counts never go stale in between.
  pub async fn lock(&self) -> MutexGuard<'_, ()> { self.lock.lock().await }

  pub async fn ensure_root(&self) -> io::Result<()> {
    tokio::fs::create_dir_all(&self.root).await
  }

  fn path_for(&self, content_hash: &str) -> io::Result<PathBuf> {
    let valid = content_hash.len() == 64
      && content_hash.bytes().all(|b| b.is_ascii_hexdigit());
    if !valid {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("not a content hash: {content_hash:?}"),
      ));
    }
    Ok(self.root.join(content_hash))
  }

  /// Write `bytes` under `content_hash` unless a blob is already there.
  /// Returns `true` if a new file was written.
  pub async fn put(&self, content_hash: &str, bytes: &[u8]) -> io::Result<bool> {
    let path = self.path_for(content_hash)?;
    if tokio::fs::try_exists(&path).await? {
      return Ok(false);
    }
    let tmp = self.root.join(format!(".{content_hash}.{}", Uuid::new_v4()));
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(true)
  }

  pub async fn get(&self, content_hash: &str) -> io::Result<Bytes> {
    let path = self.path_for(content_hash)?;
    Ok(Bytes::from(tokio::fs::read(path).await?))
  }

  /// Remove a blob. Missing blobs are not an error.
  pub async fn remove(&self, content_hash: &str) -> io::Result<()> {
    let path = self.path_for(content_hash)?;
    match tokio::fs::remove_file(path).await {
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      other => other,
    }
  }
}

/// Reduce a client-supplied name to a bare, printable file name.
pub fn sanitize_file_name(raw: &str) -> String {
  let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
  let cleaned: String = base
    .chars()
    .filter(|c| !c.is_control() && !matches!(c, '"' | ';'))
    .take(MAX_FILE_NAME)
    .collect();
  let cleaned = cleaned.trim().trim_start_matches('.').trim();
  if cleaned.is_empty() {
    "upload".to_owned()
  } else {
    cleaned.to_owned()
  }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn load_scholar<S: PortalStore>(
  state: &AppState<S>,
  id: Uuid,
) -> Result<Scholar, Error> {
  state
    .store
    .get_scholar(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)
}

async fn load_document<S: PortalStore>(
  state: &AppState<S>,
  id: Uuid,
) -> Result<(Document, Scholar), Error> {
  let doc = state
    .store
    .get_document(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;
  let scholar = load_scholar(state, doc.scholar_id).await?;
  Ok((doc, scholar))
}

fn allow(permitted: bool) -> Result<(), Error> {
  if permitted { Ok(()) } else { Err(Error::Forbidden) }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct UploadParams {
  pub name: Option<String>,
}

/// `POST /documents/scholars/:id?name=<file name>`: returns 201 + metadata.
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
  Query(params): Query<UploadParams>,
  headers: HeaderMap,
  body: Body,
) -> Result<impl IntoResponse, Error>
where
  S: PortalStore + 'static,
{
  let scholar = load_scholar(&state, id).await?;
  allow(access::can_contribute(&actor, &scholar))?;

  let limit = state.config.max_upload_bytes;
  let bytes = to_bytes(body, limit)
    .await
    .map_err(|_| Error::PayloadTooLarge(limit))?;
  if bytes.is_empty() {
    return Err(Error::BadRequest("empty upload".into()));
  }

  let media_type = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .unwrap_or(DEFAULT_MEDIA_TYPE)
    .to_owned();
  let file_name = sanitize_file_name(params.name.as_deref().unwrap_or_default());

  let content_hash = etag::content_hash(&bytes);
  let doc = Document {
    document_id: Uuid::new_v4(),
    scholar_id: id,
    file_name,
    media_type,
    content_hash,
    size: bytes.len() as u64,
    uploaded_by: actor.user_id,
    uploaded_at: Utc::now(),
  };

  let _guard = state.blobs.lock().await;
  let written = state.blobs.put(&doc.content_hash, &bytes).await?;
  if let Err(e) = state.store.add_document(doc.clone()).await {
    if written && let Err(rm) = state.blobs.remove(&doc.content_hash).await {
      tracing::warn!(error = %rm, "orphaned blob left behind");
    }
    return Err(Error::store(e));
  }

  tracing::info!(
    document_id = %doc.document_id,
    scholar_id = %id,
    size = doc.size,
    "document uploaded"
  );
  Ok((StatusCode::CREATED, Json(doc)))
}

/// `GET /documents/scholars/:id`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Document>>, Error>
where
  S: PortalStore + 'static,
{
  let scholar = load_scholar(&state, id).await?;
  allow(access::can_view_scholar(&actor, &scholar))?;
  let docs = state.store.list_documents(id).await.map_err(Error::store)?;
  Ok(Json(docs))
}

/// `GET /documents/:doc_id`
pub async fn download<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: PortalStore + 'static,
{
  let (doc, scholar) = load_document(&state, id).await?;
  allow(access::can_view_scholar(&actor, &scholar))?;

  let etag = etag::etag_for(&doc.content_hash);
  if etag::if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  let bytes = state.blobs.get(&doc.content_hash).await?;
  let disposition = format!("attachment; filename=\"{}\"", doc.file_name);
  Ok(
    (
      [
        (header::CONTENT_TYPE, doc.media_type),
        (header::CONTENT_DISPOSITION, disposition),
        (header::ETAG, etag),
      ],
      bytes,
    )
      .into_response(),
  )
}

/// `DELETE /documents/:doc_id`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<Actor>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, Error>
where
  S: PortalStore + 'static,
{
  let (doc, scholar) = load_document(&state, id).await?;
  allow(access::can_manage_scholar(&actor, &scholar))?;

  let _guard = state.blobs.lock().await;
  state.store.delete_document(id).await.map_err(Error::store)?;
  let remaining = state
    .store
    .count_documents_with_hash(&doc.content_hash)
    .await
    .map_err(Error::store)?;
  if remaining == 0 {
    state.blobs.remove(&doc.content_hash).await?;
  }

  tracing::info!(document_id = %id, blob_kept = remaining > 0, "document deleted");
  Ok(StatusCode::NO_CONTENT)
}
