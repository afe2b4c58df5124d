//! HTTP server for the scholar portal.
//!
//! Composes the JSON API from `scholar-api` with session authentication,
//! password reset, and document storage into a single axum [`Router`]
//! backed by any [`PortalStore`].

pub mod auth;
pub mod documents;
pub mod error;
pub mod etag;
pub mod mail;
pub mod reset;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router, middleware,
  routing::{get, post},
};
use scholar_core::store::PortalStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use documents::BlobStore;
use mail::Mailer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SCHOLAR_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  /// Public origin, used to build links in outbound mail.
  pub base_url:          String,
  pub store_path:        PathBuf,
  pub upload_dir:        PathBuf,
  pub max_upload_bytes:  usize,
  pub session_ttl_hours: i64,
  pub reset_ttl_minutes: i64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              8080,
      base_url:          "http://localhost:8080".to_string(),
      store_path:        PathBuf::from("scholar.db"),
      upload_dir:        PathBuf::from("uploads"),
      max_upload_bytes:  20 * 1024 * 1024,
      session_ttl_hours: 12,
      reset_ttl_minutes: 30,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all server handlers.
pub struct AppState<S: PortalStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub mailer: Arc<dyn Mailer>,
  pub blobs:  Arc<BlobStore>,
}

impl<S: PortalStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      config: self.config.clone(),
      mailer: self.mailer.clone(),
      blobs:  self.blobs.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full portal router.
///
/// `/auth/login` and the password-reset endpoints are public; everything
/// else requires a live session.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PortalStore + 'static,
{
  let public = Router::new()
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/password-reset", post(reset::request::<S>))
    .route("/auth/password-reset/confirm", post(reset::confirm::<S>))
    .with_state(state.clone());

  let protected = Router::new()
    .route("/auth/logout", post(auth::logout::<S>))
    .route("/auth/me", get(auth::me::<S>))
    .route("/auth/password", post(auth::change_password::<S>))
    .route(
      "/documents/scholars/{id}",
      get(documents::list::<S>).post(documents::upload::<S>),
    )
    .route(
      "/documents/{id}",
      get(documents::download::<S>).delete(documents::remove::<S>),
    )
    .with_state(state.clone())
    .nest("/api", scholar_api::api_router(state.store.clone()))
    .route_layer(middleware::from_fn_with_state(
      state,
      auth::require_session::<S>,
    ));

  public.merge(protected).layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
