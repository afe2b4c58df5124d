//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use scholar_api::ApiError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("not found")]
  NotFound,
  #[error("forbidden")]
  Forbidden,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("upload exceeds {0} bytes")]
  PayloadTooLarge(usize),
  #[error(transparent)]
  Api(#[from] ApiError),
  #[error("blob storage error: {0}")]
  Io(#[from] std::io::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Api(_) => None,
      Error::Unauthorized => Some(StatusCode::UNAUTHORIZED),
      Error::NotFound => Some(StatusCode::NOT_FOUND),
      Error::Forbidden => Some(StatusCode::FORBIDDEN),
      Error::BadRequest(_) => Some(StatusCode::BAD_REQUEST),
      Error::PayloadTooLarge(_) => Some(StatusCode::PAYLOAD_TOO_LARGE),
      Error::Io(e) => {
        tracing::error!(error = %e, "blob storage failure");
        Some(StatusCode::INTERNAL_SERVER_ERROR)
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store failure");
        Some(StatusCode::INTERNAL_SERVER_ERROR)
      }
    };
    match (self, status) {
      (Error::Api(e), _) => e.into_response(),
      (other, status) => (
        status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(json!({ "error": other.to_string() })),
      )
        .into_response(),
    }
  }
}
