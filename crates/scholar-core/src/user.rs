//! User accounts and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

/// The role an account holds in the portal.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Supervisor,
  Scholar,
}

/// A portal account.
///
/// Accounts are soft-deleted: `deleted_at` is set and the row is kept so that
/// historical references (comments, uploads) still resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  /// Always stored lower-cased.
  pub email:         String,
  pub name:          String,
  pub role:          Role,
  /// Argon2 PHC string. Never leaves the server.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
  pub deleted_at:    Option<DateTime<Utc>>,
}

impl User {
  pub fn is_active(&self) -> bool { self.deleted_at.is_none() }
}

/// The public face of an account, embedded in other resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
  pub user_id: Uuid,
  pub name:    String,
  pub email:   String,
}

/// Input to [`crate::store::PortalStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub name:          String,
  pub role:          Role,
  pub password_hash: String,
}

/// Normalise an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
