//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Document bodies are compact JSON.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use scholar_core::{
  scholar::{LinkedScholar, Scholar},
  session::{PasswordReset, Session},
  user::{Role, User, UserSummary},
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::Admin => "admin",
    Role::Supervisor => "supervisor",
    Role::Scholar => "scholar",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  Role::from_str(s)
    .map_err(|_| Error::Core(scholar_core::Error::UnknownRole(s.to_owned())))
}

// ─── JSON documents ──────────────────────────────────────────────────────────

pub fn encode_body<T: Serialize>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_body<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub name:          String,
  pub role:          String,
  pub password_hash: String,
  pub created_at:    String,
  pub deleted_at:    Option<String>,
}

/// Column list matching the field order of [`RawUser`].
pub const USER_COLUMNS: &str =
  "user_id, email, name, role, password_hash, created_at, deleted_at";

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      name:          row.get(2)?,
      role:          row.get(3)?,
      password_hash: row.get(4)?,
      created_at:    row.get(5)?,
      deleted_at:    row.get(6)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      email:         self.email,
      name:          self.name,
      role:          decode_role(&self.role)?,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
      deleted_at:    self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read from a `sessions` row.
pub struct RawSession {
  pub token_hash: String,
  pub user_id:    String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token_hash: self.token_hash,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

/// Raw strings read from a `password_resets` row.
pub struct RawPasswordReset {
  pub token_hash: String,
  pub user_id:    String,
  pub created_at: String,
  pub expires_at: String,
  pub used_at:    Option<String>,
}

impl RawPasswordReset {
  pub fn into_reset(self) -> Result<PasswordReset> {
    Ok(PasswordReset {
      token_hash: self.token_hash,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
      used_at:    self.used_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// A scholar document joined with its (possibly absent) active owner.
pub struct RawLinkedScholar {
  pub body:        String,
  pub owner_id:    Option<String>,
  pub owner_name:  Option<String>,
  pub owner_email: Option<String>,
}

impl RawLinkedScholar {
  pub fn into_linked(self) -> Result<LinkedScholar> {
    let scholar: Scholar = decode_body(&self.body)?;
    let owner = match (self.owner_id, self.owner_name, self.owner_email) {
      (Some(id), Some(name), Some(email)) => Some(UserSummary {
        user_id: decode_uuid(&id)?,
        name,
        email,
      }),
      _ => None,
    };
    Ok(LinkedScholar { scholar, owner })
  }
}
