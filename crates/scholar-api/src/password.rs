//! Argon2 password hashing shared by account creation and the auth layer.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::ApiError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Enforce the password policy on a new password.
pub fn validate(password: &str) -> Result<(), ApiError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  Ok(())
}

/// Produce an argon2 PHC string for `password`.
pub fn hash(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Check `password` against a stored PHC string. Malformed hashes never
/// verify.
pub fn verify(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let phc = hash("correct horse").unwrap();
    assert!(phc.starts_with("$argon2"));
    assert!(verify("correct horse", &phc));
    assert!(!verify("battery staple", &phc));
  }

  #[test]
  fn malformed_hash_never_verifies() {
    assert!(!verify("anything", "not-a-phc-string"));
  }

  #[test]
  fn short_passwords_are_rejected() {
    assert!(validate("short").is_err());
    assert!(validate("long enough").is_ok());
  }
}
