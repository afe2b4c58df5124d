//! The `PortalStore` trait.
//!
//! Implemented by storage backends (e.g. `scholar-store-sqlite`). The HTTP
//! layers depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  document::Document,
  forum::{Comment, Event, NewEvent, Post, Thread},
  publication::{NewPublication, Publication},
  scholar::{LinkedScholar, NewScholar, Scholar},
  session::{PasswordReset, Session},
  user::{NewUser, Role, User},
};

/// Abstraction over a portal store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`). Lookups return `None` rather than
/// an error when the row does not exist; deletions report whether anything
/// was removed.
pub trait PortalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new account. The email must already be normalised.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id, including soft-deleted accounts.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Retrieve a user by normalised email, including soft-deleted accounts.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// List active users, optionally filtered by role.
  fn list_users(
    &self,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Mark a user deleted. Returns `false` if no active user had that id.
  fn soft_delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn set_password_hash(
    &self,
    id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Revoke every session belonging to `user_id`.
  fn delete_user_sessions(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Password resets ───────────────────────────────────────────────────

  fn create_password_reset(
    &self,
    reset: PasswordReset,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Atomically mark a reset token used and return it. Returns `None` if the
  /// token is unknown, expired, or already used.
  fn redeem_password_reset<'a>(
    &'a self,
    token_hash: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<PasswordReset>, Self::Error>> + Send + 'a;

  // ── Scholars ──────────────────────────────────────────────────────────

  fn create_scholar(
    &self,
    input: NewScholar,
  ) -> impl Future<Output = Result<Scholar, Self::Error>> + Send + '_;

  fn get_scholar(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Scholar>, Self::Error>> + Send + '_;

  /// The scholar profile owned by `user_id`, if any.
  fn find_scholar_by_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Scholar>, Self::Error>> + Send + '_;

  /// Every scholar with its owner link resolved. Owners that are missing or
  /// soft-deleted resolve to `None`. Documents that cannot be decoded at all
  /// are skipped.
  fn list_linked_scholars(
    &self,
  ) -> impl Future<Output = Result<Vec<LinkedScholar>, Self::Error>> + Send + '_;

  /// Read the document for `scholar_id`, apply `edit`, and write it back as
  /// one atomic step, so concurrent edits of the same scholar never overwrite
  /// each other.
  ///
  /// Returns `None` if the scholar does not exist. If `edit` fails nothing is
  /// written and its error comes back inside `Some`.
  fn update_scholar<T, E, F>(
    &self,
    scholar_id: Uuid,
    edit: F,
  ) -> impl Future<Output = Result<Option<Result<T, E>>, Self::Error>> + Send + '_
  where
    F: FnOnce(&mut Scholar) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static;

  // ── Publications ──────────────────────────────────────────────────────

  fn add_publication(
    &self,
    input: NewPublication,
  ) -> impl Future<Output = Result<Publication, Self::Error>> + Send + '_;

  fn get_publication(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Publication>, Self::Error>> + Send + '_;

  /// Publications for a scholar, newest year first.
  fn list_publications(
    &self,
    scholar_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Publication>, Self::Error>> + Send + '_;

  fn delete_publication(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Events & comments ─────────────────────────────────────────────────

  fn create_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// Events ordered by start time; if `starting_after` is set, only events
  /// starting at or after it.
  fn list_events(
    &self,
    starting_after: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Delete an event and its comments.
  fn delete_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn add_comment(
    &self,
    event_id: Uuid,
    author_id: Uuid,
    body: String,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments on an event, oldest first.
  fn list_comments(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Threads & posts ───────────────────────────────────────────────────

  fn create_thread(
    &self,
    title: String,
    author_id: Uuid,
  ) -> impl Future<Output = Result<Thread, Self::Error>> + Send + '_;

  fn get_thread(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Thread>, Self::Error>> + Send + '_;

  /// Threads, newest first.
  fn list_threads(
    &self,
  ) -> impl Future<Output = Result<Vec<Thread>, Self::Error>> + Send + '_;

  fn add_post(
    &self,
    thread_id: Uuid,
    author_id: Uuid,
    body: String,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Posts in a thread, oldest first.
  fn list_posts(
    &self,
    thread_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  fn add_document(
    &self,
    document: Document,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Documents for a scholar, newest first.
  fn list_documents(
    &self,
    scholar_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  fn delete_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// How many document rows reference a blob.
  fn count_documents_with_hash<'a>(
    &'a self,
    content_hash: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;
}
