//! [`SqliteStore`]: the SQLite implementation of [`PortalStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{
  OptionalExtension as _, TransactionBehavior, params_from_iter, types::Value,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use scholar_core::{
  document::Document,
  forum::{Comment, Event, NewEvent, Post, Thread},
  publication::{NewPublication, Publication},
  scholar::{LinkedScholar, NewScholar, Scholar},
  session::{PasswordReset, Session},
  store::PortalStore,
  user::{NewUser, Role, User},
};

use crate::{
  Error, Result,
  encode::{
    RawLinkedScholar, RawPasswordReset, RawSession, RawUser, USER_COLUMNS,
    decode_body, encode_body, encode_dt, encode_role, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A portal store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single write statement and return the number of affected rows.
  async fn execute(&self, sql: &'static str, params: Vec<Value>) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, params_from_iter(params))?))
      .await?;
    Ok(changed)
  }

  /// Run a query whose first column is a JSON `body` and decode every row.
  async fn fetch_docs<T: DeserializeOwned>(
    &self,
    sql: &'static str,
    params: Vec<Value>,
  ) -> Result<Vec<T>> {
    let bodies: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    bodies.iter().map(|b| decode_body(b)).collect()
  }

  async fn fetch_doc<T: DeserializeOwned>(
    &self,
    sql: &'static str,
    params: Vec<Value>,
  ) -> Result<Option<T>> {
    Ok(self.fetch_docs(sql, params).await?.into_iter().next())
  }

  async fn fetch_users(&self, sql: String, params: Vec<Value>) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }
}

fn id(value: Uuid) -> Value { Value::Text(encode_uuid(value)) }

fn ts(value: DateTime<Utc>) -> Value { Value::Text(encode_dt(value)) }

/// Carry a non-SQLite failure out of a `call` closure.
fn other<E>(e: E) -> tokio_rusqlite::Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── PortalStore impl ────────────────────────────────────────────────────────

impl PortalStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      email:         input.email,
      name:          input.name,
      role:          input.role,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
      deleted_at:    None,
    };

    self
      .execute(
        "INSERT INTO users (user_id, email, name, role, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        vec![
          id(user.user_id),
          user.email.clone().into(),
          user.name.clone().into(),
          encode_role(user.role).to_owned().into(),
          user.password_hash.clone().into(),
          ts(user.created_at),
        ],
      )
      .await?;

    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let users = self
      .fetch_users(
        format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
        vec![id(user_id)],
      )
      .await?;
    Ok(users.into_iter().next())
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let users = self
      .fetch_users(
        format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        vec![email.to_owned().into()],
      )
      .await?;
    Ok(users.into_iter().next())
  }

  async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
    match role {
      Some(role) => {
        self
          .fetch_users(
            format!(
              "SELECT {USER_COLUMNS} FROM users
               WHERE deleted_at IS NULL AND role = ?1
               ORDER BY name"
            ),
            vec![encode_role(role).to_owned().into()],
          )
          .await
      }
      None => {
        self
          .fetch_users(
            format!(
              "SELECT {USER_COLUMNS} FROM users
               WHERE deleted_at IS NULL
               ORDER BY name"
            ),
            vec![],
          )
          .await
      }
    }
  }

  async fn soft_delete_user(&self, user_id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "UPDATE users SET deleted_at = ?2 WHERE user_id = ?1 AND deleted_at IS NULL",
        vec![id(user_id), ts(Utc::now())],
      )
      .await?;
    Ok(changed > 0)
  }

  async fn set_password_hash(&self, user_id: Uuid, password_hash: String) -> Result<()> {
    let changed = self
      .execute(
        "UPDATE users SET password_hash = ?2 WHERE user_id = ?1",
        vec![id(user_id), password_hash.into()],
      )
      .await?;
    if changed == 0 {
      return Err(Error::UserNotFound(user_id));
    }
    Ok(())
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, session: Session) -> Result<()> {
    self
      .execute(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          session.token_hash.into(),
          id(session.user_id),
          ts(session.created_at),
          ts(session.expires_at),
        ],
      )
      .await?;
    Ok(())
  }

  async fn get_session(&self, token_hash: &str) -> Result<Option<Session>> {
    let token_hash = token_hash.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |row| {
              Ok(RawSession {
                token_hash: row.get(0)?,
                user_id:    row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, token_hash: &str) -> Result<()> {
    self
      .execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        vec![token_hash.to_owned().into()],
      )
      .await?;
    Ok(())
  }

  async fn delete_user_sessions(&self, user_id: Uuid) -> Result<()> {
    self
      .execute("DELETE FROM sessions WHERE user_id = ?1", vec![id(user_id)])
      .await?;
    Ok(())
  }

  // ── Password resets ───────────────────────────────────────────────────────

  async fn create_password_reset(&self, reset: PasswordReset) -> Result<()> {
    self
      .execute(
        "INSERT INTO password_resets (token_hash, user_id, created_at, expires_at, used_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          reset.token_hash.into(),
          id(reset.user_id),
          ts(reset.created_at),
          ts(reset.expires_at),
          reset.used_at.map(encode_dt).into(),
        ],
      )
      .await?;
    Ok(())
  }

  async fn redeem_password_reset(
    &self,
    token_hash: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<PasswordReset>> {
    let token_hash = token_hash.to_owned();
    let now_str    = encode_dt(now);

    // Claim and read back on the connection thread so two redemptions of the
    // same token cannot both succeed.
    let raw: Option<RawPasswordReset> = self
      .conn
      .call(move |conn| {
        let claimed = conn.execute(
          "UPDATE password_resets SET used_at = ?2
           WHERE token_hash = ?1 AND used_at IS NULL AND expires_at > ?2",
          rusqlite::params![token_hash, now_str],
        )?;
        if claimed == 0 {
          return Ok(None);
        }
        Ok(conn
          .query_row(
            "SELECT token_hash, user_id, created_at, expires_at, used_at
             FROM password_resets WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |row| {
              Ok(RawPasswordReset {
                token_hash: row.get(0)?,
                user_id:    row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
                used_at:    row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPasswordReset::into_reset).transpose()
  }

  // ── Scholars ──────────────────────────────────────────────────────────────

  async fn create_scholar(&self, input: NewScholar) -> Result<Scholar> {
    let scholar = Scholar {
      scholar_id:        Uuid::new_v4(),
      user_id:           input.user_id,
      supervisor_id:     input.supervisor_id,
      enrollment_number: input.enrollment_number,
      department:        input.department,
      research_area:     input.research_area,
      joined_on:         input.joined_on,
      coursework:        None,
      dc_meetings:       None,
      milestones:        None,
      created_at:        Utc::now(),
    };

    self
      .execute(
        "INSERT INTO scholars (scholar_id, user_id, supervisor_id, body)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          id(scholar.scholar_id),
          id(scholar.user_id),
          scholar.supervisor_id.map(encode_uuid).into(),
          encode_body(&scholar)?.into(),
        ],
      )
      .await?;

    Ok(scholar)
  }

  async fn get_scholar(&self, scholar_id: Uuid) -> Result<Option<Scholar>> {
    self
      .fetch_doc(
        "SELECT body FROM scholars WHERE scholar_id = ?1",
        vec![id(scholar_id)],
      )
      .await
  }

  async fn find_scholar_by_user(&self, user_id: Uuid) -> Result<Option<Scholar>> {
    self
      .fetch_doc(
        "SELECT body FROM scholars WHERE user_id = ?1 ORDER BY rowid LIMIT 1",
        vec![id(user_id)],
      )
      .await
  }

  async fn list_linked_scholars(&self) -> Result<Vec<LinkedScholar>> {
    let raws: Vec<RawLinkedScholar> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT s.body, u.user_id, u.name, u.email
           FROM scholars s
           LEFT JOIN users u
             ON u.user_id = s.user_id AND u.deleted_at IS NULL
           ORDER BY s.rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawLinkedScholar {
              body:        row.get(0)?,
              owner_id:    row.get(1)?,
              owner_name:  row.get(2)?,
              owner_email: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let linked = raws
      .into_iter()
      .filter_map(|raw| match raw.into_linked() {
        Ok(linked) => Some(linked),
        Err(e) => {
          tracing::warn!(error = %e, "skipping undecodable scholar document");
          None
        }
      })
      .collect();
    Ok(linked)
  }

  async fn update_scholar<T, E, F>(
    &self,
    scholar_id: Uuid,
    edit: F,
  ) -> Result<Option<Result<T, E>>>
  where
    F: FnOnce(&mut Scholar) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
  {
    let id_str = encode_uuid(scholar_id);

    // Read, edit and write on the connection thread inside one immediate
    // transaction; no other call can interleave between the read and the
    // write.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM scholars WHERE scholar_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(body) = body else {
          return Ok(None);
        };

        let mut scholar: Scholar = serde_json::from_str(&body).map_err(other)?;
        let outcome = edit(&mut scholar);
        if outcome.is_ok() {
          tx.execute(
            "UPDATE scholars SET user_id = ?2, supervisor_id = ?3, body = ?4
             WHERE scholar_id = ?1",
            rusqlite::params![
              id_str,
              encode_uuid(scholar.user_id),
              scholar.supervisor_id.map(encode_uuid),
              serde_json::to_string(&scholar).map_err(other)?,
            ],
          )?;
          tx.commit()?;
        }
        Ok(Some(outcome))
      })
      .await?;

    Ok(outcome)
  }

  // ── Publications ──────────────────────────────────────────────────────────

  async fn add_publication(&self, input: NewPublication) -> Result<Publication> {
    let publication = Publication {
      publication_id: Uuid::new_v4(),
      scholar_id:     input.scholar_id,
      title:          input.title,
      authors:        input.authors,
      venue:          input.venue,
      year:           input.year,
      kind:           input.kind,
      doi:            input.doi,
      created_at:     Utc::now(),
    };

    self
      .execute(
        "INSERT INTO publications (publication_id, scholar_id, year, created_at, body)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          id(publication.publication_id),
          id(publication.scholar_id),
          publication.year.into(),
          ts(publication.created_at),
          encode_body(&publication)?.into(),
        ],
      )
      .await?;

    Ok(publication)
  }

  async fn get_publication(&self, publication_id: Uuid) -> Result<Option<Publication>> {
    self
      .fetch_doc(
        "SELECT body FROM publications WHERE publication_id = ?1",
        vec![id(publication_id)],
      )
      .await
  }

  async fn list_publications(&self, scholar_id: Uuid) -> Result<Vec<Publication>> {
    self
      .fetch_docs(
        "SELECT body FROM publications WHERE scholar_id = ?1
         ORDER BY year DESC, created_at DESC",
        vec![id(scholar_id)],
      )
      .await
  }

  async fn delete_publication(&self, publication_id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "DELETE FROM publications WHERE publication_id = ?1",
        vec![id(publication_id)],
      )
      .await?;
    Ok(changed > 0)
  }

  // ── Events & comments ─────────────────────────────────────────────────────

  async fn create_event(&self, input: NewEvent) -> Result<Event> {
    let event = Event {
      event_id:    Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      starts_at:   input.starts_at,
      location:    input.location,
      created_by:  input.created_by,
      created_at:  Utc::now(),
    };

    self
      .execute(
        "INSERT INTO events (event_id, starts_at, body) VALUES (?1, ?2, ?3)",
        vec![id(event.event_id), ts(event.starts_at), encode_body(&event)?.into()],
      )
      .await?;

    Ok(event)
  }

  async fn get_event(&self, event_id: Uuid) -> Result<Option<Event>> {
    self
      .fetch_doc("SELECT body FROM events WHERE event_id = ?1", vec![id(event_id)])
      .await
  }

  async fn list_events(&self, starting_after: Option<DateTime<Utc>>) -> Result<Vec<Event>> {
    match starting_after {
      Some(after) => {
        self
          .fetch_docs(
            "SELECT body FROM events WHERE starts_at >= ?1 ORDER BY starts_at",
            vec![ts(after)],
          )
          .await
      }
      None => {
        self
          .fetch_docs("SELECT body FROM events ORDER BY starts_at", vec![])
          .await
      }
    }
  }

  async fn delete_event(&self, event_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(event_id);

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM comments WHERE event_id = ?1",
          rusqlite::params![id_str],
        )?;
        let changed = tx.execute(
          "DELETE FROM events WHERE event_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(changed)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn add_comment(
    &self,
    event_id: Uuid,
    author_id: Uuid,
    body: String,
  ) -> Result<Comment> {
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      event_id,
      author_id,
      body,
      created_at: Utc::now(),
    };

    self
      .execute(
        "INSERT INTO comments (comment_id, event_id, created_at, body)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          id(comment.comment_id),
          id(comment.event_id),
          ts(comment.created_at),
          encode_body(&comment)?.into(),
        ],
      )
      .await?;

    Ok(comment)
  }

  async fn list_comments(&self, event_id: Uuid) -> Result<Vec<Comment>> {
    self
      .fetch_docs(
        "SELECT body FROM comments WHERE event_id = ?1 ORDER BY created_at, rowid",
        vec![id(event_id)],
      )
      .await
  }

  // ── Threads & posts ───────────────────────────────────────────────────────

  async fn create_thread(&self, title: String, author_id: Uuid) -> Result<Thread> {
    let thread = Thread {
      thread_id: Uuid::new_v4(),
      title,
      author_id,
      created_at: Utc::now(),
    };

    self
      .execute(
        "INSERT INTO threads (thread_id, created_at, body) VALUES (?1, ?2, ?3)",
        vec![id(thread.thread_id), ts(thread.created_at), encode_body(&thread)?.into()],
      )
      .await?;

    Ok(thread)
  }

  async fn get_thread(&self, thread_id: Uuid) -> Result<Option<Thread>> {
    self
      .fetch_doc("SELECT body FROM threads WHERE thread_id = ?1", vec![id(thread_id)])
      .await
  }

  async fn list_threads(&self) -> Result<Vec<Thread>> {
    self
      .fetch_docs(
        "SELECT body FROM threads ORDER BY created_at DESC, rowid DESC",
        vec![],
      )
      .await
  }

  async fn add_post(&self, thread_id: Uuid, author_id: Uuid, body: String) -> Result<Post> {
    let post = Post {
      post_id: Uuid::new_v4(),
      thread_id,
      author_id,
      body,
      created_at: Utc::now(),
    };

    self
      .execute(
        "INSERT INTO posts (post_id, thread_id, created_at, body) VALUES (?1, ?2, ?3, ?4)",
        vec![
          id(post.post_id),
          id(post.thread_id),
          ts(post.created_at),
          encode_body(&post)?.into(),
        ],
      )
      .await?;

    Ok(post)
  }

  async fn list_posts(&self, thread_id: Uuid) -> Result<Vec<Post>> {
    self
      .fetch_docs(
        "SELECT body FROM posts WHERE thread_id = ?1 ORDER BY created_at, rowid",
        vec![id(thread_id)],
      )
      .await
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn add_document(&self, document: Document) -> Result<()> {
    self
      .execute(
        "INSERT INTO documents (document_id, scholar_id, content_hash, uploaded_at, body)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          id(document.document_id),
          id(document.scholar_id),
          document.content_hash.clone().into(),
          ts(document.uploaded_at),
          encode_body(&document)?.into(),
        ],
      )
      .await?;
    Ok(())
  }

  async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>> {
    self
      .fetch_doc(
        "SELECT body FROM documents WHERE document_id = ?1",
        vec![id(document_id)],
      )
      .await
  }

  async fn list_documents(&self, scholar_id: Uuid) -> Result<Vec<Document>> {
    self
      .fetch_docs(
        "SELECT body FROM documents WHERE scholar_id = ?1
         ORDER BY uploaded_at DESC, rowid DESC",
        vec![id(scholar_id)],
      )
      .await
  }

  async fn delete_document(&self, document_id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "DELETE FROM documents WHERE document_id = ?1",
        vec![id(document_id)],
      )
      .await?;
    Ok(changed > 0)
  }

  async fn count_documents_with_hash(&self, content_hash: &str) -> Result<usize> {
    let hash = content_hash.to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM documents WHERE content_hash = ?1",
          rusqlite::params![hash],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(usize::try_from(count).unwrap_or(0))
  }
}
