//! SQL schema for the portal's SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Timestamps in ordering columns are fixed-width RFC 3339 (microseconds,
/// `Z` suffix) so that string comparison matches chronological order.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    role          TEXT NOT NULL,   -- 'admin' | 'supervisor' | 'scholar'
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    deleted_at    TEXT             -- soft delete marker
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,   -- sha256 hex of the cookie token
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS password_resets (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    used_at    TEXT
);

-- Scholar profiles are whole JSON documents. The owner link is deliberately
-- not a foreign key: a profile may outlive its account.
CREATE TABLE IF NOT EXISTS scholars (
    scholar_id    TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    supervisor_id TEXT,
    body          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS publications (
    publication_id TEXT PRIMARY KEY,
    scholar_id     TEXT NOT NULL REFERENCES scholars(scholar_id),
    year           INTEGER NOT NULL,
    created_at     TEXT NOT NULL,
    body           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    event_id  TEXT PRIMARY KEY,
    starts_at TEXT NOT NULL,
    body      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    event_id   TEXT NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    body       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS threads (
    thread_id  TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    body       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    post_id    TEXT PRIMARY KEY,
    thread_id  TEXT NOT NULL REFERENCES threads(thread_id),
    created_at TEXT NOT NULL,
    body       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    document_id  TEXT PRIMARY KEY,
    scholar_id   TEXT NOT NULL REFERENCES scholars(scholar_id),
    content_hash TEXT NOT NULL,
    uploaded_at  TEXT NOT NULL,
    body         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS sessions_user_idx      ON sessions(user_id);
CREATE INDEX IF NOT EXISTS scholars_user_idx      ON scholars(user_id);
CREATE INDEX IF NOT EXISTS scholars_supervisor_idx ON scholars(supervisor_id);
CREATE INDEX IF NOT EXISTS publications_scholar_idx ON publications(scholar_id);
CREATE INDEX IF NOT EXISTS comments_event_idx     ON comments(event_id);
CREATE INDEX IF NOT EXISTS posts_thread_idx       ON posts(thread_id);
CREATE INDEX IF NOT EXISTS documents_scholar_idx  ON documents(scholar_id);
CREATE INDEX IF NOT EXISTS documents_hash_idx     ON documents(content_hash);

PRAGMA user_version = 1;
";
