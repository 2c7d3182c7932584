//! Append-only audit log of queue actions, stored in SQLite.
//!
//! Tables are created lazily on first use, so opening a log never touches the
//! schema. Entries are never updated or deleted.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::AuditError;
use crate::types::{Actor, AssetId, UserId};

/// Timestamp format stored in `created_at` (UTC).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default number of rows returned by [`AuditLog::recent_logs`].
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// One action to record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditEvent {
    pub user_id: Option<UserId>,
    pub action: String,
    pub asset_id: Option<AssetId>,
    pub count: Option<u64>,
    pub notes: Option<String>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn by(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn asset(mut self, asset_id: AssetId) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A stored entry joined with the acting user's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub user_id: Option<UserId>,
    pub action: String,
    pub asset_id: Option<AssetId>,
    pub count: Option<u64>,
    pub notes: Option<String>,
    pub created_at: String,
    pub username: Option<String>,
    pub email: Option<String>,
}

struct State {
    conn: Connection,
    schema_ready: bool,
}

/// SQLite-backed audit log.
pub struct AuditLog {
    state: Mutex<State>,
}

impl AuditLog {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, AuditError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!("Audit log opened at {:?}", path);
        Ok(Self::from_connection(conn))
    }

    /// Private in-memory database.
    pub fn in_memory() -> Result<Self, AuditError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            state: Mutex::new(State {
                conn,
                schema_ready: false,
            }),
        }
    }

    /// Run `f` against a connection whose schema is guaranteed to exist.
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, AuditError> {
        let mut state = self.state.lock().map_err(|_| AuditError::Poisoned)?;
        if !state.schema_ready {
            ensure_schema(&state.conn)?;
            state.schema_ready = true;
        }
        Ok(f(&state.conn)?)
    }

    /// Insert or refresh the identity shown next to a user's entries.
    pub fn register_user(&self, actor: &Actor) -> Result<(), AuditError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO altomatic_users (id, username, email) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET username = excluded.username, email = excluded.email",
                params![actor.id as i64, actor.username, actor.email],
            )
            .map(|_| ())
        })
    }

    /// Record an action and return the new row id.
    pub fn append(&self, event: &AuditEvent) -> Result<i64, AuditError> {
        let created_at = chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO altomatic_log (user_id, action, asset_id, count, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.user_id.map(|id| id as i64),
                    event.action,
                    event.asset_id.map(|id| id as i64),
                    event.count.map(|n| n as i64),
                    event.notes,
                    created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        tracing::debug!(id, action = %event.action, "Audit entry appended");
        Ok(id)
    }

    /// Up to `limit` entries, newest first.
    pub fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, AuditError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT l.id, l.user_id, l.action, l.asset_id, l.count, l.notes, l.created_at,
                        u.username, u.email
                 FROM altomatic_log l
                 LEFT JOIN altomatic_users u ON u.id = l.user_id
                 ORDER BY l.id DESC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit as i64], |row| {
                Ok(LogEntry {
                    id: row.get(0)?,
                    user_id: row.get::<_, Option<i64>>(1)?.map(|v| v as UserId),
                    action: row.get(2)?,
                    asset_id: row.get::<_, Option<i64>>(3)?.map(|v| v as AssetId),
                    count: row.get::<_, Option<i64>>(4)?.map(|v| v as u64),
                    notes: row.get(5)?,
                    created_at: row.get(6)?,
                    username: row.get(7)?,
                    email: row.get(8)?,
                })
            })?;
            rows.collect()
        })
    }

}

fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS altomatic_users (
            id          INTEGER PRIMARY KEY,
            username    TEXT NOT NULL,
            email       TEXT
        );
        CREATE TABLE IF NOT EXISTS altomatic_log (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NULL,
            action      TEXT NOT NULL,
            asset_id    INTEGER NULL,
            count       INTEGER NULL,
            notes       TEXT NULL,
            created_at  DATETIME NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_altomatic_log_created_at ON altomatic_log(created_at);
        CREATE INDEX IF NOT EXISTS idx_altomatic_log_asset_id ON altomatic_log(asset_id);",
    )
}
