//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! Config services and the engine call store methods; they never
//! execute SQL directly.

use crate::{error::ScoreResult, event::EventLogEntry};
mod config;
mod signals;
use rusqlite::{params, Connection};

pub use config::StoredConfigValue;
pub use signals::TicketWindowCounts;

pub struct RiskStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl RiskStore {
    pub fn open(path: &str) -> ScoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ScoreResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    pub fn reopen(&self) -> ScoreResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ScoreResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_signals.sql"))?;
        Ok(())
    }

    /// In-memory store with the schema applied.
    pub fn in_memory_migrated() -> ScoreResult<Self> {
        let store = Self::in_memory()?;
        store.migrate()?;
        Ok(store)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> ScoreResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (tenant_id, event_type, payload, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.tenant_id,
                entry.event_type,
                entry.payload,
                entry.recorded_at,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_tenant(&self, tenant_id: &str) -> ScoreResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tenant_id, event_type, payload, recorded_at
             FROM event_log WHERE tenant_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![tenant_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    tenant_id: row.get(1)?,
                    event_type: row.get(2)?,
                    payload: row.get(3)?,
                    recorded_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, tenant_id: &str, event_type: &str) -> ScoreResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM event_log WHERE tenant_id = ?1 AND event_type = ?2",
                params![tenant_id, event_type],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
