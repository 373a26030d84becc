//! Anonymous safety event log over SQLite.
//!
//! Writers serialize through one connection behind a mutex: cycles for
//! independent zones share this store, and SQLite gets exactly one writer at
//! a time. Rows are immutable once inserted.

use rusqlite::{params, Connection, OpenFlags};
use sitegate_core::ports::{AuditError, AuditSink};
use sitegate_core::{GateAction, PpeKind};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One persisted gating decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    pub id: i64,
    /// Unix seconds.
    pub ts: i64,
    pub zone_id: String,
    /// Comma-joined, lexicographically sorted PPE tokens; empty on ALLOW.
    pub missing_ppe: String,
    pub action_taken: String,
}

pub struct AuditLog {
    db_path: PathBuf,
    conn: Mutex<Connection>,
}

fn now_ts() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn join_missing(missing: &BTreeSet<PpeKind>) -> String {
    let mut tokens: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
    tokens.sort_unstable();
    tokens.join(",")
}

impl AuditLog {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, rusqlite::Error> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts INTEGER NOT NULL,
                zone_id TEXT NOT NULL,
                missing_ppe TEXT,
                action_taken TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_ts ON events(ts);
            "#,
        )?;
        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Insert one immutable decision row.
    pub fn append(
        &self,
        zone_id: &str,
        missing: &BTreeSet<PpeKind>,
        action: GateAction,
    ) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().expect("audit connection lock poisoned");
        conn.execute(
            "INSERT INTO events (ts, zone_id, missing_ppe, action_taken) VALUES (?1, ?2, ?3, ?4)",
            params![now_ts(), zone_id, join_missing(missing), action.as_str()],
        )?;
        Ok(())
    }

    /// Most recent rows, newest first. Diagnostics/read-side only.
    pub fn recent(&self, limit: u32) -> Result<Vec<AuditRow>, rusqlite::Error> {
        let conn = self.conn.lock().expect("audit connection lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, ts, zone_id, missing_ppe, action_taken FROM events ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |r| {
                Ok(AuditRow {
                    id: r.get(0)?,
                    ts: r.get(1)?,
                    zone_id: r.get(2)?,
                    missing_ppe: r.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    action_taken: r.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<i64, rusqlite::Error> {
        let conn = self.conn.lock().expect("audit connection lock poisoned");
        conn.query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0))
    }

    /// Column names of the events table. Lets callers verify the privacy
    /// contract against the live schema, not just this crate's source.
    pub fn columns(&self) -> Result<Vec<String>, rusqlite::Error> {
        let conn = self.conn.lock().expect("audit connection lock poisoned");
        let mut stmt = conn.prepare("PRAGMA table_info(events)")?;
        let names = stmt
            .query_map([], |r| r.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl AuditSink for AuditLog {
    fn record(
        &self,
        zone_id: &str,
        missing: &BTreeSet<PpeKind>,
        action: GateAction,
    ) -> Result<(), AuditError> {
        self.append(zone_id, missing, action)
            .map_err(|e| AuditError::Write(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_missing_sorted_and_empty() {
        assert_eq!(join_missing(&BTreeSet::new()), "");
        let set: BTreeSet<PpeKind> = [PpeKind::Vest, PpeKind::Gloves, PpeKind::Helmet]
            .into_iter()
            .collect();
        assert_eq!(join_missing(&set), "gloves,helmet,vest");
    }
}
