//! `SQLite`-backed implementation of [`RunStore`].
//!
//! Uses a single `Mutex<Connection>` for thread safety.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use pulseline_types::record::{ProjectId, RunId, RunOutcome, RunRecord};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{self, StateError};
use crate::store::RunStore;

/// `SQLite` datetime format (UTC, no timezone suffix).
const SQLITE_DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Idempotent DDL for run tracking tables.
const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS pipeline_runs (
    id TEXT PRIMARY KEY,
    project TEXT NOT NULL,
    pid INTEGER,
    log_path TEXT,
    started_at TEXT,
    finished_at TEXT,
    outcome TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS run_elements (
    run_id TEXT NOT NULL REFERENCES pipeline_runs(id),
    element TEXT NOT NULL,
    started_at TEXT,
    ended_at TEXT,
    PRIMARY KEY (run_id, element)
);
";

/// `SQLite`-backed run storage.
///
/// Create with [`SqliteRunStore::open`] for file-backed persistence or
/// [`SqliteRunStore::in_memory`] for tests.
pub struct SqliteRunStore {
    conn: Mutex<Connection>,
}

impl SqliteRunStore {
    /// Open or create a `SQLite` run database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if the directory can't be created,
    /// or [`StateError::Sqlite`] if the database can't be opened.
    pub fn open(path: &Path) -> error::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory `SQLite` store (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Sqlite`] if the in-memory database can't
    /// be initialized.
    pub fn in_memory() -> error::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection lock.
    fn lock_conn(&self) -> error::Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StateError::LockPoisoned)
    }

    /// Convert a `SQLite` datetime string to ISO-8601.
    fn sqlite_to_iso8601(raw: &str) -> String {
        NaiveDateTime::parse_from_str(raw, SQLITE_DATETIME_FMT).map_or_else(
            |_| raw.to_string(),
            |ndt| format!("{}Z", ndt.format("%Y-%m-%dT%H:%M:%S")),
        )
    }

    /// Convert an ISO-8601 string to `SQLite` datetime format.
    fn iso8601_to_sqlite(iso: &str) -> String {
        chrono::DateTime::parse_from_rfc3339(iso).map_or_else(
            |_| iso.to_string(),
            |dt| dt.format(SQLITE_DATETIME_FMT).to_string(),
        )
    }

    #[cfg(test)]
    fn get_element_row(
        &self,
        run: &RunId,
        element: &str,
    ) -> error::Result<Option<(Option<String>, Option<String>)>> {
        let conn = self.lock_conn()?;
        conn.query_row(
            "SELECT started_at, ended_at FROM run_elements WHERE run_id = ?1 AND element = ?2",
            rusqlite::params![run.as_str(), element],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(StateError::Sqlite)
    }
}

impl RunStore for SqliteRunStore {
    fn create_run(&self, record: &RunRecord) -> error::Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO pipeline_runs (id, project, pid, log_path, started_at, finished_at, outcome) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                record.id.as_str(),
                record.project.as_str(),
                record.pid,
                record.log_path,
                record.started_at.as_deref().map(Self::iso8601_to_sqlite),
                record.finished_at.as_deref().map(Self::iso8601_to_sqlite),
                record.outcome.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_run(&self, id: &RunId) -> error::Result<Option<RunRecord>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT id, project, pid, log_path, started_at, finished_at, outcome \
                 FROM pipeline_runs WHERE id = ?1",
                [id.as_str()],
                |row| {
                    let id: String = row.get(0)?;
                    let project: String = row.get(1)?;
                    let pid: Option<u32> = row.get(2)?;
                    let log_path: Option<String> = row.get(3)?;
                    let started_at: Option<String> = row.get(4)?;
                    let finished_at: Option<String> = row.get(5)?;
                    let outcome: String = row.get(6)?;
                    Ok((id, project, pid, log_path, started_at, finished_at, outcome))
                },
            )
            .optional()?;

        Ok(row.map(
            |(id, project, pid, log_path, started_at, finished_at, outcome)| RunRecord {
                id: RunId::new(id),
                project: ProjectId::new(project),
                pid,
                log_path,
                started_at: started_at.as_deref().map(Self::sqlite_to_iso8601),
                finished_at: finished_at.as_deref().map(Self::sqlite_to_iso8601),
                outcome: RunOutcome::from_str_opt(&outcome).unwrap_or(RunOutcome::Pending),
            },
        ))
    }

    fn update_run(&self, record: &RunRecord) -> error::Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE pipeline_runs SET project = ?2, pid = ?3, log_path = ?4, \
             started_at = ?5, finished_at = ?6, outcome = ?7 WHERE id = ?1",
            rusqlite::params![
                record.id.as_str(),
                record.project.as_str(),
                record.pid,
                record.log_path,
                record.started_at.as_deref().map(Self::iso8601_to_sqlite),
                record.finished_at.as_deref().map(Self::iso8601_to_sqlite),
                record.outcome.as_str(),
            ],
        )?;
        Ok(())
    }

    fn element_started(&self, run: &RunId, element: &str) -> error::Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO run_elements (run_id, element, started_at) \
             VALUES (?1, ?2, datetime('now')) \
             ON CONFLICT(run_id, element) DO UPDATE SET started_at = datetime('now')",
            rusqlite::params![run.as_str(), element],
        )?;
        Ok(())
    }

    fn element_ended(&self, run: &RunId, element: &str) -> error::Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO run_elements (run_id, element, ended_at) \
             VALUES (?1, ?2, datetime('now')) \
             ON CONFLICT(run_id, element) DO UPDATE SET ended_at = datetime('now')",
            rusqlite::params![run.as_str(), element],
        )?;
        Ok(())
    }
}
