//! SQLite store implementation

use super::MirrorStore;
use crate::model::{
    DiscoveredIssue, IssueId, IssueState, IssueSyncState, MirrorStatus, StatusSource,
    SyncIssueError,
};
use crate::sync::{RunOutcome, RunStatus, SyncRun, SyncRunLedger};
use crate::{MirrorSyncError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,

    /// Enable WAL mode for better concurrency
    pub wal_mode: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        // Always use ~/.config for consistency across platforms
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("mirrorsync");
        path.push("mirror.db");

        Self {
            path,
            wal_mode: true,
        }
    }
}

impl StoreConfig {
    /// Config pointing at an explicit database path
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            wal_mode: true,
        }
    }
}

/// SQLite-backed mirror store and run ledger
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the store database
    pub fn new(config: StoreConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %config.path.display(), "Opening mirror store");

        let conn = Connection::open(&config.path)?;

        if config.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        let store = Self { conn };
        store.init_schema()?;

        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS issue_sync_state (
                issue_id TEXT PRIMARY KEY,
                external_number INTEGER NOT NULL,
                mirror_status TEXT NOT NULL,
                status_raw_snapshot TEXT,
                status_source TEXT,
                status_updated_at TEXT,
                last_sync_at TEXT NOT NULL,
                sync_error_code TEXT,
                sync_error_message TEXT
            );

            CREATE TABLE IF NOT EXISTS discovered_issues (
                repo TEXT NOT NULL,
                number INTEGER NOT NULL,
                title TEXT NOT NULL,
                state TEXT NOT NULL,
                url TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (repo, number)
            );

            CREATE TABLE IF NOT EXISTS sync_runs (
                run_id INTEGER PRIMARY KEY AUTOINCREMENT,
                query TEXT NOT NULL,
                status TEXT NOT NULL,
                total_count INTEGER NOT NULL DEFAULT 0,
                upserted_count INTEGER NOT NULL DEFAULT 0,
                error TEXT,
                started_at TEXT NOT NULL,
                finished_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_issue_sync_state_number
                ON issue_sync_state(external_number);
            CREATE INDEX IF NOT EXISTS idx_sync_runs_status
                ON sync_runs(status);
            "#,
        )?;

        Ok(())
    }

    fn issue_state_from_row(row: &Row<'_>) -> rusqlite::Result<RawIssueStateRow> {
        Ok(RawIssueStateRow {
            issue_id: row.get(0)?,
            external_number: row.get(1)?,
            mirror_status: row.get(2)?,
            status_raw_snapshot: row.get(3)?,
            status_source: row.get(4)?,
            status_updated_at: row.get(5)?,
            last_sync_at: row.get(6)?,
            sync_error_code: row.get(7)?,
            sync_error_message: row.get(8)?,
        })
    }
}

/// Raw row shape before enum decoding
struct RawIssueStateRow {
    issue_id: String,
    external_number: i64,
    mirror_status: String,
    status_raw_snapshot: Option<String>,
    status_source: Option<String>,
    status_updated_at: Option<String>,
    last_sync_at: String,
    sync_error_code: Option<String>,
    sync_error_message: Option<String>,
}

impl RawIssueStateRow {
    fn decode(self) -> Result<IssueSyncState> {
        let mirror_status = MirrorStatus::parse(&self.mirror_status).ok_or_else(|| {
            MirrorSyncError::Storage(format!("unknown mirror status: {}", self.mirror_status))
        })?;

        let status_source = match self.status_source {
            Some(value) => Some(StatusSource::parse(&value).ok_or_else(|| {
                MirrorSyncError::Storage(format!("unknown status source: {}", value))
            })?),
            None => None,
        };

        let sync_error = match (self.sync_error_code, self.sync_error_message) {
            (Some(code), Some(message)) => Some(SyncIssueError { code, message }),
            _ => None,
        };

        Ok(IssueSyncState {
            issue_id: IssueId::new(self.issue_id),
            external_number: self.external_number as u64,
            mirror_status,
            status_raw_snapshot: self.status_raw_snapshot,
            status_source,
            status_updated_at: self.status_updated_at,
            last_sync_at: self.last_sync_at,
            sync_error,
        })
    }
}

impl MirrorStore for SqliteStore {
    fn save_issue_state(&self, state: &IssueSyncState) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO issue_sync_state (
                issue_id, external_number, mirror_status, status_raw_snapshot,
                status_source, status_updated_at, last_sync_at,
                sync_error_code, sync_error_message
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(issue_id) DO UPDATE SET
                external_number = excluded.external_number,
                mirror_status = excluded.mirror_status,
                status_raw_snapshot = excluded.status_raw_snapshot,
                status_source = excluded.status_source,
                status_updated_at = excluded.status_updated_at,
                last_sync_at = excluded.last_sync_at,
                sync_error_code = excluded.sync_error_code,
                sync_error_message = excluded.sync_error_message
            "#,
            params![
                state.issue_id.as_str(),
                state.external_number as i64,
                state.mirror_status.as_str(),
                state.status_raw_snapshot.as_deref(),
                state.status_source.map(|s| s.as_str()),
                state.status_updated_at.as_deref(),
                &state.last_sync_at,
                state.sync_error.as_ref().map(|e| e.code.as_str()),
                state.sync_error.as_ref().map(|e| e.message.as_str()),
            ],
        )?;

        Ok(())
    }

    fn load_issue_state(&self, issue_id: &IssueId) -> Result<Option<IssueSyncState>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT issue_id, external_number, mirror_status, status_raw_snapshot,
                       status_source, status_updated_at, last_sync_at,
                       sync_error_code, sync_error_message
                FROM issue_sync_state WHERE issue_id = ?
                "#,
                params![issue_id.as_str()],
                Self::issue_state_from_row,
            )
            .optional()?;

        row.map(RawIssueStateRow::decode).transpose()
    }

    fn list_issue_states(&self) -> Result<Vec<IssueSyncState>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT issue_id, external_number, mirror_status, status_raw_snapshot,
                   status_source, status_updated_at, last_sync_at,
                   sync_error_code, sync_error_message
            FROM issue_sync_state
            ORDER BY external_number ASC, issue_id ASC
            "#,
        )?;

        let rows = stmt.query_map([], Self::issue_state_from_row)?;

        let mut states = Vec::new();
        for row in rows {
            states.push(row?.decode()?);
        }
        Ok(states)
    }

    fn upsert_discovered(&self, issue: &DiscoveredIssue) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        self.conn.execute(
            r#"
            INSERT INTO discovered_issues (
                repo, number, title, state, url, updated_at, fetched_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(repo, number) DO UPDATE SET
                title = excluded.title,
                state = excluded.state,
                url = excluded.url,
                updated_at = excluded.updated_at,
                fetched_at = excluded.fetched_at
            "#,
            params![
                &issue.repo,
                issue.number as i64,
                &issue.title,
                issue.state.as_str(),
                &issue.url,
                &issue.updated_at,
                now,
            ],
        )?;

        Ok(())
    }

    fn list_discovered(&self) -> Result<Vec<DiscoveredIssue>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT repo, number, title, state, url, updated_at
            FROM discovered_issues
            ORDER BY repo ASC, number ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DiscoveredIssue {
                repo: row.get(0)?,
                number: row.get::<_, i64>(1)? as u64,
                title: row.get(2)?,
                state: IssueState::parse(&row.get::<_, String>(3)?),
                url: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?;

        let mut issues = Vec::new();
        for row in rows {
            issues.push(row?);
        }
        Ok(issues)
    }
}

impl SyncRunLedger for SqliteStore {
    fn create_run(&self, query: &str) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO sync_runs (query, status, started_at) VALUES (?, ?, ?)",
            params![query, RunStatus::Running.as_str(), now],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_run(&self, run_id: i64, outcome: &RunOutcome) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let updated = self.conn.execute(
            r#"
            UPDATE sync_runs
            SET status = ?, total_count = ?, upserted_count = ?, error = ?, finished_at = ?
            WHERE run_id = ?
            "#,
            params![
                outcome.status.as_str(),
                outcome.total_count as i64,
                outcome.upserted_count as i64,
                outcome.error.as_deref(),
                now,
                run_id,
            ],
        )?;

        if updated == 0 {
            return Err(MirrorSyncError::Storage(format!(
                "sync run {} not found",
                run_id
            )));
        }
        Ok(())
    }

    fn list_runs(&self, limit: u32) -> Result<Vec<SyncRun>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT run_id, query, status, total_count, upserted_count,
                   error, started_at, finished_at
            FROM sync_runs
            ORDER BY run_id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;

        let mut runs = Vec::new();
        for row in rows {
            let (run_id, query, status, total, upserted, error, started_at, finished_at) = row?;
            let status = RunStatus::parse(&status).ok_or_else(|| {
                MirrorSyncError::Storage(format!("unknown run status: {}", status))
            })?;
            runs.push(SyncRun {
                run_id,
                query,
                status,
                total_count: total as u64,
                upserted_count: upserted as u64,
                error,
                started_at,
                finished_at,
            });
        }
        Ok(runs)
    }
}
