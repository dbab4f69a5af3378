//! SQLite mirror of listings and outcomes
//!
//! Each process run gets a row in `runs`; listings and outcomes hang off it.
//! Rewriting a site's records or a report replaces the earlier rows of the
//! same run.

use crate::crawler::{ReportScope, RunReport};
use crate::extract::JobListing;
use crate::output::traits::{OutputError, OutputResult, ResultSink};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per process run
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Normalized job listings
CREATE TABLE IF NOT EXISTS listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    source TEXT NOT NULL,
    title TEXT NOT NULL,
    company TEXT NOT NULL,
    url TEXT NOT NULL,
    description TEXT NOT NULL,
    location TEXT NOT NULL,
    salary TEXT NOT NULL,
    crawled_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_run_source ON listings(run_id, source);

-- Per-site job outcomes
CREATE TABLE IF NOT EXISTS outcomes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    site TEXT NOT NULL,
    engine TEXT NOT NULL,
    count INTEGER,
    status TEXT NOT NULL,
    error TEXT
);

CREATE INDEX IF NOT EXISTS idx_outcomes_run ON outcomes(run_id);
"#;

/// Creates all tables and indexes if they do not exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Result sink backed by a SQLite database
pub struct SqliteSink {
    conn: Mutex<Connection>,
    run_id: i64,
}

impl SqliteSink {
    /// Opens (or creates) the database and starts a run row
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration the run was started with
    pub fn open(path: &Path, config_hash: &str) -> OutputResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        Self::with_connection(conn, config_hash)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory(config_hash: &str) -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::with_connection(conn, config_hash)
    }

    fn with_connection(conn: Connection, config_hash: &str) -> OutputResult<Self> {
        initialize_schema(&conn)?;
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, 'running')",
            params![Utc::now().to_rfc3339(), config_hash],
        )?;
        let run_id = conn.last_insert_rowid();
        tracing::debug!("Recording run {} in SQLite", run_id);

        Ok(Self {
            conn: Mutex::new(conn),
            run_id,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    fn lock(&self) -> OutputResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| OutputError::Write("database connection lock poisoned".to_string()))
    }

    /// Number of listings stored for a site in this run
    pub fn listing_count(&self, source: &str) -> OutputResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM listings WHERE run_id = ?1 AND source = ?2",
            params![self.run_id, source],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Outcomes stored for this run as (site, status) pairs, in insertion order
    pub fn outcomes(&self) -> OutputResult<Vec<(String, String)>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT site, status FROM outcomes WHERE run_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![self.run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Run status as stored in `runs`
    pub fn run_status(&self) -> OutputResult<String> {
        let conn = self.lock()?;
        let status = conn.query_row(
            "SELECT status FROM runs WHERE id = ?1",
            params![self.run_id],
            |row| row.get(0),
        )?;
        Ok(status)
    }
}

impl SqliteSink {
    fn insert_listings(
        &self,
        tx: &rusqlite::Transaction<'_>,
        site: &str,
        records: &[JobListing],
    ) -> OutputResult<()> {
        let mut insert = tx.prepare(
            "INSERT INTO listings
                (run_id, source, title, company, url, description, location, salary, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for listing in records {
            insert.execute(params![
                self.run_id,
                site,
                listing.title,
                listing.company,
                listing.url,
                listing.description,
                listing.location,
                listing.salary,
                listing.crawled_at.to_rfc3339(),
            ])?;
        }
        Ok(())
    }
}

impl ResultSink for SqliteSink {
    fn write_records(&self, site: &str, records: &[JobListing]) -> OutputResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM listings WHERE run_id = ?1 AND source = ?2",
            params![self.run_id, site],
        )?;
        self.insert_listings(&tx, site, records)?;

        tx.commit()?;
        Ok(())
    }

    fn append_records(&self, site: &str, records: &[JobListing]) -> OutputResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        self.insert_listings(&tx, site, records)?;
        tx.commit()?;
        Ok(())
    }

    fn write_report(&self, report: &RunReport, scope: ReportScope) -> OutputResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        match scope {
            ReportScope::Full => {
                tx.execute(
                    "DELETE FROM outcomes WHERE run_id = ?1",
                    params![self.run_id],
                )?;
            }
            ReportScope::Partial(engine) => {
                tx.execute(
                    "DELETE FROM outcomes WHERE run_id = ?1 AND engine = ?2",
                    params![self.run_id, engine.as_str()],
                )?;
            }
        }

        {
            let mut insert = tx.prepare(
                "INSERT INTO outcomes (run_id, site, engine, count, status, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for outcome in &report.results {
                let in_scope = match scope {
                    ReportScope::Full => true,
                    ReportScope::Partial(engine) => outcome.engine == engine,
                };
                if !in_scope {
                    continue;
                }
                insert.execute(params![
                    self.run_id,
                    outcome.site,
                    outcome.engine.as_str(),
                    outcome.count.map(|c| c as i64),
                    outcome.status.as_str(),
                    outcome.error,
                ])?;
            }
        }

        tx.execute(
            "UPDATE runs SET finished_at = ?1, status = 'completed' WHERE id = ?2",
            params![Utc::now().to_rfc3339(), self.run_id],
        )?;

        tx.commit()?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSink")
            .field("run_id", &self.run_id)
            .finish()
    }
}
