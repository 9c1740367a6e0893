//! SQLite store handle and utilities.
//!
//! Runtime defaults follow the usual local-store setup:
//! - `journal_mode = WAL` to allow concurrent readers while a writer commits
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` so category deletes cascade and references die with
//!   their target item

pub mod migrations;
pub mod query;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::{path::Path, time::Duration};

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// An explicitly constructed store handle.
///
/// Every operation receives the handle it works on; there is no process-wide
/// client. Mutations go through [`Store::write`], which scopes one
/// transaction to one closure.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the store at `path`, apply pragmas, and migrate.
    ///
    /// # Errors
    ///
    /// Returns an error if opening/configuring/migrating the database fails.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store directory {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("open store database {}", path.display()))?;
        Self::from_connection(conn, busy_timeout)
    }

    /// Open a private in-memory store. Used by tests and dry runs.
    ///
    /// # Errors
    ///
    /// Returns an error if configuring or migrating the database fails.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory store")?;
        Self::from_connection(conn, DEFAULT_BUSY_TIMEOUT)
    }

    /// Wrap an existing connection, applying pragmas and migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if configuring or migrating the database fails.
    pub fn from_connection(mut conn: Connection, busy_timeout: Duration) -> Result<Self> {
        configure_connection(&conn, busy_timeout).context("configure sqlite pragmas")?;
        migrations::migrate(&mut conn).context("apply store migrations")?;
        Ok(Self { conn })
    }

    /// Shared read access. Reads outside a transaction see the last commit.
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one `IMMEDIATE` transaction.
    ///
    /// `IMMEDIATE` takes the database write lock at `BEGIN`, so the reads a
    /// mutation makes cannot be invalidated by another writer before it
    /// commits. The transaction commits only when `f` returns `Ok`; any error
    /// (or panic) drops it, which rolls back.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or a store error from `BEGIN`/`COMMIT`.
    pub fn write<T, E>(&mut self, f: impl FnOnce(&Transaction<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Current wall-clock time in microseconds, the unit of every `*_at_us` column.
pub(crate) fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}
