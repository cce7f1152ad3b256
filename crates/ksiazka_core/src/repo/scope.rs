//! Transactional repository scope.
//!
//! # Responsibility
//! - Own one SQLite connection from acquire to release.
//! - Make exactly one commit-or-rollback decision per scope.
//!
//! # Invariants
//! - A transaction is open for the whole scope lifetime.
//! - A scope that was not marked complete always rolls back.
//! - The connection is closed after the decision, even when it failed.
//! - Dropping an unreleased scope runs the same release routine.

use crate::config;
use crate::db::{open_db, open_db_in_memory};
use crate::repo::error::{RepoResult, RepositoryError};
use crate::repo::register_repo::SqliteRegisterRepository;
use log::{debug, error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Guard over one connection and its single transaction.
pub struct RepositoryScope {
    // Taken only by `finish`, which runs once from `release` or `drop`.
    conn: Option<Connection>,
    complete: bool,
    started_at: Instant,
}

impl RepositoryScope {
    /// Opens the database at `path` and begins the scope transaction.
    pub fn acquire(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        let conn = open_db(path).map_err(|err| {
            RepositoryError::with_cause(
                format!("error getting connection to `{}`", path.display()),
                err,
            )
        })?;
        Self::begin(conn)
    }

    /// Opens the process-wide database configured in [`config`].
    pub fn acquire_configured() -> RepoResult<Self> {
        Self::acquire(config::db_path())
    }

    /// Opens a private in-memory database. Data is lost on release.
    pub fn acquire_in_memory() -> RepoResult<Self> {
        let conn = open_db_in_memory().map_err(|err| {
            RepositoryError::with_cause("error getting in-memory connection", err)
        })?;
        Self::begin(conn)
    }

    /// Acquires a scope, runs `work` and releases the scope on every path.
    ///
    /// `work` decides about the commit by calling [`Self::mark_complete`].
    /// When both `work` and the release fail, the returned error carries
    /// both causes, the work failure first.
    pub fn run<T>(
        path: impl AsRef<Path>,
        work: impl FnOnce(&mut RepositoryScope) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let mut scope = Self::acquire(path)?;
        let outcome = work(&mut scope);
        let released = scope.release();

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(err), Ok(())) => Err(err),
            (Ok(_), Err(release_err)) => Err(release_err),
            (Err(err), Err(release_err)) => Err(RepositoryError::new(format!(
                "{}; release after failure also failed",
                err.message()
            ))
            .caused_by(err)
            .caused_by(release_err)),
        }
    }

    fn begin(conn: Connection) -> RepoResult<Self> {
        conn.execute_batch("BEGIN;")
            .map_err(|err| RepositoryError::with_cause("error beginning transaction", err))?;
        debug!("event=scope_acquire module=repo status=ok");
        Ok(Self {
            conn: Some(conn),
            complete: false,
            started_at: Instant::now(),
        })
    }

    /// Marks every operation of this scope as successful.
    ///
    /// Pure flag flip; calling it more than once has no further effect.
    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Register repository bound to this scope's connection.
    pub fn registers(&self) -> SqliteRegisterRepository<'_> {
        SqliteRegisterRepository::new(self.connection())
    }

    /// Raw connection inside the scope transaction.
    pub(crate) fn connection(&self) -> &Connection {
        match self.conn.as_ref() {
            Some(conn) => conn,
            None => unreachable!("scope connection is only taken during release"),
        }
    }

    /// Commits when marked complete, otherwise rolls back; then closes.
    pub fn release(mut self) -> RepoResult<()> {
        self.finish()
    }

    fn finish(&mut self) -> RepoResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        let (decision, sql) = if self.complete {
            ("commit", "COMMIT;")
        } else {
            ("rollback", "ROLLBACK;")
        };

        let decided = conn.execute_batch(sql);
        let closed = conn.close().map_err(|(_, err)| err);
        let duration_ms = self.started_at.elapsed().as_millis();

        let settled = settle(decision, decided, closed);
        match &settled {
            Ok(()) => info!(
                "event=scope_release module=repo status=ok decision={} duration_ms={}",
                decision, duration_ms
            ),
            Err(err) => error!(
                "event=scope_release module=repo status=error decision={} duration_ms={} error={}",
                decision, duration_ms, err
            ),
        }
        settled
    }
}

/// Folds the commit-or-rollback outcome and the close outcome into one result.
///
/// The decision failure, when present, is always the first cause.
fn settle(
    decision: &'static str,
    decided: rusqlite::Result<()>,
    closed: rusqlite::Result<()>,
) -> RepoResult<()> {
    match (decided, closed) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(decide_err), Ok(())) => Err(RepositoryError::with_cause(
            format!("error during {decision}"),
            decide_err,
        )),
        (Ok(()), Err(close_err)) => Err(RepositoryError::with_cause(
            "error closing connection",
            close_err,
        )),
        (Err(decide_err), Err(close_err)) => Err(RepositoryError::new(format!(
            "error during {decision} and closing connection"
        ))
        .caused_by(decide_err)
        .caused_by(close_err)),
    }
}

impl Drop for RepositoryScope {
    fn drop(&mut self) {
        if self.conn.is_none() {
            return;
        }
        if let Err(err) = self.finish() {
            error!("event=scope_drop module=repo status=error error={err}");
        }
    }
}
