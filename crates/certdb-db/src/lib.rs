//! # certdb-db
//!
//! libSQL storage for the certification objectives dataset.
//!
//! Four tables (`states`, `tests`, `objectives`, `audits`) with foreign keys
//! enforced on every connection. Writes go through a [`Writer`], obtained
//! either directly from [`CertDb::writer`] or from a [`UnitOfWork`] so that
//! all rows for one state commit or roll back together. Reads and the
//! read-only projections served by the CLI and HTTP API live on [`CertDb`].

pub mod error;
pub mod helpers;
mod migrations;
pub mod projections;
pub mod repos;

use error::DatabaseError;
use libsql::Builder;

pub use repos::Writer;

/// Central database handle.
pub struct CertDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl CertDb {
    /// Open a local database at `path` (or `":memory:"`), creating the schema
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let cert_db = Self { db, conn };
        cert_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(cert_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Auto-committing writer on the main connection.
    #[must_use]
    pub const fn writer(&self) -> Writer<'_> {
        Writer::new(&self.conn)
    }

    /// Begin a transaction covering one state-processing unit.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if `BEGIN` fails.
    pub async fn begin(&self) -> Result<UnitOfWork, DatabaseError> {
        let tx = self.conn.transaction().await?;
        Ok(UnitOfWork { tx })
    }
}

/// An open transaction. Dropping it without [`UnitOfWork::commit`] rolls back.
pub struct UnitOfWork {
    tx: libsql::Transaction,
}

impl UnitOfWork {
    #[must_use]
    pub fn writer(&self) -> Writer<'_> {
        Writer::new(&self.tx)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if `COMMIT` fails.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if `ROLLBACK` fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
