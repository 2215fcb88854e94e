//! State repository.

use chrono::Utc;

use certdb_core::entities::State;

use crate::CertDb;
use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_optional_datetime};
use crate::repos::Writer;

const STATE_COLUMNS: &str = "id, name, abbrev, last_full_refresh";

pub(crate) fn row_to_state(row: &libsql::Row) -> Result<State, DatabaseError> {
    Ok(State {
        id: row.get::<i64>(0)?,
        name: row.get::<String>(1)?,
        abbrev: row.get::<String>(2)?,
        last_full_refresh: parse_optional_datetime(get_opt_string(row, 3)?.as_deref())?,
    })
}

impl Writer<'_> {
    /// Insert the state if absent and return its row either way. Only the
    /// name is unique; two states may share an abbreviation.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn upsert_state(&self, name: &str, abbrev: &str) -> Result<State, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "INSERT INTO states (name, abbrev) VALUES (?1, ?2)
                     ON CONFLICT(name) DO UPDATE SET name = excluded.name
                     RETURNING {STATE_COLUMNS}"
                ),
                libsql::params![name, abbrev],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_state(&row)
    }

    /// Stamp the state's last full refresh with the current time.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no such state exists.
    pub async fn touch_state_refresh(&self, state_id: i64) -> Result<(), DatabaseError> {
        let changed = self
            .conn
            .execute(
                "UPDATE states SET last_full_refresh = ?1 WHERE id = ?2",
                libsql::params![Utc::now().to_rfc3339(), state_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "state",
                id: state_id,
            });
        }
        Ok(())
    }
}

impl CertDb {
    /// Look a state up by name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_state_by_name(&self, name: &str) -> Result<Option<State>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {STATE_COLUMNS} FROM states WHERE name = ?1 COLLATE NOCASE"),
                [name.trim()],
            )
            .await?;
        rows.next().await?.map(|row| row_to_state(&row)).transpose()
    }

    /// All states, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_states(&self) -> Result<Vec<State>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(&format!("SELECT {STATE_COLUMNS} FROM states ORDER BY name"), ())
            .await?;
        let mut states = Vec::new();
        while let Some(row) = rows.next().await? {
            states.push(row_to_state(&row)?);
        }
        Ok(states)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_states(&self) -> Result<u32, DatabaseError> {
        self.count("states").await
    }

    pub(crate) async fn count(&self, table: &'static str) -> Result<u32, DatabaseError> {
        let mut rows = self
            .conn()
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        crate::helpers::get_u32(&row, 0)
    }
}
