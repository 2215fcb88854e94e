//! Per-state run audit repository. Append-only.

use certdb_core::drafts::NewAudit;
use certdb_core::entities::Audit;

use crate::CertDb;
use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, get_u32, parse_datetime, parse_enum, parse_optional_datetime};
use crate::repos::Writer;

fn row_to_audit(row: &libsql::Row) -> Result<Audit, DatabaseError> {
    Ok(Audit {
        id: row.get::<i64>(0)?,
        state_id: row.get::<i64>(1)?,
        status: parse_enum(&row.get::<String>(2)?)?,
        objective_path: parse_enum(&row.get::<String>(3)?)?,
        tests_found: get_u32(row, 4)?,
        objectives_found: get_u32(row, 5)?,
        objectives_inferred: get_u32(row, 6)?,
        queries_attempted: get_u32(row, 7)?,
        run_started_at: parse_datetime(&row.get::<String>(8)?)?,
        run_ended_at: parse_optional_datetime(get_opt_string(row, 9)?.as_deref())?,
        notes: get_opt_string(row, 10)?,
    })
}

impl Writer<'_> {
    /// Append an audit record for `state_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the state does not exist or the insert fails.
    pub async fn insert_audit(&self, state_id: i64, audit: &NewAudit) -> Result<Audit, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "INSERT INTO audits (state_id, status, objective_path, tests_found,
                    objectives_found, objectives_inferred, queries_attempted,
                    run_started_at, run_ended_at, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 RETURNING id",
                libsql::params![
                    state_id,
                    audit.status.as_str(),
                    audit.objective_path.as_str(),
                    i64::from(audit.tests_found),
                    i64::from(audit.objectives_found),
                    i64::from(audit.objectives_inferred),
                    i64::from(audit.queries_attempted),
                    audit.run_started_at.to_rfc3339(),
                    audit.run_ended_at.map(|t| t.to_rfc3339()),
                    audit.notes.as_deref()
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;

        Ok(Audit {
            id: row.get::<i64>(0)?,
            state_id,
            status: audit.status,
            objective_path: audit.objective_path,
            tests_found: audit.tests_found,
            objectives_found: audit.objectives_found,
            objectives_inferred: audit.objectives_inferred,
            queries_attempted: audit.queries_attempted,
            run_started_at: audit.run_started_at,
            run_ended_at: audit.run_ended_at,
            notes: audit.notes.clone(),
        })
    }
}

impl CertDb {
    /// Audits for one state, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_audits_for_state(&self, state_id: i64) -> Result<Vec<Audit>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, state_id, status, objective_path, tests_found, objectives_found,
                        objectives_inferred, queries_attempted, run_started_at, run_ended_at, notes
                 FROM audits WHERE state_id = ?1 ORDER BY id",
                [state_id],
            )
            .await?;
        let mut audits = Vec::new();
        while let Some(row) = rows.next().await? {
            audits.push(row_to_audit(&row)?);
        }
        Ok(audits)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_audits(&self) -> Result<u32, DatabaseError> {
        self.count("audits").await
    }
}
