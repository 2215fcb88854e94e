//! Objective repository.

use certdb_core::drafts::NewObjective;
use certdb_core::entities::Objective;

use crate::CertDb;
use crate::error::DatabaseError;
use crate::helpers::{get_f64, get_flag, get_opt_string, get_u32, parse_enum};
use crate::repos::Writer;

pub(crate) const OBJECTIVE_COLUMNS: &str = "id, test_id, objective_index, text, \
     evidence_excerpt, evidence_url, evidence_locator, is_inferred, confidence, rationale, \
     validation_status, validator_notes";

/// Parse an objective starting at column `base`.
pub(crate) fn row_to_objective_at(row: &libsql::Row, base: i32) -> Result<Objective, DatabaseError> {
    Ok(Objective {
        id: row.get::<i64>(base)?,
        test_id: row.get::<i64>(base + 1)?,
        index: get_u32(row, base + 2)?,
        text: row.get::<String>(base + 3)?,
        evidence_excerpt: get_opt_string(row, base + 4)?,
        evidence_url: get_opt_string(row, base + 5)?,
        evidence_locator: get_opt_string(row, base + 6)?,
        is_inferred: get_flag(row, base + 7)?,
        confidence: get_f64(row, base + 8)?,
        rationale: get_opt_string(row, base + 9)?,
        validation_status: parse_enum(&row.get::<String>(base + 10)?)?,
        validator_notes: get_opt_string(row, base + 11)?,
    })
}

impl Writer<'_> {
    /// Insert an objective for `test_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the test does not exist, the index is
    /// already used for that test, or a column constraint fails.
    pub async fn insert_objective(
        &self,
        test_id: i64,
        objective: &NewObjective,
    ) -> Result<Objective, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "INSERT INTO objectives (test_id, objective_index, text, evidence_excerpt,
                    evidence_url, evidence_locator, is_inferred, confidence, rationale,
                    validation_status, validator_notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 RETURNING id",
                libsql::params![
                    test_id,
                    i64::from(objective.index),
                    objective.text.as_str(),
                    objective.evidence_excerpt.as_deref(),
                    objective.evidence_url.as_deref(),
                    objective.evidence_locator.as_deref(),
                    i64::from(objective.is_inferred),
                    objective.confidence,
                    objective.rationale.as_deref(),
                    objective.validation_status.as_str(),
                    objective.validator_notes.as_deref()
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;

        Ok(Objective {
            id: row.get::<i64>(0)?,
            test_id,
            index: objective.index,
            text: objective.text.clone(),
            evidence_excerpt: objective.evidence_excerpt.clone(),
            evidence_url: objective.evidence_url.clone(),
            evidence_locator: objective.evidence_locator.clone(),
            is_inferred: objective.is_inferred,
            confidence: objective.confidence,
            rationale: objective.rationale.clone(),
            validation_status: objective.validation_status,
            validator_notes: objective.validator_notes.clone(),
        })
    }
}

impl CertDb {
    /// Objectives of one test, ordered by index.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_objectives_for_test(&self, test_id: i64) -> Result<Vec<Objective>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {OBJECTIVE_COLUMNS} FROM objectives
                     WHERE test_id = ?1 ORDER BY objective_index"
                ),
                [test_id],
            )
            .await?;
        let mut objectives = Vec::new();
        while let Some(row) = rows.next().await? {
            objectives.push(row_to_objective_at(&row, 0)?);
        }
        Ok(objectives)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_objectives(&self) -> Result<u32, DatabaseError> {
        self.count("objectives").await
    }
}
