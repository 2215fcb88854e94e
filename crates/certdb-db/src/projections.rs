//! Read-only projections served by `certdb` query subcommands and the HTTP API.

use std::collections::BTreeMap;

use certdb_core::entities::State;
use certdb_core::records::{ObjectiveRecord, StateTestRecord, TestRecord, round2};
use certdb_core::responses::{
    ConfidenceDistribution, OverviewStats, SearchFilters, SearchHit, SearchResponse, StateCounts,
    StateSummary,
};

use crate::CertDb;
use crate::error::DatabaseError;
use crate::helpers::{contains_pattern, get_f64, get_u32};
use crate::repos::objective::{OBJECTIVE_COLUMNS, row_to_objective_at};
use crate::repos::state::row_to_state;
use crate::repos::test::{TEST_COLUMNS, row_to_test_at};

impl CertDb {
    /// Every state with its test count, objective count, verified and
    /// inferred counts, and mean objective confidence (`0.0` without
    /// objectives).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_states_with_counts(&self) -> Result<Vec<StateCounts>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT s.id, s.name, s.abbrev, s.last_full_refresh,
                        (SELECT COUNT(*) FROM tests t2 WHERE t2.state_id = s.id),
                        COUNT(o.id),
                        COALESCE(SUM(CASE WHEN o.is_inferred = 0 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN o.is_inferred = 1 THEN 1 ELSE 0 END), 0),
                        COALESCE(AVG(o.confidence), 0.0)
                 FROM states s
                 LEFT JOIN tests t ON t.state_id = s.id
                 LEFT JOIN objectives o ON o.test_id = t.id
                 GROUP BY s.id
                 ORDER BY s.name",
                (),
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(StateCounts {
                state: row_to_state(&row)?,
                test_count: get_u32(&row, 4)?,
                objective_count: get_u32(&row, 5)?,
                verified_count: get_u32(&row, 6)?,
                inferred_count: get_u32(&row, 7)?,
                avg_confidence: get_f64(&row, 8)?,
            });
        }
        Ok(out)
    }

    /// All tests of `state` with their ordered objectives.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn state_records(&self, state: &State) -> Result<Vec<StateTestRecord>, DatabaseError> {
        let tests = self.list_tests_for_state(state.id).await?;
        let mut records = Vec::with_capacity(tests.len());
        for test in &tests {
            let objectives = self.get_objectives_for_test(test.id).await?;
            records.push(StateTestRecord::new(&state.name, test, &objectives));
        }
        Ok(records)
    }

    /// [`Self::state_records`] by state name; `None` for an unknown state.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn state_records_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Vec<StateTestRecord>>, DatabaseError> {
        match self.get_state_by_name(name).await? {
            Some(state) => Ok(Some(self.state_records(&state).await?)),
            None => Ok(None),
        }
    }

    /// Test/objective totals, mean confidence and last test creation time
    /// for one state; `None` for an unknown state.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn state_summary(&self, name: &str) -> Result<Option<StateSummary>, DatabaseError> {
        let Some(state) = self.get_state_by_name(name).await? else {
            return Ok(None);
        };
        let mut rows = self
            .conn()
            .query(
                "SELECT (SELECT COUNT(*) FROM tests WHERE state_id = ?1),
                        COUNT(o.id),
                        COALESCE(AVG(o.confidence), 0.0),
                        (SELECT MAX(created_at) FROM tests WHERE state_id = ?1)
                 FROM tests t
                 JOIN objectives o ON o.test_id = t.id
                 WHERE t.state_id = ?1",
                [state.id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;

        Ok(Some(StateSummary {
            total_tests: get_u32(&row, 0)?,
            total_objectives: get_u32(&row, 1)?,
            average_confidence: round2(get_f64(&row, 2)?),
            last_updated: row.get::<Option<String>>(3)?.unwrap_or_default(),
            state: state.name,
            abbreviation: state.abbrev,
        }))
    }

    /// Case-insensitive substring search over objective text, grouped by test.
    ///
    /// The state filter matches the state name exactly (ignoring case); the
    /// subject filter is a substring match on the test's subject area.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<SearchResponse, DatabaseError> {
        let mut conditions = vec!["o.text LIKE ?1 ESCAPE '\\'".to_string()];
        let mut params: Vec<libsql::Value> = vec![libsql::Value::Text(contains_pattern(query))];

        if let Some(ref state) = filters.state {
            params.push(libsql::Value::Text(state.trim().to_string()));
            conditions.push(format!("s.name = ?{} COLLATE NOCASE", params.len()));
        }
        if let Some(ref subject) = filters.subject {
            params.push(libsql::Value::Text(contains_pattern(subject)));
            conditions.push(format!("t.subject_area LIKE ?{} ESCAPE '\\'", params.len()));
        }
        if let Some(min) = filters.min_confidence {
            params.push(libsql::Value::Real(min));
            conditions.push(format!("o.confidence >= ?{}", params.len()));
        }

        let test_columns = prefixed("t", TEST_COLUMNS);
        let objective_columns = prefixed("o", OBJECTIVE_COLUMNS);
        let sql = format!(
            "SELECT s.name, {test_columns}, {objective_columns}
             FROM objectives o
             JOIN tests t ON o.test_id = t.id
             JOIN states s ON t.state_id = s.id
             WHERE {}
             ORDER BY s.name, t.id, o.objective_index",
            conditions.join(" AND ")
        );

        let mut rows = self
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let mut results: Vec<(i64, SearchHit)> = Vec::new();
        while let Some(row) = rows.next().await? {
            let state_name = row.get::<String>(0)?;
            let test = row_to_test_at(&row, 1)?;
            let objective = row_to_objective_at(&row, 12)?;
            let record = ObjectiveRecord::from(&objective);
            let same_test = results.last().is_some_and(|(id, _)| *id == test.id);
            if same_test {
                if let Some((_, hit)) = results.last_mut() {
                    hit.matching_objectives.push(record);
                    hit.match_count += 1;
                }
            } else {
                results.push((
                    test.id,
                    SearchHit {
                        state: state_name,
                        test: TestRecord::from(&test),
                        matching_objectives: vec![record],
                        match_count: 1,
                    },
                ));
            }
        }

        let results: Vec<SearchHit> = results.into_iter().map(|(_, hit)| hit).collect();
        Ok(SearchResponse {
            query: query.to_string(),
            filters: filters.clone(),
            total_results: u32::try_from(results.len()).unwrap_or(u32::MAX),
            results,
        })
    }

    /// Global totals and the confidence histogram.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn overview(&self) -> Result<OverviewStats, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT (SELECT COUNT(*) FROM states),
                        (SELECT COUNT(*) FROM tests),
                        COUNT(*),
                        COALESCE(SUM(CASE WHEN is_inferred = 0 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN is_inferred = 1 THEN 1 ELSE 0 END), 0),
                        COALESCE(AVG(confidence), 0.0),
                        COALESCE(SUM(CASE WHEN confidence > 0.8 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN confidence >= 0.5 AND confidence <= 0.8 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN confidence < 0.5 THEN 1 ELSE 0 END), 0)
                 FROM objectives",
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;

        Ok(OverviewStats {
            total_states: get_u32(&row, 0)?,
            total_tests: get_u32(&row, 1)?,
            total_objectives: get_u32(&row, 2)?,
            verified_objectives: get_u32(&row, 3)?,
            inferred_objectives: get_u32(&row, 4)?,
            average_confidence: round2(get_f64(&row, 5)?),
            data_quality_distribution: ConfidenceDistribution {
                high_confidence: get_u32(&row, 6)?,
                medium_confidence: get_u32(&row, 7)?,
                low_confidence: get_u32(&row, 8)?,
            },
        })
    }

    /// Every state with its records, keyed by state name. Used by the
    /// aggregate exports.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn all_state_records(
        &self,
    ) -> Result<BTreeMap<String, Vec<StateTestRecord>>, DatabaseError> {
        let mut out = BTreeMap::new();
        for state in self.list_states().await? {
            let records = self.state_records(&state).await?;
            out.insert(state.name, records);
        }
        Ok(out)
    }
}

/// Qualify a comma-separated column list with a table alias.
fn prefixed(alias: &str, columns: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
