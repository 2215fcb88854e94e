//! # certdb-report
//!
//! File exports of the certdb store. Every emitter is a pure read of the
//! database and produces valid, possibly empty, artifacts on an empty store:
//!
//! - `data/<State>.jsonl`: one [`StateTestRecord`] per line
//! - `outputs/all_states_objectives.json` and `.csv`
//! - `outputs/validation_summary.csv`
//! - `reports/coverage_summary.md`

pub mod aggregate;
pub mod coverage;
pub mod csv;
pub mod error;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use certdb_config::PathsConfig;
use certdb_core::jurisdictions::file_stem;
use certdb_core::records::StateTestRecord;
use certdb_db::CertDb;

pub use error::ReportError;

pub const AGGREGATE_JSON: &str = "all_states_objectives.json";
pub const AGGREGATE_CSV: &str = "all_states_objectives.csv";
pub const VALIDATION_CSV: &str = "validation_summary.csv";
pub const COVERAGE_MD: &str = "coverage_summary.md";

/// Paths written by [`Reporter::emit_all`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportFiles {
    pub state_records: Vec<PathBuf>,
    pub aggregate_json: PathBuf,
    pub aggregate_csv: PathBuf,
    pub validation_summary: PathBuf,
    pub coverage_report: PathBuf,
}

/// Writes every export under the configured project root.
pub struct Reporter<'a> {
    db: &'a CertDb,
    paths: &'a PathsConfig,
    generated_at: DateTime<Utc>,
}

impl<'a> Reporter<'a> {
    #[must_use]
    pub fn new(db: &'a CertDb, paths: &'a PathsConfig) -> Self {
        Self {
            db,
            paths,
            generated_at: Utc::now(),
        }
    }

    /// Override the timestamp stamped into the coverage report.
    #[must_use]
    pub const fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    /// Write `data/<State>.jsonl` for every stored state, one line per test.
    /// A state without tests gets an empty file. A file that cannot be
    /// written is logged and left out of the result.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if a query fails or `data/` cannot be created.
    pub async fn emit_per_state_records(&self) -> Result<Vec<PathBuf>, ReportError> {
        let dir = ensure_dir(&self.paths.data_dir())?;
        let mut written = Vec::new();
        for state in self.db.list_states().await? {
            let records = self.db.state_records(&state).await?;
            let path = dir.join(format!("{}.jsonl", file_stem(&state.name)));
            if let Err(error) = serde_jsonlines::write_json_lines(&path, &records) {
                tracing::warn!(state = %state.name, path = %path.display(), %error, "skipping state records");
                continue;
            }
            tracing::debug!(state = %state.name, tests = records.len(), path = %path.display(), "wrote state records");
            written.push(path);
        }
        Ok(written)
    }

    /// Write the nested JSON document and the per-test CSV.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if a query, serialization or file write fails.
    pub async fn emit_aggregate(&self) -> Result<(PathBuf, PathBuf), ReportError> {
        let dir = ensure_dir(&self.paths.outputs_dir())?;

        let mut states = Vec::new();
        for state in self.db.list_states().await? {
            let records = self.db.state_records(&state).await?;
            states.push((state, records));
        }

        let csv = aggregate::render_tests_csv(states.iter().flat_map(|(_, records)| records));
        let csv_path = dir.join(AGGREGATE_CSV);
        write_file(&csv_path, &csv)?;

        let document = aggregate::build_document(states);
        let json_path = dir.join(AGGREGATE_JSON);
        write_file(&json_path, &serde_json::to_string_pretty(&document)?)?;

        tracing::debug!(states = document.len(), "wrote aggregate exports");
        Ok((json_path, csv_path))
    }

    /// Write the per-state validation CSV.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if a query or the file write fails.
    pub async fn emit_validation_summary(&self) -> Result<PathBuf, ReportError> {
        let dir = ensure_dir(&self.paths.outputs_dir())?;
        let counts = self.db.list_states_with_counts().await?;
        let path = dir.join(VALIDATION_CSV);
        write_file(&path, &aggregate::render_validation_csv(&counts))?;
        Ok(path)
    }

    /// Write the Markdown coverage report.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if a query or the file write fails.
    pub async fn emit_coverage_report(&self) -> Result<PathBuf, ReportError> {
        let dir = ensure_dir(&self.paths.reports_dir())?;
        let overview = self.db.overview().await?;
        let counts = self.db.list_states_with_counts().await?;
        let path = dir.join(COVERAGE_MD);
        write_file(
            &path,
            &coverage::render(self.generated_at, &overview, &counts),
        )?;
        Ok(path)
    }

    /// Run every emitter.
    ///
    /// # Errors
    ///
    /// Returns the first `ReportError` encountered.
    pub async fn emit_all(&self) -> Result<ReportFiles, ReportError> {
        let state_records = self.emit_per_state_records().await?;
        let (aggregate_json, aggregate_csv) = self.emit_aggregate().await?;
        let validation_summary = self.emit_validation_summary().await?;
        let coverage_report = self.emit_coverage_report().await?;
        tracing::info!(
            state_files = state_records.len(),
            root = %self.paths.root.display(),
            "reports written"
        );
        Ok(ReportFiles {
            state_records,
            aggregate_json,
            aggregate_csv,
            validation_summary,
            coverage_report,
        })
    }
}

/// Read back a `data/<State>.jsonl` file.
///
/// # Errors
///
/// Returns `ReportError` if the file cannot be read or a line does not parse.
pub fn read_state_records(path: &Path) -> Result<Vec<StateTestRecord>, ReportError> {
    let lines =
        serde_jsonlines::json_lines::<StateTestRecord, _>(path).map_err(ReportError::io(path))?;
    lines
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(ReportError::io(path))
}

fn ensure_dir(dir: &Path) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir).map_err(ReportError::io(dir))?;
    Ok(dir.to_path_buf())
}

fn write_file(path: &Path, contents: &str) -> Result<(), ReportError> {
    std::fs::write(path, contents).map_err(ReportError::io(path))
}
