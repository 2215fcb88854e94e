//! Markdown coverage report.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use certdb_core::responses::{OverviewStats, StateCounts};

/// States averaging at least this confidence are listed as high quality.
pub const HIGH_CONFIDENCE: f64 = 0.8;
/// States averaging below this confidence are listed for manual review.
pub const LOW_CONFIDENCE: f64 = 0.6;
const LISTED_STATES: usize = 10;

/// `Complete` once a state has any objectives.
#[must_use]
pub const fn coverage_status(counts: &StateCounts) -> &'static str {
    if counts.objective_count > 0 {
        "Complete"
    } else {
        "Incomplete"
    }
}

fn share(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

/// Render the full report. Writing into a `String` cannot fail, so the
/// `fmt::Result`s are discarded.
#[must_use]
pub fn render(generated_at: DateTime<Utc>, overview: &OverviewStats, states: &[StateCounts]) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Teacher Certification Objectives - Coverage Report\n");
    let _ = writeln!(
        md,
        "**Generated:** {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let _ = writeln!(md, "## Overall Statistics\n");
    let _ = writeln!(md, "- **Total States Processed:** {}", overview.total_states);
    let _ = writeln!(md, "- **Total Tests Found:** {}", overview.total_tests);
    let _ = writeln!(md, "- **Total Objectives:** {}", overview.total_objectives);
    let _ = writeln!(
        md,
        "- **Verified Objectives:** {} ({:.1}%)",
        overview.verified_objectives,
        share(overview.verified_objectives, overview.total_objectives)
    );
    let _ = writeln!(
        md,
        "- **Inferred Objectives:** {} ({:.1}%)",
        overview.inferred_objectives,
        share(overview.inferred_objectives, overview.total_objectives)
    );
    let _ = writeln!(md, "- **Average Confidence:** {:.2}\n", overview.average_confidence);

    let _ = writeln!(md, "## Per-State Coverage\n");
    let _ = writeln!(md, "| State | Tests | Objectives | Verified | Inferred | Status |");
    let _ = writeln!(md, "|-------|-------|------------|----------|----------|--------|");
    for counts in states {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {} | {} |",
            counts.state.name,
            counts.test_count,
            counts.objective_count,
            counts.verified_count,
            counts.inferred_count,
            coverage_status(counts)
        );
    }

    let with_objectives = || states.iter().filter(|c| c.objective_count > 0);
    let high: Vec<&str> = with_objectives()
        .filter(|c| c.avg_confidence >= HIGH_CONFIDENCE)
        .map(|c| c.state.name.as_str())
        .collect();
    let low: Vec<&str> = with_objectives()
        .filter(|c| c.avg_confidence < LOW_CONFIDENCE)
        .map(|c| c.state.name.as_str())
        .collect();

    let _ = writeln!(md, "\n## Data Quality Insights\n");
    write_state_list(
        &mut md,
        &format!("States with High Confidence Data (>={HIGH_CONFIDENCE})"),
        &high,
    );
    write_state_list(
        &mut md,
        &format!("States Needing Manual Review (<{LOW_CONFIDENCE} confidence)"),
        &low,
    );

    let _ = writeln!(md, "## Recommendations\n");
    let _ = writeln!(md, "1. **Priority Review:** Focus on states with low confidence scores");
    let _ = writeln!(md, "2. **Source Verification:** Validate URLs and update broken links");
    let _ = writeln!(
        md,
        "3. **Content Enhancement:** Seek official test blueprints for inferred objectives"
    );
    let _ = writeln!(md, "4. **Regular Updates:** Refresh state sources quarterly");
    md
}

fn write_state_list(md: &mut String, title: &str, names: &[&str]) {
    let _ = writeln!(md, "**{title}:** {}\n", names.len());
    for name in names.iter().take(LISTED_STATES) {
        let _ = writeln!(md, "- {name}");
    }
    if !names.is_empty() {
        let _ = writeln!(md);
    }
}
