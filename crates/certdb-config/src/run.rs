//! Run configuration: which states and which tests a pipeline run covers.

use certdb_core::drafts::NewTest;
use certdb_core::jurisdictions::{self, US_STATES};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_confidence_floor() -> f64 {
    0.4
}

fn default_tests() -> Vec<TestTemplate> {
    vec![
        TestTemplate {
            test_system: "Praxis".into(),
            test_name: "Elementary Education: Multiple Subjects".into(),
            test_code: Some("5001".into()),
            subject_area: "Elementary Education".into(),
            grade_band: "K-6".into(),
            official_source_url: Some("https://www.ets.org/praxis/prepare/materials/5001".into()),
            provider: "ETS".into(),
            source_last_updated: Some("2024".into()),
        },
        TestTemplate {
            test_system: "Praxis".into(),
            test_name: "Mathematics: Content Knowledge".into(),
            test_code: Some("5161".into()),
            subject_area: "Mathematics".into(),
            grade_band: "7-12".into(),
            official_source_url: Some("https://www.ets.org/praxis/prepare/materials/5161".into()),
            provider: "ETS".into(),
            source_last_updated: Some("2024".into()),
        },
        TestTemplate {
            test_system: "{abbrev} State Exam".into(),
            test_name: "{state} Teaching Foundations".into(),
            test_code: None,
            subject_area: "General Education".into(),
            grade_band: "All".into(),
            official_source_url: Some(
                "https://{abbrev_lower}.gov/education/teacher-certification".into(),
            ),
            provider: "State DOE".into(),
            source_last_updated: Some("2024".into()),
        },
    ]
}

/// A test definition whose string fields may contain `{state}`, `{abbrev}`
/// and `{abbrev_lower}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestTemplate {
    pub test_system: String,
    pub test_name: String,
    #[serde(default)]
    pub test_code: Option<String>,
    pub subject_area: String,
    pub grade_band: String,
    #[serde(default)]
    pub official_source_url: Option<String>,
    pub provider: String,
    #[serde(default)]
    pub source_last_updated: Option<String>,
}

impl TestTemplate {
    /// Substitute placeholders for one state.
    #[must_use]
    pub fn render(&self, state: &str, abbrev: &str) -> NewTest {
        let lower = abbrev.to_lowercase();
        let fill = |s: &str| {
            s.replace("{state}", state)
                .replace("{abbrev_lower}", &lower)
                .replace("{abbrev}", abbrev)
        };
        let fill_opt = |s: &Option<String>| s.as_deref().map(fill);
        NewTest {
            test_system: fill(&self.test_system),
            test_name: fill(&self.test_name),
            test_code: fill_opt(&self.test_code),
            subject_area: fill(&self.subject_area),
            grade_band: fill(&self.grade_band),
            official_source_url: fill_opt(&self.official_source_url),
            provider: fill(&self.provider),
            source_last_updated: fill_opt(&self.source_last_updated),
        }
    }
}

/// A state selected for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTarget {
    pub name: String,
    pub abbrev: String,
}

impl RunTarget {
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        jurisdictions::lookup(input).map_or_else(
            || Self {
                name: input.trim().to_string(),
                abbrev: jurisdictions::abbrev_for(input),
            },
            |j| Self {
                name: j.name.to_string(),
                abbrev: j.abbrev.to_string(),
            },
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// State names or abbreviations. `None` selects the demonstration subset;
    /// an explicit empty list produces an empty run.
    #[serde(default)]
    pub states: Option<Vec<String>>,

    #[serde(default = "default_tests")]
    pub tests: Vec<TestTemplate>,

    /// Generated objectives below this confidence are dropped, unless that
    /// would leave a test with none.
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,

    /// Skip inserting a test whose natural key already exists for the state.
    #[serde(default)]
    pub dedupe_tests: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            states: None,
            tests: default_tests(),
            confidence_floor: default_confidence_floor(),
            dedupe_tests: false,
        }
    }
}

impl RunConfig {
    /// Resolve the configured state list into canonical targets.
    #[must_use]
    pub fn resolve_states(&self) -> Vec<RunTarget> {
        match &self.states {
            Some(list) => list.iter().map(|s| RunTarget::from_input(s)).collect(),
            None => jurisdictions::demo_states()
                .iter()
                .map(|j| RunTarget::from_input(j.name))
                .collect(),
        }
    }

    /// Select every state.
    pub fn select_all_states(&mut self) {
        self.states = Some(US_STATES.iter().map(|j| j.name.to_string()).collect());
    }

    /// Render every configured test for one state.
    #[must_use]
    pub fn tests_for(&self, target: &RunTarget) -> Vec<NewTest> {
        self.tests
            .iter()
            .map(|t| t.render(&target.name, &target.abbrev))
            .collect()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(ConfigError::InvalidValue {
                field: "run.confidence_floor".into(),
                reason: format!("{} is outside [0, 1]", self.confidence_floor),
            });
        }
        if let Some(blank) = self.tests.iter().position(|t| t.test_name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: format!("run.tests[{blank}].test_name"),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
