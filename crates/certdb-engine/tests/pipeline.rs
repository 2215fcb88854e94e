//! End-to-end runs of the orchestrator against an in-memory store and a
//! temporary project root.

use std::time::Duration;

use certdb_config::{CertdbConfig, PathsConfig, RunTarget, TestTemplate};
use certdb_core::drafts::NewTest;
use certdb_core::enums::{AuditStatus, ObjectivePath, ValidationStatus};
use certdb_db::CertDb;
use certdb_engine::discovery::{DiscoveredObjective, Discovery, DiscoveryResult};
use certdb_engine::{Orchestrator, RunContext, StubDiscovery};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

fn elementary_template() -> TestTemplate {
    TestTemplate {
        test_system: "Praxis".into(),
        test_name: "Elementary Education: Multiple Subjects".into(),
        test_code: Some("5001".into()),
        subject_area: "Elementary Education".into(),
        grade_band: "K-6".into(),
        official_source_url: Some("https://www.ets.org/praxis/prepare/materials/5001".into()),
        provider: "ETS".into(),
        source_last_updated: Some("2024".into()),
    }
}

fn config(dir: &TempDir, states: &[&str]) -> CertdbConfig {
    let mut config = CertdbConfig {
        paths: PathsConfig {
            root: dir.path().to_path_buf(),
        },
        ..CertdbConfig::default()
    };
    config.run.states = Some(states.iter().map(ToString::to_string).collect());
    config.run.tests = vec![elementary_template()];
    config
}

async fn run_with<D: Discovery>(db: &CertDb, config: &CertdbConfig, discovery: D) -> RunContext {
    let mut ctx = RunContext::create(&config.paths.logs_dir()).unwrap();
    Orchestrator::new(db, config, discovery)
        .run(&mut ctx)
        .await
        .unwrap();
    ctx
}

async fn memory_db() -> CertDb {
    CertDb::open_local(":memory:").await.unwrap()
}

/// Returns fixed candidates for every test.
struct FixedDiscovery {
    objectives: Vec<String>,
    sources: Vec<String>,
    extra_tests: Vec<NewTest>,
}

impl FixedDiscovery {
    fn objectives(texts: &[&str]) -> Self {
        Self {
            objectives: texts.iter().map(ToString::to_string).collect(),
            sources: Vec::new(),
            extra_tests: Vec::new(),
        }
    }
}

impl Discovery for FixedDiscovery {
    async fn discover(&self, _state: &str, _test: &NewTest) -> DiscoveryResult {
        DiscoveryResult {
            candidate_tests: self.extra_tests.clone(),
            candidate_objectives: self
                .objectives
                .iter()
                .map(|t| DiscoveredObjective::new(t.as_str(), Some("https://www.ets.org/praxis/5001.pdf")))
                .collect(),
            supporting_sources: self.sources.clone(),
            queries_attempted: 2,
        }
    }
}

/// Never answers within any reasonable timeout.
struct SlowDiscovery;

impl Discovery for SlowDiscovery {
    async fn discover(&self, _state: &str, _test: &NewTest) -> DiscoveryResult {
        tokio::time::sleep(Duration::from_secs(60)).await;
        DiscoveryResult::empty(99)
    }
}

#[tokio::test]
async fn texas_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &["TX"]);
    let db = memory_db().await;

    let ctx = run_with(&db, &config, StubDiscovery).await;

    assert_eq!(db.count_states().await.unwrap(), 1);
    assert_eq!(db.count_tests().await.unwrap(), 1);
    assert_eq!(db.count_audits().await.unwrap(), 1);

    let state = db.get_state_by_name("Texas").await.unwrap().unwrap();
    assert_eq!(state.abbrev, "TX");
    assert!(state.last_full_refresh.is_some());

    let tests = db.list_tests_for_state(state.id).await.unwrap();
    let objectives = db.get_objectives_for_test(tests[0].id).await.unwrap();
    assert!(!objectives.is_empty());
    for objective in &objectives {
        assert!(objective.is_inferred);
        assert!((objective.confidence - 0.75).abs() < f64::EPSILON);
        assert_eq!(objective.validation_status, ValidationStatus::Inferred);
    }

    let audits = db.list_audits_for_state(state.id).await.unwrap();
    assert_eq!(audits[0].status, AuditStatus::Success);
    assert_eq!(audits[0].objective_path, ObjectivePath::Inferred);
    assert_eq!(audits[0].queries_attempted, 6);

    let jsonl = std::fs::read_to_string(config.paths.data_dir().join("Texas.jsonl")).unwrap();
    let lines: Vec<&str> = jsonl.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""state":"Texas""#));

    assert_eq!(ctx.summary.states_processed, 1);
    assert_eq!(ctx.summary.total_verified, 0);
    assert!((ctx.summary.inferred_pct() - 100.0).abs() < 1e-9);

    let state_log = std::fs::read_to_string(config.paths.logs_dir().join("texas.log")).unwrap();
    assert!(state_log.contains("Processing state: Texas (TX)"));
    let run_log = std::fs::read_to_string(config.paths.logs_dir().join("run.log")).unwrap();
    assert!(run_log.contains("Run complete: 1 state(s)"));
}

#[tokio::test]
async fn rerun_duplicates_tests_without_dedupe() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &["Texas"]);
    let db = memory_db().await;

    run_with(&db, &config, StubDiscovery).await;
    run_with(&db, &config, StubDiscovery).await;

    let state = db.get_state_by_name("Texas").await.unwrap().unwrap();
    let tests = db.list_tests_for_state(state.id).await.unwrap();
    assert_eq!(tests.len(), 2);
    assert_eq!(tests[0].test_name, tests[1].test_name);
    assert_eq!(db.count_states().await.unwrap(), 1);
    assert_eq!(db.count_audits().await.unwrap(), 2);
}

#[tokio::test]
async fn rerun_reuses_tests_with_dedupe() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, &["Texas"]);
    config.run.dedupe_tests = true;
    let db = memory_db().await;

    run_with(&db, &config, StubDiscovery).await;
    let objectives_after_first = db.count_objectives().await.unwrap();
    let ctx = run_with(&db, &config, StubDiscovery).await;

    assert_eq!(db.count_tests().await.unwrap(), 1);
    assert_eq!(db.count_objectives().await.unwrap(), objectives_after_first);
    assert_eq!(ctx.outcomes[0].objectives(), 0);
    assert_eq!(ctx.outcomes[0].queries_attempted, 0);
}

#[tokio::test]
async fn persistence_failure_is_isolated_to_its_state() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &["Ohio", "Texas"]);
    let db = memory_db().await;
    db.conn()
        .execute(
            "CREATE TRIGGER reject_ohio_tests BEFORE INSERT ON tests
             WHEN (SELECT name FROM states WHERE id = NEW.state_id) = 'Ohio'
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END",
            (),
        )
        .await
        .unwrap();

    let ctx = run_with(&db, &config, StubDiscovery).await;

    assert_eq!(ctx.summary.failed_states, vec!["Ohio".to_string()]);
    assert_eq!(ctx.summary.states_processed, 2);

    let ohio = db.get_state_by_name("Ohio").await.unwrap().unwrap();
    assert!(db.list_tests_for_state(ohio.id).await.unwrap().is_empty());
    let audits = db.list_audits_for_state(ohio.id).await.unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].status, AuditStatus::Failed);
    assert!(audits[0].notes.as_deref().unwrap().contains("injected failure"));

    let texas = db.get_state_by_name("Texas").await.unwrap().unwrap();
    assert_eq!(db.list_tests_for_state(texas.id).await.unwrap().len(), 1);
    assert_eq!(
        db.list_audits_for_state(texas.id).await.unwrap()[0].status,
        AuditStatus::Success
    );

    // Reports still cover both states.
    assert!(config.paths.data_dir().join("Ohio.jsonl").exists());
    assert!(config.paths.data_dir().join("Texas.jsonl").exists());
}

#[tokio::test]
async fn states_sharing_an_abbreviation_are_both_audited() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &["Washington", "Washington DC"]);
    let db = memory_db().await;

    let ctx = run_with(&db, &config, StubDiscovery).await;

    assert!(ctx.summary.failed_states.is_empty());
    assert_eq!(db.count_states().await.unwrap(), 2);
    assert_eq!(db.count_audits().await.unwrap(), 2);
    for name in ["Washington", "Washington DC"] {
        let state = db.get_state_by_name(name).await.unwrap().unwrap();
        assert_eq!(state.abbrev, "WA");
        let audits = db.list_audits_for_state(state.id).await.unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].status, AuditStatus::Success);
    }
}

#[tokio::test]
async fn state_registration_failure_records_failed_audit() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &["Ohio", "Texas"]);
    let db = memory_db().await;
    db.writer().upsert_state("Ohio", "OH").await.unwrap();
    db.conn()
        .execute(
            "CREATE TRIGGER reject_ohio_upsert BEFORE UPDATE ON states
             WHEN OLD.name = 'Ohio'
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END",
            (),
        )
        .await
        .unwrap();

    let ctx = run_with(&db, &config, StubDiscovery).await;

    assert_eq!(ctx.summary.failed_states, vec!["Ohio".to_string()]);
    let ohio = db.get_state_by_name("Ohio").await.unwrap().unwrap();
    let audits = db.list_audits_for_state(ohio.id).await.unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].status, AuditStatus::Failed);
    assert!(audits[0].notes.as_deref().unwrap().contains("injected failure"));
    assert_eq!(db.count_audits().await.unwrap(), 2);
}

#[tokio::test]
async fn state_name_with_path_separator_still_gets_reports() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &["Texas", "Guam/Saipan"]);
    let db = memory_db().await;

    let ctx = run_with(&db, &config, StubDiscovery).await;

    assert!(ctx.summary.failed_states.is_empty());
    assert!(config.paths.data_dir().join("Guam_Saipan.jsonl").exists());
    assert!(config.paths.data_dir().join("Texas.jsonl").exists());
    assert!(config.paths.logs_dir().join("guam_saipan.log").exists());
    assert!(config.paths.outputs_dir().join("all_states_objectives.json").exists());
    assert!(config.paths.reports_dir().join("coverage_summary.md").exists());
}

#[tokio::test]
async fn discovery_timeout_counts_as_empty() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, &["Texas"]);
    config.discovery.timeout_ms = 20;
    let db = memory_db().await;

    let ctx = run_with(&db, &config, SlowDiscovery).await;

    let outcome = &ctx.outcomes[0];
    assert_eq!(outcome.status, AuditStatus::Success);
    assert_eq!(outcome.queries_attempted, 0);
    assert_eq!(outcome.objective_path, ObjectivePath::Inferred);
    assert!(outcome.objectives_inferred > 0);
}

#[tokio::test]
async fn valid_discovered_objectives_are_verified() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &["Texas"]);
    let db = memory_db().await;
    let discovery = FixedDiscovery::objectives(&[
        "Analyze student reading data to plan targeted literacy instruction",
        "Navigation Home",
        "Explain how place value supports multi-digit arithmetic fluency",
    ]);

    let ctx = run_with(&db, &config, discovery).await;

    let state = db.get_state_by_name("Texas").await.unwrap().unwrap();
    let test = &db.list_tests_for_state(state.id).await.unwrap()[0];
    let objectives = db.get_objectives_for_test(test.id).await.unwrap();
    assert_eq!(objectives.len(), 3);
    assert_eq!(objectives[0].validation_status, ValidationStatus::Verified);
    assert!(!objectives[0].is_inferred);
    assert_eq!(objectives[1].validation_status, ValidationStatus::Flagged);
    assert!(objectives[1].validator_notes.as_deref().unwrap().contains("too short"));
    assert_eq!(
        objectives[0].evidence_url.as_deref(),
        Some("https://www.ets.org/praxis/5001.pdf")
    );

    assert_eq!(ctx.outcomes[0].objective_path, ObjectivePath::Discovered);
    assert_eq!(ctx.outcomes[0].objectives_flagged, 1);
    assert_eq!(ctx.summary.total_verified, 3);
}

#[rstest]
#[case::all_too_short(&["Read", "Click here", "Home page link"])]
#[case::no_action_verbs(&["The quick brown fox jumps over lazy dogs again"])]
#[case::boilerplate_only(&["Table of contents for the teacher certification exam guide"])]
#[case::whitespace_and_copyright(&["   ", "\t\n", "© 2024 All rights reserved"])]
#[case::empty_strings(&["", ""])]
#[tokio::test]
async fn malformed_discovered_objectives_fall_back_to_inference(#[case] texts: &[&str]) {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &["Texas"]);
    let db = memory_db().await;

    let ctx = run_with(&db, &config, FixedDiscovery::objectives(texts)).await;

    let outcome = &ctx.outcomes[0];
    assert_eq!(outcome.objective_path, ObjectivePath::Inferred);
    assert_eq!(outcome.objectives_found, 0);
    assert!(outcome.objectives_inferred > 0);

    let state = db.get_state_by_name("Texas").await.unwrap().unwrap();
    let test = &db.list_tests_for_state(state.id).await.unwrap()[0];
    let objectives = db.get_objectives_for_test(test.id).await.unwrap();
    assert!(objectives.iter().all(|o| o.is_inferred));
}

#[tokio::test]
async fn supporting_sources_boost_inferred_confidence() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &["Texas"]);
    let db = memory_db().await;
    let discovery = FixedDiscovery {
        objectives: Vec::new(),
        sources: vec!["https://tea.texas.gov/a".into(), "https://tea.texas.gov/b".into()],
        extra_tests: Vec::new(),
    };

    run_with(&db, &config, discovery).await;

    let state = db.get_state_by_name("Texas").await.unwrap().unwrap();
    let test = &db.list_tests_for_state(state.id).await.unwrap()[0];
    let objectives = db.get_objectives_for_test(test.id).await.unwrap();
    assert!((objectives[0].confidence - 0.95).abs() < 1e-9);
    assert!(
        objectives[0]
            .rationale
            .as_deref()
            .unwrap()
            .ends_with("Supported by 2 additional source(s)")
    );
}

#[tokio::test]
async fn discovered_tests_are_added_once() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &["Texas"]);
    let db = memory_db().await;
    let extra = NewTest {
        test_system: "TExES".into(),
        test_name: "Core Subjects EC-6".into(),
        test_code: Some("391".into()),
        subject_area: "Elementary Education".into(),
        grade_band: "EC-6".into(),
        official_source_url: Some("https://www.tx.nesinc.com/".into()),
        provider: "Pearson".into(),
        source_last_updated: None,
    };
    let discovery = FixedDiscovery {
        objectives: Vec::new(),
        sources: Vec::new(),
        extra_tests: vec![extra.clone(), extra],
    };

    let ctx = run_with(&db, &config, discovery).await;

    assert_eq!(db.count_tests().await.unwrap(), 2);
    assert_eq!(ctx.outcomes[0].tests_found, 2);
}

#[tokio::test]
async fn empty_state_list_still_writes_reports() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &[]);
    let db = memory_db().await;

    let ctx = run_with(&db, &config, StubDiscovery).await;

    assert_eq!(ctx.summary.states_processed, 0);
    assert!(config.paths.outputs_dir().join("all_states_objectives.json").exists());
    assert!(config.paths.reports_dir().join("coverage_summary.md").exists());
    let run_log = std::fs::read_to_string(config.paths.logs_dir().join("run.log")).unwrap();
    assert!(run_log.contains("No states configured"));
}

#[tokio::test]
async fn runs_are_deterministic() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let states = ["Alaska", "New York"];

    let mut texts = Vec::new();
    for dir in [&first_dir, &second_dir] {
        let mut config = config(dir, &states);
        config.run.tests = CertdbConfig::default().run.tests;
        let db = memory_db().await;
        run_with(&db, &config, StubDiscovery).await;

        let mut all = Vec::new();
        for state in &states {
            let records = db.state_records_by_name(state).await.unwrap().unwrap();
            for record in records {
                all.extend(record.objectives.into_iter().map(|o| (o.text, o.confidence.to_bits())));
            }
        }
        texts.push(all);
    }
    assert_eq!(texts[0], texts[1]);
    assert!(!texts[0].is_empty());
}

#[tokio::test]
async fn process_state_unknown_name_uses_fallback_abbrev() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &[]);
    let db = memory_db().await;
    let mut ctx = RunContext::create(&config.paths.logs_dir()).unwrap();

    let outcome = Orchestrator::new(&db, &config, StubDiscovery)
        .process_state(&mut ctx.log, &RunTarget::from_input("Guam"))
        .await
        .unwrap();

    assert_eq!(outcome.status, AuditStatus::Success);
    let state = db.get_state_by_name("guam").await.unwrap().unwrap();
    assert_eq!(state.abbrev, "GU");
}
