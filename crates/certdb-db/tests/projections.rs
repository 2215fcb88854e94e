//! Integration tests for the read-only projections.

use certdb_core::drafts::{NewObjective, NewTest};
use certdb_core::responses::SearchFilters;
use certdb_db::CertDb;
use pretty_assertions::assert_eq;
use rstest::rstest;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn new_test(name: &str, subject: &str) -> NewTest {
    NewTest {
        test_system: "Praxis".into(),
        test_name: name.into(),
        test_code: None,
        subject_area: subject.into(),
        grade_band: "K-6".into(),
        official_source_url: None,
        provider: "ETS".into(),
        source_last_updated: None,
    }
}

/// Texas: two tests (3 + 2 objectives). Ohio: one test, one discovered
/// objective. Alaska: no tests.
async fn seeded() -> CertDb {
    let db = CertDb::open_local(":memory:").await.unwrap();
    let w = db.writer();

    let tx = w.upsert_state("Texas", "TX").await.unwrap();
    let elem = w
        .insert_test(tx.id, &new_test("Elementary Education", "Elementary Education"))
        .await
        .unwrap();
    for (i, (text, c)) in [
        ("Integrate literacy instruction across content areas", 0.75),
        ("Use formative and summative assessment to guide instruction", 0.75),
        ("Teach social studies content and citizenship concepts", 0.75),
    ]
    .iter()
    .enumerate()
    {
        let index = u32::try_from(i).unwrap();
        w.insert_objective(elem.id, &NewObjective::inferred(index, text, *c, "template"))
            .await
            .unwrap();
    }
    let math = w
        .insert_test(tx.id, &new_test("Mathematics: Content Knowledge", "Mathematics"))
        .await
        .unwrap();
    w.insert_objective(
        math.id,
        &NewObjective::inferred(0, "Apply mathematical reasoning and problem-solving strategies", 0.6, "pattern"),
    )
    .await
    .unwrap();
    w.insert_objective(
        math.id,
        &NewObjective::inferred(1, "Meet minimal competency expectations for licensure", 0.4, "minimal"),
    )
    .await
    .unwrap();

    let oh = w.upsert_state("Ohio", "OH").await.unwrap();
    let foundations = w
        .insert_test(oh.id, &new_test("Ohio Teaching Foundations", "General Education"))
        .await
        .unwrap();
    w.insert_objective(
        foundations.id,
        &NewObjective::discovered(
            0,
            "Demonstrate knowledge of Ohio learning standards for mathematics",
            Some("https://education.ohio.gov"),
        ),
    )
    .await
    .unwrap();

    w.upsert_state("Alaska", "AK").await.unwrap();
    db
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn states_with_counts() {
    let db = seeded().await;
    let rows = db.list_states_with_counts().await.unwrap();
    let summary: Vec<_> = rows
        .iter()
        .map(|r| (r.state.name.as_str(), r.test_count, r.objective_count, r.verified_count, r.inferred_count))
        .collect();
    assert_eq!(
        summary,
        vec![("Alaska", 0, 0, 0, 0), ("Ohio", 1, 1, 1, 0), ("Texas", 2, 5, 0, 5)]
    );
    assert!(rows[0].avg_confidence.abs() < f64::EPSILON);
    assert!((rows[2].avg_confidence - 0.65).abs() < 1e-9);
}

#[tokio::test]
async fn state_summary_totals() {
    let db = seeded().await;
    let summary = db.state_summary("texas").await.unwrap().unwrap();
    assert_eq!(summary.state, "Texas");
    assert_eq!(summary.abbreviation, "TX");
    assert_eq!(summary.total_tests, 2);
    assert_eq!(summary.total_objectives, 5);
    assert!((summary.average_confidence - 0.65).abs() < 1e-9);
    assert!(!summary.last_updated.is_empty());

    let empty = db.state_summary("Alaska").await.unwrap().unwrap();
    assert_eq!(empty.total_tests, 0);
    assert_eq!(empty.last_updated, "");
    assert!(db.state_summary("Atlantis").await.unwrap().is_none());
}

#[tokio::test]
async fn overview_histogram() {
    let db = seeded().await;
    let stats = db.overview().await.unwrap();
    assert_eq!(stats.total_states, 3);
    assert_eq!(stats.total_tests, 3);
    assert_eq!(stats.total_objectives, 6);
    assert_eq!(stats.verified_objectives, 1);
    assert_eq!(stats.inferred_objectives, 5);
    let dist = stats.data_quality_distribution;
    assert_eq!((dist.high_confidence, dist.medium_confidence, dist.low_confidence), (1, 4, 1));
}

#[tokio::test]
async fn overview_of_empty_store() {
    let db = CertDb::open_local(":memory:").await.unwrap();
    let stats = db.overview().await.unwrap();
    assert_eq!(stats.total_objectives, 0);
    assert!(stats.average_confidence.abs() < f64::EPSILON);
    assert_eq!(stats.data_quality_distribution.total(), 0);
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[tokio::test]
async fn state_records_nest_ordered_objectives() {
    let db = seeded().await;
    let records = db.state_records_by_name("Texas").await.unwrap().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].state, "Texas");
    let indexes: Vec<_> = records[0].objectives.iter().map(|o| o.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
    assert!(db.state_records_by_name("Atlantis").await.unwrap().is_none());

    let all = db.all_state_records().await.unwrap();
    assert_eq!(all.keys().cloned().collect::<Vec<_>>(), vec!["Alaska", "Ohio", "Texas"]);
    assert!(all["Alaska"].is_empty());
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[rstest]
#[case::plain("instruction", SearchFilters::default(), 1, 2)]
#[case::case_insensitive("MATHEMATICAL", SearchFilters::default(), 1, 1)]
#[case::spans_states("math", SearchFilters::default(), 2, 2)]
#[case::state_filter("math", SearchFilters { state: Some("ohio".into()), ..SearchFilters::default() }, 1, 1)]
#[case::subject_filter("e", SearchFilters { subject: Some("Mathematics".into()), ..SearchFilters::default() }, 1, 2)]
#[case::min_confidence("e", SearchFilters { min_confidence: Some(0.7), ..SearchFilters::default() }, 2, 4)]
#[case::wildcard_is_literal("%", SearchFilters::default(), 0, 0)]
#[tokio::test]
async fn search_groups_by_test(
    #[case] query: &str,
    #[case] filters: SearchFilters,
    #[case] expected_tests: u32,
    #[case] expected_objectives: u32,
) {
    let db = seeded().await;
    let response = db.search(query, &filters).await.unwrap();
    assert_eq!(response.total_results, expected_tests);
    assert_eq!(
        response.results.iter().map(|h| h.match_count).sum::<u32>(),
        expected_objectives
    );
    for hit in &response.results {
        assert_eq!(hit.match_count as usize, hit.matching_objectives.len());
    }
}
