//! Emitter tests against a seeded in-memory store.

use certdb_config::PathsConfig;
use certdb_core::drafts::{NewObjective, NewTest};
use certdb_core::records::StateTestRecord;
use certdb_db::CertDb;
use certdb_report::{Reporter, read_state_records};
use pretty_assertions::assert_eq;
use schemars::schema_for;
use tempfile::TempDir;

fn new_test(name: &str, code: Option<&str>) -> NewTest {
    NewTest {
        test_system: "Praxis".into(),
        test_name: name.into(),
        test_code: code.map(String::from),
        subject_area: "Elementary Education".into(),
        grade_band: "K-6".into(),
        official_source_url: Some("https://www.ets.org/praxis".into()),
        provider: "ETS".into(),
        source_last_updated: Some("2024".into()),
    }
}

/// Texas: two tests (3 + 2 objectives). New York: one test, one objective.
/// Alaska: no tests.
async fn seeded_db() -> CertDb {
    let db = CertDb::open_local(":memory:").await.unwrap();
    let writer = db.writer();

    let texas = writer.upsert_state("Texas", "TX").await.unwrap();
    let ny = writer.upsert_state("New York", "NY").await.unwrap();
    writer.upsert_state("Alaska", "AK").await.unwrap();

    let plan: [(i64, &str, Option<&str>, &[f64]); 3] = [
        (texas.id, "Elementary Education: Multiple Subjects", Some("5001"), &[0.75, 0.75, 0.75]),
        (texas.id, "Texas Teaching Foundations, Core", None, &[0.7, 0.7]),
        (ny.id, "Mathematics: Content Knowledge", Some("5161"), &[0.4]),
    ];
    for (state_id, name, code, confidences) in plan {
        let test = writer.insert_test(state_id, &new_test(name, code)).await.unwrap();
        for (i, confidence) in confidences.iter().enumerate() {
            let index = u32::try_from(i).unwrap();
            writer
                .insert_objective(
                    test.id,
                    &NewObjective::inferred(
                        index,
                        &format!("Demonstrate classroom competency {index} with diverse learners"),
                        *confidence,
                        "template",
                    ),
                )
                .await
                .unwrap();
        }
    }
    db
}

fn paths(dir: &TempDir) -> PathsConfig {
    PathsConfig {
        root: dir.path().to_path_buf(),
    }
}

#[tokio::test]
async fn per_state_jsonl_has_one_line_per_test() {
    let db = seeded_db().await;
    let dir = TempDir::new().unwrap();
    let paths = paths(&dir);

    let written = Reporter::new(&db, &paths).emit_per_state_records().await.unwrap();
    assert_eq!(written.len(), 3);

    let texas = read_state_records(&paths.data_dir().join("Texas.jsonl")).unwrap();
    assert_eq!(texas.len(), 2);
    assert!(texas.iter().all(|r| r.state == "Texas"));
    assert_eq!(texas[0].objectives.len(), 3);

    let ny = std::fs::read_to_string(paths.data_dir().join("New_York.jsonl")).unwrap();
    assert_eq!(ny.lines().count(), 1);

    let alaska = std::fs::read_to_string(paths.data_dir().join("Alaska.jsonl")).unwrap();
    assert!(alaska.is_empty());
}

#[tokio::test]
async fn unwritable_state_file_does_not_block_other_reports() {
    let db = seeded_db().await;
    let dir = TempDir::new().unwrap();
    let paths = paths(&dir);
    // A directory where Texas.jsonl should go makes that one write fail.
    std::fs::create_dir_all(paths.data_dir().join("Texas.jsonl")).unwrap();

    let files = Reporter::new(&db, &paths).emit_all().await.unwrap();

    assert_eq!(
        files.state_records,
        vec![paths.data_dir().join("Alaska.jsonl"), paths.data_dir().join("New_York.jsonl")]
    );
    assert!(files.aggregate_json.exists());
    assert!(files.validation_summary.exists());
    assert!(files.coverage_report.exists());
}

#[tokio::test]
async fn state_names_with_separators_stay_in_data_dir() {
    let db = CertDb::open_local(":memory:").await.unwrap();
    db.writer().upsert_state("Guam/Saipan", "GU").await.unwrap();
    let dir = TempDir::new().unwrap();
    let paths = paths(&dir);

    let files = Reporter::new(&db, &paths).emit_all().await.unwrap();

    assert_eq!(files.state_records, vec![paths.data_dir().join("Guam_Saipan.jsonl")]);
    assert!(files.state_records[0].exists());
}

#[tokio::test]
async fn jsonl_lines_match_record_schema() {
    let db = seeded_db().await;
    let dir = TempDir::new().unwrap();
    let paths = paths(&dir);
    Reporter::new(&db, &paths).emit_per_state_records().await.unwrap();

    let schema = serde_json::to_value(schema_for!(StateTestRecord)).unwrap();
    let validator = jsonschema::validator_for(&schema).unwrap();

    let contents = std::fs::read_to_string(paths.data_dir().join("Texas.jsonl")).unwrap();
    for line in contents.lines() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        let errors: Vec<String> = validator.iter_errors(&value).map(|e| e.to_string()).collect();
        assert!(errors.is_empty(), "schema errors: {errors:?}");
    }
}

#[tokio::test]
async fn csv_objective_counts_sum_to_row_count() {
    let db = seeded_db().await;
    let dir = TempDir::new().unwrap();
    let paths = paths(&dir);

    let (_, csv_path) = Reporter::new(&db, &paths).emit_aggregate().await.unwrap();
    let csv = std::fs::read_to_string(csv_path).unwrap();

    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("state,test_name,test_code,subject_area,objective_count,avg_confidence")
    );
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.contains(&"Texas,\"Texas Teaching Foundations, Core\",N/A,Elementary Education,2,0.70"));

    // objective_count is the second-to-last field; the quoted comma above
    // does not affect fields counted from the end.
    let sum: u32 = rows
        .iter()
        .map(|row| row.rsplit(',').nth(1).unwrap().parse::<u32>().unwrap())
        .sum();
    assert_eq!(sum, db.count_objectives().await.unwrap());
}

#[tokio::test]
async fn aggregate_json_nests_tests_under_states() {
    let db = seeded_db().await;
    let dir = TempDir::new().unwrap();
    let paths = paths(&dir);

    let (json_path, _) = Reporter::new(&db, &paths).emit_aggregate().await.unwrap();
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();

    assert_eq!(doc["Texas"]["state_info"]["abbrev"], "TX");
    assert_eq!(doc["Texas"]["tests"].as_array().unwrap().len(), 2);
    assert_eq!(doc["Texas"]["tests"][0]["test_code"], "5001");
    assert_eq!(doc["Texas"]["tests"][0]["objectives_count"], 3);
    assert_eq!(doc["Alaska"]["tests"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn coverage_total_matches_store() {
    let db = seeded_db().await;
    let dir = TempDir::new().unwrap();
    let paths = paths(&dir);

    let files = Reporter::new(&db, &paths).emit_all().await.unwrap();
    let md = std::fs::read_to_string(&files.coverage_report).unwrap();

    let total = db.count_objectives().await.unwrap();
    assert_eq!(total, 6);
    assert!(md.contains(&format!("- **Total Objectives:** {total}")));
    assert!(md.contains("| Alaska | 0 | 0 | 0 | 0 | Incomplete |"));
    assert!(md.contains("| Texas | 2 | 5 | 0 | 5 | Complete |"));
    assert!(md.contains("- New York"));

    let validation = std::fs::read_to_string(&files.validation_summary).unwrap();
    assert!(validation.contains("Alaska,0,0,0,0,0.00,Partial"));
}

#[tokio::test]
async fn empty_store_emits_valid_empty_artifacts() {
    let db = CertDb::open_local(":memory:").await.unwrap();
    let dir = TempDir::new().unwrap();
    let paths = paths(&dir);

    let files = Reporter::new(&db, &paths).emit_all().await.unwrap();

    assert!(files.state_records.is_empty());
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files.aggregate_json).unwrap()).unwrap();
    assert_eq!(json, serde_json::json!({}));
    assert_eq!(
        std::fs::read_to_string(&files.aggregate_csv).unwrap().lines().count(),
        1
    );
    assert_eq!(
        std::fs::read_to_string(&files.validation_summary).unwrap().lines().count(),
        1
    );
    let md = std::fs::read_to_string(&files.coverage_report).unwrap();
    assert!(md.contains("- **Total Objectives:** 0"));
    assert!(!md.contains("NaN"));
}
