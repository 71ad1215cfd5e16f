//! End-to-end tests for the upload → profile → clean → download workflow
//!
//! These run the `Workspace` over a temporary version store using the
//! fixture files in `testdata/`.

use csvsteward::analyser::lifecycle::{DownloadVariant, Workspace};
use csvsteward::analyser::logic::{self, IngestFormat, InferredType, Normalization};
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use tempfile::TempDir;

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("fixture {}: {e}", path.display()))
}

fn workspace() -> (TempDir, Workspace) {
    let temp = TempDir::new().expect("temp dir");
    let ws = Workspace::open(temp.path().join("files")).expect("workspace");
    (temp, ws)
}

#[test]
fn test_upload_profiles_fixture() {
    let (_temp, ws) = workspace();
    let up = ws
        .upload("analyst", "customers.csv", &fixture("customers.csv"))
        .expect("upload");
    let p = &up.profile;

    assert_eq!(p.row_count, 7);
    assert_eq!(p.duplicate_row_count, 1);

    let col = |name: &str| p.column(name).expect("column exists");
    assert_eq!(col("customer_id").inferred_type, InferredType::Integer);
    assert_eq!(col("customer_id").semantic_cluster_label, "identifier");
    assert_eq!(col("full_name").semantic_cluster_label, "person_name");

    assert_eq!(col("email").missing_count, 1);
    assert_eq!(col("email").distinct_pattern_set, vec!["email".to_owned()]);
    assert_eq!(col("email").semantic_cluster_label, "contact");

    assert_eq!(col("city").inferred_type, InferredType::String);
    assert_eq!(
        col("city").normalization_suggestion,
        Some(Normalization::TrimLowercase)
    );
    assert_eq!(col("signup_date").inferred_type, InferredType::Date);
    assert_eq!(
        col("signup_date").normalization_suggestion,
        Some(Normalization::StandardizeDate)
    );
    assert_eq!(col("active").inferred_type, InferredType::Boolean);
    assert_eq!(col("active").semantic_cluster_label, "flag");

    assert_eq!(col("balance").inferred_type, InferredType::Float);
    assert_eq!(col("balance").missing_count, 1);
    assert_eq!(p.outlier_counts.get("balance"), Some(&1));
    assert_eq!(p.outlier_counts.get("customer_id"), Some(&0));
    assert!(!p.outlier_counts.contains_key("city"));
}

#[test]
fn test_cleaning_chain_on_fixture() {
    let (_temp, ws) = workspace();
    let session = "analyst";
    let up = ws
        .upload(session, "customers.csv", &fixture("customers.csv"))
        .expect("upload");

    let dedup = ws
        .remove_duplicates(session, &up.file_name)
        .expect("remove duplicates");
    assert_eq!(dedup.profile.row_count, 6);
    assert_eq!(dedup.profile.duplicate_row_count, 0);

    let complete = ws
        .remove_missing_values(session, &dedup.file_name)
        .expect("remove missing");
    assert_eq!(complete.profile.row_count, 4);
    assert_eq!(complete.profile.total_missing(), 0);

    let normalized = ws
        .normalize(session, &complete.file_name, "city")
        .expect("normalize city");
    let table = ws.store().resolve(&normalized.file_name).expect("resolve");
    let cities: Vec<Option<String>> = table.column_values("city").expect("city");
    assert_eq!(
        cities,
        vec![
            Some("paris".to_owned()),
            Some("paris".to_owned()),
            Some("lyon".to_owned()),
            Some("nantes".to_owned()),
        ]
    );
    assert_eq!(
        normalized.profile.column("city").expect("city").normalization_suggestion,
        None
    );

    // Other columns are byte-identical to the version normalize started from.
    let before = ws.store().resolve(&complete.file_name).expect("resolve");
    for name in before.column_names().iter().filter(|n| *n != "city") {
        assert_eq!(
            table.column_values(name).expect("column"),
            before.column_values(name).expect("column")
        );
    }

    assert_eq!(ws.current(session).expect("current"), normalized.file_name);

    let lineage: Vec<String> = ws
        .lineage(&normalized.file_name)
        .expect("lineage")
        .into_iter()
        .map(|v| v.file_name)
        .collect();
    assert_eq!(
        lineage,
        vec![
            normalized.file_name.clone(),
            complete.file_name.clone(),
            dedup.file_name.clone(),
            up.file_name.clone(),
        ]
    );

    let original = ws
        .download(&normalized.file_name, DownloadVariant::Original)
        .expect("download original");
    let original = logic::ingest(&original.bytes, &IngestFormat::csv()).expect("parse");
    assert_eq!(original.row_count(), 7);

    let deduped = ws
        .download(&normalized.file_name, DownloadVariant::Duplicates)
        .expect("download duplicates");
    assert_eq!(deduped.file_name, dedup.file_name);
}

#[test]
fn test_ragged_upload_is_rejected() {
    let (_temp, ws) = workspace();
    let err = ws
        .upload("analyst", "ragged.csv", &fixture("ragged.csv"))
        .expect_err("ragged rows must fail");
    assert_eq!(err.kind(), "format_error");
    assert!(ws.store().is_empty());
    assert_eq!(ws.current("analyst").unwrap_err().kind(), "not_found");
}

#[test]
fn test_concurrent_cleaning_in_one_session_is_serialized() {
    let (_temp, ws) = workspace();
    let session = "shared";
    let up = ws
        .upload(session, "customers.csv", &fixture("customers.csv"))
        .expect("upload");

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|i| {
                let ws = ws.clone();
                let barrier = Arc::clone(&barrier);
                let file_name = up.file_name.clone();
                scope.spawn(move || {
                    barrier.wait();
                    if i % 2 == 0 {
                        ws.remove_duplicates(session, &file_name)
                    } else {
                        ws.remove_missing_values(session, &file_name)
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect()
    });

    let successes: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(successes.len(), 1, "exactly one call may advance the session");
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind(), "stale_version");
    }

    let winner = successes[0];
    assert_eq!(ws.current(session).expect("current"), winner.file_name);
    assert_eq!(winner.derived_from.as_deref(), Some(up.file_name.as_str()));
}

#[test]
fn test_sessions_clean_independently() {
    let (_temp, ws) = workspace();
    let bytes = fixture("customers.csv");
    let sessions = ["a", "b", "c", "d"];

    let uploads: Vec<_> = sessions
        .iter()
        .map(|s| ws.upload(s, "customers.csv", &bytes).expect("upload"))
        .collect();

    std::thread::scope(|scope| {
        for (session, up) in sessions.iter().zip(&uploads) {
            let ws = ws.clone();
            scope.spawn(move || {
                let dedup = ws
                    .remove_duplicates(session, &up.file_name)
                    .expect("remove duplicates");
                let done = ws
                    .remove_missing_values(session, &dedup.file_name)
                    .expect("remove missing");
                assert_eq!(ws.current(session).expect("current"), done.file_name);
            });
        }
    });

    let currents: std::collections::HashSet<String> = sessions
        .iter()
        .map(|s| ws.current(s).expect("current"))
        .collect();
    assert_eq!(currents.len(), sessions.len());
}

#[test]
fn test_versions_survive_restart() {
    let temp = TempDir::new().expect("temp dir");
    let dir = temp.path().join("files");

    let file_name = {
        let ws = Workspace::open(dir.clone()).expect("workspace");
        let up = ws
            .upload("analyst", "customers.csv", &fixture("customers.csv"))
            .expect("upload");
        ws.remove_duplicates("analyst", &up.file_name)
            .expect("dedup")
            .file_name
    };

    let reopened = Workspace::open(dir).expect("reopen");
    let analyzed = reopened.analyze(&file_name).expect("analyze");
    assert_eq!(analyzed.profile.row_count, 6);
    // Session pointers do not outlive the process.
    assert_eq!(reopened.current("analyst").unwrap_err().kind(), "not_found");
}

#[test]
fn test_cleaning_properties_hold() {
    let inputs: [&[u8]; 4] = [
        b"a,b\n1,x\n1,x\n2,\n2,\n3,y\n",
        b"a\n1\n1\n1\n",
        b"a,b\n,\n,\n",
        b"a,b\n",
    ];

    for raw in inputs {
        let t = logic::ingest(raw, &IngestFormat::csv()).expect("ingest");

        let d1 = logic::remove_duplicates(&t).expect("dedup");
        let d2 = logic::remove_duplicates(&d1).expect("dedup");
        assert_eq!(d1, d2);
        assert!(d1.row_count() <= t.row_count());

        let m1 = logic::remove_missing(&t).expect("missing");
        let m2 = logic::remove_missing(&m1).expect("missing");
        assert_eq!(m1, m2);
        assert!(m1.row_count() <= t.row_count());
    }
}
