//! Batch processing and error isolation tests

use super::fixtures::{
    LEGACY_DOWNCAST, LEGACY_WITHOUT_PRESSURE, MODERN_DOWNCAST, RecordingTool, write_cast,
};
use crate::config::UnxtabConfig;
use crate::error::UnxtabError;
use crate::models::ArtifactPaths;
use crate::processor::BatchProcessor;
use crate::table::read_table;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Archive with one clean legacy table, one without a pressure column,
/// one modern table and one spreadsheet that cannot be loaded
fn create_archive(temp_dir: &TempDir) -> PathBuf {
    let root = temp_dir.path().join("archive");
    let legacy = root.join("UW-2014_Data");
    write_cast(&legacy, "2014_A_downcast.csv", LEGACY_DOWNCAST);
    write_cast(&legacy, "2014_B_downcast.csv", LEGACY_WITHOUT_PRESSURE);
    let modern = root.join("2019_cruise");
    write_cast(&modern, "2019_P4_downcast.csv", MODERN_DOWNCAST);
    write_cast(&modern, "2019_P4_upcast.xlsx", "not a table");
    root
}

fn quiet(root: PathBuf, config: UnxtabConfig) -> BatchProcessor {
    BatchProcessor::new(root, config).unwrap().with_progress(false)
}

#[tokio::test]
async fn test_batch_collects_review_list() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_archive(&temp_dir);

    let context = quiet(root.clone(), UnxtabConfig::default().without_conversion())
        .process()
        .await
        .unwrap();

    assert_eq!(context.stats.files_discovered, 4);
    assert_eq!(context.stats.files_processed, 3);
    assert_eq!(context.stats.files_skipped, 1);
    assert_eq!(context.stats.files_failed, 0);
    assert_eq!(context.stats.files_flagged, 1);

    let flagged = root.join("UW-2014_Data").join("2014_B_downcast.csv");
    assert_eq!(context.review.files(), vec![flagged.as_path()]);
    assert!(context.skipped[0].reason.contains("xlsx"));
}

#[tokio::test]
async fn test_reports_follow_discovery_order_with_parallel_jobs() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_archive(&temp_dir);

    let sequential = quiet(root.clone(), UnxtabConfig::default().without_conversion())
        .process()
        .await
        .unwrap();
    let parallel = quiet(
        root,
        UnxtabConfig::default().without_conversion().with_jobs(4),
    )
    .process()
    .await
    .unwrap();

    let sources = |reports: &[crate::processor::FileReport]| {
        reports.iter().map(|r| r.source.clone()).collect::<Vec<_>>()
    };
    assert_eq!(sources(&sequential.reports), sources(&parallel.reports));
    assert_eq!(sequential.review.files(), parallel.review.files());
}

#[tokio::test]
async fn test_same_name_flagged_in_two_cruises_is_reviewed_twice() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("archive");
    let first = write_cast(
        &root.join("UW-2014_Data"),
        "P4_downcast.csv",
        LEGACY_WITHOUT_PRESSURE,
    );
    let second = write_cast(
        &root.join("UW-2015_Data"),
        "P4_downcast.csv",
        LEGACY_WITHOUT_PRESSURE,
    );

    let context = quiet(root, UnxtabConfig::default().without_conversion())
        .process()
        .await
        .unwrap();

    assert_eq!(context.stats.files_flagged, 2);
    assert_eq!(
        context.review.files(),
        vec![first.as_path(), second.as_path()]
    );
    assert_eq!(context.review.entries_for(&second).count(), 1);
}

#[tokio::test]
async fn test_write_failure_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_archive(&temp_dir);
    let blocked = root.join("UW-2014_Data").join("2014_A_downcast.csv");
    fs::create_dir_all(ArtifactPaths::for_source(&blocked).augmented).unwrap();

    let context = quiet(root.clone(), UnxtabConfig::default().without_conversion())
        .process()
        .await
        .unwrap();

    assert_eq!(context.stats.files_failed, 1);
    assert_eq!(context.stats.files_processed, 2);
    assert_eq!(context.failures[0].filename, "2014_A_downcast.csv");

    let modern = root.join("2019_cruise").join("2019_P4_downcast.csv");
    let paths = ArtifactPaths::for_source(&modern);
    assert!(paths.config.exists());
    assert_eq!(read_table(&paths.augmented).unwrap().height(), 3);
}

#[tokio::test]
async fn test_tool_failure_does_not_stop_batch() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_archive(&temp_dir);
    let tool = Arc::new(RecordingTool::exiting_with(1));

    let context = quiet(root, UnxtabConfig::default())
        .with_tool(tool.clone())
        .process()
        .await
        .unwrap();

    assert_eq!(tool.calls().len(), 3);
    assert_eq!(context.stats.files_processed, 3);
    assert_eq!(context.stats.tool_failures, 3);
    assert!(context.reports.iter().all(|r| r.paths.config.exists()));
}

#[tokio::test]
async fn test_year_range_limits_batch() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_archive(&temp_dir);

    let config = UnxtabConfig::default()
        .without_conversion()
        .with_year_range(None, Some(2015));
    let context = quiet(root, config).process().await.unwrap();

    assert_eq!(context.stats.files_discovered, 2);
    assert_eq!(context.stats.files_processed, 2);
    assert_eq!(context.stats.rows_removed, 1);
}

#[tokio::test]
async fn test_second_run_ignores_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_archive(&temp_dir);

    quiet(root.clone(), UnxtabConfig::default().without_conversion())
        .process()
        .await
        .unwrap();
    let context = quiet(root, UnxtabConfig::default().without_conversion())
        .process()
        .await
        .unwrap();

    assert_eq!(context.stats.files_discovered, 4);
}

#[tokio::test]
async fn test_report_is_written() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_archive(&temp_dir);
    let report_path = temp_dir.path().join("report.json");

    let context = quiet(root, UnxtabConfig::default().without_conversion())
        .process()
        .await
        .unwrap();
    context.write_report(&report_path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["stats"]["files_processed"], 3);
    assert_eq!(json["review"][0]["filename"], "2014_B_downcast.csv");
    assert_eq!(json["files"].as_array().unwrap().len(), 3);
    assert_eq!(json["files"][0]["conversion"]["status"], "skipped");
}

#[test]
fn test_missing_root_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nowhere");

    match BatchProcessor::new(missing.clone(), UnxtabConfig::default()) {
        Err(UnxtabError::SourceNotFound { path }) => assert_eq!(path, missing),
        Err(other) => panic!("Expected SourceNotFound error, got {}", other),
        Ok(_) => panic!("Expected SourceNotFound error"),
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();

    let result = BatchProcessor::new(
        temp_dir.path().to_path_buf(),
        UnxtabConfig::default().with_jobs(0),
    );

    assert!(matches!(result, Err(UnxtabError::Configuration { .. })));
}
