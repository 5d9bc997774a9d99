mod common;

use std::sync::Arc;

use common::{capture_logs, xoo_config, RecordingProgress, TestTree};
use scanindex_rs::index::{ComponentId, FileFilter, IndexedFile, IssueExclusionsRegistry};
use scanindex_rs::{Candidate, IndexOutcome, IndexingSession, SkipReason};

struct SkipGenerated;

impl FileFilter for SkipGenerated {
    fn accept(&self, file: &IndexedFile) -> bool {
        !file.project_relative_path().contains("generated")
    }
}

struct OnlyPublished;

impl FileFilter for OnlyPublished {
    fn name(&self) -> &str {
        "published-only"
    }

    fn accept(&self, file: &IndexedFile) -> bool {
        file.is_published()
    }
}

#[test]
fn filters_run_in_order_and_short_circuit() {
    let tree = TestTree::new();
    let generated = tree.write("src/generated/a.xoo", "a");
    let unknown = tree.write("src/b.java", "b");
    let kept = tree.write("src/c.xoo", "c");
    let (project, module) = tree.single_module();
    let session = IndexingSession::builder(project)
        .config(xoo_config())
        .file_filter(Arc::new(SkipGenerated))
        .file_filter(Arc::new(OnlyPublished))
        .build()
        .unwrap();

    let (outcomes, logs) = capture_logs(|| {
        [&generated, &unknown, &kept]
            .map(|path| session.index_file(&Candidate::main(path, &module)).unwrap())
    });

    assert!(matches!(
        &outcomes[0],
        IndexOutcome::Skipped(SkipReason::Filtered { filter }) if filter == "SkipGenerated"
    ));
    assert!(matches!(
        &outcomes[1],
        IndexOutcome::Skipped(SkipReason::Filtered { filter }) if filter == "published-only"
    ));
    assert!(matches!(&outcomes[2], IndexOutcome::Indexed(_)));
    assert!(logs.contains("'src/generated/a.xoo' excluded by SkipGenerated"));
    assert!(logs.contains("'src/b.java' excluded by published-only"));

    let summary = session.summary();
    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.excluded_by_filters, 2);
    assert_eq!(summary.excluded_by_patterns, 0);
}

#[test]
fn active_issue_exclusions_receive_indexed_files() {
    let tree = TestTree::new();
    let a = tree.write("src/a.xoo", "a");
    let b = tree.write("src/b.xoo", "b");
    let (project, module) = tree.single_module();
    let issue_exclusions = Arc::new(IssueExclusionsRegistry::active());
    let session = IndexingSession::builder(project)
        .config(xoo_config())
        .issue_exclusions(issue_exclusions.clone())
        .build()
        .unwrap();

    session.index_file(&Candidate::main(&a, &module)).unwrap();
    session.index_file(&Candidate::test(&b, &module)).unwrap();

    assert_eq!(
        issue_exclusions.entries(),
        vec![
            ("src/a.xoo".to_string(), ComponentId::new(1)),
            ("src/b.xoo".to_string(), ComponentId::new(2)),
        ]
    );
}

#[test]
fn inactive_issue_exclusions_are_left_alone() {
    let tree = TestTree::new();
    let a = tree.write("src/a.xoo", "a");
    let (project, module) = tree.single_module();
    let issue_exclusions = Arc::new(IssueExclusionsRegistry::inactive());
    let session = IndexingSession::builder(project)
        .config(xoo_config())
        .issue_exclusions(issue_exclusions.clone())
        .build()
        .unwrap();

    session.index_file(&Candidate::main(&a, &module)).unwrap();

    assert!(issue_exclusions.entries().is_empty());
}

#[test]
fn progress_reports_running_total() {
    let tree = TestTree::new();
    let a = tree.write("src/a.xoo", "a");
    let excluded = tree.write("src/b.java", "b");
    let c = tree.write("src/c.xoo", "c");
    let (project, module) = tree.single_module();
    let progress = Arc::new(RecordingProgress::default());
    let session = IndexingSession::builder(project)
        .config(xoo_config())
        .file_filter(Arc::new(OnlyPublished))
        .progress_reporter(progress.clone())
        .build()
        .unwrap();

    for path in [&a, &excluded, &c] {
        session.index_file(&Candidate::main(path, &module)).unwrap();
    }

    assert_eq!(
        progress.messages(),
        vec![
            "1 file indexed...  (last one was src/a.xoo)".to_string(),
            "2 files indexed...  (last one was src/c.xoo)".to_string(),
        ]
    );
}
