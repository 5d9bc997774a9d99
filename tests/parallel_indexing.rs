mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{xoo_config, TestTree};
use proptest::prelude::*;
use scanindex_rs::index::{FileFilter, GlobExclusionFilters, IndexedFile};
use scanindex_rs::{Candidate, IndexError, IndexOutcome, IndexingSession, ModuleContext};

#[test]
fn batch_indexes_every_candidate() {
    let tree = TestTree::new();
    let (project, module) = tree.single_module();
    let candidates: Vec<Candidate> = (0..200)
        .map(|i| Candidate::main(tree.write(&format!("src/d{}/f{i}.xoo", i % 7), "x"), &module))
        .collect();
    let session = IndexingSession::builder(project).config(xoo_config()).build().unwrap();

    let summary = session.index_all(&candidates).unwrap();

    assert_eq!(summary.indexed, 200);
    let ids: BTreeSet<u64> = session.registry().files().iter().map(|f| f.id().get()).collect();
    assert_eq!(ids.len(), 200);
    assert_eq!(ids.first(), Some(&1));
    assert_eq!(ids.last(), Some(&200));
}

#[test]
fn batch_stops_at_first_duplicate() {
    let tree = TestTree::new();
    let (project, module) = tree.single_module();
    let mut candidates: Vec<Candidate> = (0..50)
        .map(|i| Candidate::main(tree.write(&format!("src/f{i}.xoo"), "x"), &module))
        .collect();
    candidates.push(Candidate::test(tree.root().join("src/f0.xoo"), &module));
    let session = IndexingSession::builder(project).config(xoo_config()).build().unwrap();

    let err = session.index_all(&candidates).unwrap_err();

    assert!(matches!(err, IndexError::DuplicatePath { ref path } if path == "src/f0.xoo"));
    assert!(session.is_aborted());
    assert!(session.registry().is_sealed());
    assert!(session.registry().len() <= 50);
    assert!(matches!(
        session.index_file(&candidates[1]),
        Err(IndexError::Aborted)
    ));
}

struct DropMarked;

impl FileFilter for DropMarked {
    fn accept(&self, file: &IndexedFile) -> bool {
        !file.project_relative_path().contains("drop_")
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn registry_size_matches_non_skipped_candidates(
        names in proptest::collection::btree_set("[a-z]{1,8}", 1..20),
        kinds in proptest::collection::vec(0u8..6, 20),
    ) {
        let tree = TestTree::new();
        let outside = TestTree::new();
        let config = xoo_config()
            .with_language("java", ["java"])
            .with_forced_language("xoo");
        let mut project = tree.project(Arc::new(GlobExclusionFilters::excluding(["**/skip_*"]).unwrap()));
        let module = ModuleContext::builder("project", tree.mkdir("src"))
            .exclusions(Arc::new(GlobExclusionFilters::excluding(["hide_*"]).unwrap()))
            .build(&project)
            .unwrap();
        let module = project.add_module(module);
        let session = IndexingSession::builder(Arc::new(project))
            .config(config)
            .file_filter(Arc::new(DropMarked))
            .build()
            .unwrap();

        let mut counts = [0usize; 6];
        let mut last_id = 0u64;
        for (name, kind) in names.iter().zip(&kinds) {
            counts[*kind as usize] += 1;
            let path = match *kind {
                0 => outside.write(&format!("{name}.xoo"), "x"),
                1 => tree.write(&format!("src/{name}.java"), "x"),
                2 => tree.write(&format!("src/skip_{name}.xoo"), "x"),
                3 => tree.write(&format!("src/hide_{name}.xoo"), "x"),
                4 => tree.write(&format!("src/drop_{name}.xoo"), "x"),
                _ => tree.write(&format!("src/{name}.xoo"), "x"),
            };

            if let IndexOutcome::Indexed(file) = session.index_file(&Candidate::main(path, &module)).unwrap() {
                prop_assert!(file.id().get() > last_id);
                prop_assert_eq!(file.is_published(), file.language().is_some());
                last_id = file.id().get();
            }
        }

        let summary = session.summary();
        prop_assert_eq!(summary.outside_project, counts[0]);
        prop_assert_eq!(summary.forced_language_skips, counts[1]);
        prop_assert_eq!(summary.excluded_by_patterns, counts[2] + counts[3]);
        prop_assert_eq!(summary.excluded_by_filters, counts[4]);
        prop_assert_eq!(session.registry().len(), counts[5]);
        prop_assert_eq!(
            summary.indexed
                + summary.excluded_by_patterns
                + summary.excluded_by_filters
                + summary.forced_language_skips
                + summary.outside_project,
            names.len()
        );
    }
}
