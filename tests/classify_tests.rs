//! End-to-end classification tests against real directory trees.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use refdupe::duplicates::{
    ClassifierConfig, ClassifyError, DuplicateClassifier, OutcomeStatus, TreeRole,
};
use refdupe::error_sink::{ErrorKind, ErrorSink};
use refdupe::progress::ProgressCallback;
use refdupe::scanner::{HashAlgorithm, WalkerConfig};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct Trees {
    _dir: TempDir,
    reference: PathBuf,
    candidate: PathBuf,
}

fn trees() -> Trees {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("reference");
    let candidate = dir.path().join("candidate");
    fs::create_dir(&reference).unwrap();
    fs::create_dir(&candidate).unwrap();
    Trees {
        _dir: dir,
        reference,
        candidate,
    }
}

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn status_of(result: &refdupe::duplicates::Classification, name: &str) -> OutcomeStatus {
    result
        .outcomes
        .iter()
        .find(|o| o.path.ends_with(name))
        .unwrap_or_else(|| panic!("no outcome for {name}"))
        .status()
}

// =============================================================================
// Basic Classification
// =============================================================================

#[test]
fn test_basic_duplicate_and_unique() {
    let t = trees();
    write(&t.reference.join("A"), b"X");
    write(&t.candidate.join("B"), b"X");
    write(&t.candidate.join("C"), b"Y");

    let mut sink = ErrorSink::new();
    let result = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut sink)
        .unwrap();

    assert_eq!(status_of(&result, "B"), OutcomeStatus::Duplicate);
    assert_eq!(status_of(&result, "C"), OutcomeStatus::Unique);
    assert!(sink.is_empty());
}

#[test]
fn test_nested_directories_and_names_do_not_matter() {
    let t = trees();
    write(&t.reference.join("deep/er/photo.jpg"), b"jpeg bytes");
    write(&t.candidate.join("recup_dir.1/f0001.jpg"), b"jpeg bytes");
    write(&t.candidate.join("recup_dir.2/f0002.jpg"), b"other bytes");

    let result = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();

    assert_eq!(status_of(&result, "f0001.jpg"), OutcomeStatus::Duplicate);
    assert_eq!(status_of(&result, "f0002.jpg"), OutcomeStatus::Unique);
}

#[test]
fn test_empty_files_match_each_other() {
    let t = trees();
    write(&t.reference.join("empty"), b"");
    write(&t.candidate.join("also_empty"), b"");

    let result = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();
    assert_eq!(result.summary.duplicates, 1);
}

#[test]
fn test_empty_reference_means_everything_unique() {
    let t = trees();
    write(&t.candidate.join("a"), b"1");
    write(&t.candidate.join("b"), b"2");

    let result = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();
    assert_eq!(result.summary.unique, 2);
    assert_eq!(result.summary.index_entries, 0);
}

#[test]
fn test_repeated_reference_content_collapses_in_index() {
    let t = trees();
    for i in 0..5 {
        write(&t.reference.join(format!("copy{i}")), b"same");
    }
    write(&t.candidate.join("c"), b"same");

    let result = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();
    assert_eq!(result.summary.reference_files, 5);
    assert_eq!(result.summary.reference_hashed, 5);
    assert_eq!(result.summary.index_entries, 1);
    assert_eq!(result.summary.duplicates, 1);
}

#[test]
fn test_outcomes_follow_discovery_order() {
    let t = trees();
    for name in ["c", "a", "b"] {
        write(&t.candidate.join(name), name.as_bytes());
    }

    let result = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();
    let names: Vec<_> = result
        .outcomes
        .iter()
        .map(|o| o.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

// =============================================================================
// Chunked Hashing End-to-End
// =============================================================================

#[test]
fn test_chunk_boundaries_match_across_trees() {
    let t = trees();
    let chunk = 512usize;
    let config = ClassifierConfig::default().with_chunk_size(chunk);

    // Sizes straddle the small threshold; the default threshold reads all of
    // them whole.
    for len in [chunk - 1, chunk, chunk + 1, 3 * chunk + 5] {
        let data: Vec<u8> = (0..len).map(|i| (i * 7 % 251) as u8).collect();
        write(&t.reference.join(format!("r{len}")), &data);
        write(&t.candidate.join(format!("c{len}")), &data);
    }

    let small = DuplicateClassifier::new(config)
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();
    let default = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();

    assert_eq!(small.summary.duplicates, 4);
    for (a, b) in small.outcomes.iter().zip(&default.outcomes) {
        assert_eq!(a.digest, b.digest);
    }
}

#[test]
fn test_md5_run() {
    let t = trees();
    write(&t.reference.join("a"), b"abc");
    write(&t.candidate.join("b"), b"abc");

    let config = ClassifierConfig::default().with_algorithm(HashAlgorithm::Md5);
    let result = DuplicateClassifier::new(config)
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();

    assert_eq!(result.algorithm, HashAlgorithm::Md5);
    assert_eq!(
        result.outcomes[0].digest.unwrap().to_hex(),
        "900150983CD24FB0D6963F7D28E17F72"
    );
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_repeated_runs_are_identical() {
    let t = trees();
    write(&t.reference.join("x/1"), b"one");
    write(&t.reference.join("y/2"), b"two");
    write(&t.candidate.join("p/1"), b"one");
    write(&t.candidate.join("q/3"), b"three");

    let classifier = DuplicateClassifier::with_defaults();
    let first = classifier
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();
    let second = classifier
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();

    assert_eq!(first.outcomes, second.outcomes);
    assert_eq!(first.summary.duplicates, second.summary.duplicates);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_missing_reference_root_aborts() {
    let t = trees();
    let missing = t.reference.join("nope");
    let mut sink = ErrorSink::new();

    let err = DuplicateClassifier::with_defaults()
        .classify(&missing, &t.candidate, &mut sink)
        .unwrap_err();

    let ClassifyError::Root { role, .. } = err;
    assert_eq!(role, TreeRole::Reference);
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.count_kind(ErrorKind::Path), 1);
}

#[test]
#[cfg(unix)]
fn test_unreadable_candidate_file_is_unknown_and_counts_reconcile() {
    use std::os::unix::fs::PermissionsExt;

    let t = trees();
    write(&t.reference.join("a"), b"X");
    write(&t.candidate.join("dup"), b"X");
    write(&t.candidate.join("new"), b"Z");
    let locked = t.candidate.join("locked");
    write(&locked, b"X");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Running as root ignores permission bits.
    let readable = fs::File::open(&locked).is_ok();

    let mut sink = ErrorSink::new();
    let result = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut sink)
        .unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    let s = &result.summary;
    assert_eq!(s.candidate_files, 3);
    assert_eq!(s.candidate_files, s.duplicates + s.unique + s.unknown);
    assert_eq!(s.candidate_hashed + sink.count_kind(ErrorKind::Read), 3);

    if !readable {
        assert_eq!(status_of(&result, "locked"), OutcomeStatus::Unknown);
        assert_eq!(s.unknown, 1);
        assert_eq!(s.errors, 1);
        assert_eq!(sink.count_kind(ErrorKind::Read), 1);
    }
}

/// Removes a file once classification starts, after it was enumerated.
struct RemoveOnClassify(PathBuf);

impl ProgressCallback for RemoveOnClassify {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        if phase == "classify" {
            fs::remove_file(&self.0).unwrap();
        }
    }

    fn on_progress(&self, _current: usize, _path: &str) {}

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_candidate_vanishing_before_hashing_is_unknown() {
    let t = trees();
    write(&t.reference.join("a"), b"X");
    write(&t.candidate.join("dup"), b"X");
    write(&t.candidate.join("new"), b"Z");
    let gone = t.candidate.join("gone");
    write(&gone, b"X");

    let config = ClassifierConfig::default()
        .with_progress_callback(Arc::new(RemoveOnClassify(gone.clone())));
    let mut sink = ErrorSink::new();
    let result = DuplicateClassifier::new(config)
        .classify(&t.reference, &t.candidate, &mut sink)
        .unwrap();

    let s = &result.summary;
    assert_eq!(s.candidate_files, 3);
    assert_eq!(s.candidate_files, s.duplicates + s.unique + s.unknown);
    assert_eq!(s.duplicates, 1);
    assert_eq!(s.unique, 1);
    assert_eq!(s.unknown, 1);
    assert_eq!(s.errors, 1);
    assert_eq!(status_of(&result, "gone"), OutcomeStatus::Unknown);

    let records: Vec<_> = sink.iter().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ErrorKind::Read);
    assert_eq!(records[0].context, gone);
}

#[test]
#[cfg(unix)]
fn test_unreadable_reference_subdir_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let t = trees();
    let locked = t.reference.join("locked");
    write(&locked.join("secret"), b"S");
    write(&t.reference.join("open"), b"O");
    write(&t.candidate.join("s"), b"S");
    write(&t.candidate.join("o"), b"O");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    let readable = fs::read_dir(&locked).is_ok();

    let mut sink = ErrorSink::new();
    let result = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut sink)
        .unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(status_of(&result, "o"), OutcomeStatus::Duplicate);
    if !readable {
        assert_eq!(status_of(&result, "s"), OutcomeStatus::Unique);
        assert_eq!(sink.count_kind(ErrorKind::Traversal), 1);
    }
}

#[test]
#[cfg(unix)]
fn test_symlink_loop_in_candidate_is_recorded() {
    use std::os::unix::fs::symlink;

    let t = trees();
    write(&t.reference.join("a"), b"A");
    write(&t.candidate.join("sub/a"), b"A");
    symlink(&t.candidate, t.candidate.join("sub/back")).unwrap();

    let mut sink = ErrorSink::new();
    let result = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut sink)
        .unwrap();

    assert_eq!(result.summary.duplicates, 1);
    assert_eq!(sink.count_kind(ErrorKind::Traversal), 1);
}

#[test]
#[cfg(unix)]
fn test_no_follow_symlinks_skips_linked_dirs() {
    use std::os::unix::fs::symlink;

    let t = trees();
    let outside = TempDir::new().unwrap();
    write(&outside.path().join("linked"), b"L");
    write(&t.reference.join("l"), b"L");
    symlink(outside.path(), t.candidate.join("link")).unwrap();

    let follow = DuplicateClassifier::with_defaults()
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();
    assert_eq!(follow.summary.duplicates, 1);

    let config = ClassifierConfig::default()
        .with_walker_config(WalkerConfig::default().with_follow_symlinks(false));
    let no_follow = DuplicateClassifier::new(config)
        .classify(&t.reference, &t.candidate, &mut ErrorSink::new())
        .unwrap();
    assert_eq!(no_follow.summary.candidate_files, 0);
}

#[test]
fn test_error_cap_keeps_total_count() {
    let t = trees();
    write(&t.reference.join("a"), b"A");

    let mut sink = ErrorSink::with_cap(1);
    let classifier = DuplicateClassifier::with_defaults();
    let index = refdupe::duplicates::HashIndex::build(
        &[t.reference.join("a")],
        classifier.hasher(),
        &mut sink,
        None,
    );
    let missing: Vec<_> = (0..3).map(|i| t.candidate.join(format!("gone{i}"))).collect();
    let (outcomes, _) = classifier.classify_files(&index, &missing, &mut sink);

    assert!(outcomes.iter().all(|o| o.status() == OutcomeStatus::Unknown));
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.dropped(), 2);
    assert_eq!(sink.total(), 3);
}
