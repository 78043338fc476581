//! Integration tests for the binary's entry point: configuration layering,
//! exit codes, the error log and the deletion step.

use clap::Parser;
use refdupe::cli::Cli;
use refdupe::config::Config;
use refdupe::error::{ConfigError, ExitCode};
use refdupe::scanner::HashAlgorithm;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all REFDUPE_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("REFDUPE_") {
            std::env::remove_var(key);
        }
    }
}

struct Fixture {
    _dir: TempDir,
    reference: PathBuf,
    candidate: PathBuf,
    log: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref");
    let candidate = dir.path().join("cand");
    fs::create_dir(&reference).unwrap();
    fs::create_dir(&candidate).unwrap();
    let log = dir.path().join("Errors.log");
    Fixture {
        _dir: dir,
        reference,
        candidate,
        log,
    }
}

fn run(f: &Fixture, extra: &[&str]) -> anyhow::Result<ExitCode> {
    let mut args = vec![
        "refdupe".to_string(),
        "-q".to_string(),
        f.reference.to_string_lossy().into_owned(),
        f.candidate.to_string_lossy().into_owned(),
        "--error-log".to_string(),
        f.log.to_string_lossy().into_owned(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    refdupe::run_app(Cli::try_parse_from(args).unwrap())
}

fn log_body(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Exit Codes and Error Log
// =============================================================================

#[test]
fn test_exit_code_success_with_duplicates() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    fs::write(f.reference.join("a"), b"X").unwrap();
    fs::write(f.candidate.join("b"), b"X").unwrap();

    assert_eq!(run(&f, &[]).unwrap(), ExitCode::Success);
    assert_eq!(log_body(&f.log), vec!["No errors"]);
}

#[test]
fn test_exit_code_no_duplicates() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    fs::write(f.reference.join("a"), b"X").unwrap();
    fs::write(f.candidate.join("b"), b"Y").unwrap();

    assert_eq!(
        run(&f, &["--output", "json"]).unwrap(),
        ExitCode::NoDuplicates
    );
}

#[test]
#[cfg(unix)]
fn test_exit_code_partial_success_writes_log() {
    use std::os::unix::fs::PermissionsExt;

    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    fs::write(f.reference.join("a"), b"X").unwrap();
    let locked = f.candidate.join("locked");
    fs::write(&locked, b"X").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    let readable = fs::File::open(&locked).is_ok();

    let code = run(&f, &["--output", "csv"]).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    if !readable {
        assert_eq!(code, ExitCode::PartialSuccess);
        let body = log_body(&f.log);
        assert_eq!(body.len(), 1);
        assert!(body[0].starts_with("[read] "));
        assert!(body[0].contains("locked"));
    }
}

#[test]
fn test_same_directory_is_invalid_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    let cli = Cli::try_parse_from([
        "refdupe",
        "-q",
        f.reference.to_str().unwrap(),
        f.reference.to_str().unwrap(),
    ])
    .unwrap();

    let err = refdupe::run_app(cli).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::SamePath(_))
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidConfig);
}

#[test]
fn test_nested_candidate_is_invalid_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    let inner = f.reference.join("inner");
    fs::create_dir(&inner).unwrap();
    let cli = Cli::try_parse_from([
        "refdupe",
        "-q",
        f.reference.to_str().unwrap(),
        inner.to_str().unwrap(),
    ])
    .unwrap();

    let err = refdupe::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidConfig);
}

// =============================================================================
// Configuration Layering
// =============================================================================

#[test]
fn test_config_file_then_env_then_cli() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "algorithm = \"md5\"\nchunk_size = 4096\noutput = \"json\"\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.algorithm, HashAlgorithm::Md5);
    assert_eq!(config.chunk_size, 4096);

    std::env::set_var("REFDUPE_CHUNK_SIZE", "8192");
    std::env::set_var("REFDUPE_FOLLOW_SYMLINKS", "false");
    let mut config = Config::load(Some(&path)).unwrap();
    clear_env();
    assert_eq!(config.algorithm, HashAlgorithm::Md5);
    assert_eq!(config.chunk_size, 8192);
    assert!(!config.follow_symlinks);

    let cli = Cli::try_parse_from([
        "refdupe",
        "/ref",
        "/cand",
        "--algorithm",
        "blake3",
        "--chunk-size",
        "1KiB",
        "--output",
        "csv",
    ])
    .unwrap();
    config.apply_cli(&cli);
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert_eq!(config.chunk_size, 1024);
    assert_eq!(config.output, refdupe::cli::OutputFormat::Csv);
}

#[test]
fn test_invalid_env_value_is_config_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    std::env::set_var("REFDUPE_ALGORITHM", "crc32");
    let result = Config::load(None);
    clear_env();
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_zero_chunk_size_from_cli_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    let err = run(&f, &["--chunk-size", "0"]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidConfig);
}

// =============================================================================
// Deletion
// =============================================================================

#[test]
fn test_permanent_delete_removes_only_duplicates() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    fs::write(f.reference.join("a"), b"X").unwrap();
    fs::write(f.candidate.join("dup"), b"X").unwrap();
    fs::write(f.candidate.join("keep"), b"Y").unwrap();

    let code = run(&f, &["--delete", "--permanent", "--yes"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!f.candidate.join("dup").exists());
    assert!(f.candidate.join("keep").exists());
    assert!(f.reference.join("a").exists());
    assert_eq!(log_body(&f.log), vec!["No errors"]);
}

#[test]
#[cfg(unix)]
fn test_delete_refuses_symlink_into_reference() {
    use std::os::unix::fs::symlink;

    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    let original = f.reference.join("a");
    fs::write(&original, b"X").unwrap();
    symlink(&original, f.candidate.join("link")).unwrap();

    let code = run(&f, &["--delete", "--permanent", "--yes"]).unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(original.exists());
    let body = log_body(&f.log);
    assert_eq!(body.len(), 1);
    assert!(body[0].starts_with("[delete] "));
}

#[test]
fn test_delete_without_yes_off_terminal_deletes_nothing() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    fs::write(f.reference.join("a"), b"X").unwrap();
    fs::write(f.candidate.join("dup"), b"X").unwrap();

    // Test harness stdin is not a terminal, so no prompt is shown.
    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return;
    }
    let code = run(&f, &["--delete", "--permanent"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(f.candidate.join("dup").exists());
}

#[test]
#[cfg(unix)]
fn test_delete_refuses_files_reached_through_link_out_of_candidate() {
    use std::os::unix::fs::symlink;

    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    let outside = f.reference.parent().unwrap().join("outside");
    fs::create_dir(&outside).unwrap();
    let precious = outside.join("precious.doc");
    fs::write(f.reference.join("a"), b"X").unwrap();
    fs::write(&precious, b"X").unwrap();
    symlink(&outside, f.candidate.join("linkdir")).unwrap();

    let code = run(&f, &["--delete", "--permanent", "--yes"]).unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(precious.exists());
    let body = log_body(&f.log);
    assert_eq!(body.len(), 1);
    assert!(body[0].starts_with("[delete] "));
    assert!(body[0].contains("outside the candidate tree"));
}

#[test]
#[cfg(unix)]
fn test_delete_handles_two_paths_to_one_file() {
    use std::os::unix::fs::symlink;

    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let f = fixture();
    fs::write(f.reference.join("a"), b"X").unwrap();
    let real = f.candidate.join("x.txt");
    fs::write(&real, b"X").unwrap();
    symlink(&real, f.candidate.join("y")).unwrap();

    let code = run(&f, &["--delete", "--permanent", "--yes"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!real.exists());
    assert_eq!(log_body(&f.log), vec!["No errors"]);
}
