//! Integration tests for the log manager

#[macro_use]
extern crate hamcrest;

use std::path::Path;
use std::sync::Arc;
use std::thread;

use hamcrest::prelude::*;

use handlereg::growth::DEFAULT_PAGE;
use handlereg::logman::{
    EnvLogDir, LogConfig, LogError, LogManager, LogStatus, Severity, ENTRY_DELIMITER,
    LINE_MAX_CHARS,
};
use handlereg::OpenMode;

const LOG_NAMES: [&str; 5] = ["apple", "bannana", "carrot", "dillweed", "endive"];

const MSG_SHORT: &str =
    "The quick brown fox jumped over the lazy doggy and the orange kitty did too.";

const MSG_LONG: &str = "The quick brown fox jumped over the lazy doggy and then the orange \
    kitty did also. If that wasn't enough, the noisy chicken came along and did the very \
    same thing.";

fn manager(dir: &Path) -> LogManager {
    LogManager::new(LogConfig::with_dir(dir))
}

fn read_log(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

/// Split file content into records, without their trailing delimiter
fn records(content: &str) -> Vec<&str> {
    content
        .split_terminator(ENTRY_DELIMITER)
        .map(|r| r.strip_suffix('\n').unwrap_or(r))
        .collect()
}

#[test]
fn test_open_twice_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let logs = manager(dir.path());

    logs.open("apple", OpenMode::Append).unwrap();
    logs.open("apple", OpenMode::Append).unwrap();

    assert_that!(logs.logs_used(), is(equal_to(1)));
    assert!(logs.is_open("apple"));
    assert_eq!(logs.path("apple").unwrap(), dir.path().join("apple"));
}

#[test]
fn test_five_logs_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let logs = manager(dir.path());

    for name in LOG_NAMES {
        logs.open(name, OpenMode::Append).unwrap();
    }
    logs.close(LOG_NAMES[0]).unwrap();
    assert_eq!(logs.status(LOG_NAMES[0]), Some(LogStatus::Closed));

    logs.open(LOG_NAMES[0], OpenMode::Append).unwrap();
    logs.write(LOG_NAMES[0], Severity::Status, Some(MSG_SHORT)).unwrap();
    logs.write(LOG_NAMES[0], Severity::Status, Some(MSG_LONG)).unwrap();
    logs.close(LOG_NAMES[0]).unwrap();

    logs.write_with_autoopen(LOG_NAMES[0], Severity::Status, Some(MSG_LONG))
        .unwrap();
    assert!(!logs.is_open(LOG_NAMES[0]));

    logs.close_all().unwrap();
    for name in LOG_NAMES {
        assert!(!logs.is_open(name));
    }
    assert_that!(logs.logs_used(), is(equal_to(LOG_NAMES.len())));

    let content = read_log(dir.path(), LOG_NAMES[0]);
    assert_that!(records(&content).len(), is(equal_to(3)));
    assert!(read_log(dir.path(), LOG_NAMES[1]).is_empty());
}

#[test]
fn test_record_layout() {
    let dir = tempfile::tempdir().unwrap();
    let logs = manager(dir.path());
    logs.open("layout", OpenMode::Append).unwrap();
    logs.write("layout", Severity::Warning, Some("disk almost full")).unwrap();
    logs.close("layout").unwrap();

    let content = read_log(dir.path(), "layout");
    assert!(content.ends_with(ENTRY_DELIMITER));
    let lines: Vec<&str> = content.lines().collect();
    assert_that!(lines.len(), is(equal_to(3)));

    let event: Vec<&str> = lines[0].split_whitespace().collect();
    assert_eq!(event.len(), 8);
    assert_eq!(event[0].len(), "YYYY-MM-DD".len());
    assert_eq!(event[1].len(), "HH:MM:SS".len());
    assert_eq!(event[2], "0000");
    assert_eq!(event[3], "W");
    for id in &event[4..] {
        id.parse::<u32>().unwrap();
    }
    // four right-aligned six-character identity fields
    assert_eq!(lines[0].len(), "YYYY-MM-DD HH:MM:SS 0000 W".len() + 4 * 7);

    assert_eq!(lines[1], "disk almost full");
    assert_eq!(lines[2], "\t--");
}

#[test]
fn test_long_message_is_wrapped() {
    let dir = tempfile::tempdir().unwrap();
    let logs = manager(dir.path());
    logs.open("wrap", OpenMode::Append).unwrap();
    logs.write("wrap", Severity::Info, Some(MSG_LONG)).unwrap();
    logs.close("wrap").unwrap();

    let content = read_log(dir.path(), "wrap");
    let body: Vec<&str> = content.lines().skip(1).take_while(|l| *l != "\t--").collect();
    assert!(body.len() > 1);
    for line in &body {
        assert!(line.chars().count() <= LINE_MAX_CHARS);
    }
    let rejoined = body.join(" ");
    assert_eq!(
        rejoined.split_whitespace().collect::<Vec<_>>(),
        MSG_LONG.split_whitespace().collect::<Vec<_>>()
    );
}

#[test]
fn test_missing_message_writes_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let logs = manager(dir.path());
    logs.open("empty", OpenMode::Append).unwrap();
    logs.write("empty", Severity::Debug, None).unwrap();
    logs.close("empty").unwrap();

    let content = read_log(dir.path(), "empty");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(&lines[1..], &["\t--", "", "\t--"]);
}

#[test]
fn test_table_growth_keeps_logs_usable() {
    let dir = tempfile::tempdir().unwrap();
    let logs = LogManager::with_page(LogConfig::with_dir(dir.path()), DEFAULT_PAGE);
    let initial = logs.logs_allocated();

    let names: Vec<String> = (0..2 * DEFAULT_PAGE).map(|i| format!("log{i}")).collect();
    for name in &names {
        logs.open(name, OpenMode::Append).unwrap();
        assert!(logs.logs_used() <= logs.logs_allocated());
    }
    assert!(logs.logs_allocated() > initial);

    for name in &names {
        logs.write(name, Severity::Info, Some(name.as_str())).unwrap();
    }
    for name in &names {
        logs.close(name).unwrap();
    }
    for name in &names {
        let content = read_log(dir.path(), name);
        assert_eq!(records(&content).len(), 1);
        assert!(content.contains(name.as_str()));
    }
}

#[test]
fn test_autoopen_restores_closed_state() {
    let dir = tempfile::tempdir().unwrap();
    let logs = manager(dir.path());

    logs.write_with_autoopen("x", Severity::Info, Some("hi")).unwrap();
    assert!(!logs.is_open("x"));
    assert_eq!(records(&read_log(dir.path(), "x")).len(), 1);

    logs.write_with_autoopen("x", Severity::Info, Some("hi")).unwrap();
    assert!(!logs.is_open("x"));
    assert_eq!(logs.status("x"), Some(LogStatus::Closed));

    let content = read_log(dir.path(), "x");
    let recs = records(&content);
    assert_eq!(recs.len(), 2);
    for rec in recs {
        assert!(rec.ends_with("\nhi"));
    }
    assert_eq!(logs.logs_used(), 1);
}

#[test]
fn test_autoopen_keeps_open_log_open() {
    let dir = tempfile::tempdir().unwrap();
    let logs = manager(dir.path());
    logs.open("busy", OpenMode::Append).unwrap();

    for _ in 0..3 {
        logs.write_with_autoopen("busy", Severity::Status, Some("tick")).unwrap();
        assert!(logs.is_open("busy"));
    }
    logs.close("busy").unwrap();
    assert_eq!(records(&read_log(dir.path(), "busy")).len(), 3);
}

#[test]
fn test_write_mode_truncates_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let logs = manager(dir.path());
    logs.open("fresh", OpenMode::Append).unwrap();
    logs.write("fresh", Severity::Info, Some("old")).unwrap();
    logs.close("fresh").unwrap();

    logs.open("fresh", OpenMode::Write).unwrap();
    logs.write("fresh", Severity::Info, Some("new")).unwrap();
    logs.close("fresh").unwrap();

    let content = read_log(dir.path(), "fresh");
    assert!(!content.contains("old"));
    assert_eq!(records(&content).len(), 1);
}

#[test]
fn test_inaccessible_dir() {
    let dir = tempfile::tempdir().unwrap();
    let logs = manager(&dir.path().join("missing"));

    let err = logs.open("apple", OpenMode::Append).unwrap_err();
    assert!(matches!(err, LogError::DirInaccessible { .. }));
    let err = logs
        .write_with_autoopen("apple", Severity::Info, Some("hi"))
        .unwrap_err();
    assert!(matches!(err, LogError::DirInaccessible { .. }));
    assert_eq!(logs.logs_used(), 0);
}

#[test]
fn test_unset_dir_variable() {
    let config = LogConfig {
        dir: Box::new(EnvLogDir::new("HANDLEREG_TEST_NO_SUCH_DIR_VAR")),
        ..LogConfig::default()
    };
    let logs = LogManager::new(config);
    assert!(matches!(
        logs.open("apple", OpenMode::Append),
        Err(LogError::DirUnavailable(_))
    ));
}

#[test]
fn test_invalid_names_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let logs = manager(dir.path());
    for bad in ["", "..", "../escape", "a/b"] {
        assert!(matches!(
            logs.open(bad, OpenMode::Append),
            Err(LogError::InvalidName(_))
        ));
    }
    assert_eq!(logs.logs_used(), 0);
}

#[test]
fn test_concurrent_writers_keep_records_whole() {
    let dir = tempfile::tempdir().unwrap();
    let logs = Arc::new(manager(dir.path()));
    logs.open("shared", OpenMode::Append).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let logs = Arc::clone(&logs);
            thread::spawn(move || {
                for i in 0..25 {
                    let msg = format!("writer {t} record {i}");
                    logs.write("shared", Severity::Info, Some(msg.as_str())).unwrap();
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }
    logs.close("shared").unwrap();

    let content = read_log(dir.path(), "shared");
    let recs = records(&content);
    assert_that!(recs.len(), is(equal_to(100)));
    for rec in recs {
        let lines: Vec<&str> = rec.lines().collect();
        assert_eq!(lines.len(), 2, "torn record: {rec:?}");
        assert!(lines[1].starts_with("writer "));
    }
}

#[test]
fn test_concurrent_autoopen_same_name() {
    let dir = tempfile::tempdir().unwrap();
    let logs = Arc::new(manager(dir.path()));

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let logs = Arc::clone(&logs);
            thread::spawn(move || {
                for i in 0..10 {
                    let msg = format!("w{t}-{i}");
                    logs.write_with_autoopen("rare", Severity::Debug, Some(msg.as_str()))
                        .unwrap();
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    assert_eq!(logs.logs_used(), 1);
    assert!(!logs.is_open("rare"));
    assert_eq!(records(&read_log(dir.path(), "rare")).len(), 40);
}

#[test]
fn test_autoopen_on_open_log_skips_dir_lookup() {
    const VAR: &str = "HANDLEREG_TEST_AUTOOPEN_DIR";
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var(VAR, dir.path());
    let config = LogConfig {
        dir: Box::new(EnvLogDir::new(VAR)),
        ..LogConfig::default()
    };
    let logs = LogManager::new(config);
    logs.open("busy", OpenMode::Append).unwrap();

    std::env::remove_var(VAR);
    logs.write_with_autoopen("busy", Severity::Info, Some("still here"))
        .unwrap();
    assert!(logs.is_open("busy"));

    logs.close("busy").unwrap();
    assert!(matches!(
        logs.write_with_autoopen("busy", Severity::Info, Some("gone")),
        Err(LogError::DirUnavailable(_))
    ));
    let content = read_log(dir.path(), "busy");
    assert_that!(records(&content).len(), is(equal_to(1)));
    assert!(content.contains("\nstill here\n"));
}

#[test]
fn test_concurrent_autoopen_in_write_mode_keeps_record_whole() {
    let dir = tempfile::tempdir().unwrap();
    let config = LogConfig::with_dir(dir.path()).default_mode(OpenMode::Write);
    let logs = Arc::new(LogManager::new(config));

    for round in 0..20 {
        let name = format!("fresh{round}");
        let start = Arc::new(std::sync::Barrier::new(4));
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let logs = Arc::clone(&logs);
                let start = Arc::clone(&start);
                let name = name.clone();
                thread::spawn(move || {
                    let msg = "x".repeat(10 + 20 * t);
                    start.wait();
                    logs.write_with_autoopen(&name, Severity::Info, Some(msg.as_str()))
                        .unwrap();
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        // every write truncates, so exactly one whole record survives
        let content = read_log(dir.path(), &name);
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3, "torn log {name}: {content:?}");
        assert!(lines[1].chars().all(|c| c == 'x'));
        assert_eq!(lines[2], "\t--");
        assert!(!logs.is_open(&name));
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_close_all_reports_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    std::os::unix::fs::symlink("/dev/full", dir.path().join("full")).unwrap();
    let logs = manager(dir.path());

    for name in ["before", "full", "after"] {
        logs.open(name, OpenMode::Append).unwrap();
    }
    logs.write("before", Severity::Info, Some("kept")).unwrap();
    assert!(matches!(
        logs.write("full", Severity::Info, Some("no room")),
        Err(LogError::Stream { .. })
    ));
    logs.write("after", Severity::Info, Some("kept")).unwrap();

    match logs.close_all() {
        Err(LogError::Stream { name, .. }) => assert_eq!(name, "full"),
        other => panic!("expected a stream error for \"full\", got {other:?}"),
    }
    for name in ["before", "full", "after"] {
        assert!(!logs.is_open(name), "{name} left open");
    }
    assert_that!(records(&read_log(dir.path(), "after")).len(), is(equal_to(1)));
}
