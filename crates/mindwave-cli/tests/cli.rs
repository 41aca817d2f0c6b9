use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

/// Attention 50 then meditation 10, with a stray byte in front.
const CLEAN_DUMP: &[u8] = &[
    0x00, 0xAA, 0xAA, 0x02, 0x04, 0x32, 0xC9, 0xAA, 0xAA, 0x02, 0x05, 0x0A, 0xF0,
];
/// One good attention frame followed by a frame with a flipped checksum.
const DAMAGED_DUMP: &[u8] = &[
    0xAA, 0xAA, 0x02, 0x04, 0x32, 0xC9, 0xAA, 0xAA, 0x02, 0x05, 0x0A, 0xF1,
];

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("mindwave"))
}

fn write_dump(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write dump");
    path
}

fn stdout_json(assert: assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("decode").and(contains("capture")));
    cmd().arg("decode").arg("--help").assert().success();
    cmd().arg("capture").arg("--help").assert().success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.bin");
    let report = temp.path().join("report.json");

    cmd()
        .arg("decode")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn stdout_outputs_report_json() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_dump(temp.path(), "session.bin", CLEAN_DUMP);

    let assert = cmd()
        .arg("decode")
        .arg(&input)
        .arg("--stdout")
        .assert()
        .success();
    let report = stdout_json(assert);

    assert_eq!(report["tool"]["name"], "mindwave");
    assert_eq!(report["input"]["bytes"], CLEAN_DUMP.len() as u64);
    assert_eq!(report["frames"]["frames_decoded"], 2);
    assert_eq!(report["frames"]["bytes_skipped"], 1);
    assert_eq!(report["metrics"][0]["metric"], "attention");
    assert_eq!(report["metrics"][0]["last"], 50);
    assert_eq!(report["metrics"][1]["metric"], "meditation");
    assert_eq!(report["metrics"][1]["last"], 10);
}

#[test]
fn report_file_is_written() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_dump(temp.path(), "session.bin", CLEAN_DUMP);
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("-o")
        .arg(&report)
        .arg("--pretty")
        .assert()
        .success()
        .stderr(contains("OK: report written"));

    let text = std::fs::read_to_string(&report).expect("report written");
    assert!(text.contains('\n'));
    let value: Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(value["report_version"], 1);
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_dump(temp.path(), "session.bin", CLEAN_DUMP);
    let report = temp.path().join("report.json");

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_dump(temp.path(), "session.bin", CLEAN_DUMP);

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn report_path_must_differ_from_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_dump(temp.path(), "session.bin", CLEAN_DUMP);

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .code(2)
        .stderr(contains("report path must differ from input"));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_dump(temp.path(), "session.bin", CLEAN_DUMP);
    let report = temp.path().join("report.json");

    cmd()
        .arg("decode")
        .arg(input)
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn glob_resolving_to_one_file_is_accepted() {
    let temp = TempDir::new().expect("tempdir");
    write_dump(temp.path(), "session.bin", CLEAN_DUMP);
    let pattern = temp.path().join("*.bin");

    let assert = cmd()
        .arg("decode")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .success();
    assert_eq!(stdout_json(assert)["frames"]["frames_decoded"], 2);
}

#[test]
fn glob_matching_several_files_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    write_dump(temp.path(), "a.bin", CLEAN_DUMP);
    write_dump(temp.path(), "b.bin", CLEAN_DUMP);
    let pattern = temp.path().join("*.bin");

    cmd()
        .arg("decode")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("multiple files match pattern").and(contains("hint:")));
}

#[test]
fn list_discards_outputs_counters() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_dump(temp.path(), "damaged.bin", DAMAGED_DUMP);

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .arg("--list-discards")
        .assert()
        .success()
        .stderr(contains("Discarded frames:").and(contains("checksum_mismatches 1")));
}

#[test]
fn strict_fails_when_frames_are_discarded() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_dump(temp.path(), "damaged.bin", DAMAGED_DUMP);

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .code(2)
        .stderr(contains("1 frame(s) discarded"));
}

#[test]
fn strict_passes_on_clean_dump() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_dump(temp.path(), "session.bin", CLEAN_DUMP);

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .success();
}

#[test]
fn capture_without_port_shows_hint() {
    cmd()
        .arg("capture")
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("no serial port given").and(contains("hint:")));
}

#[test]
fn capture_on_missing_port_fails_to_start() {
    cmd()
        .arg("capture")
        .arg("/dev/mindwave-does-not-exist")
        .arg("--duration")
        .arg("1")
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("failed to start capture").and(contains("hint:")));
}

#[test]
fn capture_reads_port_from_config_file() {
    let temp = TempDir::new().expect("tempdir");
    let config = temp.path().join("mindwave.toml");
    std::fs::write(
        &config,
        "[serial]\nport = \"/dev/mindwave-does-not-exist\"\nbaud_rate = 9600\n",
    )
    .expect("write config");

    cmd()
        .arg("capture")
        .arg("--config")
        .arg(config)
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("/dev/mindwave-does-not-exist@9600"));
}

#[test]
fn unknown_watch_metric_is_rejected() {
    cmd()
        .arg("capture")
        .arg("/dev/rfcomm0")
        .arg("--watch")
        .arg("focus")
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("unknown metric 'focus'"));
}
