//! Integration tests for the tsperf binary.

use std::io::Write;
use std::process::{Command, Stdio};

const SAMPLE_LOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/trace/testdata/sample.log");

fn tsperf() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tsperf"));
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

/// Test that `-` reads the trace from stdin.
#[test]
fn test_analyze_trace_from_stdin() {
    let sample_trace = r#"[
{"name":"request","ph":"M","ts":1000,"pid":1,"tid":1,"args":{"seq":1,"command":"quickinfo"}},
{"name":"response","ph":"M","ts":5000,"pid":1,"tid":1,"args":{"seq":2,"request_seq":1,"command":"quickinfo"}},
{"name":"checkSourceFile","ph":"X","ts":6000,"dur":600000,"pid":1,"tid":1,"args":{"path":"/src/a.ts"}},
]"#;
    let project = tempfile::tempdir().unwrap();

    let mut child = tsperf()
        .arg("-")
        .arg("--project")
        .arg(project.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn tsperf");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(sample_trace.as_bytes())
        .expect("Failed to write to stdin");

    let output = child.wait_with_output().expect("Failed to read output");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("quickinfo"), "Should show command stats");
    assert!(
        stdout.contains("600.0ms  Internal: checkSourceFile  /src/a.ts"),
        "Should list slow internal op:\n{stdout}"
    );
}

/// Test reading from a file.
#[test]
fn test_analyze_trace_from_file() {
    let project = tempfile::tempdir().unwrap();
    let output = tsperf()
        .arg(SAMPLE_LOG)
        .arg("--project")
        .arg(project.path())
        .output()
        .expect("Failed to run tsperf");

    assert!(output.status.success(), "Should succeed with sample log");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("TRACE PERFORMANCE ANALYSIS"),
        "Should have header"
    );
    assert!(stdout.contains("sample.log"), "Should name the file");
    assert!(
        stdout.contains("Command: completionInfo"),
        "Should list slow command"
    );
    assert!(stdout.contains("quickinfo"), "Should show quickinfo stats");
    assert!(stdout.contains("TOTAL"), "Should show total row");
    // No tsconfig in the project dir, so no path annotations.
    assert!(!stdout.contains("Triggered by tsconfig paths"));
}

/// Path aliases from the project's tsconfig annotate findSourceFile spans.
#[test]
fn test_analyze_trace_with_tsconfig_paths() {
    let project = tempfile::tempdir().unwrap();
    std::fs::write(
        project.path().join("tsconfig.json"),
        r#"{
  // aliases
  "compilerOptions": { "paths": { "@shared/*": ["./src/shared/*"] } },
}"#,
    )
    .unwrap();

    let output = tsperf()
        .arg(SAMPLE_LOG)
        .arg("--project")
        .arg(project.path())
        .arg("--format")
        .arg("json")
        .output()
        .expect("Failed to run tsperf");

    assert!(output.status.success());
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let internal = reports[0]["internal_stats"].as_object().unwrap();
    assert!(
        internal.contains_key("findSourceFile: /repo/src/shared/util.ts (Triggered by tsconfig paths)"),
        "Should annotate the aliased lookup: {internal:?}"
    );
    assert!(internal.contains_key("findSourceFile: /repo/lib/a.ts"));
}

/// A broken tsconfig is a warning, not a failure.
#[test]
fn test_analyze_trace_bad_tsconfig_warns() {
    let project = tempfile::tempdir().unwrap();
    std::fs::write(project.path().join("tsconfig.json"), "{ broken").unwrap();

    let output = tsperf()
        .arg(SAMPLE_LOG)
        .arg("--project")
        .arg(project.path())
        .output()
        .expect("Failed to run tsperf");

    assert!(output.status.success(), "Should still analyze the trace");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to parse"),
        "Should warn about tsconfig: {stderr}"
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("TRACE PERFORMANCE ANALYSIS"));
}

/// Test that a missing file is reported and fails the run.
#[test]
fn test_analyze_trace_missing_file() {
    let project = tempfile::tempdir().unwrap();
    let output = tsperf()
        .arg("/nonexistent/path/to/trace.json")
        .arg("--project")
        .arg(project.path())
        .output()
        .expect("Failed to run tsperf");

    assert!(
        !output.status.success(),
        "Should fail with non-existent file"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to open"),
        "Should show error message: {stderr}"
    );
}

/// One bad file doesn't hide the report for the others.
#[test]
fn test_analyze_trace_partial_failure() {
    let project = tempfile::tempdir().unwrap();
    let output = tsperf()
        .arg("/nonexistent/trace.json")
        .arg(SAMPLE_LOG)
        .arg("--project")
        .arg(project.path())
        .output()
        .expect("Failed to run tsperf");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("TRACE PERFORMANCE ANALYSIS"));
}

/// JSON output carries the raw aggregates.
#[test]
fn test_analyze_trace_json() {
    let project = tempfile::tempdir().unwrap();
    let output = tsperf()
        .arg(SAMPLE_LOG)
        .arg("--project")
        .arg(project.path())
        .arg("--format")
        .arg("json")
        .output()
        .expect("Failed to run tsperf");

    assert!(output.status.success());
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let report = &reports[0];
    assert!(report["path"].as_str().unwrap().ends_with("sample.log"));

    let quickinfo = &report["command_stats"]["quickinfo"];
    assert_eq!(quickinfo["count"], 2);
    assert_eq!(quickinfo["total_duration"], 15800.0);
    assert_eq!(quickinfo["max_duration"], 12500.0);

    let slow = report["slow_operations"].as_array().unwrap();
    assert_eq!(slow.len(), 2);
}

/// Directories are searched for trace files.
#[test]
fn test_analyze_trace_directory_argument() {
    let logs = tempfile::tempdir().unwrap();
    let trace_dir = logs.path().join("window1/tsserver-log-abc");
    std::fs::create_dir_all(&trace_dir).unwrap();
    let mut file = std::fs::File::create(trace_dir.join("trace.42.json")).unwrap();
    writeln!(
        file,
        r#"[
{{"name":"request","ph":"M","ts":0,"pid":1,"tid":1,"args":{{"seq":1,"command":"navto"}}}},
{{"name":"response","ph":"M","ts":700000,"pid":1,"tid":1,"args":{{"seq":2,"request_seq":1,"command":"navto"}}}},
]"#
    )
    .unwrap();

    let output = tsperf()
        .arg(logs.path())
        .arg("--project")
        .arg(logs.path())
        .output()
        .expect("Failed to run tsperf");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("trace.42.json"));
    assert!(stdout.contains("700.0ms  Command: navto"));
}

/// An empty directory finds nothing and says how to enable tracing.
#[test]
fn test_analyze_trace_no_files() {
    let empty = tempfile::tempdir().unwrap();
    let output = tsperf()
        .arg(empty.path())
        .arg("--project")
        .arg(empty.path())
        .stdin(Stdio::null())
        .output()
        .expect("Failed to run tsperf");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No trace files found"), "{stderr}");
    assert!(stderr.contains("enableTracing"), "{stderr}");
}

/// `--latest` picks the newest file even when it isn't listed first.
#[test]
fn test_analyze_trace_latest_among_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let base = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
    let write_trace = |name: &str, command: &str, age_secs: u64| {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{"name":"request","ph":"M","ts":0,"pid":1,"tid":1,"args":{{"seq":1,"command":"{command}"}}}}
{{"name":"response","ph":"M","ts":100,"pid":1,"tid":1,"args":{{"seq":2,"request_seq":1,"command":"{command}"}}}}"#
        )
        .unwrap();
        file.set_modified(base - std::time::Duration::from_secs(age_secs))
            .unwrap();
        path
    };
    let older = write_trace("older.json", "olderCommand", 600);
    let newer = write_trace("newer.json", "newerCommand", 0);

    let output = tsperf()
        .arg(&older)
        .arg(&newer)
        .arg("--latest")
        .arg("--project")
        .arg(dir.path())
        .output()
        .expect("Failed to run tsperf");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("newerCommand"), "{stdout}");
    assert!(!stdout.contains("olderCommand"), "{stdout}");
}
