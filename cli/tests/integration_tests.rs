use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const FILE_SCHEMA: &str = r#"
name: inputs::File
config_name: file
category: input
status: stable
options:
  - name: path
    validate: string
    required: true
  - name: mode
    validate: [read, tail]
    default: tail
  - name: password
    validate: password
flags:
  - tokens: ["--since-db PATH"]
    help: Where to keep read offsets
  - tokens: ["--verbose"]
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write fixture");
    path
}

fn plugin_config(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_plugin-config"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run plugin-config")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp path is utf-8")
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_prints_configuration_with_defaults_and_redacted_secret() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "file.yaml", FILE_SCHEMA);
    let params = write(
        dir.path(),
        "params.json",
        r#"{"path": ["/var/log/syslog"], "password": "hunter2"}"#,
    );

    let output = plugin_config(&[
        "check",
        "--schema",
        path_arg(&schema),
        "--params",
        path_arg(&params),
    ]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["path"], "/var/log/syslog");
    assert_eq!(config["mode"], "tail");
    assert_eq!(config["password"], "<secret>");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("hunter2"));
}

#[test]
fn check_yaml_output() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "file.yaml", FILE_SCHEMA);
    let params = write(dir.path(), "params.yaml", "path: /tmp/x\nmode: read\n");

    let output = plugin_config(&[
        "check",
        "--schema",
        path_arg(&schema),
        "--params",
        path_arg(&params),
        "--format",
        "yaml",
    ]);

    assert!(output.status.success());
    let config: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(config["mode"].as_str(), Some("read"));
}

#[test]
fn check_missing_required_setting_fails_with_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "file.yaml", FILE_SCHEMA);
    let params = write(dir.path(), "params.yaml", "mode: read\n");

    let output = plugin_config(&[
        "check",
        "--schema",
        path_arg(&schema),
        "--params",
        path_arg(&params),
    ]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Something is wrong with your configuration for the File plugin"));
    assert!(stderr.contains("Missing a required setting for the File plugin: path"));
}

#[test]
fn check_rejects_value_outside_allowed_list() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "file.yaml", FILE_SCHEMA);
    let params = write(dir.path(), "params.yaml", "path: /tmp/x\nmode: rewind\n");

    let output = plugin_config(&[
        "check",
        "--schema",
        path_arg(&schema),
        "--params",
        path_arg(&params),
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("rewind"));
}

#[test]
fn check_reports_unreadable_schema() {
    let dir = tempfile::tempdir().unwrap();
    let params = write(dir.path(), "params.yaml", "path: /tmp/x\n");
    let missing = dir.path().join("nope.yaml");

    let output = plugin_config(&[
        "check",
        "--schema",
        path_arg(&missing),
        "--params",
        path_arg(&params),
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load schema"));
}

// ---------------------------------------------------------------------------
// flags
// ---------------------------------------------------------------------------

#[test]
fn flags_lists_prefixed_names_with_help() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "file.yaml", FILE_SCHEMA);

    let output = plugin_config(&["flags", "--schema", path_arg(&schema)]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["--file-since-db\tWhere to keep read offsets", "--file-verbose"]
    );
}

#[test]
fn flags_without_declarations() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write(dir.path(), "plain.yaml", "name: Plain\nstatus: stable\n");

    let output = plugin_config(&["flags", "--schema", path_arg(&schema)]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "Plain declares no flags.");
}
