//! Command line behaviour of the `stratum` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SCHEMA: &str = r#"
root: config
elements:
  config:
    children:
      type: { unique: name }
  type:
    attributes:
      name: { required: true }
      shared: { values: ["true", "false"] }
"#;

fn stratum(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stratum"))
        .args(args)
        .current_dir(cwd)
        .env_remove("STRATUM_VALIDATE")
        .env_remove("STRATUM_LOG_DIRECTORY")
        .output()
        .expect("failed to run stratum")
}

fn project() -> TempDir {
    let temp = TempDir::new().expect("failed to create temp dir");
    let root = temp.path();
    fs::create_dir_all(root.join("app/etc")).unwrap();
    fs::create_dir_all(root.join("module/etc")).unwrap();
    fs::write(root.join("schema.yaml"), SCHEMA).unwrap();
    fs::write(
        root.join("app/etc/di.xml"),
        r#"<config><type name="A" shared="true"/></config>"#,
    )
    .unwrap();
    fs::write(
        root.join("module/etc/di.xml"),
        r#"<config><type name="A" shared="false"/><type name="B"/></config>"#,
    )
    .unwrap();
    fs::write(
        root.join("stratum.toml"),
        r#"
file_name = "di.xml"
roots = ["app/etc", "module/etc"]
validate = true
schema = "schema.yaml"
log_directory = "var/log"

[id_attributes]
"/config/type" = "name"
"#,
    )
    .unwrap();
    temp
}

#[test]
fn read_prints_merged_json() {
    let temp = project();
    let output = stratum(&["read", "--config", "stratum.toml"], temp.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "type": [{ "@name": "A", "@shared": "false" }, { "@name": "B" }] })
    );
}

#[test]
fn read_prints_merged_xml() {
    let temp = project();
    let output = stratum(
        &["read", "--config", "stratum.toml", "--format", "xml"],
        temp.path(),
    );
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "<config>\n  <type name=\"A\" shared=\"false\"/>\n  <type name=\"B\"/>\n</config>\n"
    );
}

#[test]
fn read_fails_on_invalid_merged_document() {
    let temp = project();
    fs::write(
        temp.path().join("module/etc/di.xml"),
        r#"<config><type name="A" shared="sometimes"/></config>"#,
    )
    .unwrap();

    let output = stratum(
        &["read", "--config", "stratum.toml", "--log", "read.log"],
        temp.path(),
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("got 'sometimes'"));

    let log = fs::read_to_string(temp.path().join("var/log/read.log")).unwrap();
    assert!(log.starts_with("scope=(default) file_name=di.xml failed:"));

    let output = stratum(
        &["read", "--config", "stratum.toml", "--no-validate"],
        temp.path(),
    );
    assert!(output.status.success());
}

#[test]
fn check_reports_every_violation() {
    let temp = project();
    fs::write(
        temp.path().join("bad.xml"),
        "<config>\n  <type shared=\"maybe\"/>\n</config>",
    )
    .unwrap();

    let output = stratum(
        &["check", "app/etc/di.xml", "bad.xml", "--schema", "schema.yaml"],
        temp.path(),
    );
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("app/etc/di.xml: ok"));
    assert!(stdout.contains("/config/type: Missing required attribute 'name'"));
    assert!(stdout.contains("/config/type: Attribute 'shared' must be one of: true, false, got 'maybe'"));
}
