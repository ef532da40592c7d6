use std::fs;
use std::process::Output;
use tempfile::tempdir;

/// Runs the binary against an unsupported URL scheme so it stops right after
/// loading the config, before any network call.
fn run_with_config(file_name: &str, contents: &str) -> Output {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join(file_name);
    fs::write(&config_path, contents).unwrap();

    std::process::Command::new(env!("CARGO_BIN_EXE_insighthub"))
        .arg("ftp://example.com")
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .output()
        .expect("Failed to execute command")
}

fn assert_config_loaded(output: &Output) {
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid URL scheme 'ftp'"), "{}", stderr);
    assert!(!stderr.contains("config"), "{}", stderr);
}

fn assert_config_rejected(output: &Output, message: &str) {
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(message), "{}", stderr);
}

#[test]
fn test_cli_with_json_config() {
    let output = run_with_config(
        "config.json",
        r#"{
        "competitors": ["https://rival.test"],
        "keywords": ["seo", "ai tools"],
        "output": "json",
        "timeout": 15
    }"#,
    );
    assert_config_loaded(&output);
}

#[test]
fn test_cli_with_toml_config() {
    let output = run_with_config(
        "config.toml",
        r#"
competitors = ["https://rival.test"]
keywords = ["seo"]
output = "json"
no_ai = true

[scoring]
baseline = 40
"#,
    );
    assert_config_loaded(&output);
}

#[test]
fn test_cli_with_yaml_config() {
    let output = run_with_config(
        "config.yaml",
        r#"
competitors:
  - https://rival.test
keywords:
  - seo
output: json
timeout: 15
"#,
    );
    assert_config_loaded(&output);
}

#[test]
fn test_cli_with_yml_config() {
    let output = run_with_config(
        "config.yml",
        r#"
keywords:
  - seo
llm_model: llama-3.1-8b-instant
keyword_results: 10
"#,
    );
    assert_config_loaded(&output);
}

#[test]
fn test_cli_with_invalid_config_format() {
    let output = run_with_config("config.txt", "invalid content");
    assert_config_rejected(&output, "Unsupported config file format");
}

#[test]
fn test_cli_with_invalid_json_config() {
    let output = run_with_config("config.json", r#"{ invalid json }"#);
    assert_config_rejected(&output, "Failed to parse JSON config");
}

#[test]
fn test_cli_with_invalid_toml_config() {
    let output = run_with_config("config.toml", r#"[[[ invalid toml"#);
    assert_config_rejected(&output, "Failed to parse TOML config");
}

#[test]
fn test_cli_with_invalid_yaml_config() {
    let output = run_with_config(
        "config.yaml",
        r#"
keywords: "test
  timeout: invalid
"#,
    );
    assert_config_rejected(&output, "Failed to parse YAML config");
}

#[test]
fn test_cli_with_wrongly_typed_config() {
    let output = run_with_config("config.json", r#"{ "timeout": "soon" }"#);
    assert_config_rejected(&output, "Failed to parse JSON config");
}

#[test]
fn test_cli_with_nonexistent_config() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_insighthub"))
        .arg("https://example.com")
        .arg("--config")
        .arg("/nonexistent/path/config.json")
        .output()
        .expect("Failed to execute command");

    assert_config_rejected(&output, "Failed to read config file");
}

#[test]
fn test_cli_with_config_and_help() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, r#"{ "competitors": ["https://rival.test"] }"#).unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_insighthub"))
        .arg("https://example.com")
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
}
