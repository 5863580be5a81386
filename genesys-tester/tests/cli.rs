use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "genesys-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_genesys-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("smoke"));
}

#[test]
fn cli_runs_all_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_genesys-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args(["--report", "json", "--iterations", "1", "--output"])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let content = std::fs::read_to_string(output_path).expect("read output");
    let results: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let results = results.as_array().expect("array of results");
    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r["passed"] == true));
}

#[test]
fn cli_rejects_invalid_config() {
    let exe = env!("CARGO_BIN_EXE_genesys-tester");
    let config_path = temp_path("config");
    std::fs::write(&config_path, r#"{"level_curve": {"kind": "flat", "xp_per_level": 0}}"#)
        .expect("write config");
    let output = Command::new(exe)
        .args(["--scenarios", "smoke", "--config"])
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid progression config"));
}

#[test]
fn cli_honors_start_date_and_overrides() {
    let exe = env!("CARGO_BIN_EXE_genesys-tester");
    let config_path = temp_path("quadratic");
    std::fs::write(
        &config_path,
        r#"{"level_curve": {"kind": "quadratic", "base": 100}, "daily_farm_cap": 120}"#,
    )
    .expect("write config");
    let output_path = temp_path("markdown");
    let output = Command::new(exe)
        .args([
            "--scenarios",
            "leveling,farming,attributes",
            "--start-date",
            "2024-02-28",
            "--report",
            "markdown",
            "--config",
        ])
        .arg(&config_path)
        .arg("--output")
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("- **Failed**: 0"));
}
