use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir, variant: &str) -> PathBuf {
    let toml = format!(
        r#"
[vehicle]
variant = "{variant}"
gas_interceptor = false
blind_spot_monitor = true

[control]
rate_hz = 100
offset_time_constant_s = 60.0

[logging]
level = "warn"
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    write_config(dir, "corolla_2010")
}

fn schema_json(cfg: &Path) -> serde_json::Value {
    let out = Command::cargo_bin("carstate_cli")
        .unwrap()
        .arg("--config")
        .arg(cfg)
        .args(["--json", "schema"])
        .output()
        .unwrap();
    assert!(out.status.success());
    serde_json::from_slice(&out.stdout).unwrap()
}

// Every subscribed signal at zero, plus overrides.
fn zeroed_signals(bus: &serde_json::Value, overrides: &[(&str, f64)]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for r in bus["signals"].as_array().unwrap() {
        let key = format!(
            "{}.{}",
            r["message"].as_str().unwrap(),
            r["signal"].as_str().unwrap()
        );
        map.insert(key, 0.0.into());
    }
    for (k, v) in overrides {
        map.insert((*k).to_string(), (*v).into());
    }
    serde_json::Value::Object(map)
}

fn cycle_line(schema: &serde_json::Value, elapsed_s: f64, pt_over: &[(&str, f64)]) -> String {
    serde_json::json!({
        "elapsed_s": elapsed_s,
        "pt": { "signals": zeroed_signals(&schema["pt"], pt_over) },
        "cam": { "signals": zeroed_signals(&schema["cam"], &[]) },
    })
    .to_string()
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["variants"], 0, "rav4_tss2", "stdout")]
#[case(&["schema"], 0, "SECONDARY_STEER_ANGLE", "stdout")]
#[case(&["replay"], 2, "required", "stderr")]
#[case(&["replay", "--input", "/nonexistent/cycles.jsonl"], 1, "open replay input", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("carstate_cli").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        _ => {
            assert.stderr(predicate::str::contains(needle));
        }
    }
}

#[test]
fn variants_json_lists_facets() {
    let out = Command::cargo_bin("carstate_cli")
        .unwrap()
        .args(["--json", "variants"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 15);
    let legacy = rows.iter().find(|r| r["name"] == "corolla_2010").unwrap();
    assert_eq!(legacy["legacy"], true);
    assert_eq!(legacy["secondary_angle_sensor"], true);
}

#[test]
fn second_gen_schema_requests_acc_type_on_camera_bus() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "rav4_tss2");
    let schema = schema_json(&cfg);
    let cam = schema["cam"]["signals"].as_array().unwrap();
    assert!(cam.iter().any(|r| r["signal"] == "ACC_TYPE"));
    let pt = schema["pt"]["signals"].as_array().unwrap();
    assert!(!pt.iter().any(|r| r["signal"] == "ACC_TYPE"));
}

#[test]
fn replay_emits_one_snapshot_per_cycle() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let schema = schema_json(&cfg);

    let input = dir.path().join("cycles.jsonl");
    let body = format!(
        "# two cycles\n{}\n{}\n",
        cycle_line(&schema, 0.01, &[("SECONDARY_STEER_ANGLE.ZORRO_STEER", 10.0)]),
        cycle_line(&schema, 0.1, &[("SECONDARY_STEER_ANGLE.ZORRO_STEER", 10.5)]),
    );
    fs::write(&input, body).unwrap();

    let out = Command::cargo_bin("carstate_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--input")
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let snaps: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(snaps.len(), 2);
    assert_eq!(snaps[0]["steeringRateDeg"].as_f64().unwrap(), 0.0);
    assert!((snaps[1]["steeringRateDeg"].as_f64().unwrap() - 5.0).abs() < 1e-9);
    assert_eq!(snaps[1]["steeringAngleDeg"].as_f64().unwrap(), 10.5);
}

#[test]
fn replay_limit_stops_early() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let schema = schema_json(&cfg);
    let line = cycle_line(&schema, 0.01, &[]);
    let input = dir.path().join("cycles.jsonl");
    fs::write(&input, format!("{line}\n{line}\n{line}\n")).unwrap();

    Command::cargo_bin("carstate_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["replay", "--limit", "1", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::function(|s: &str| s.lines().count() == 1));
}

#[test]
fn unknown_variant_exits_3() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "supra_mk4");
    Command::cargo_bin("carstate_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("schema")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("carstate variants"));
}

#[test]
fn missing_signal_exits_4_with_json_reason() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let input = dir.path().join("cycles.jsonl");
    fs::write(
        &input,
        r#"{"elapsed_s": 0.01, "pt": {"signals": {"GEAR_PACKET.GEAR": 32}}}"#,
    )
    .unwrap();

    let out = Command::cargo_bin("carstate_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("replay")
        .arg("--input")
        .arg(&input)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));

    let stderr = String::from_utf8(out.stderr).unwrap();
    let last = stderr.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(v["reason"], "MissingSignal");
    assert_eq!(v["details"]["bus"], "pt");
}

#[test]
fn missing_config_is_humanized() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("carstate_cli")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("schema")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not read the config file"));
}

#[test]
fn invalid_control_rate_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(
        &path,
        "[vehicle]\nvariant = \"rav4\"\n[control]\nrate_hz = 0\n",
    )
    .unwrap();
    Command::cargo_bin("carstate_cli")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .arg("schema")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Configuration is invalid"))
        .stderr(predicate::str::contains("rate_hz must be > 0"));
}

#[test]
fn invalid_config_reports_reason_as_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(
        &path,
        "[vehicle]\nvariant = \"rav4\"\n[logging]\nrotation = \"weekly\"\n",
    )
    .unwrap();
    let out = Command::cargo_bin("carstate_cli")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .args(["--json", "schema"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8(out.stderr).unwrap();
    let v: serde_json::Value = serde_json::from_str(stderr.lines().last().unwrap()).unwrap();
    assert_eq!(v["reason"], "RejectedConfig");
}
