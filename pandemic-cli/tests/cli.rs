use std::path::Path;
use std::process::{Command, Output};

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "pandemic-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn run(saves: &Path, args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_pandemic");
    Command::new(exe)
        .arg("--saves")
        .arg(saves)
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("run cli")
}

#[test]
fn cli_new_exec_show_flow() {
    let saves = temp_path("flow");
    assert!(run(&saves, &["new", "tuesday"]).status.success());
    assert!(saves.join("tuesday.json").exists());

    let output = run(&saves, &["exec", "tuesday", "infect", "tok"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Infected Tokyo (level 1)"));

    let output = run(&saves, &["exec", "tuesday", "infect", "tokyo"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already been drawn"));

    assert!(run(&saves, &["exec", "tuesday", "epidemic", "tokyo"]).status.success());

    let output = run(&saves, &["show", "tuesday", "--json"]);
    assert!(output.status.success());
    let snapshot: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("snapshot is json");
    assert_eq!(snapshot["game_name"], "tuesday");
    assert_eq!(snapshot["infection_deck"]["striations"][0], serde_json::json!(["Tokyo"]));
    assert!(
        snapshot["infection_deck"]["drawn"]
            .as_array()
            .is_some_and(Vec::is_empty)
    );

    let output = run(&saves, &["show", "tuesday"]);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Striation 0 (1)"));
}

#[test]
fn cli_refuses_to_overwrite_without_force() {
    let saves = temp_path("force");
    assert!(run(&saves, &["new", "game", "--shock-markers", "4"]).status.success());
    let output = run(&saves, &["new", "game"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));
    assert!(run(&saves, &["new", "game", "--force"]).status.success());
    assert!(!run(&saves, &["show", "missing"]).status.success());
}

#[test]
fn cli_keeps_unreadable_save_without_force() {
    let saves = temp_path("broken");
    std::fs::create_dir_all(&saves).unwrap();
    let save = saves.join("game.json");
    std::fs::write(&save, "{\"catalog\": ").unwrap();

    let output = run(&saves, &["new", "game"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot be loaded"), "{stderr}");
    assert_eq!(std::fs::read_to_string(&save).unwrap(), "{\"catalog\": ");

    assert!(run(&saves, &["new", "game", "--force"]).status.success());
    assert!(run(&saves, &["show", "game"]).status.success());
}

#[test]
fn cli_simulate_writes_json_report() {
    let saves = temp_path("sim-saves");
    let output_path = temp_path("sim.json");
    let output = Command::new(env!("CARGO_BIN_EXE_pandemic"))
        .arg("--saves")
        .arg(&saves)
        .args(["simulate", "--seeds", "1,2", "--steps", "50", "--report", "json", "--output"])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Pandemic Infection Tracker"));
    let content = std::fs::read_to_string(output_path).expect("read output");
    let results: serde_json::Value = serde_json::from_str(&content).expect("report is json");
    assert_eq!(results.as_array().map(Vec::len), Some(2));
    assert_eq!(results[1]["seed"], 2);
}
