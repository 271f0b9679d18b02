use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

struct Commands<'a> {
    compatibility: &'a str,
    conditioning: Option<&'a str>,
    configuration: &'a str,
    service: &'a str,
}

impl Default for Commands<'_> {
    fn default() -> Self {
        Self {
            compatibility: "sh -c 'exit 0'",
            conditioning: None,
            configuration: "sh -c 'echo living-room profile'",
            service: "sh -c 'exit 0'",
        }
    }
}

fn write_config(dir: &Path, commands: &Commands<'_>) -> PathBuf {
    let mut engine = serde_json::json!({
        "compatibility": commands.compatibility,
        "configuration": commands.configuration,
        "service": commands.service,
    });
    if let Some(conditioning) = commands.conditioning {
        engine["conditioning"] = serde_json::Value::from(conditioning);
    }
    let config = serde_json::json!({
        "schema_version": 1,
        "data_dir": "data",
        "startup_delay_ms": 0,
        "engine": engine,
    });
    let path = dir.join("config.json");
    std::fs::write(
        &path,
        serde_json::to_string_pretty(&config).expect("serialize config"),
    )
    .expect("write config");
    path
}

fn run_launcher(config: &Path, report: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mlaunch"))
        .arg("run")
        .arg("--config")
        .arg(config)
        .arg("--text")
        .arg("--auto-start")
        .arg("--delay-ms")
        .arg("0")
        .arg("--report")
        .arg(report)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("run mlaunch")
}

fn read_report(path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path).expect("read run report");
    serde_json::from_str(&content).expect("parse run report")
}

#[test]
fn init_writes_default_config_once() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config_path = temp_dir.path().join("launcher").join("config.json");
    let init = |force: bool| {
        let mut command = Command::new(env!("CARGO_BIN_EXE_mlaunch"));
        command.arg("init").arg("--config").arg(&config_path);
        if force {
            command.arg("--force");
        }
        command.output().expect("run init")
    };

    let first = init(false);
    assert!(first.status.success());
    assert!(String::from_utf8_lossy(&first.stdout).contains("wrote "));
    let config: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config_path).expect("read config"))
            .expect("parse config");
    assert_eq!(config["schema_version"], 1);
    assert_eq!(config["action_label"], "Start media center");

    let second = init(false);
    assert!(!second.status.success());
    assert!(String::from_utf8_lossy(&second.stderr).contains("--force"));

    assert!(init(true).status.success());
}

#[test]
fn auto_start_conditions_and_starts_the_service() {
    if find_in_path("sh").is_none() {
        return;
    }
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config = write_config(
        temp_dir.path(),
        &Commands {
            compatibility: "sh -c 'exit 1'",
            conditioning: Some("sh -c 'touch conditioned'"),
            ..Commands::default()
        },
    );
    let report_path = temp_dir.path().join("report.json");

    let output = run_launcher(&config, &report_path);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("status: Applying system optimizations..."), "{stdout}");
    assert!(stdout.contains("status: Media center started successfully"), "{stdout}");
    assert!(stdout.contains("handed off to the media service"), "{stdout}");
    assert!(temp_dir.path().join("data").join("conditioned").is_file());

    let report = read_report(&report_path);
    assert_eq!(report["outcome"], "running");
    assert_eq!(report["final_stage"]["stage"], "running");
    assert_eq!(report["start_attempts"], 1);
    assert_eq!(report["notices"].as_array().map(Vec::len), Some(0));
}

#[test]
fn configuration_failure_exits_nonzero() {
    if find_in_path("sh").is_none() {
        return;
    }
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config = write_config(
        temp_dir.path(),
        &Commands {
            configuration: "sh -c 'echo catalog offline >&2; exit 3'",
            ..Commands::default()
        },
    );
    let report_path = temp_dir.path().join("report.json");

    let output = run_launcher(&config, &report_path);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("error: Configuration failed"), "{stderr}");
    assert!(stderr.contains("media center setup failed"), "{stderr}");

    let report = read_report(&report_path);
    assert_eq!(report["outcome"], "failed");
    assert_eq!(report["final_stage"]["stage"], "failed");
    let reason = report["failure_reason"].as_str().expect("failure reason");
    assert!(reason.contains("catalog offline"), "{reason}");
    assert_eq!(report["start_attempts"], 0);
}

#[test]
fn rejected_start_leaves_launcher_ready() {
    if find_in_path("sh").is_none() {
        return;
    }
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config = write_config(
        temp_dir.path(),
        &Commands {
            service: "sh -c 'exit 4'",
            ..Commands::default()
        },
    );
    let report_path = temp_dir.path().join("report.json");

    let output = run_launcher(&config, &report_path);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("error: Startup failed"), "{stderr}");
    assert!(stderr.contains("launcher quit while ready to start"), "{stderr}");

    let report = read_report(&report_path);
    assert_eq!(report["outcome"], "quit");
    assert_eq!(report["final_stage"]["stage"], "ready_to_start");
    assert_eq!(report["start_attempts"], 1);
}

#[test]
fn missing_engine_program_fails_before_any_stage() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config = write_config(
        temp_dir.path(),
        &Commands {
            service: "mlaunch-test-no-such-service --fullscreen",
            ..Commands::default()
        },
    );
    let report_path = temp_dir.path().join("report.json");

    let output = run_launcher(&config, &report_path);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("initialize media engine"), "{stderr}");
    assert!(!report_path.exists());
}
