use super::{
    command_set, default_config, load_config, resolve_data_dir, validate_config, write_config,
    CONFIG_SCHEMA_VERSION, DEFAULT_ACTION_LABEL, DEFAULT_STARTUP_DELAY_MS,
};
use std::path::Path;

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directory");
    }
    std::fs::write(path, contents.as_bytes()).expect("write file");
}

#[test]
fn default_config_is_valid() {
    let config = default_config();
    validate_config(&config).expect("default config validates");
    let commands = command_set(&config.engine).expect("split commands");
    assert_eq!(commands.compatibility, vec!["sh", "-c", "exit 0"]);
    assert_eq!(commands.conditioning, Some(vec!["true".to_string()]));
}

#[test]
fn written_config_loads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("config.json");
    let config = default_config();

    write_config(&path, &config).expect("write config");
    let loaded = load_config(&path).expect("load config");

    assert_eq!(loaded, config);
}

#[test]
fn omitted_fields_take_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    write_file(
        &path,
        r#"{
  "schema_version": 1,
  "data_dir": "state",
  "engine": {
    "compatibility": "true",
    "configuration": "true",
    "service": "true"
  }
}"#,
    );

    let config = load_config(&path).expect("load config");

    assert_eq!(config.startup_delay_ms, DEFAULT_STARTUP_DELAY_MS);
    assert_eq!(config.action_label, DEFAULT_ACTION_LABEL);
    assert_eq!(config.engine.conditioning, None);
    validate_config(&config).expect("validates");
}

#[test]
fn unknown_fields_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    write_file(
        &path,
        r#"{
  "schema_version": 1,
  "data_dir": "state",
  "window_title": "Media",
  "engine": {
    "compatibility": "true",
    "configuration": "true",
    "service": "true"
  }
}"#,
    );

    let err = load_config(&path).expect_err("unknown field");
    assert!(format!("{err:#}").contains("window_title"), "{err:#}");
}

#[test]
fn validation_rejects_bad_configs() {
    let mut config = default_config();
    config.schema_version = CONFIG_SCHEMA_VERSION + 1;
    let err = validate_config(&config).expect_err("schema version");
    assert!(err.to_string().contains("schema_version"));

    let mut config = default_config();
    config.engine.service = "   ".to_string();
    let err = validate_config(&config).expect_err("empty service");
    assert_eq!(err.to_string(), "engine.service must name a command");

    let mut config = default_config();
    config.engine.configuration = "sh -c 'unterminated".to_string();
    let err = validate_config(&config).expect_err("bad quoting");
    assert!(err.to_string().contains("engine.configuration"));

    let mut config = default_config();
    config.action_label = String::new();
    assert!(validate_config(&config).is_err());
}

#[test]
fn relative_data_dir_follows_config_file() {
    let mut config = default_config();
    config.data_dir = "state".to_string();
    assert_eq!(
        resolve_data_dir(&config, Path::new("/etc/mlaunch/config.json")),
        Path::new("/etc/mlaunch/state")
    );

    config.data_dir = "/var/lib/mlaunch".to_string();
    assert_eq!(
        resolve_data_dir(&config, Path::new("/etc/mlaunch/config.json")),
        Path::new("/var/lib/mlaunch")
    );
}
