use std::path::PathBuf;

use packserve::cli::Args;
use packserve::config::{load_config, ConfigError, ConfigStore, RuntimeConfig, ServerConfig};

fn make_args(port: Option<u16>, pack_dir: Option<PathBuf>) -> Args {
    Args {
        config: None,
        pack_dir,
        port,
        workers: None,
        host_address: None,
    }
}

#[test]
fn test_defaults_when_nothing_set() {
    let config = ServerConfig::default();
    assert_eq!(config.http_port, 8080);
    assert_eq!(config.server_ip, "");
    assert!(!config.force_pack);
    assert!(config.auto_apply_all_worlds);
    assert!(config.resource_packs.is_empty());
    assert!(config.configured_address().is_none());
}

#[test]
fn test_toml_parse() {
    let toml_str = r#"
http_port = 9000
server_ip = "play.example.net"
force_pack = true
resource_packs = ["main.zip", "extra.zip"]
"#;
    let parsed: ServerConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(parsed.http_port, 9000);
    assert_eq!(parsed.configured_address(), Some("play.example.net"));
    assert!(parsed.force_pack);
    assert!(parsed.auto_apply_all_worlds, "missing key keeps its default");
    assert_eq!(parsed.resource_packs, vec!["main.zip", "extra.zip"]);
}

#[test]
fn test_toml_unknown_fields_ignored() {
    let toml_str = "http_port = 9000\nunknown_future_key = true\n";
    let parsed: Result<ServerConfig, _> = toml::from_str(toml_str);
    assert!(parsed.is_ok());
}

#[test]
fn test_message_falls_back_to_builtin() {
    let toml_str = "[messages]\npack_prompt = \"custom\"\n";
    let parsed: ServerConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(parsed.message("pack_prompt"), "custom");
    assert!(parsed.message("resource_pack_failed").contains("Failed"));
    assert_eq!(parsed.message("no_such_key"), "");
}

#[test]
fn test_open_writes_defaults_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("packserve.toml");
    let store = ConfigStore::open(&path).unwrap();
    assert!(path.exists());
    assert_eq!(store.snapshot(), ServerConfig::default());
    assert_eq!(load_config(&path).unwrap(), ServerConfig::default());
}

#[test]
fn test_update_persists_and_publishes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packserve.toml");
    let store = ConfigStore::open(&path).unwrap();

    store
        .update(|cfg| {
            cfg.http_port = 9090;
            cfg.force_pack = true;
        })
        .unwrap();

    assert_eq!(store.snapshot().http_port, 9090);
    let on_disk = load_config(&path).unwrap();
    assert_eq!(on_disk.http_port, 9090);
    assert!(on_disk.force_pack);
}

#[test]
fn test_update_failure_leaves_memory_untouched() {
    let dir = tempfile::tempdir().unwrap();
    // The "file" path is a directory, so saving fails.
    let store = ConfigStore::with_config(dir.path(), ServerConfig::default());
    let result = store.update(|cfg| cfg.http_port = 1234);
    assert!(result.is_err());
    assert_eq!(store.snapshot().http_port, 8080);
}

#[test]
fn test_reload_picks_up_file_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packserve.toml");
    let store = ConfigStore::open(&path).unwrap();
    std::fs::write(&path, "resource_packs = [\"a.zip\"]\nforce_pack = true\n").unwrap();

    store.reload().unwrap();
    let cfg = store.snapshot();
    assert_eq!(cfg.resource_packs, vec!["a.zip"]);
    assert!(cfg.force_pack);
}

#[test]
fn test_reload_parse_error_keeps_previous() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packserve.toml");
    let store = ConfigStore::open(&path).unwrap();
    std::fs::write(&path, "http_port = \"not a number\"\n").unwrap();

    assert!(store.reload().is_err());
    assert_eq!(store.snapshot(), ServerConfig::default());
}

#[test]
fn test_cli_port_overrides_file() {
    let file = ServerConfig {
        http_port: 7777,
        ..ServerConfig::default()
    };
    let runtime = RuntimeConfig::resolve(&file, &make_args(Some(9000), None));
    assert_eq!(runtime.port, 9000);

    let runtime = RuntimeConfig::resolve(&file, &make_args(None, None));
    assert_eq!(runtime.port, 7777);
}

#[test]
fn test_runtime_defaults() {
    let runtime = RuntimeConfig::resolve(&ServerConfig::default(), &make_args(None, None));
    assert_eq!(runtime.pack_dir, PathBuf::from("pack"));
    assert_eq!(runtime.workers, 5);
    assert!(runtime.host_address.is_none());
}

#[test]
fn test_zero_port_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packserve.toml");
    std::fs::write(&path, "http_port = 0\n").unwrap();
    assert!(matches!(load_config(&path), Err(ConfigError::InvalidPort(0))));
    assert!(ConfigStore::open(&path).is_err());
}

#[test]
fn test_reload_with_zero_port_keeps_previous() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packserve.toml");
    let store = ConfigStore::open(&path).unwrap();
    std::fs::write(&path, "http_port = 0\nforce_pack = true\n").unwrap();

    assert!(store.reload().is_err());
    assert_eq!(store.snapshot(), ServerConfig::default());
}
