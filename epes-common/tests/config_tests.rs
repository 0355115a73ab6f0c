//! Configuration tests
//!
//! Tests that touch EPES_ROOT_FOLDER are marked #[serial] so they do not
//! race on the process environment.

use epes_common::config::{
    database_path, default_root_folder, resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV,
};
use epes_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/epes-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/epes-toml")),
        ..TomlConfig::default()
    };

    let root = resolve_root_folder(Some("/tmp/epes-cli"), &config);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(root, PathBuf::from("/tmp/epes-cli"));
}

#[test]
#[serial]
fn test_env_var_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/epes-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/epes-toml")),
        ..TomlConfig::default()
    };

    let root = resolve_root_folder(None, &config);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(root, PathBuf::from("/tmp/epes-env"));
}

#[test]
#[serial]
fn test_toml_beats_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/epes-toml")),
        ..TomlConfig::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/epes-toml"));
}

#[test]
#[serial]
fn test_falls_back_to_platform_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let root = resolve_root_folder(None, &TomlConfig::default());

    assert_eq!(root, default_root_folder());
    assert!(!root.as_os_str().is_empty());
}

#[test]
fn test_load_config_file_with_defaults_table() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/epes"
log_level = "debug"

[defaults]
voltage_hv = "33000"
oltc_make = "CTR"
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/epes")));
    assert_eq!(config.log_level.as_deref(), Some("debug"));
    assert_eq!(config.defaults.voltage_hv, "33000");
    assert_eq!(config.defaults.oltc_make, "CTR");
    // Keys not given keep their compiled defaults
    assert_eq!(config.defaults.voltage_lv, "433");
}

#[test]
fn test_missing_config_file_is_an_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    assert!(matches!(TomlConfig::load(&path), Err(Error::Io(_))));
}

#[test]
fn test_malformed_config_file_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "root_folder = [not toml").unwrap();

    assert!(matches!(TomlConfig::load(&path), Err(Error::Config(_))));
}

#[test]
fn test_database_lives_in_root_folder() {
    let temp_dir = TempDir::new().unwrap();
    assert_eq!(database_path(temp_dir.path()), temp_dir.path().join("epes.db"));
}
