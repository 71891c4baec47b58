//! Unit tests for configuration file loading and root folder resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate MORA_ROOT_FOLDER or MORA_CONFIG are marked with #[serial].

use mora_common::config::{
    default_root_folder, load_toml_file, load_toml_or_default, resolve_root_folder,
    CONFIG_PATH_ENV, ROOT_FOLDER_ENV,
};
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, PartialEq)]
struct SampleConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    port: Option<u16>,
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = resolve_root_folder(None, ROOT_FOLDER_ENV, None);

    assert!(!root_folder.as_os_str().is_empty());
    assert_eq!(root_folder, default_root_folder());
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/mora-env-folder");

    // CLI beats everything
    let cli = PathBuf::from("/tmp/mora-cli-folder");
    let toml = PathBuf::from("/tmp/mora-toml-folder");
    assert_eq!(
        resolve_root_folder(Some(&cli), ROOT_FOLDER_ENV, Some(&toml)),
        cli
    );

    // ENV beats TOML
    assert_eq!(
        resolve_root_folder(None, ROOT_FOLDER_ENV, Some(&toml)),
        PathBuf::from("/tmp/mora-env-folder")
    );

    // TOML beats default
    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(resolve_root_folder(None, ROOT_FOLDER_ENV, Some(&toml)), toml);
}

#[test]
fn test_load_toml_file_parses() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "name = \"mora\"\nport = 8000").expect("write toml");

    let config: SampleConfig = load_toml_file(file.path()).expect("valid toml");
    assert_eq!(config.name.as_deref(), Some("mora"));
    assert_eq!(config.port, Some(8000));
}

#[test]
fn test_load_toml_file_reports_parse_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "port = \"not a number\"").expect("write toml");

    let result: mora_common::Result<SampleConfig> = load_toml_file(file.path());
    assert!(matches!(result, Err(mora_common::Error::Config(_))));
}

#[test]
#[serial]
fn test_missing_explicit_config_is_an_error() {
    env::remove_var(CONFIG_PATH_ENV);
    let result: mora_common::Result<SampleConfig> =
        load_toml_or_default(Some(Path::new("/nonexistent/mora-test.toml")), "mora-test");
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_config_path_from_env() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "name = \"from-env\"").expect("write toml");
    env::set_var(CONFIG_PATH_ENV, file.path());

    let config: SampleConfig =
        load_toml_or_default(None, "mora-test-module").expect("config loads");
    assert_eq!(config.name.as_deref(), Some("from-env"));

    env::remove_var(CONFIG_PATH_ENV);
}
