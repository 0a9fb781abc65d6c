use super::data::Config;
use super::io::ConfigError;
use crate::core::constants::{
    API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MODEL,
    DEFAULT_SYSTEM_MESSAGE,
};
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let config = Config {
        default_model: Some("sonar-pro".to_string()),
        temperature: Some(0.3),
        tool_servers: vec!["http://localhost:8000".to_string()],
        ..Default::default()
    };
    config.save_to_path(&config_path).expect("Failed to save");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load");
    assert_eq!(loaded, config);

    Config::mutate_at::<_, _, ConfigError>(&config_path, |config| {
        config.default_model = None;
        config.max_tokens = Some(250);
        Ok(())
    })
    .expect("Failed to mutate");

    let reloaded = Config::load_from_path(&config_path).expect("Failed to reload");
    assert_eq!(reloaded.default_model, None);
    assert_eq!(reloaded.max_tokens, Some(250));
    assert_eq!(reloaded.temperature, Some(0.3));
}

#[test]
fn test_invalid_toml_reports_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "temperature = [").expect("Failed to write");

    let err = Config::load_from_path(&config_path).unwrap_err();

    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn test_failed_mutation_does_not_write() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");

    let result = Config::mutate_at(&config_path, |_config| -> Result<(), ConfigError> {
        Err(ConfigError::NoConfigDir)
    });

    assert!(result.is_err());
    assert!(!config_path.exists());
}

#[test]
fn test_environment_overrides_file_values() {
    let mut config = Config {
        api_key: Some("from-file".to_string()),
        base_url: Some("https://file.example".to_string()),
        ..Default::default()
    };

    config.apply_env(env(&[
        (API_KEY_ENV, " from-env "),
        (BASE_URL_ENV, "https://env.example/"),
    ]));

    assert_eq!(config.api_key(), Some("from-env"));
    assert_eq!(config.base_url(), "https://env.example");
}

#[test]
fn test_blank_environment_values_are_ignored() {
    let mut config = Config {
        api_key: Some("from-file".to_string()),
        ..Default::default()
    };

    config.apply_env(env(&[(API_KEY_ENV, "  "), (BASE_URL_ENV, "")]));

    assert_eq!(config.api_key(), Some("from-file"));
    assert_eq!(config.base_url(), DEFAULT_BASE_URL);
}

#[test]
fn test_defaults_fill_missing_settings() {
    let config = Config::default();
    let settings = config.generation_settings();

    assert_eq!(settings.model, DEFAULT_MODEL);
    assert_eq!(settings.system_message, DEFAULT_SYSTEM_MESSAGE);
    assert_eq!(config.timeouts().connect, DEFAULT_CONNECT_TIMEOUT);
    assert_eq!(config.api_key(), None);

    let tuned = Config {
        read_timeout_secs: Some(5),
        ..Default::default()
    };
    assert_eq!(tuned.timeouts().read, Duration::from_secs(5));
}

#[test]
fn test_tool_server_list_is_deduplicated() {
    let mut config = Config::default();

    assert!(config.add_tool_server("http://a:1"));
    assert!(!config.add_tool_server(" http://a:1 "));
    assert!(config.add_tool_server("http://b:2"));
    assert_eq!(config.tool_servers().len(), 2);

    assert!(config.remove_tool_server("http://a:1"));
    assert!(!config.remove_tool_server("http://a:1"));
    assert_eq!(config.tool_servers, vec!["http://b:2".to_string()]);
}
