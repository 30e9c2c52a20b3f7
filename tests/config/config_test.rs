//! Coverage for config parsing, defaults, and env-override precedence.

use std::io::Write;

use prospector::config::ProspectorConfig;

#[test]
fn defaults_when_no_file_and_no_env() {
    let config = ProspectorConfig::load_with(|key| {
        // Point at a path that does not exist so the real CWD is ignored.
        (key == "PROSPECTOR_CONFIG_PATH").then(|| "/nonexistent/prospector.toml".to_owned())
    })
    .expect("defaults should load");

    assert_eq!(config.llm.model, "gemini-2.5-flash");
    assert!(config.llm.api_key.is_empty());
    assert_eq!(config.search.result_target, 20);
    assert_eq!(config.search.min_hire_probability, None);
    assert!(config.mailbox.access_token.is_empty());
    assert_eq!(config.paths.database, "prospector.db");
}

#[test]
fn file_values_override_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"
[llm]
model = "gemini-2.5-pro"

[search]
result_target = 50
min_hire_probability = 80.0

[paths]
database = "/tmp/p.db"
"#
    )
    .expect("write config");
    let path = file.path().to_string_lossy().into_owned();

    let config = ProspectorConfig::load_with(move |key| {
        (key == "PROSPECTOR_CONFIG_PATH").then(|| path.clone())
    })
    .expect("file should load");

    assert_eq!(config.llm.model, "gemini-2.5-pro");
    assert_eq!(config.search.result_target, 50);
    assert_eq!(config.search.min_hire_probability, Some(80.0));
    assert_eq!(config.paths.database, "/tmp/p.db");
    // Untouched sections keep their defaults.
    assert_eq!(config.paths.logs_dir, "logs");
}

#[test]
fn env_overrides_beat_file_values() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"
[llm]
model = "gemini-2.5-pro"
api_key = "file-key"
"#
    )
    .expect("write config");
    let path = file.path().to_string_lossy().into_owned();

    let config = ProspectorConfig::load_with(move |key| match key {
        "PROSPECTOR_CONFIG_PATH" => Some(path.clone()),
        "PROSPECTOR_GEMINI_API_KEY" => Some("env-key".to_owned()),
        "PROSPECTOR_RESULT_TARGET" => Some("35".to_owned()),
        "PROSPECTOR_GMAIL_TOKEN" => Some("ya29.token".to_owned()),
        _ => None,
    })
    .expect("config should load");

    assert_eq!(config.llm.api_key, "env-key");
    assert_eq!(config.llm.model, "gemini-2.5-pro");
    assert_eq!(config.search.result_target, 35);
    assert_eq!(config.mailbox.access_token, "ya29.token");
}

#[test]
fn invalid_numeric_override_is_ignored() {
    let config = ProspectorConfig::load_with(|key| match key {
        "PROSPECTOR_CONFIG_PATH" => Some("/nonexistent/prospector.toml".to_owned()),
        "PROSPECTOR_RESULT_TARGET" => Some("lots".to_owned()),
        "PROSPECTOR_MIN_HIRE_PROBABILITY" => Some("high".to_owned()),
        _ => None,
    })
    .expect("config should load");

    assert_eq!(config.search.result_target, 20);
    assert_eq!(config.search.min_hire_probability, None);
}

#[test]
fn malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(file, "this is not toml [[[").expect("write config");
    let path = file.path().to_string_lossy().into_owned();

    let result = ProspectorConfig::load_with(move |key| {
        (key == "PROSPECTOR_CONFIG_PATH").then(|| path.clone())
    });
    assert!(result.is_err(), "malformed TOML must not silently default");
}
