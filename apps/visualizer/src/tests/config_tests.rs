use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

fn temp_settings_file(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("visualizer_config_test_{suffix}.toml"));
    fs::write(&path, contents).expect("write settings file");
    path
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(Path::new("/nonexistent/visualizer.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert_eq!(
        settings.api_base_url,
        "http://localhost:8000/embedding-visualizer/api"
    );
    assert_eq!(settings.edit_debounce(), Duration::from_millis(100));
    assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    assert_eq!(settings.api_token, None);
}

#[test]
fn file_values_override_defaults() {
    let path = temp_settings_file(
        r#"
api_base_url = "https://embeddings.example.com"
api_token = "from-file"
debounce_ms = "250"
log_filter = "debug"
"#,
    );
    let settings = load_settings_from(&path, no_env);
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.api_base_url, "https://embeddings.example.com");
    assert_eq!(settings.api_token.as_deref(), Some("from-file"));
    assert_eq!(settings.debounce_ms, 250);
    assert_eq!(settings.request_timeout_secs, 30);
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn unparseable_file_is_ignored() {
    let path = temp_settings_file("api_base_url = [1, 2");
    let settings = load_settings_from(&path, no_env);
    fs::remove_file(&path).expect("cleanup");
    assert_eq!(settings, Settings::default());
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let path = temp_settings_file(
        r#"
api_base_url = "https://from-file.example.com"
request_timeout_secs = "5"
"#,
    );
    let settings = load_settings_from(
        &path,
        env_from(&[
            ("VISUALIZER_API_URL", "http://short.example.com"),
            ("APP__API_BASE_URL", "http://prefixed.example.com"),
            ("VISUALIZER_API_TOKEN", "env-token"),
            ("APP__REQUEST_TIMEOUT_SECS", "12"),
        ]),
    );
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.api_base_url, "http://prefixed.example.com");
    assert_eq!(settings.api_token.as_deref(), Some("env-token"));
    assert_eq!(settings.request_timeout_secs, 12);
}

#[test]
fn bad_numbers_and_blank_tokens_keep_previous_values() {
    let settings = load_settings_from(
        Path::new("/nonexistent/visualizer.toml"),
        env_from(&[
            ("APP__DEBOUNCE_MS", "soon"),
            ("APP__API_TOKEN", "   "),
            ("APP__LOG_FILTER", "client_core=debug"),
        ]),
    );
    assert_eq!(settings.debounce_ms, 100);
    assert_eq!(settings.api_token, None);
    assert_eq!(settings.log_filter, "client_core=debug");
}
