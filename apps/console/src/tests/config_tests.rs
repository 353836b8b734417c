use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("tunnel_console_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("console.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_match_roster_navigation() {
    let settings = ConsoleSettings::default();
    assert_eq!(settings.page_size, 25);
    assert_eq!(settings.ordering, ResponseOrdering::LatestIssued);
    assert_eq!(settings.in_flight, InFlightPolicy::Allow);
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        r#"
server_url = "https://console.example.net"
page_size = 50
ordering = "last-completed"
request_timeout_secs = 15
"#,
    );

    let mut settings = ConsoleSettings::default();
    let raw = fs::read_to_string(&path).expect("read back");
    apply_file(&mut settings, &raw, &path).expect("valid file");

    assert_eq!(settings.server_url, "https://console.example.net");
    assert_eq!(settings.page_size, 50);
    assert_eq!(settings.ordering, ResponseOrdering::LastCompleted);
    assert_eq!(settings.request_timeout(), Some(Duration::from_secs(15)));
    assert_eq!(settings.in_flight, InFlightPolicy::Allow);

    if let Some(parent) = path.parent() {
        fs::remove_dir_all(parent).expect("cleanup");
    }
}

#[test]
fn explicit_missing_file_is_an_error() {
    let err = load_settings(Some(Path::new("/nonexistent/tunnel-console/console.toml")))
        .expect_err("missing file");
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn malformed_file_is_reported() {
    let path = temp_config("page_size = \"many\"");
    let err = load_settings(Some(path.as_path())).expect_err("bad type");
    assert!(matches!(err, ConfigError::Parse { .. }));

    if let Some(parent) = path.parent() {
        fs::remove_dir_all(parent).expect("cleanup");
    }
}

#[test]
fn app_prefixed_env_wins_over_plain_name() {
    let mut settings = ConsoleSettings::default();
    apply_env(
        &mut settings,
        vars(&[
            ("CONSOLE_SERVER_URL", "http://plain:8080"),
            ("APP__SERVER_URL", "http://prefixed:8080"),
            ("CONSOLE_SESSION_TOKEN", "tok-env"),
            ("APP__IN_FLIGHT", "reject"),
        ]),
    )
    .expect("valid env");

    assert_eq!(settings.server_url, "http://prefixed:8080");
    assert_eq!(settings.session_token, "tok-env");
    assert_eq!(settings.in_flight, InFlightPolicy::Reject);
}

#[test]
fn invalid_env_value_names_the_variable() {
    let mut settings = ConsoleSettings::default();
    let err = apply_env(&mut settings, vars(&[("APP__ORDERING", "whenever")]))
        .expect_err("unknown ordering");
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            key: "APP__ORDERING",
            ..
        }
    ));
}

#[test]
fn overrides_apply_last() {
    let mut settings = ConsoleSettings::default();
    settings
        .apply_overrides(&Overrides {
            server_url: Some("http://flag:9000".into()),
            session_token: None,
            ordering: Some("last-completed".into()),
            in_flight: None,
        })
        .expect("valid overrides");

    assert_eq!(settings.server_url, "http://flag:9000");
    assert_eq!(settings.options().ordering, ResponseOrdering::LastCompleted);
    assert!(settings.session_token.is_empty());
}
