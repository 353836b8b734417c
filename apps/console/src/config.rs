use std::{fs, io, path::Path, time::Duration};

use client_core::{lists::ROSTER_PAGE_SIZE, ConsoleOptions, InFlightPolicy, ResponseOrdering};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "console.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read { path: String, source: io::Error },
    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub server_url: String,
    pub session_token: String,
    pub page_size: u32,
    pub ordering: ResponseOrdering,
    pub in_flight: InFlightPolicy,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            session_token: String::new(),
            page_size: ROSTER_PAGE_SIZE,
            ordering: ResponseOrdering::default(),
            in_flight: InFlightPolicy::default(),
            request_timeout_secs: None,
        }
    }
}

impl ConsoleSettings {
    pub fn options(&self) -> ConsoleOptions {
        ConsoleOptions {
            ordering: self.ordering,
            in_flight: self.in_flight,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Command-line flags win over every other layer.
    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<(), ConfigError> {
        if let Some(v) = &overrides.server_url {
            self.server_url = v.clone();
        }
        if let Some(v) = &overrides.session_token {
            self.session_token = v.clone();
        }
        if let Some(v) = &overrides.ordering {
            self.ordering = parse_value("ordering", v)?;
        }
        if let Some(v) = &overrides.in_flight {
            self.in_flight = parse_value("in_flight", v)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub session_token: Option<String>,
    pub ordering: Option<String>,
    pub in_flight: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    session_token: Option<String>,
    page_size: Option<u32>,
    ordering: Option<String>,
    in_flight: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the config file, then the environment. An explicitly named
/// config file must exist; the default one is optional.
pub fn load_settings(config_path: Option<&Path>) -> Result<ConsoleSettings, ConfigError> {
    let mut settings = ConsoleSettings::default();

    let (path, required) = match config_path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_PATH), false),
    };
    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw, path)?,
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut ConsoleSettings, raw: &str, path: &Path) -> Result<(), ConfigError> {
    let file_cfg: FileSettings = toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.session_token {
        settings.session_token = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.ordering {
        settings.ordering = parse_value("ordering", &v)?;
    }
    if let Some(v) = file_cfg.in_flight {
        settings.in_flight = parse_value("in_flight", &v)?;
    }
    if file_cfg.request_timeout_secs.is_some() {
        settings.request_timeout_secs = file_cfg.request_timeout_secs;
    }
    Ok(())
}

fn apply_env(
    settings: &mut ConsoleSettings,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(v) = var("CONSOLE_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("CONSOLE_SESSION_TOKEN") {
        settings.session_token = v;
    }

    if let Some(v) = var("APP__PAGE_SIZE") {
        settings.page_size = parse_value("APP__PAGE_SIZE", &v)?;
    }
    if let Some(v) = var("APP__ORDERING") {
        settings.ordering = parse_value("APP__ORDERING", &v)?;
    }
    if let Some(v) = var("APP__IN_FLIGHT") {
        settings.in_flight = parse_value("APP__IN_FLIGHT", &v)?;
    }
    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = Some(parse_value("APP__REQUEST_TIMEOUT_SECS", &v)?);
    }
    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
