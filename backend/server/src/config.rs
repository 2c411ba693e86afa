use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_DATABASE_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    Invalid { key: String, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub db_name: String,
    pub allowed_origins: Vec<String>,
    pub event_capacity: usize,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("RUST_PORT", "5000")?,
            database_url: load_secret("DATABASE_URL", DEFAULT_DATABASE_URL),
            db_name: try_load("DB_NAME", "bizpulse")?,
            allowed_origins: parse_origins(&try_load::<String>("ALLOWED_ORIGINS", DEFAULT_ORIGINS)?),
            event_capacity: try_load("EVENT_CHANNEL_CAPACITY", "256")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse_value(key, &raw)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key: key.to_string(),
            message: e.to_string(),
        }
    })
}

/// Environment first, then a Docker secret of the same name, then the default.
fn load_secret(secret_name: &str, default: &str) -> String {
    if let Some(value) = var(secret_name) {
        return value;
    }

    let path = format!("/run/secrets/{secret_name}");
    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| {
            info!("{secret_name} not set, using default");
            default.to_string()
        })
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" http://localhost:3000 ,,http://127.0.0.1:3000"),
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u16>("RUST_PORT", " 8080 ").unwrap(), 8080);

        let error = parse_value::<u16>("RUST_PORT", "eighty").unwrap_err();
        assert!(error.to_string().starts_with("Invalid RUST_PORT value"));
    }

    #[test]
    fn test_default_used_when_unset() {
        let port: u16 = try_load("PULSE_TEST_UNSET_PORT", "5000").unwrap();

        assert_eq!(port, 5000);
    }
}
