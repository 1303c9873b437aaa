//! Runtime configuration read from `VETTED_*` environment variables.
//!
//! | Variable                    | Default                      |
//! |-----------------------------|------------------------------|
//! | `VETTED_ADDR`               | `127.0.0.1:3000`             |
//! | `VETTED_VALIDATE_RESPONSES` | on in debug, off in release  |
//! | `VETTED_DOCS_PATH`          | `/openapi.json`              |
//! | `VETTED_LOG_FORMAT`         | `pretty` (or `json`)         |
//! | `VETTED_LOG_LEVEL`          | `info`, `RUST_LOG` overrides |
//!
//! Values that do not parse fall back to their default.

use std::{env, net::SocketAddr};

const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub validate_responses: bool,
    pub docs_path: String,
    pub log_format: LogFormat,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(DEFAULT_ADDR),
            validate_responses: cfg!(debug_assertions),
            docs_path: "/openapi.json".into(),
            log_format: LogFormat::Pretty,
            log_level: "info".into(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, `from_env` uses the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let addr = lookup("VETTED_ADDR")
            .and_then(|addr| addr.trim().parse().ok())
            .unwrap_or(defaults.addr);

        let validate_responses = lookup("VETTED_VALIDATE_RESPONSES")
            .and_then(|flag| parse_flag(&flag))
            .unwrap_or(defaults.validate_responses);

        let docs_path = lookup("VETTED_DOCS_PATH")
            .filter(|path| path.starts_with('/'))
            .unwrap_or(defaults.docs_path);

        let log_format = match lookup("VETTED_LOG_FORMAT")
            .map(|format| format.to_lowercase())
            .as_deref()
        {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let log_level = lookup("VETTED_LOG_LEVEL")
            .filter(|level| !level.trim().is_empty())
            .unwrap_or(defaults.log_level);

        Self {
            addr,
            validate_responses,
            docs_path,
            log_format,
            log_level,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
