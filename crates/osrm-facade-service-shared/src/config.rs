//! Process configuration read once from the environment at startup.
//!
//! # Environment Variables
//!
//! - `OSRM_BASE`: routing engine base URL (default: public demo server)
//! - `OSRM_TIMEOUT`: upstream timeout in seconds, fractional allowed (default: `15`)
//! - `OSRM_PROFILE`: routing profile path segment (default: `driving`)
//! - `OSRM_ALTERNATIVES`: request alternatives and keep the shortest (default: `false`)
//! - `CORS_ENABLED`: install the CORS layer (default: `true`)
//! - `CORS_ORIGINS`: `*` or a comma-separated list of origins (default: `*`)
//! - `SERVICE_PORT` / `PORT`: listen port, `SERVICE_PORT` wins (default: `5000`)

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use osrm_facade_lib::osrm::{DEFAULT_BASE_URL, DEFAULT_PROFILE, DEFAULT_TIMEOUT};
use osrm_facade_lib::{OsrmConfig, RouteSelection};

/// Port used when neither `SERVICE_PORT` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 5000;

/// Preflight cache lifetime advertised to browsers.
const CORS_MAX_AGE: Duration = Duration::from_secs(600);

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("{var} must be a boolean (true/false/1/0/yes/no/on/off), got '{value}'")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var} must be a TCP port, got '{value}'")]
    InvalidPort { var: &'static str, value: String },

    #[error("CORS_ORIGINS contains an invalid origin '{value}'")]
    InvalidOrigin { value: String },
}

/// Which origins may call the service from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

/// Cross-origin settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: AllowedOrigins,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: AllowedOrigins::Any,
        }
    }
}

impl CorsConfig {
    /// Build the tower-http layer, or `None` when CORS is disabled.
    ///
    /// Preflight requests are answered by the layer itself.
    pub fn layer(&self) -> Option<CorsLayer> {
        if !self.enabled {
            return None;
        }

        let allow_origin = match &self.origins {
            AllowedOrigins::Any => AllowOrigin::from(Any),
            AllowedOrigins::List(origins) => AllowOrigin::list(
                origins
                    .iter()
                    .filter_map(|o| HeaderValue::from_str(o).ok())
                    .collect::<Vec<_>>(),
            ),
        };

        Some(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([axum::http::header::CONTENT_TYPE])
                .max_age(CORS_MAX_AGE),
        )
    }
}

/// Everything the route service needs, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub port: u16,
    pub osrm: OsrmConfig,
    pub cors: CorsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            osrm: OsrmConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = get("OSRM_BASE").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let profile = get("OSRM_PROFILE").unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let timeout = match get("OSRM_TIMEOUT") {
            Some(raw) => parse_timeout("OSRM_TIMEOUT", &raw)?,
            None => DEFAULT_TIMEOUT,
        };

        let alternatives = match get("OSRM_ALTERNATIVES") {
            Some(raw) => parse_bool("OSRM_ALTERNATIVES", &raw)?,
            None => false,
        };

        let cors_enabled = match get("CORS_ENABLED") {
            Some(raw) => parse_bool("CORS_ENABLED", &raw)?,
            None => true,
        };

        let origins = match get("CORS_ORIGINS") {
            Some(raw) => parse_origins(&raw)?,
            None => AllowedOrigins::Any,
        };

        let port = match (get("SERVICE_PORT"), get("PORT")) {
            (Some(raw), _) => parse_port("SERVICE_PORT", &raw)?,
            (None, Some(raw)) => parse_port("PORT", &raw)?,
            (None, None) => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            osrm: OsrmConfig {
                base_url,
                profile,
                timeout,
                selection: RouteSelection::from_alternatives(alternatives),
            },
            cors: CorsConfig {
                enabled: cors_enabled,
                origins,
            },
        })
    }
}

fn parse_timeout(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ConfigError::InvalidTimeout {
            var,
            value: raw.to_string(),
        })
}

/// Parse the boolean spellings accepted for switches.
pub(crate) fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: raw.to_string(),
        }),
    }
}

fn parse_port(var: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort {
        var,
        value: raw.to_string(),
    })
}

fn parse_origins(raw: &str) -> Result<AllowedOrigins, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Ok(AllowedOrigins::Any);
    }

    for origin in &origins {
        if HeaderValue::from_str(origin).is_err() || !origin.contains("://") {
            return Err(ConfigError::InvalidOrigin {
                value: origin.clone(),
            });
        }
    }

    Ok(AllowedOrigins::List(origins))
}
