//! # Application Configuration
//!
//! Environment-driven configuration with defaults. CLI flags may override
//! individual fields after loading.

use chrono::FixedOffset;

use crate::errors::{AppError, AppResult};

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to (default: "0.0.0.0")
    pub host: String,

    /// Port to bind to (default: 8000)
    pub port: u16,

    /// Fixed UTC offset used to interpret submitted local deadlines and to
    /// render them back (default: UTC)
    pub timezone_offset: FixedOffset,

    /// Whether an external auth provider is configured. Controls the
    /// fully-open edit mode for public orders.
    pub external_auth_enabled: bool,

    /// Public base URL used when generating admin and join links
    pub base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            timezone_offset: utc_offset(),
            external_auth_enabled: false,
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

fn utc_offset() -> FixedOffset {
    // 0 is always a valid offset
    FixedOffset::east_opt(0).unwrap_or_else(|| unreachable!())
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognised variables: `HOST`, `PORT`, `TIMEZONE_OFFSET` (e.g.
    /// `+02:00`), `EXTERNAL_AUTH` (`true`/`1`), `BASE_URL`.
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.host = host;
        }
        if let Ok(raw) = std::env::var("PORT") {
            config.port = raw
                .parse()
                .map_err(|_| AppError::InvalidInput(format!("invalid PORT: {}", raw)))?;
        }
        if let Ok(raw) = std::env::var("TIMEZONE_OFFSET") {
            config.timezone_offset = parse_offset(&raw)?;
        }
        if let Ok(raw) = std::env::var("EXTERNAL_AUTH") {
            config.external_auth_enabled = matches!(raw.as_str(), "1" | "true" | "yes");
        }
        if let Ok(url) = std::env::var("BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        Ok(config)
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a `+HH:MM` / `-HH:MM` (or `Z`) offset string
pub fn parse_offset(raw: &str) -> AppResult<FixedOffset> {
    if raw == "Z" {
        return Ok(utc_offset());
    }

    let invalid = || AppError::InvalidInput(format!("invalid timezone offset: {}", raw));

    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };

    let mut parts = rest.splitn(2, ':');
    let hours: i32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(invalid)?;
    let minutes: i32 = match parts.next() {
        Some(m) => m.parse().map_err(|_| invalid())?,
        None => 0,
    };

    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
