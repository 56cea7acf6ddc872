//! Startup configuration from the environment

use crate::llm::{GenerationConfig, ModelSettings, API_KEY_VAR, DEFAULT_MODEL};
use std::time::Duration;
use thiserror::Error;

const PORT_VAR: &str = "SUNRISE_PORT";
const MODEL_VAR: &str = "SUNRISE_MODEL";
const GATEWAY_VAR: &str = "LLM_GATEWAY";
const TIMEOUT_VAR: &str = "SUNRISE_REQUEST_TIMEOUT_SECS";
const VERIFY_VAR: &str = "SUNRISE_VERIFY_CREDENTIAL";
const GRACE_VAR: &str = "SUNRISE_SESSION_GRACE_SECS";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_GRACE_SECS: u64 = 120;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Process-wide configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// How long a session survives with no page attached
    pub session_grace: Duration,
    pub model: ModelSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup. Unset and empty values fall
    /// back to defaults, except the credential, whose emptiness is reported
    /// by model client initialisation.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match get(PORT_VAR) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: PORT_VAR,
                value,
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = positive_secs(get(TIMEOUT_VAR), TIMEOUT_VAR, DEFAULT_TIMEOUT_SECS)?;
        let grace_secs = positive_secs(get(GRACE_VAR), GRACE_VAR, DEFAULT_GRACE_SECS)?;

        let verify_credential = match get(VERIFY_VAR) {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue {
                var: VERIFY_VAR,
                value,
                reason: "expected true/false",
            })?,
            None => false,
        };

        Ok(Self {
            port,
            session_grace: Duration::from_secs(grace_secs),
            model: ModelSettings {
                api_key: lookup(API_KEY_VAR),
                model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                gateway: get(GATEWAY_VAR),
                request_timeout: Duration::from_secs(timeout_secs),
                verify_credential,
                generation: GenerationConfig::default(),
            },
        })
    }
}

fn positive_secs(
    value: Option<String>,
    var: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "expected a positive number of seconds",
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
