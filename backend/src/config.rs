use std::net::SocketAddr;
use std::path::PathBuf;

use shared::ClientConfig;
use thiserror::Error;

pub const REMOTE_URL: &str = "TEAMBOARD_REMOTE_URL";
pub const REMOTE_ANON_KEY: &str = "TEAMBOARD_REMOTE_ANON_KEY";
pub const BIND: &str = "TEAMBOARD_BIND";
pub const DIST: &str = "TEAMBOARD_DIST";

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_DIST: &str = "frontend/dist";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not a valid socket address: {value}")]
    InvalidBind { name: &'static str, value: String },
}

/// Everything the host needs to serve the app.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub client: ClientConfig,
    pub bind: SocketAddr,
    pub dist: PathBuf,
}

impl HostConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let remote_url = required(REMOTE_URL)?;
        let anon_key = required(REMOTE_ANON_KEY)?;

        let bind = lookup(BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind { name: BIND, value: bind.clone() })?;

        let dist = lookup(DIST)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DIST));

        Ok(HostConfig {
            client: ClientConfig {
                remote_url: remote_url.trim_end_matches('/').to_string(),
                anon_key,
            },
            bind,
            dist,
        })
    }
}
