use shared::ClientConfig;
use url::Url;

use crate::error::ConfigError;
use crate::remote::http::{self, HttpRequest};

/// Where the host publishes the connection values.
pub const CONFIG_PATH: &str = "/api/config";

/// Validated connection values for the remote data service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    base: Url,
    anon_key: String,
}

impl Config {
    pub fn new(remote_url: &str, anon_key: &str) -> Result<Self, ConfigError> {
        let remote_url = remote_url.trim().trim_end_matches('/');
        if remote_url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        let base = Url::parse(remote_url).map_err(|_| ConfigError::InvalidUrl(remote_url.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(remote_url.to_string()));
        }

        let anon_key = anon_key.trim();
        if anon_key.is_empty() {
            return Err(ConfigError::MissingKey);
        }

        Ok(Self {
            base,
            anon_key: anon_key.to_string(),
        })
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// `path` appended below the project url, e.g. `rest/v1/tasks`.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", prefix, path.trim_start_matches('/')));
        url
    }

    pub fn rest_url(&self, table: &str) -> Url {
        self.endpoint(&format!("rest/v1/{}", table))
    }

    pub fn auth_url(&self, path: &str) -> Url {
        self.endpoint(&format!("auth/v1/{}", path))
    }

    pub fn realtime_url(&self) -> Url {
        let mut url = self.endpoint("realtime/v1/websocket");
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // http and ws are both special schemes, so the swap cannot be refused.
        let _ = url.set_scheme(scheme);
        url.query_pairs_mut()
            .append_pair("apikey", &self.anon_key)
            .append_pair("vsn", "1.0.0");
        url
    }
}

impl TryFrom<ClientConfig> for Config {
    type Error = ConfigError;

    fn try_from(config: ClientConfig) -> Result<Self, Self::Error> {
        Config::new(&config.remote_url, &config.anon_key)
    }
}

/// Fetches the connection values from the host that served the app.
pub async fn load() -> Result<Config, ConfigError> {
    let body = http::send(HttpRequest::get(CONFIG_PATH)).await?;
    let config: ClientConfig = serde_json::from_str(&body)?;
    Config::try_from(config)
}
