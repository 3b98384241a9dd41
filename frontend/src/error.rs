use thiserror::Error;

/// Failure of a call to the remote data service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx response. `message` is the service's own explanation when it sent one.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
    #[error("browser storage unavailable: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for RemoteError {
    fn from(error: serde_json::Error) -> Self {
        RemoteError::Decode(error.to_string())
    }
}

impl RemoteError {
    /// Text suitable for an alert shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            RemoteError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the service refused the request itself, as opposed to the call
    /// never getting an answer.
    pub fn is_rejection(&self) -> bool {
        matches!(self, RemoteError::Status { status, .. } if (400..500).contains(status))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("remote url is missing")]
    MissingUrl,
    #[error("remote url {0:?} is not a valid http(s) url")]
    InvalidUrl(String),
    #[error("anon key is missing")]
    MissingKey,
    #[error("could not load config from host: {0}")]
    Unavailable(#[from] RemoteError),
    #[error("config from host is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Pulls the human-readable message out of an auth or row service error body.
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}
