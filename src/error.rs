use reqwest::StatusCode;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum AppError {
    /// Connection or timeout class failure. The only retry-eligible kind.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },

    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: SerdeJsonError,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio join error: {0}")]
    Join(#[from] JoinError),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl AppError {
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() {
            return AppError::Transport(e.to_string());
        }
        match e.status() {
            Some(status) => AppError::Status {
                status,
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
                body: String::new(),
            },
            None => AppError::Generic(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_transient() {
        assert!(AppError::Transport("connection reset".into()).is_transient());
        assert!(!AppError::Status {
            status: StatusCode::BAD_REQUEST,
            url: "/api/stacks".into(),
            body: "bad".into(),
        }
        .is_transient());
        assert!(!AppError::Generic("x".into()).is_transient());
    }
}
