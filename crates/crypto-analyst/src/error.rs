//! Error Types for Crypto Analyst

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalystError>;

#[derive(Error, Debug)]
pub enum AnalystError {
    /// Upstream unreachable or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status
    #[error("Provider error: {0}")]
    Provider(String),

    /// Input rejected before any request was issued
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No data found for the requested token
    #[error("No market data for {0}")]
    NoData(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalystError {
    /// Short label used in advisories and logs
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Provider(_) | Self::NoData(_) => "provider",
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Text safe to show to the end user
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => format!("Please check your message: {msg}."),
            Self::NoData(token) => format!("No market data is available for {}.", token.to_uppercase()),
            Self::Network(_) => "The market data service is currently unreachable.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<AgentError> for AnalystError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::ProviderUnavailable(msg) => Self::Network(msg),
            AgentError::Config(msg) => Self::Configuration(msg),
            AgentError::Json(e) => Self::Serialization(e),
            other => Self::Provider(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for AnalystError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::Network(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Provider(format!("HTTP {status}"))
        } else {
            Self::Provider(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_mapping() {
        let err: AnalystError = AgentError::ProviderUnavailable("timeout".into()).into();
        assert!(matches!(err, AnalystError::Network(_)));

        let err: AnalystError = AgentError::Config("no key".into()).into();
        assert_eq!(err.kind(), "configuration");

        let err: AnalystError = AgentError::RateLimited("429".into()).into();
        assert_eq!(err.kind(), "provider");
    }

    #[test]
    fn test_user_message() {
        let err = AnalystError::Validation("message is empty".into());
        assert_eq!(err.user_message(), "Please check your message: message is empty.");

        let err = AnalystError::Provider("HTTP 500 from https://internal".into());
        assert!(!err.user_message().contains("internal"));
    }
}
