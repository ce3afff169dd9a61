use thiserror::Error;

/// Remote error codes Deribit documents as transient (rate limits, matching
/// engine busy, temporarily unavailable).
const RETRYABLE_API_CODES: [i64; 9] = [
    10028, 10040, 10041, 10047, 10066, 11051, 11094, 13028, 13888,
];

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API error: {code} - {message}")]
    ApiError { code: i64, message: String },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Authentication is required")]
    AuthenticationRequired,

    #[error("Not connected")]
    NotConnected,

    #[error("Connection lost while the request was in flight")]
    ConnectionLost,

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Request {method} timed out after {timeout_ms}ms")]
    RequestTimeout { method: String, timeout_ms: u64 },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("Other error: {0}")]
    Other(String),
}

impl ExchangeError {
    /// Whether the failure is transient and the same request may succeed later
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError(_)
            | Self::ConnectionTimeout(_)
            | Self::RequestTimeout { .. }
            | Self::NotConnected
            | Self::ConnectionLost => true,
            Self::ApiError { code, .. } => RETRYABLE_API_CODES.contains(code),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_carries_remote_message() {
        let err = ExchangeError::ApiError {
            code: 10009,
            message: "not_enough_funds".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("10009"));
        assert!(text.contains("not_enough_funds"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ExchangeError::ConnectionLost.is_retryable());
        assert!(ExchangeError::ApiError {
            code: 10028,
            message: "too_many_requests".to_string()
        }
        .is_retryable());
        assert!(!ExchangeError::ApiError {
            code: 10009,
            message: "not_enough_funds".to_string()
        }
        .is_retryable());
        assert!(!ExchangeError::AuthenticationRequired.is_retryable());
    }
}
