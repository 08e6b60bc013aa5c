use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExternalError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("LLM API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ExternalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExternalError::ConnectionError(format!("request timed out: {}", err))
        } else if err.is_decode() {
            ExternalError::MalformedResponse(err.to_string())
        } else {
            ExternalError::ConnectionError(err.to_string())
        }
    }
}
