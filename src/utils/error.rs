use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker protocol error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Alerter error: {alerter_type}: {message}")]
    Alert { alerter_type: String, message: String },

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Human verification required: {url}")]
    HumanVerification { url: String },
}

impl AppError {
    pub fn alert(alerter_type: &str, message: impl std::fmt::Display) -> Self {
        AppError::Alert {
            alerter_type: alerter_type.to_string(),
            message: message.to_string(),
        }
    }

    /// True only for the error that must stop the whole process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::HumanVerification { .. })
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
