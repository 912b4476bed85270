use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Network Error: {0}")]
    Network(String),

    #[error("HTTP Error: unexpected status {0}")]
    HttpStatus(u16),

    #[error("Decode Error: {0}")]
    Decode(String),

    #[error("System Error: {0}")]
    System(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Clipboard Error: {0}")]
    Clipboard(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl AppError {
    /// Transport failures, non-2xx statuses and undecodable bodies.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            AppError::Network(_) | AppError::HttpStatus(_) | AppError::Decode(_)
        )
    }
}

// Implement conversion from standard errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_failures_are_classified() {
        assert!(AppError::Network("refused".into()).is_network_failure());
        assert!(AppError::HttpStatus(503).is_network_failure());
        assert!(AppError::Decode("eof".into()).is_network_failure());
        assert!(!AppError::Clipboard("busy".into()).is_network_failure());
        assert!(!AppError::Validation("bad pair".into()).is_network_failure());
    }
}
