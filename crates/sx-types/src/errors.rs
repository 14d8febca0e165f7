use thiserror::Error;

/// Main error type for the SteelX optimization core
#[derive(Error, Debug)]
pub enum SxError {
    #[error("Invalid range for {parameter}: {message}")]
    InvalidRange { parameter: String, message: String },

    #[error("Unknown optimization method: {0} (expected grid, genetic or bayesian)")]
    UnknownMethod(String),

    #[error("Grid too large: {message}")]
    GridTooLarge { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for SteelX operations
pub type SxResult<T> = Result<T, SxError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::SxError::Validation(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::SxError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SxError::InvalidRange {
            parameter: "temperature".to_string(),
            message: "min 1600 must be below max 1400".to_string(),
        };

        assert!(error.to_string().contains("temperature"));
        assert!(error.to_string().contains("1600"));
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let sx_error: SxError = json_err.into();

        match sx_error {
            SxError::Serialization(_) => (),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_macros() {
        let validation_err = validation_error!("Invalid value: {}", 42);
        assert!(matches!(validation_err, SxError::Validation(ref m) if m == "Invalid value: 42"));

        let config_err = config_error!("population_size must be positive, got {}", 0);
        assert!(config_err.to_string().starts_with("Configuration error"));
    }
}
