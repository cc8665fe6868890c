//! Error types for the csscade merge engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("No CSS loaded: call load_css() before processing elements")]
    NoCssLoaded,

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
}

pub type Result<T> = std::result::Result<T, CascadeError>;

impl CascadeError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Errors that reject the whole input rather than a single declaration
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::MalformedInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CascadeError::parse(3, "expected ':' after property name");
        assert_eq!(
            err.to_string(),
            "Parse error at line 3: expected ':' after property name"
        );

        let err = CascadeError::malformed("override payload must be a mapping");
        assert!(err.to_string().contains("must be a mapping"));
        assert!(err.is_input_error());

        assert!(!CascadeError::NoCssLoaded.is_input_error());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CascadeError = io.into();
        assert!(matches!(err, CascadeError::Io(_)));
    }
}
