//! Error types for the Vigil engine

use thiserror::Error;

/// Result type alias using Vigil Error
pub type Result<T> = std::result::Result<T, Error>;

/// Vigil error types
#[derive(Error, Debug)]
pub enum Error {
    // === Catalog Errors ===
    #[error("Duplicate check id in catalog: {check_id}")]
    DuplicateCheck { check_id: String },

    #[error("Invalid check definition: {check_id} - {message}")]
    InvalidCheckDefinition { check_id: String, message: String },

    // === Probe Configuration Errors ===
    #[error(transparent)]
    Probe(#[from] ConfigError),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },
}

impl Error {
    /// Check if this error is fatal (should stop the run rather than a single probe)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::DuplicateCheck { .. }
                | Error::InvalidCheckDefinition { .. }
                | Error::Configuration(_)
                | Error::InvalidConfig { .. }
        )
    }

    /// Get an error code for logging
    pub fn code(&self) -> &'static str {
        match self {
            Error::DuplicateCheck { .. } => "DUPLICATE_CHECK",
            Error::InvalidCheckDefinition { .. } => "INVALID_CHECK_DEF",
            Error::Probe(e) => e.code(),
            Error::Configuration(_) => "CONFIG_ERROR",
            Error::InvalidConfig { .. } => "INVALID_CONFIG",
        }
    }
}

/// A configuration problem in a single probe.
///
/// These never abort a run: the probe that carries one is treated as not
/// applicable and the error is reported alongside the check's result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown filter type: {filter_type}")]
    UnknownFilter { filter_type: String },

    #[error("Unknown parser: {parser}")]
    UnknownParser { parser: String },

    #[error("Malformed expression for filter {filter_type}: {expression:?} - {message}")]
    MalformedExpression {
        filter_type: String,
        expression: String,
        message: String,
    },

    #[error("Parser {parser} failed on artifact {artifact}: {message}")]
    ParserFailed {
        parser: String,
        artifact: String,
        message: String,
    },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::UnknownFilter { .. } => "UNKNOWN_FILTER",
            ConfigError::UnknownParser { .. } => "UNKNOWN_PARSER",
            ConfigError::MalformedExpression { .. } => "MALFORMED_EXPRESSION",
            ConfigError::ParserFailed { .. } => "PARSER_FAILED",
        }
    }

    /// Shorthand used by filter plugins when an expression cannot be compiled
    pub fn malformed(
        filter_type: impl Into<String>,
        expression: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ConfigError::MalformedExpression {
            filter_type: filter_type.into(),
            expression: expression.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_errors_are_not_fatal() {
        let err: Error = ConfigError::UnknownFilter {
            filter_type: "nope".into(),
        }
        .into();
        assert!(!err.is_fatal());
        assert_eq!(err.code(), "UNKNOWN_FILTER");
        assert_eq!(err.to_string(), "Unknown filter type: nope");
    }

    #[test]
    fn test_duplicate_check_is_fatal() {
        let err = Error::DuplicateCheck {
            check_id: "C1".into(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.code(), "DUPLICATE_CHECK");
    }

    #[test]
    fn test_configuration_errors_are_fatal() {
        let err = Error::InvalidConfig {
            key: "engine.worker_threads".into(),
            message: "must be at most 512".into(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.code(), "INVALID_CONFIG");
        assert!(Error::Configuration("bad toml".into()).is_fatal());

        let err = Error::InvalidCheckDefinition {
            check_id: "C1".into(),
            message: "no methods".into(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.code(), "INVALID_CHECK_DEF");
    }
}
