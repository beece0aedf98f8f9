//! Configuration management for the Vigil engine

use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use vigil_core::{Error, Result};
use vigil_engine::EngineOptions;

/// Upper bound on `engine.worker_threads`
const MAX_WORKER_THREADS: usize = 512;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Evaluation settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        debug!("Loading configuration from {:?}", path);
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Merge with environment variables (VIGIL_ prefix)
    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge overrides from any `VIGIL_*` variable lookup.
    ///
    /// Values that do not parse are ignored.
    pub fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        // Engine settings
        if let Some(n) = var("VIGIL_WORKER_THREADS").and_then(|v| v.parse().ok()) {
            self.engine.worker_threads = n;
        }
        if let Some(val) = var("VIGIL_MAX_FINDINGS") {
            if val.eq_ignore_ascii_case("none") {
                self.engine.default_max_findings = None;
            } else if let Ok(n) = val.parse() {
                self.engine.default_max_findings = Some(n);
            }
        }

        // Logging
        if let Some(val) = var("VIGIL_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = var("VIGIL_LOG_FORMAT") {
            self.logging.format = val;
        }

        self
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.engine.worker_threads > MAX_WORKER_THREADS {
            return Err(Error::InvalidConfig {
                key: "engine.worker_threads".into(),
                message: format!("must be at most {}", MAX_WORKER_THREADS),
            });
        }
        if self.logging.level.trim().is_empty() {
            return Err(Error::InvalidConfig {
                key: "logging.level".into(),
                message: "must not be empty".into(),
            });
        }
        self.logging.format.parse::<LogFormat>()?;
        Ok(())
    }
}

/// Evaluation engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker threads for check evaluation (0 = one per CPU)
    #[serde(default)]
    pub worker_threads: usize,

    /// Anomalies per check when a request sets no cap (unset = unlimited)
    #[serde(default)]
    pub default_max_findings: Option<usize>,
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        EngineOptions {
            worker_threads: config.worker_threads,
            default_max_findings: config.default_max_findings,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Builder for constructing Config
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.config.engine.worker_threads = threads;
        self
    }

    pub fn default_max_findings(mut self, max: usize) -> Self {
        self.config.engine.default_max_findings = Some(max);
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn log_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [engine]
            worker_threads = 4
            default_max_findings = 25

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.engine.worker_threads, 4);
        assert_eq!(config.engine.default_max_findings, Some(25));
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.engine.default_max_findings, None);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder()
            .worker_threads(2)
            .default_max_findings(10)
            .log_level("warn")
            .build();

        assert_eq!(config.engine.worker_threads, 2);
        assert_eq!(config.logging.level, "warn");

        let options = EngineOptions::from(&config.engine);
        assert_eq!(options.worker_threads, 2);
        assert_eq!(options.default_max_findings, Some(10));
    }

    #[test]
    fn test_merge_vars() {
        let vars: HashMap<&str, &str> = [
            ("VIGIL_WORKER_THREADS", "8"),
            ("VIGIL_MAX_FINDINGS", "3"),
            ("VIGIL_LOG_FORMAT", "compact"),
        ]
        .into_iter()
        .collect();

        let config = Config::default().merge_vars(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.engine.worker_threads, 8);
        assert_eq!(config.engine.default_max_findings, Some(3));
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_merge_vars_ignores_garbage() {
        let config = Config::builder()
            .worker_threads(2)
            .build()
            .merge_vars(|k| (k == "VIGIL_WORKER_THREADS").then(|| "lots".to_string()));
        assert_eq!(config.engine.worker_threads, 2);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let err = Config::builder().worker_threads(100_000).build().validate().unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");

        let err = Config::builder().log_format("xml").build().validate().unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nworker_threads = 1").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.engine.worker_threads, 1);

        let err = Config::from_file("/nonexistent/vigil.toml").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
