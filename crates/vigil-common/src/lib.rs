//! Vigil Common - Shared utilities: logging and configuration
//!
//! This crate provides the configuration and logging setup an embedding
//! application uses around the Vigil engine.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigBuilder, EngineConfig, LoggingConfig};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogFormat};
