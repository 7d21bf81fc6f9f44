//! # Configuration
//!
//! Client configuration: API endpoint, session persistence, and logging.

pub mod client;

pub use client::{
    ApiConfig, Config, ConfigError, LogFormat, LoggingConfig, RefreshFailurePolicy, SessionConfig,
};
