//! Configuration management for ferrozst
//!
//! Settings are layered from built-in defaults, an optional YAML, TOML or JSON
//! file, and `FERROZST__`-prefixed environment variables, then validated.
//!
//! # Features
//!
//! - **Multiple formats**: YAML, TOML and JSON configuration files
//! - **Validation**: level and chunk size are checked while deserializing
//! - **Environment overrides**: `FERROZST__COMPRESSION__LEVEL=9` and friends
//!
//! # Examples
//!
//! ```rust
//! use ferrozst_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_source_file("ferrozst.yaml")
//!     .add_env_prefix("FERROZST")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Chunk size: {}", config.stream.chunk_size.get());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use ferrozst_types::{ChunkSize, CompressionLevel};
use serde::{Deserialize, Serialize};

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for ferrozst
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compression settings
    pub compression: CompressionConfig,
    /// Stream reading settings
    pub stream: StreamConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Compression configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Level used when none is given on the command line
    pub level: CompressionLevel,
}

/// Stream configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Size of each read when a file is turned into a chunk stream
    pub chunk_size: ChunkSize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            colored_output: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.compression.level.get(), 3);
        assert_eq!(config.stream.chunk_size.get(), 128 * 1024);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("compression:\n  level: 7\n").unwrap();
        assert_eq!(config.compression.level.get(), 7);
        assert_eq!(config.stream, StreamConfig::default());
        assert!(config.logging.colored_output);
    }

    #[test]
    fn test_out_of_range_level_is_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("compression:\n  level: 22\n");
        assert!(result.is_err());
    }
}
