//! Logging configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level (trace, debug, info, warn, error)
    pub global_level: String,

    /// Log level of the engine backends
    pub engine_level: String,

    /// Enable console output
    pub console_output: bool,

    /// Directory for daily JSON log files (None = no file logging)
    pub log_directory: Option<PathBuf>,

    /// Include file location in logs
    pub include_file_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            global_level: "info".to_string(),
            engine_level: "warn".to_string(),
            console_output: true,
            log_directory: None,
            include_file_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create a development configuration with verbose logging
    pub fn development() -> Self {
        Self {
            global_level: "debug".to_string(),
            engine_level: "debug".to_string(),
            console_output: true,
            log_directory: Some(PathBuf::from("logs")),
            include_file_location: true,
        }
    }

    /// Create a production configuration with minimal overhead
    pub fn production() -> Self {
        Self {
            global_level: "warn".to_string(),
            engine_level: "error".to_string(),
            console_output: false,
            log_directory: Some(PathBuf::from("/var/log/sift-module")),
            include_file_location: false,
        }
    }

    /// Maps `-v` counts onto levels, keeping the engine one step quieter
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        let (global, engine) = match verbose {
            0 => return self,
            1 => ("info", "info"),
            2 => ("debug", "info"),
            _ => ("trace", "debug"),
        };
        self.global_level = global.to_string();
        self.engine_level = engine.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !VALID_LEVELS.contains(&self.global_level.as_str()) {
            return Err(format!(
                "Invalid global_level: {}. Must be one of: {:?}",
                self.global_level, VALID_LEVELS
            ));
        }

        if !VALID_LEVELS.contains(&self.engine_level.as_str()) {
            return Err(format!(
                "Invalid engine_level: {}. Must be one of: {:?}",
                self.engine_level, VALID_LEVELS
            ));
        }

        if let Some(ref log_dir) = self.log_directory {
            if let Some(parent) = log_dir.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(format!("Log directory parent does not exist: {:?}", parent));
                }
            }
        }

        Ok(())
    }
}
