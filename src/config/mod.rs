use crate::api::Configurable;
use crate::components::SiftProperties;
use crate::engine::{ImageMode, SiftMode};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration file: one property table per component plus logging.
///
/// ```toml
/// [extractor]
/// imageMode = "Unsigned Char"
/// nbOctaves = 4
///
/// [matcher]
/// rootSift = false
///
/// [logging]
/// global_level = "debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extractor: SiftProperties,
    pub matcher: SiftProperties,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;

        if content.trim_start().starts_with('{') {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (section, properties) in [("extractor", &self.extractor), ("matcher", &self.matcher)] {
            validate_properties(section, properties, &mut errors);
        }

        if let Err(e) = self.logging.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Sets every extractor property on `component` and applies them
    pub fn configure_extractor(&self, component: &mut dyn Configurable) -> crate::Result<()> {
        component.configure(&self.extractor.to_property_map())
    }

    /// Sets every matcher property on `component` and applies them
    pub fn configure_matcher(&self, component: &mut dyn Configurable) -> crate::Result<()> {
        component.configure(&self.matcher.to_property_map())
    }
}

// Components fall back on unknown choices; configuration files reject them.
fn validate_properties(section: &str, properties: &SiftProperties, errors: &mut Vec<String>) {
    if SiftMode::parse(&properties.mode).is_none() {
        errors.push(format!(
            "{}.mode must be one of {}, got '{}'",
            section,
            SiftMode::VALID_VALUES.join(", "),
            properties.mode
        ));
    }

    if ImageMode::parse(&properties.image_mode).is_none() {
        errors.push(format!(
            "{}.imageMode must be one of {}, got '{}'",
            section,
            ImageMode::VALID_VALUES.join(", "),
            properties.image_mode
        ));
    }

    if properties.downsampling > 16.0 {
        errors.push(format!("{}.downsampling must not exceed 16", section));
    }

    if properties.nb_octaves > 20 {
        errors.push(format!("{}.nbOctaves must not exceed 20", section));
    }
}

#[derive(Debug, Clone)]
pub enum ConfigFormat {
    Json,
    Toml,
}

pub fn load_config_or_default(config_path: Option<&str>) -> Config {
    match config_path {
        Some(path) => match Config::load_from_file(path) {
            Ok(config) => {
                if let Err(errors) = config.validate() {
                    eprintln!("Configuration validation errors:");
                    for error in errors {
                        eprintln!("  - {}", error);
                    }
                    eprintln!("Using default configuration instead.");
                    Config::default()
                } else {
                    config
                }
            }
            Err(e) => {
                eprintln!("Failed to load config from '{}': {}", path, e);
                eprintln!("Using default configuration.");
                Config::default()
            }
        },
        None => Config::default(),
    }
}
