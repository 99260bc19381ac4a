use crate::api::{PropertyInfo, PropertyMap, PropertyType};
use crate::engine::{EngineConfig, ImageMode, NormMode, ProcessingMode, SiftMode};
use crate::error::SiftModuleError;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Property values shared by the extractor and the matcher.
///
/// Names follow the component property names (`nbOctaves`, `imageMode`, ...),
/// both in configuration files and in [`crate::api::Configurable::set_property`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiftProperties {
    pub mode: String,
    pub image_mode: String,
    pub nb_octaves: i32,
    pub nb_level_per_octave: i32,
    pub sigma: f32,
    pub threshold: f32,
    pub edge_limit: f32,
    pub downsampling: f32,
    pub initial_blur: f32,
    pub max_total_keypoints: i64,
    pub root_sift: bool,
}

impl Default for SiftProperties {
    fn default() -> Self {
        Self {
            mode: "PopSift".to_string(),
            image_mode: "Float".to_string(),
            nb_octaves: 0,
            nb_level_per_octave: 0,
            sigma: 0.0,
            threshold: 0.0,
            edge_limit: 0.0,
            downsampling: 0.0,
            initial_blur: 0.0,
            max_total_keypoints: 10000,
            root_sift: true,
        }
    }
}

impl SiftProperties {
    pub fn declared() -> Vec<PropertyInfo> {
        let defaults = Self::default();
        let choices = |values: &[&str]| PropertyType::Choice(values.iter().map(|v| v.to_string()).collect());

        vec![
            PropertyInfo {
                name: "mode",
                description: "SIFT conventions followed by the engine",
                default_value: Value::from(defaults.mode),
                value_type: choices(&SiftMode::VALID_VALUES),
            },
            PropertyInfo {
                name: "imageMode",
                description: "Pixel type the engine consumes",
                default_value: Value::from(defaults.image_mode),
                value_type: choices(&ImageMode::VALID_VALUES),
            },
            PropertyInfo {
                name: "nbOctaves",
                description: "Number of octaves, 0 keeps the engine default",
                default_value: Value::from(defaults.nb_octaves),
                value_type: PropertyType::Integer,
            },
            PropertyInfo {
                name: "nbLevelPerOctave",
                description: "Number of levels per octave, 0 keeps the engine default",
                default_value: Value::from(defaults.nb_level_per_octave),
                value_type: PropertyType::Integer,
            },
            PropertyInfo {
                name: "sigma",
                description: "Initial sigma",
                default_value: Value::from(defaults.sigma),
                value_type: PropertyType::Float,
            },
            PropertyInfo {
                name: "threshold",
                description: "Minimum contrast",
                default_value: Value::from(defaults.threshold),
                value_type: PropertyType::Float,
            },
            PropertyInfo {
                name: "edgeLimit",
                description: "Maximum ratio of Hessian eigenvalues",
                default_value: Value::from(defaults.edge_limit),
                value_type: PropertyType::Float,
            },
            PropertyInfo {
                name: "downsampling",
                description: "Downscale the input by 2^N; 0 lets the engine upscale by 2",
                default_value: Value::from(defaults.downsampling),
                value_type: PropertyType::Float,
            },
            PropertyInfo {
                name: "initialBlur",
                description: "Blur assumed in the input image",
                default_value: Value::from(defaults.initial_blur),
                value_type: PropertyType::Float,
            },
            PropertyInfo {
                name: "maxTotalKeypoints",
                description: "Keypoint cap, largest scales are kept first",
                default_value: Value::from(defaults.max_total_keypoints),
                value_type: PropertyType::Integer,
            },
            PropertyInfo {
                name: "rootSift",
                description: "RootSift normalization when true, classic L2 otherwise",
                default_value: Value::from(defaults.root_sift),
                value_type: PropertyType::Boolean,
            },
        ]
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields.get(name).cloned(),
            _ => None,
        }
    }

    pub fn set(&mut self, component: &str, name: &str, value: &Value) -> Result<()> {
        let Value::Object(mut fields) = serde_json::to_value(&*self)? else {
            return Err(anyhow::anyhow!("{} properties did not serialize to an object", component));
        };

        match fields.get_mut(name) {
            Some(slot) => *slot = value.clone(),
            None => {
                return Err(SiftModuleError::UnknownProperty {
                    component: component.to_string(),
                    name: name.to_string(),
                }
                .into())
            }
        }

        *self = serde_json::from_value(Value::Object(fields)).map_err(|e| SiftModuleError::InvalidProperty {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    pub fn to_property_map(&self) -> PropertyMap {
        let mut map = PropertyMap::new();
        if let Ok(Value::Object(fields)) = serde_json::to_value(self) {
            map.parameters.extend(fields);
        }
        map
    }

    /// Builds the engine configuration; invalid choices fall back to engine defaults.
    pub fn to_engine_config(&self, component: &str, processing: ProcessingMode) -> EngineConfig {
        let image_mode = ImageMode::parse(&self.image_mode).unwrap_or_else(|| {
            info!(
                "imageMode for {} is {}. It should be either Float or Unsigned Char. It is set by default to Unsigned Char.",
                component, self.image_mode
            );
            ImageMode::UnsignedChar
        });

        let mut config = EngineConfig::new(processing, image_mode);
        config.set_octaves(self.nb_octaves);
        config.set_levels(self.nb_level_per_octave);
        config.set_sigma(self.sigma);
        config.set_threshold(self.threshold);
        config.set_edge_limit(self.edge_limit);
        config.set_downsampling(self.downsampling);
        config.set_initial_blur(self.initial_blur);
        config.set_filter_max_extrema(self.max_total_keypoints);
        config.norm_mode = if self.root_sift {
            NormMode::RootSift
        } else {
            NormMode::Classic
        };

        config.mode = SiftMode::parse(&self.mode).unwrap_or_else(|| {
            info!(
                "{} is not a valid mode for {}. Set to PopSift default mode. Valid values are {}",
                self.mode,
                component,
                SiftMode::VALID_VALUES.join(", ")
            );
            SiftMode::PopSift
        });

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_declared_property_is_gettable() {
        let properties = SiftProperties::default();
        for info in SiftProperties::declared() {
            assert_eq!(properties.get(info.name), Some(info.default_value.clone()), "{}", info.name);
        }
    }

    #[test]
    fn test_set_known_property() {
        let mut properties = SiftProperties::default();
        properties.set("extractor", "nbOctaves", &Value::from(5)).unwrap();
        properties.set("extractor", "edgeLimit", &Value::from(12)).unwrap();
        properties.set("extractor", "imageMode", &Value::from("Unsigned Char")).unwrap();

        assert_eq!(properties.nb_octaves, 5);
        assert_eq!(properties.edge_limit, 12.0);
        assert_eq!(properties.image_mode, "Unsigned Char");
    }

    #[test]
    fn test_set_rejects_unknown_and_ill_typed() {
        let mut properties = SiftProperties::default();

        let err = properties.set("extractor", "octaves", &Value::from(3)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SiftModuleError>(),
            Some(SiftModuleError::UnknownProperty { .. })
        ));

        let err = properties.set("extractor", "rootSift", &Value::from("yes")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SiftModuleError>(),
            Some(SiftModuleError::InvalidProperty { .. })
        ));
        assert!(properties.root_sift);
    }

    #[test]
    fn test_engine_config_forwards_values() {
        let properties = SiftProperties {
            image_mode: "Unsigned Char".to_string(),
            mode: "VLFeat".to_string(),
            nb_octaves: 4,
            nb_level_per_octave: 0,
            sigma: 1.2,
            max_total_keypoints: 250,
            root_sift: false,
            ..SiftProperties::default()
        };

        let config = properties.to_engine_config("extractor", ProcessingMode::Extracting);
        assert_eq!(config.image_mode, ImageMode::UnsignedChar);
        assert_eq!(config.mode, SiftMode::VLFeat);
        assert_eq!(config.octaves, Some(4));
        assert_eq!(config.levels, None);
        assert_eq!(config.sigma, Some(1.2));
        assert_eq!(config.max_extrema, Some(250));
        assert_eq!(config.norm_mode, NormMode::Classic);
        assert_eq!(config.normalization_multiplier, 9);
    }

    #[test]
    fn test_invalid_choices_fall_back() {
        let properties = SiftProperties {
            image_mode: "Double".to_string(),
            mode: "SURF".to_string(),
            ..SiftProperties::default()
        };

        let config = properties.to_engine_config("matcher", ProcessingMode::Matching);
        assert_eq!(config.image_mode, ImageMode::UnsignedChar);
        assert_eq!(config.mode, SiftMode::PopSift);
        assert_eq!(config.processing, ProcessingMode::Matching);
    }

    #[test]
    fn test_config_file_names() {
        let properties: SiftProperties =
            toml::from_str("imageMode = \"Unsigned Char\"\nnbLevelPerOctave = 4\nrootSift = false\n").unwrap();
        assert_eq!(properties.nb_level_per_octave, 4);
        assert!(!properties.root_sift);
        assert_eq!(properties.max_total_keypoints, 10000);
    }
}
