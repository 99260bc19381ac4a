use crate::datastructure::{DescriptorBuffer, DescriptorMatch, Image, ImageLayout, Keypoint};
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Detects keypoints in an image and describes them.
pub trait DescriptorsExtractorFromImage {
    /// Describes the kind of descriptor produced
    fn type_string(&self) -> &str;

    /// Extracts keypoints and their descriptors; row `i` describes keypoint `i`
    fn extract(&self, image: &Image) -> Result<(Vec<Keypoint>, DescriptorBuffer)>;
}

/// Everything an image matcher hands back for a pair of images.
#[derive(Debug, Clone)]
pub struct ImageMatches {
    pub keypoints1: Vec<Keypoint>,
    pub keypoints2: Vec<Keypoint>,
    pub descriptors1: DescriptorBuffer,
    pub descriptors2: DescriptorBuffer,
    pub matches: Vec<DescriptorMatch>,
}

/// Detects, describes and matches keypoints between two images.
pub trait ImageMatcher {
    fn match_images(&self, image1: &Image, image2: &Image) -> Result<ImageMatches>;
}

/// Converts an image to another channel layout, keeping its data type.
pub trait ImageConvertor {
    fn convert(&self, image: &Image, layout: ImageLayout) -> Result<Image>;
}

/// Static identity of a component.
pub trait ComponentTraits {
    const UUID: Uuid;
    const NAME: &'static str;
    const DESCRIPTION: &'static str;
}

/// Components configured through named properties.
pub trait Configurable {
    fn component_name(&self) -> &str;

    /// Properties this component declares, with their defaults
    fn declared_properties(&self) -> Vec<PropertyInfo>;

    fn set_property(&mut self, name: &str, value: &Value) -> Result<()>;

    fn get_property(&self, name: &str) -> Option<Value>;

    /// Applies the current property values
    fn on_configured(&mut self) -> Result<()>;

    /// Sets every property in `properties`, then applies them
    fn configure(&mut self, properties: &PropertyMap) -> Result<()> {
        let mut names: Vec<&String> = properties.parameters.keys().collect();
        names.sort();
        for name in names {
            self.set_property(name, &properties.parameters[name])?;
        }
        self.on_configured()
    }
}

/// Property values keyed by property name
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    pub parameters: HashMap<String, Value>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.parameters
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// Information about a declared property
#[derive(Debug, Clone, serde::Serialize)]
pub struct PropertyInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub default_value: Value,
    pub value_type: PropertyType,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum PropertyType {
    Integer,
    Float,
    Boolean,
    Choice(Vec<String>),
}
