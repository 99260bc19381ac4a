use super::properties::SiftProperties;
use super::prepare_grey;
use crate::api::{ComponentTraits, Configurable, DescriptorsExtractorFromImage, ImageConvertor, PropertyInfo};
use crate::datastructure::{DescriptorBuffer, DescriptorDataType, Image, Keypoint};
use crate::engine::{enqueue, EngineConfig, EngineFactory, EngineInput, ProcessingMode, SiftEngine};
use crate::error::SiftModuleError;
use crate::logging::ComponentSpan;
use crate::utils::LumaConvertor;
use crate::Result;
use ndarray::Axis;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Extracts SIFT keypoints and 8-bit descriptors from one image.
///
/// One keypoint is produced per detected extremum, carrying its first
/// orientation and the color of the source pixel under it.
pub struct SiftDescriptorsExtractor {
    properties: SiftProperties,
    image_convertor: Box<dyn ImageConvertor>,
    engine_factory: EngineFactory,
    engine: Option<Box<dyn SiftEngine>>,
}

impl ComponentTraits for SiftDescriptorsExtractor {
    const UUID: Uuid = Uuid::from_u128(0x7fb2aace_a1b1_11eb_bcbc_0242ac130002);
    const NAME: &'static str = "SiftDescriptorsExtractor";
    const DESCRIPTION: &'static str = "SiftDescriptorsExtractor implements the DescriptorsExtractorFromImage interface";
}

impl SiftDescriptorsExtractor {
    /// Extractor backed by the OpenCV engine
    #[cfg(feature = "opencv")]
    pub fn new() -> Self {
        Self::with_engine_factory(crate::engine::opencv_factory())
    }

    pub fn with_engine_factory(engine_factory: EngineFactory) -> Self {
        debug!("{} constructor", Self::NAME);
        Self {
            properties: SiftProperties::default(),
            image_convertor: Box::new(LumaConvertor),
            engine_factory,
            engine: None,
        }
    }

    /// Replaces the convertor used to turn colour images into grey ones
    pub fn with_image_convertor(mut self, image_convertor: Box<dyn ImageConvertor>) -> Self {
        self.image_convertor = image_convertor;
        self
    }

    pub fn properties(&self) -> &SiftProperties {
        &self.properties
    }

    /// Configuration of the current engine, if configured
    pub fn engine_config(&self) -> Option<&EngineConfig> {
        self.engine.as_deref().map(|engine| engine.config())
    }

    pub fn is_configured(&self) -> bool {
        self.engine.is_some()
    }

    /// Releases the engine; the component must be configured again before use
    pub fn unload_component(&mut self) {
        if self.engine.take().is_some() {
            info!("{} engine released", Self::NAME);
        }
    }
}

#[cfg(feature = "opencv")]
impl Default for SiftDescriptorsExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurable for SiftDescriptorsExtractor {
    fn component_name(&self) -> &str {
        Self::NAME
    }

    fn declared_properties(&self) -> Vec<PropertyInfo> {
        SiftProperties::declared()
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<()> {
        self.properties.set(Self::NAME, name, value)
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        self.properties.get(name)
    }

    fn on_configured(&mut self) -> Result<()> {
        info!("{} onConfigured", Self::NAME);
        let config = self
            .properties
            .to_engine_config(Self::NAME, ProcessingMode::Extracting);

        // drop the previous engine before building its replacement
        self.engine = None;
        let engine = (self.engine_factory)(&config)?;
        info!(engine = engine.name(), image_mode = %config.image_mode, "{} engine created", Self::NAME);
        self.engine = Some(engine);
        Ok(())
    }
}

impl DescriptorsExtractorFromImage for SiftDescriptorsExtractor {
    fn type_string(&self) -> &str {
        "DescriptorsExtractorType::SIFT"
    }

    fn extract(&self, image: &Image) -> Result<(Vec<Keypoint>, DescriptorBuffer)> {
        let engine = self
            .engine
            .as_deref()
            .ok_or(SiftModuleError::NotConfigured(Self::NAME))?;

        let span = ComponentSpan::new(Self::NAME, "extract");
        let guard = span.enter();

        let grey = prepare_grey(self.image_convertor.as_ref(), engine, image)?;
        let input = EngineInput::from_grey(&grey)?;
        let features = enqueue(engine, &input).wait()?;

        let mut keypoints = Vec::with_capacity(features.feature_count());
        let mut rows = Vec::with_capacity(features.feature_count());
        for (id, feature) in features.features().iter().enumerate() {
            keypoints.push(Keypoint::new(
                id,
                feature.x,
                feature.y,
                image.sample_rgb(feature.x, feature.y),
                feature.sigma,
                feature.orientations[0],
            ));
            rows.push(features.descriptor_offset(id));
        }

        let descriptors = DescriptorBuffer::from_f32(features.descriptors().select(Axis(0), &rows))?
            .convert_to(DescriptorDataType::U8);

        span.record_feature_detection(keypoints.len(), descriptors.nb_descriptors());
        drop(guard);
        span.finish();
        Ok((keypoints, descriptors))
    }
}
