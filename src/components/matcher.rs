use super::properties::SiftProperties;
use super::prepare_grey;
use crate::api::{ComponentTraits, Configurable, ImageConvertor, ImageMatcher, ImageMatches, PropertyInfo};
use crate::datastructure::{DescriptorBuffer, DescriptorMatch, Image, Keypoint};
use crate::engine::{
    enqueue, EngineConfig, EngineFactory, EngineInput, FeatureSet, ProcessingMode, SiftEngine,
};
use crate::error::SiftModuleError;
use crate::logging::ComponentSpan;
use crate::utils::LumaConvertor;
use crate::Result;
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Score given to every match; the engine only reports nearest neighbours.
pub const MATCH_SCORE: f32 = 1.0;

/// Detects SIFT features in two images and matches them inside the engine.
///
/// Keypoints are produced per orientation, so keypoint `i` always lines up
/// with float descriptor row `i`.
pub struct SiftImageMatcher {
    properties: SiftProperties,
    image_convertor: Box<dyn ImageConvertor>,
    engine_factory: EngineFactory,
    engine: Option<Box<dyn SiftEngine>>,
}

impl ComponentTraits for SiftImageMatcher {
    const UUID: Uuid = Uuid::from_u128(0x3baab95a_ad25_11eb_8529_0242ac130003);
    const NAME: &'static str = "SiftImageMatcher";
    const DESCRIPTION: &'static str = "SiftImageMatcher implements the ImageMatcher interface";
}

impl SiftImageMatcher {
    /// Matcher backed by the OpenCV engine
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

    pub fn with_image_convertor(mut self, image_convertor: Box<dyn ImageConvertor>) -> Self {
        self.image_convertor = image_convertor;
        self
    }

    pub fn properties(&self) -> &SiftProperties {
        &self.properties
    }

    pub fn engine_config(&self) -> Option<&EngineConfig> {
        self.engine.as_deref().map(|engine| engine.config())
    }

    pub fn is_configured(&self) -> bool {
        self.engine.is_some()
    }

    pub fn unload_component(&mut self) {
        if self.engine.take().is_some() {
            info!("{} engine released", Self::NAME);
        }
    }
}

#[cfg(feature = "opencv")]
impl Default for SiftImageMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurable for SiftImageMatcher {
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
        debug!("{} onConfigured", Self::NAME);
        let config = self
            .properties
            .to_engine_config(Self::NAME, ProcessingMode::Matching);

        self.engine = None;
        let engine = (self.engine_factory)(&config)?;
        info!(engine = engine.name(), image_mode = %config.image_mode, "{} engine created", Self::NAME);
        self.engine = Some(engine);
        Ok(())
    }
}

/// One keypoint per (feature, orientation), in descriptor row order.
fn keypoints_per_orientation(features: &FeatureSet) -> Vec<Keypoint> {
    features
        .features()
        .iter()
        .flat_map(|feature| {
            feature
                .orientations
                .iter()
                .map(move |&angle| (feature.x, feature.y, feature.sigma, angle))
        })
        .enumerate()
        .map(|(id, (x, y, sigma, angle))| Keypoint::new(id, x, y, [0, 0, 0], sigma, angle))
        .collect()
}

impl ImageMatcher for SiftImageMatcher {
    fn match_images(&self, image1: &Image, image2: &Image) -> Result<ImageMatches> {
        let engine = self
            .engine
            .as_deref()
            .ok_or(SiftModuleError::NotConfigured(Self::NAME))?;

        let span = ComponentSpan::new(Self::NAME, "match");
        let guard = span.enter();

        // both images are checked before any job is submitted
        let image_mode = engine.config().image_mode;
        for image in [image1, image2] {
            if !image_mode.accepts(image.data_type()) {
                let err = SiftModuleError::ImageModeMismatch {
                    image_type: image.data_type(),
                    image_mode,
                };
                error!("{}", err);
                return Err(err.into());
            }
        }

        let grey1 = prepare_grey(self.image_convertor.as_ref(), engine, image1)?;
        let grey2 = prepare_grey(self.image_convertor.as_ref(), engine, image2)?;

        let job1 = enqueue(engine, &EngineInput::from_grey(&grey1)?);
        let job2 = enqueue(engine, &EngineInput::from_grey(&grey2)?);
        let features1 = job1.wait()?;
        let features2 = job2.wait()?;

        let reverse_map = engine.match_features(&features1, &features2)?;
        if reverse_map.len() != features1.descriptor_count() {
            let err = SiftModuleError::InvalidFeatureSet(format!(
                "reverse map has {} entries for {} query descriptors",
                reverse_map.len(),
                features1.descriptor_count()
            ));
            error!("{}", err);
            return Err(err.into());
        }
        let matches: Vec<DescriptorMatch> = reverse_map
            .iter()
            .enumerate()
            .filter_map(|(i, matched)| {
                matched
                    .filter(|&j| j < features2.descriptor_count())
                    .map(|j| DescriptorMatch::new(i, j, MATCH_SCORE))
            })
            .collect();

        let keypoints1 = keypoints_per_orientation(&features1);
        let keypoints2 = keypoints_per_orientation(&features2);
        span.record_feature_detection(keypoints1.len(), features1.descriptor_count());
        span.record_matching(matches.len(), reverse_map.len());

        let result = ImageMatches {
            keypoints1,
            keypoints2,
            descriptors1: DescriptorBuffer::from_f32(features1.into_descriptors())?,
            descriptors2: DescriptorBuffer::from_f32(features2.into_descriptors())?,
            matches,
        };

        drop(guard);
        span.finish();
        Ok(result)
    }
}
