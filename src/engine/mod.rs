//! Boundary to the SIFT engine that does the actual detection and description.
//!
//! Components never look inside an engine: they hand it a grey buffer through
//! [`enqueue`], wait for the [`FeatureSet`] and translate it back into crate
//! datastructures.

pub mod config;
pub mod features;
pub mod matching;
pub mod normalize;
#[cfg(feature = "opencv")]
pub mod opencv_engine;

pub use config::*;
pub use features::*;
pub use matching::{reverse_map, MATCH_RATIO};
pub use normalize::normalize_descriptors;
#[cfg(feature = "opencv")]
pub use opencv_engine::OpenCvSiftEngine;

use crate::datastructure::{Image, ImageLayout, PixelData};
use crate::error::SiftModuleError;
use crate::Result;
use tracing::debug;
use uuid::Uuid;

/// Grey pixels submitted to the engine.
#[derive(Debug, Clone, Copy)]
pub enum GreyPixels<'a> {
    U8(&'a [u8]),
    F32(&'a [f32]),
}

#[derive(Debug, Clone, Copy)]
pub struct EngineInput<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: GreyPixels<'a>,
}

impl<'a> EngineInput<'a> {
    pub fn from_grey(image: &'a Image) -> Result<Self> {
        if image.layout() != ImageLayout::Grey {
            return Err(SiftModuleError::InvalidImage(format!(
                "engine input must be single-channel, got {:?}",
                image.layout()
            ))
            .into());
        }

        let pixels = match image.data() {
            PixelData::U8(data) => GreyPixels::U8(data),
            PixelData::F32(data) => GreyPixels::F32(data),
        };

        Ok(Self {
            width: image.width(),
            height: image.height(),
            pixels,
        })
    }
}

/// A SIFT implementation the components can drive.
pub trait SiftEngine {
    /// Returns the name of the engine
    fn name(&self) -> &str;

    fn config(&self) -> &EngineConfig;

    /// Checks whether an image of this size can be processed at all
    fn test_texture_fit(&self, width: u32, height: u32) -> AllocTest {
        self.config().test_texture_fit(width, height)
    }

    /// Detects features and computes their descriptors, blocking until done
    fn extract(&self, input: &EngineInput<'_>) -> Result<FeatureSet>;

    /// Matches every query descriptor against the train descriptors
    fn match_features(&self, query: &FeatureSet, train: &FeatureSet) -> Result<Vec<Option<usize>>> {
        Ok(reverse_map(query.descriptors(), train.descriptors(), MATCH_RATIO))
    }
}

/// Builds an engine for a configuration; components call it from `on_configured`.
pub type EngineFactory = Box<dyn Fn(&EngineConfig) -> Result<Box<dyn SiftEngine>>>;

#[cfg(feature = "opencv")]
pub fn opencv_factory() -> EngineFactory {
    Box::new(|config: &EngineConfig| {
        let engine = OpenCvSiftEngine::new(config.clone())?;
        Ok(Box::new(engine) as Box<dyn SiftEngine>)
    })
}

/// A submitted image and, once the engine is done, its features.
pub struct SiftJob {
    result: Result<FeatureSet>,
}

impl SiftJob {
    /// Blocks until the engine result is available.
    pub fn wait(self) -> Result<FeatureSet> {
        self.result
    }
}

/// Submits one image to the engine.
pub fn enqueue(engine: &dyn SiftEngine, input: &EngineInput<'_>) -> SiftJob {
    let id = Uuid::new_v4();
    let start = instant::Instant::now();
    let result = engine.extract(input);
    let elapsed = start.elapsed();

    match &result {
        Ok(features) => debug!(
            job = %id,
            engine = engine.name(),
            width = input.width,
            height = input.height,
            features = features.feature_count(),
            descriptors = features.descriptor_count(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "SIFT job finished"
        ),
        Err(e) => debug!(job = %id, engine = engine.name(), error = %e, "SIFT job failed"),
    }

    SiftJob { result }
}

/// Applies the engine-side filtering and normalization every backend shares.
pub fn finish_feature_set(features: FeatureSet, config: &EngineConfig) -> Result<FeatureSet> {
    let mut features = match (config.max_extrema, config.filter_sorting) {
        (Some(max), FilterSorting::LargestScaleFirst) if features.feature_count() > max => {
            features.retain_largest_scale_first(max)?
        }
        _ => features,
    };
    normalize_descriptors(
        features.descriptors_mut(),
        config.norm_mode,
        config.normalization_multiplier,
    );
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastructure::SIFT_DESCRIPTOR_LENGTH;
    use ndarray::Array2;

    struct FixedEngine {
        config: EngineConfig,
    }

    impl SiftEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        fn config(&self) -> &EngineConfig {
            &self.config
        }

        fn extract(&self, input: &EngineInput<'_>) -> Result<FeatureSet> {
            let features = vec![Feature {
                x: input.width as f32 / 2.0,
                y: input.height as f32 / 2.0,
                sigma: 1.6,
                orientations: vec![0.0],
            }];
            FeatureSet::new(features, Array2::ones((1, SIFT_DESCRIPTOR_LENGTH)))
        }
    }

    #[test]
    fn test_engine_input_requires_grey() {
        let rgb = Image::rgb_u8(2, 2, vec![0; 12]).unwrap();
        assert!(EngineInput::from_grey(&rgb).is_err());

        let grey = Image::grey_f32(2, 2, vec![0.0; 4]).unwrap();
        let input = EngineInput::from_grey(&grey).unwrap();
        assert!(matches!(input.pixels, GreyPixels::F32(data) if data.len() == 4));
    }

    #[test]
    fn test_enqueue_runs_job() {
        let engine = FixedEngine {
            config: EngineConfig::default(),
        };
        let image = Image::grey_u8(8, 6, vec![0; 48]).unwrap();
        let input = EngineInput::from_grey(&image).unwrap();

        let features = enqueue(&engine, &input).wait().unwrap();
        assert_eq!(features.features()[0].x, 4.0);
    }

    #[test]
    fn test_finish_caps_and_normalizes() {
        let config = EngineConfig {
            max_extrema: Some(1),
            normalization_multiplier: 0,
            ..EngineConfig::default()
        };
        let features = vec![
            Feature { x: 0.0, y: 0.0, sigma: 1.0, orientations: vec![0.0] },
            Feature { x: 1.0, y: 1.0, sigma: 4.0, orientations: vec![0.0, 1.0] },
        ];
        let set = FeatureSet::new(features, Array2::ones((3, SIFT_DESCRIPTOR_LENGTH))).unwrap();

        let finished = finish_feature_set(set, &config).unwrap();
        assert_eq!(finished.feature_count(), 1);
        assert_eq!(finished.features()[0].sigma, 4.0);
        assert_eq!(finished.descriptor_count(), 2);
        let l2: f32 = finished.descriptor(0).iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((l2 - 1.0).abs() < 1e-4);
    }
}
