use super::{
    finish_feature_set, EngineConfig, EngineInput, Feature, FeatureSet, GreyPixels, ProcessingMode, SiftEngine,
    SiftMode, MATCH_RATIO, MAX_ORIENTATIONS,
};
use crate::datastructure::{image_buffer::unit_to_u8, SIFT_DESCRIPTOR_LENGTH};
use crate::Result;
use image::imageops::{self, FilterType};
use image::GrayImage;
use ndarray::{Array2, ArrayView2};
use opencv::core::{no_array, DMatch, KeyPoint, Mat, Ptr, Vector, CV_32FC1, CV_8UC1, NORM_L2};
use opencv::features2d::{BFMatcher, SIFT};
use opencv::prelude::*;
use std::cell::RefCell;

// OpenCV defaults, used when the matching property is unset
const DEFAULT_LEVELS: u32 = 3;
const DEFAULT_CONTRAST_THRESHOLD: f32 = 0.04;
const DEFAULT_EDGE_LIMIT: f32 = 10.0;
const DEFAULT_SIGMA: f32 = 1.6;

/// SIFT engine backed by OpenCV's `features2d` SIFT and a brute-force matcher.
pub struct OpenCvSiftEngine {
    detector: RefCell<Ptr<SIFT>>,
    /// Only built for engines in matching mode
    matcher: Option<RefCell<Ptr<BFMatcher>>>,
    config: EngineConfig,
}

impl OpenCvSiftEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        // the keypoint cap is applied afterwards, largest scale first
        let detector = SIFT::create(
            0,
            config.levels.unwrap_or(DEFAULT_LEVELS) as i32,
            config.threshold.unwrap_or(DEFAULT_CONTRAST_THRESHOLD) as f64,
            config.edge_limit.unwrap_or(DEFAULT_EDGE_LIMIT) as f64,
            config.sigma.unwrap_or(DEFAULT_SIGMA) as f64,
            false, // enable_precise_upscale
        )?;

        let matcher = match config.processing {
            ProcessingMode::Matching => Some(RefCell::new(BFMatcher::create(
                NORM_L2, // float descriptors
                false,   // the ratio test needs two candidates, no cross check
            )?)),
            ProcessingMode::Extracting => None,
        };

        if config.mode != SiftMode::OpenCV {
            log::debug!("{} conventions are approximated by OpenCV SIFT", config.mode);
        }
        if let Some(blur) = config.initial_blur {
            log::debug!("initial blur {} ignored, OpenCV assumes a fixed 0.5 camera blur", blur);
        }

        Ok(Self {
            detector: RefCell::new(detector),
            matcher,
            config,
        })
    }

    /// Builds the 8-bit detector input and the factors mapping it back to input coordinates.
    fn input_mat(&self, input: &EngineInput<'_>) -> Result<(Mat, f32, f32)> {
        let bytes: Vec<u8> = match input.pixels {
            GreyPixels::U8(data) => data.to_vec(),
            GreyPixels::F32(data) => data.iter().map(|&v| unit_to_u8(v)).collect(),
        };
        let grey = GrayImage::from_raw(input.width, input.height, bytes)
            .ok_or_else(|| anyhow::anyhow!("grey buffer does not match {}x{}", input.width, input.height))?;

        let grey = match detector_input_size(input.width, input.height, self.config.downsampling) {
            Some((width, height)) => imageops::resize(&grey, width, height, FilterType::Triangle),
            None => grey,
        };

        let (width, height) = grey.dimensions();
        let mut mat = Mat::zeros(height as i32, width as i32, CV_8UC1)?.to_mat()?;
        for (x, y, pixel) in grey.enumerate_pixels() {
            *mat.at_2d_mut::<u8>(y as i32, x as i32)? = pixel[0];
        }

        Ok((
            mat,
            input.width as f32 / width as f32,
            input.height as f32 / height as f32,
        ))
    }

    fn descriptors_mat(descriptors: ArrayView2<'_, f32>) -> Result<Mat> {
        let mut mat = Mat::zeros(descriptors.nrows() as i32, descriptors.ncols() as i32, CV_32FC1)?.to_mat()?;
        for ((row, col), value) in descriptors.indexed_iter() {
            *mat.at_2d_mut::<f32>(row as i32, col as i32)? = *value;
        }
        Ok(mat)
    }
}

/// Size handed to the detector when downsampling is set.
///
/// OpenCV always doubles its input for the first octave, so the image is
/// shrunk one octave further than requested to process at `2^-downsampling`.
fn detector_input_size(width: u32, height: u32, downsampling: Option<f32>) -> Option<(u32, u32)> {
    let factor = 2f32.powf(downsampling? + 1.0);
    Some((
        ((width as f32 / factor).round() as u32).max(1),
        ((height as f32 / factor).round() as u32).max(1),
    ))
}

/// Octave index packed in the low byte of `KeyPoint::octave`; -1 is the upscaled octave.
fn unpack_octave(packed: i32) -> i32 {
    let octave = packed & 255;
    if octave >= 128 {
        octave - 256
    } else {
        octave
    }
}

impl SiftEngine for OpenCvSiftEngine {
    fn name(&self) -> &str {
        "OpenCV-SIFT"
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn extract(&self, input: &EngineInput<'_>) -> Result<FeatureSet> {
        let (mat, scale_x, scale_y) = self.input_mat(input)?;

        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();
        self.detector.borrow_mut().detect_and_compute(
            &mat,
            &no_array(),
            &mut keypoints,
            &mut descriptors,
            false,
        )?;

        // OpenCV emits one keypoint per orientation; consecutive entries at the
        // same location and size belong to the same extremum
        let mut features: Vec<Feature> = Vec::new();
        let mut rows: Vec<f32> = Vec::with_capacity(keypoints.len() * SIFT_DESCRIPTOR_LENGTH);
        let mut last_key: Option<(u32, u32, u32)> = None;

        for (index, keypoint) in keypoints.iter().enumerate() {
            // OpenCV's upscaled octave -1 is the first processed octave
            if let Some(octaves) = self.config.octaves {
                if unpack_octave(keypoint.octave()) + 1 >= octaves as i32 {
                    continue;
                }
            }

            let pt = keypoint.pt();
            let key = (pt.x.to_bits(), pt.y.to_bits(), keypoint.size().to_bits());
            let orientation = keypoint.angle().to_radians();

            match features.last_mut() {
                Some(feature) if last_key == Some(key) && feature.num_ori() < MAX_ORIENTATIONS => {
                    feature.orientations.push(orientation);
                }
                _ => features.push(Feature {
                    x: pt.x * scale_x,
                    y: pt.y * scale_y,
                    // size is the diameter of the keypoint neighbourhood
                    sigma: keypoint.size() / 2.0 * scale_x,
                    orientations: vec![orientation],
                }),
            }
            last_key = Some(key);

            for col in 0..SIFT_DESCRIPTOR_LENGTH {
                rows.push(*descriptors.at_2d::<f32>(index as i32, col as i32)?);
            }
        }

        let count = rows.len() / SIFT_DESCRIPTOR_LENGTH;
        let descriptors = Array2::from_shape_vec((count, SIFT_DESCRIPTOR_LENGTH), rows)?;
        let features = FeatureSet::new(features, descriptors)?;
        finish_feature_set(features, &self.config)
    }

    fn match_features(&self, query: &FeatureSet, train: &FeatureSet) -> Result<Vec<Option<usize>>> {
        let matcher = self
            .matcher
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("{} was configured for extraction and cannot match", self.name()))?;

        let mut reverse_map = vec![None; query.descriptor_count()];
        if query.descriptor_count() == 0 || train.descriptor_count() == 0 {
            return Ok(reverse_map);
        }

        let query_mat = Self::descriptors_mat(query.descriptors())?;
        let train_mat = Self::descriptors_mat(train.descriptors())?;

        let mut candidates = Vector::<Vector<DMatch>>::new();
        matcher.borrow_mut().knn_train_match(
            &query_mat,
            &train_mat,
            &mut candidates,
            2,
            &no_array(),
            false,
        )?;

        for pair in candidates.iter() {
            let best = match pair.len() {
                0 => continue,
                1 => pair.get(0)?,
                _ => {
                    let (best, second) = (pair.get(0)?, pair.get(1)?);
                    if best.distance >= MATCH_RATIO * second.distance {
                        continue;
                    }
                    best
                }
            };
            if let Some(slot) = reverse_map.get_mut(best.query_idx as usize) {
                *slot = Some(best.train_idx as usize);
            }
        }

        Ok(reverse_map)
    }
}
