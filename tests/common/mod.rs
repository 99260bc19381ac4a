#![allow(dead_code)]

use ndarray::Array2;
use sift_module::engine::{
    finish_feature_set, EngineConfig, EngineFactory, EngineInput, Feature, FeatureSet, GreyPixels, SiftEngine,
};
use sift_module::{Image, Result, SIFT_DESCRIPTOR_LENGTH};
use std::cell::Cell;
use std::rc::Rc;

/// Grey level at or above which the scripted engine reports a feature.
pub const BRIGHT: u8 = 200;

/// Engine that reports one feature per bright pixel.
///
/// Pixels on even columns carry two orientations, the others one, so tests
/// can check that descriptor rows follow orientations.
pub struct ScriptedEngine {
    config: EngineConfig,
    calls: Rc<Cell<usize>>,
}

impl SiftEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn extract(&self, input: &EngineInput<'_>) -> Result<FeatureSet> {
        self.calls.set(self.calls.get() + 1);

        let bright: Vec<bool> = match input.pixels {
            GreyPixels::U8(data) => data.iter().map(|&v| v >= BRIGHT).collect(),
            GreyPixels::F32(data) => data.iter().map(|&v| v >= BRIGHT as f32 / 255.0).collect(),
        };

        let mut features = Vec::new();
        let mut rows: Vec<f32> = Vec::new();
        for (index, _) in bright.iter().enumerate().filter(|&(_, &b)| b) {
            let x = (index % input.width as usize) as u32;
            let y = (index / input.width as usize) as u32;
            let num_ori = if x % 2 == 0 { 2 } else { 1 };
            let orientations: Vec<f32> = (0..num_ori).map(|o| 0.5 * o as f32).collect();
            for o in 0..num_ori {
                rows.extend(descriptor_row(x, y, o));
            }
            features.push(Feature {
                x: x as f32,
                y: y as f32,
                sigma: 1.0 + (x + y) as f32 / 10.0,
                orientations,
            });
        }

        let descriptors = Array2::from_shape_vec((rows.len() / SIFT_DESCRIPTOR_LENGTH, SIFT_DESCRIPTOR_LENGTH), rows)?;
        finish_feature_set(FeatureSet::new(features, descriptors)?, &self.config)
    }
}

/// Distinct, position-dependent descriptor values.
fn descriptor_row(x: u32, y: u32, orientation: u32) -> Vec<f32> {
    (0..SIFT_DESCRIPTOR_LENGTH as u32)
        .map(|k| ((x * 31 + y * 17 + orientation * 53 + k * 7) % 97 + 1) as f32)
        .collect()
}

/// Factory for scripted engines plus a counter of `extract` calls across all of them.
pub fn scripted_factory() -> (EngineFactory, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let shared = Rc::clone(&calls);
    let factory: EngineFactory = Box::new(move |config: &EngineConfig| {
        Ok(Box::new(ScriptedEngine {
            config: config.clone(),
            calls: Rc::clone(&shared),
        }) as Box<dyn SiftEngine>)
    });
    (factory, calls)
}

/// Black grey image with white pixels at `points`.
pub fn grey_with_points(width: u32, height: u32, points: &[(u32, u32)]) -> Image {
    let mut data = vec![0u8; (width * height) as usize];
    for &(x, y) in points {
        data[(y * width + x) as usize] = 255;
    }
    Image::grey_u8(width, height, data).unwrap()
}

/// Float version of [`grey_with_points`].
pub fn grey_f32_with_points(width: u32, height: u32, points: &[(u32, u32)]) -> Image {
    let mut data = vec![0f32; (width * height) as usize];
    for &(x, y) in points {
        data[(y * width + x) as usize] = 1.0;
    }
    Image::grey_f32(width, height, data).unwrap()
}

/// Black RGB image with coloured pixels; every colour must be bright once converted to grey.
pub fn rgb_with_points(width: u32, height: u32, points: &[((u32, u32), [u8; 3])]) -> Image {
    let mut data = vec![0u8; (width * height * 3) as usize];
    for &((x, y), rgb) in points {
        let offset = ((y * width + x) * 3) as usize;
        data[offset..offset + 3].copy_from_slice(&rgb);
    }
    Image::rgb_u8(width, height, data).unwrap()
}
