use serde::{Deserialize, Serialize};

/// A detected keypoint as handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Scale (sigma) at which the keypoint was detected.
    pub size: f32,
    /// Orientation as reported by the engine.
    pub angle: f32,
}

impl Keypoint {
    pub fn new(id: usize, x: f32, y: f32, rgb: [u8; 3], size: f32, angle: f32) -> Self {
        Self {
            id,
            x,
            y,
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            size,
            angle,
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// A pair of descriptor indices plus a matching score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptorMatch {
    pub index_in_descriptor1: usize,
    pub index_in_descriptor2: usize,
    pub matching_score: f32,
}

impl DescriptorMatch {
    pub fn new(index_in_descriptor1: usize, index_in_descriptor2: usize, matching_score: f32) -> Self {
        Self {
            index_in_descriptor1,
            index_in_descriptor2,
            matching_score,
        }
    }
}
