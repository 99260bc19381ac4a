use crate::datastructure::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Descriptor computation conventions the engine follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiftMode {
    PopSift,
    OpenCV,
    VLFeat,
}

impl SiftMode {
    pub const VALID_VALUES: [&'static str; 3] = ["PopSift", "OpenCV", "VLFeat"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PopSift" => Some(SiftMode::PopSift),
            "OpenCV" => Some(SiftMode::OpenCV),
            "VLFeat" => Some(SiftMode::VLFeat),
            _ => None,
        }
    }
}

impl fmt::Display for SiftMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiftMode::PopSift => write!(f, "PopSift"),
            SiftMode::OpenCV => write!(f, "OpenCV"),
            SiftMode::VLFeat => write!(f, "VLFeat"),
        }
    }
}

/// Pixel type the engine is built to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMode {
    Float,
    UnsignedChar,
}

impl ImageMode {
    pub const VALID_VALUES: [&'static str; 2] = ["Float", "Unsigned Char"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Float" => Some(ImageMode::Float),
            "Unsigned Char" => Some(ImageMode::UnsignedChar),
            _ => None,
        }
    }

    pub fn accepts(&self, data_type: DataType) -> bool {
        matches!(
            (self, data_type),
            (ImageMode::Float, DataType::F32) | (ImageMode::UnsignedChar, DataType::U8)
        )
    }
}

impl fmt::Display for ImageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageMode::Float => write!(f, "Float"),
            ImageMode::UnsignedChar => write!(f, "Unsigned Char"),
        }
    }
}

/// Descriptor normalization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormMode {
    /// L1-normalized then square-rooted.
    RootSift,
    /// L2-normalized, clamped at 0.2, re-normalized.
    Classic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingMode {
    /// Features are read back on the host.
    Extracting,
    /// Features stay in matchable form for engine-side matching.
    Matching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterSorting {
    LargestScaleFirst,
}

/// Engine configuration object; `None` keeps the engine default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub mode: SiftMode,
    pub image_mode: ImageMode,
    pub processing: ProcessingMode,
    pub octaves: Option<u32>,
    pub levels: Option<u32>,
    pub sigma: Option<f32>,
    pub threshold: Option<f32>,
    pub edge_limit: Option<f32>,
    /// Input is downscaled by `2^downsampling`; unset means the engine upscales by 2.
    pub downsampling: Option<f32>,
    pub initial_blur: Option<f32>,
    pub max_extrema: Option<usize>,
    pub norm_mode: NormMode,
    /// Descriptors are scaled by `2^normalization_multiplier` after normalization.
    pub normalization_multiplier: u32,
    pub filter_sorting: FilterSorting,
    pub max_texture_dimension: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: SiftMode::PopSift,
            image_mode: ImageMode::UnsignedChar,
            processing: ProcessingMode::Extracting,
            octaves: None,
            levels: None,
            sigma: None,
            threshold: None,
            edge_limit: None,
            downsampling: None,
            initial_blur: None,
            max_extrema: None,
            norm_mode: NormMode::RootSift,
            normalization_multiplier: 9,
            filter_sorting: FilterSorting::LargestScaleFirst,
            max_texture_dimension: 65536,
        }
    }
}

impl EngineConfig {
    pub fn new(processing: ProcessingMode, image_mode: ImageMode) -> Self {
        Self {
            processing,
            image_mode,
            ..Self::default()
        }
    }

    pub fn set_octaves(&mut self, octaves: i32) {
        if octaves > 0 {
            self.octaves = Some(octaves as u32);
        }
    }

    pub fn set_levels(&mut self, levels: i32) {
        if levels > 0 {
            self.levels = Some(levels as u32);
        }
    }

    pub fn set_sigma(&mut self, sigma: f32) {
        if sigma > 0.0 {
            self.sigma = Some(sigma);
        }
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        if threshold > 0.0 {
            self.threshold = Some(threshold);
        }
    }

    pub fn set_edge_limit(&mut self, edge_limit: f32) {
        if edge_limit > 0.0 {
            self.edge_limit = Some(edge_limit);
        }
    }

    pub fn set_downsampling(&mut self, downsampling: f32) {
        if downsampling > 0.0 {
            self.downsampling = Some(downsampling);
        }
    }

    pub fn set_initial_blur(&mut self, initial_blur: f32) {
        if initial_blur > 0.0 {
            self.initial_blur = Some(initial_blur);
        }
    }

    pub fn set_filter_max_extrema(&mut self, max_extrema: i64) {
        if max_extrema > 0 {
            self.max_extrema = Some(max_extrema as usize);
        }
    }

    /// Factor applied to the input dimensions before the first octave.
    pub fn input_scale(&self) -> f32 {
        match self.downsampling {
            Some(downsampling) => 2f32.powf(-downsampling),
            None => 2.0,
        }
    }

    pub fn test_texture_fit(&self, width: u32, height: u32) -> AllocTest {
        let scale = self.input_scale();
        let processed_width = (width as f32 * scale).ceil() as u64;
        let processed_height = (height as f32 * scale).ceil() as u64;
        let limit = self.max_texture_dimension as u64;

        if processed_width > limit || processed_height > limit {
            AllocTest::ExceedsTextureLimit {
                processed_width,
                processed_height,
                limit,
            }
        } else {
            AllocTest::Ok
        }
    }
}

/// Outcome of checking whether an image fits the engine's textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocTest {
    Ok,
    ExceedsTextureLimit {
        processed_width: u64,
        processed_height: u64,
        limit: u64,
    },
}

impl AllocTest {
    pub fn is_ok(&self) -> bool {
        matches!(self, AllocTest::Ok)
    }

    pub fn error_string(&self) -> String {
        match self {
            AllocTest::Ok => "image fits".to_string(),
            AllocTest::ExceedsTextureLimit {
                processed_width,
                processed_height,
                limit,
            } => format!(
                "processed size {}x{} exceeds the maximum texture dimension {}",
                processed_width, processed_height, limit
            ),
        }
    }
}
