use crate::error::SiftModuleError;
use crate::Result;
use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel layout of an [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageLayout {
    Grey,
    Rgb,
}

impl ImageLayout {
    pub fn channels(&self) -> usize {
        match self {
            ImageLayout::Grey => 1,
            ImageLayout::Rgb => 3,
        }
    }
}

/// Per-component data type of an [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    U8,
    F32,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::U8 => write!(f, "8U"),
            DataType::F32 => write!(f, "32F"),
        }
    }
}

/// Interleaved, row-major pixel storage.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    /// Float components are expected in `[0, 1]`.
    F32(Vec<f32>),
}

impl PixelData {
    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(data) => data.len(),
            PixelData::F32(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            PixelData::U8(_) => DataType::U8,
            PixelData::F32(_) => DataType::F32,
        }
    }
}

/// An image handed to the extractor or the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    layout: ImageLayout,
    data: PixelData,
}

impl Image {
    pub fn new(width: u32, height: u32, layout: ImageLayout, data: PixelData) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SiftModuleError::InvalidImage(format!(
                "empty image {}x{}",
                width, height
            ))
            .into());
        }

        let expected = width as usize * height as usize * layout.channels();
        if data.len() != expected {
            return Err(SiftModuleError::InvalidImage(format!(
                "{}x{} {:?} image needs {} components, got {}",
                width,
                height,
                layout,
                expected,
                data.len()
            ))
            .into());
        }

        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    pub fn grey_u8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, ImageLayout::Grey, PixelData::U8(data))
    }

    pub fn rgb_u8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, ImageLayout::Rgb, PixelData::U8(data))
    }

    pub fn grey_f32(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        Self::new(width, height, ImageLayout::Grey, PixelData::F32(data))
    }

    pub fn rgb_f32(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        Self::new(width, height, ImageLayout::Rgb, PixelData::F32(data))
    }

    /// Converts a decoded image, keeping float precision for 32-bit float layouts.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(grey) => Self::from(grey),
            DynamicImage::ImageRgb8(rgb) => Self::from(rgb),
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                let rgb = image.to_rgb32f();
                Self {
                    width: rgb.width(),
                    height: rgb.height(),
                    layout: ImageLayout::Rgb,
                    data: PixelData::F32(rgb.into_raw()),
                }
            }
            other if other.color().has_color() => Self::from(&other.to_rgb8()),
            other => Self::from(&other.to_luma8()),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    pub fn nb_channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    /// Color sample at integer pixel coordinates, clamped to the image.
    ///
    /// Grey values are replicated on the three channels; float components
    /// are scaled from `[0, 1]` to `0..=255`.
    pub fn pixel_rgb(&self, x: u32, y: u32) -> [u8; 3] {
        if self.data.is_empty() {
            return [0; 3];
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let channels = self.nb_channels();
        let offset = (y * self.width as usize + x) * channels;

        let component = |i: usize| -> u8 {
            match &self.data {
                PixelData::U8(data) => data[offset + i],
                PixelData::F32(data) => unit_to_u8(data[offset + i]),
            }
        };

        match self.layout {
            ImageLayout::Grey => {
                let value = component(0);
                [value, value, value]
            }
            ImageLayout::Rgb => [component(0), component(1), component(2)],
        }
    }

    /// Color sample at a sub-pixel keypoint location; coordinates are truncated.
    pub fn sample_rgb(&self, x: f32, y: f32) -> [u8; 3] {
        self.pixel_rgb(x.max(0.0) as u32, y.max(0.0) as u32)
    }
}

impl From<&GrayImage> for Image {
    fn from(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            layout: ImageLayout::Grey,
            data: PixelData::U8(image.as_raw().clone()),
        }
    }
}

impl From<&RgbImage> for Image {
    fn from(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            layout: ImageLayout::Rgb,
            data: PixelData::U8(image.as_raw().clone()),
        }
    }
}

pub(crate) fn unit_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
