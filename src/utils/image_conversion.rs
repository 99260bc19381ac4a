use crate::api::ImageConvertor;
use crate::datastructure::{Image, ImageLayout, PixelData};
use crate::Result;
use std::path::Path;

// ITU-R BT.601 luma weights, as used by OpenCV's RGB to grey conversion
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Layout conversion between grey and RGB images, preserving the data type.
#[derive(Debug, Clone, Copy, Default)]
pub struct LumaConvertor;

impl ImageConvertor for LumaConvertor {
    fn convert(&self, image: &Image, layout: ImageLayout) -> Result<Image> {
        let (width, height) = image.dimensions();
        match (image.layout(), layout) {
            (ImageLayout::Rgb, ImageLayout::Grey) => match image.data() {
                PixelData::U8(data) => Image::grey_u8(
                    width,
                    height,
                    data.chunks_exact(3)
                        .map(|px| luma(px[0] as f32, px[1] as f32, px[2] as f32).round().min(255.0) as u8)
                        .collect(),
                ),
                PixelData::F32(data) => Image::grey_f32(
                    width,
                    height,
                    data.chunks_exact(3).map(|px| luma(px[0], px[1], px[2])).collect(),
                ),
            },
            (ImageLayout::Grey, ImageLayout::Rgb) => match image.data() {
                PixelData::U8(data) => {
                    Image::rgb_u8(width, height, data.iter().flat_map(|&v| [v, v, v]).collect())
                }
                PixelData::F32(data) => {
                    Image::rgb_f32(width, height, data.iter().flat_map(|&v| [v, v, v]).collect())
                }
            },
            _ => Ok(image.clone()),
        }
    }
}

fn luma(r: f32, g: f32, b: f32) -> f32 {
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}

/// Load an image from disk, optionally as normalized 32-bit floats
pub fn load_image(path: &Path, as_float: bool) -> Result<Image> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Image file does not exist: {}",
            path.display()
        ));
    }

    let decoded = image::open(path)?;
    let image = if as_float {
        if decoded.color().has_color() {
            let rgb = decoded.to_rgb32f();
            Image::rgb_f32(rgb.width(), rgb.height(), rgb.into_raw())?
        } else {
            let grey = decoded.to_luma32f();
            Image::grey_f32(grey.width(), grey.height(), grey.into_raw())?
        }
    } else {
        Image::from_dynamic(&decoded)
    };

    validate_image_size(&image, 16)?;
    Ok(image)
}

/// Validate that an image is large enough to hold at least one SIFT neighbourhood
pub fn validate_image_size(image: &Image, min_size: u32) -> Result<()> {
    let (width, height) = image.dimensions();

    if width < min_size || height < min_size {
        return Err(anyhow::anyhow!(
            "Image too small: {}x{}, minimum: {}x{}",
            width,
            height,
            min_size,
            min_size
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastructure::DataType;

    #[test]
    fn test_rgb_to_grey_u8() {
        let image = Image::rgb_u8(2, 1, vec![255, 0, 0, 10, 10, 10]).unwrap();
        let grey = LumaConvertor.convert(&image, ImageLayout::Grey).unwrap();

        assert_eq!(grey.layout(), ImageLayout::Grey);
        assert_eq!(grey.data(), &PixelData::U8(vec![76, 10]));
    }

    #[test]
    fn test_rgb_to_grey_keeps_float_type() {
        let image = Image::rgb_f32(1, 1, vec![1.0, 1.0, 1.0]).unwrap();
        let grey = LumaConvertor.convert(&image, ImageLayout::Grey).unwrap();

        assert_eq!(grey.data_type(), DataType::F32);
        match grey.data() {
            PixelData::F32(data) => assert!((data[0] - 1.0).abs() < 1e-6),
            other => panic!("unexpected data {:?}", other),
        }
    }

    #[test]
    fn test_grey_to_rgb_replicates() {
        let image = Image::grey_u8(1, 2, vec![3, 9]).unwrap();
        let rgb = LumaConvertor.convert(&image, ImageLayout::Rgb).unwrap();
        assert_eq!(rgb.data(), &PixelData::U8(vec![3, 3, 3, 9, 9, 9]));
    }

    #[test]
    fn test_validate_image_size() {
        let small = Image::grey_u8(4, 4, vec![0; 16]).unwrap();
        let large = Image::grey_u8(64, 64, vec![0; 64 * 64]).unwrap();
        assert!(validate_image_size(&small, 8).is_err());
        assert!(validate_image_size(&large, 8).is_ok());
    }
}
