use crate::datastructure::DataType;
use crate::engine::ImageMode;

/// Failures the components report to their callers.
///
/// The crate-wide [`crate::Result`] is an `anyhow::Result`; these variants can
/// be recovered with `err.downcast_ref::<SiftModuleError>()`.
#[derive(Debug, thiserror::Error)]
pub enum SiftModuleError {
    #[error("image data type {image_type} does not match imageMode {image_mode}; imageMode should be set to {}", image_type.required_image_mode())]
    ImageModeMismatch {
        image_type: DataType,
        image_mode: ImageMode,
    },

    #[error("image {width}x{height} does not fit the engine texture: {reason}")]
    TextureFit {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("component {0} is not configured")]
    NotConfigured(&'static str),

    #[error("component {component} has no property named {name}")]
    UnknownProperty { component: String, name: String },

    #[error("invalid value for property {name}: {reason}")]
    InvalidProperty { name: String, reason: String },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("inconsistent feature set: {0}")]
    InvalidFeatureSet(String),

    #[error("no component with uuid {0} in this module")]
    UnknownComponent(uuid::Uuid),
}

impl DataType {
    fn required_image_mode(&self) -> ImageMode {
        match self {
            DataType::U8 => ImageMode::UnsignedChar,
            DataType::F32 => ImageMode::Float,
        }
    }
}
