//! The extractor and matcher components and their shared property bindings.

pub mod extractor;
pub mod matcher;
pub mod properties;

pub use extractor::SiftDescriptorsExtractor;
pub use matcher::{SiftImageMatcher, MATCH_SCORE};
pub use properties::SiftProperties;

use crate::api::ImageConvertor;
use crate::datastructure::{Image, ImageLayout};
use crate::engine::SiftEngine;
use crate::error::SiftModuleError;
use crate::Result;
use std::borrow::Cow;
use tracing::error;

/// Brings an image into the single-channel form the engine consumes and
/// checks it against the engine's image mode and texture limits.
fn prepare_grey<'a>(
    convertor: &dyn ImageConvertor,
    engine: &dyn SiftEngine,
    image: &'a Image,
) -> Result<Cow<'a, Image>> {
    let grey = if image.nb_channels() != 1 {
        Cow::Owned(convertor.convert(image, ImageLayout::Grey)?)
    } else {
        Cow::Borrowed(image)
    };

    let image_mode = engine.config().image_mode;
    if !image_mode.accepts(grey.data_type()) {
        let err = SiftModuleError::ImageModeMismatch {
            image_type: grey.data_type(),
            image_mode,
        };
        error!("{}", err);
        return Err(err.into());
    }

    let (width, height) = grey.dimensions();
    let fit = engine.test_texture_fit(width, height);
    if !fit.is_ok() {
        let err = SiftModuleError::TextureFit {
            width,
            height,
            reason: fit.error_string(),
        };
        error!("{}", err);
        return Err(err.into());
    }

    Ok(grey)
}
