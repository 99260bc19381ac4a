//! Image, keypoint, descriptor and match types exchanged with the components.

pub mod descriptor;
pub mod image_buffer;
pub mod keypoint;

pub use self::descriptor::*;
pub use self::image_buffer::*;
pub use self::keypoint::*;
