pub mod api;
pub mod components;
pub mod config;
pub mod datastructure;
pub mod engine;
pub mod error;
pub mod logging;
pub mod module;
pub mod utils;

pub use api::*;
pub use components::{SiftDescriptorsExtractor, SiftImageMatcher, SiftProperties, MATCH_SCORE};
pub use datastructure::*;
pub use error::SiftModuleError;
pub use module::{components, create_component_with, find_component, Component, ComponentInfo};

#[cfg(feature = "opencv")]
pub use module::create_component;

pub type Result<T> = anyhow::Result<T>;
