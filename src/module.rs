//! Module descriptor and component factory.

use crate::api::{ComponentTraits, Configurable, PropertyInfo};
use crate::components::{SiftDescriptorsExtractor, SiftImageMatcher, SiftProperties};
use crate::engine::EngineFactory;
use crate::error::SiftModuleError;
use crate::Result;
use serde::Serialize;
use uuid::Uuid;

pub const MODULE_UUID: Uuid = Uuid::from_u128(0x4a43732c_a1b2_11eb_bcbc_0242ac130002);
pub const MODULE_NAME: &str = "SiftModule";
pub const MODULE_DESCRIPTION: &str = "SIFT descriptor extraction and image matching components";

/// Identity and properties of a component the module can create.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentInfo {
    pub uuid: Uuid,
    pub name: &'static str,
    pub description: &'static str,
    pub interface: &'static str,
    pub properties: Vec<PropertyInfo>,
}

impl ComponentInfo {
    fn of<T: ComponentTraits>(interface: &'static str) -> Self {
        Self {
            uuid: T::UUID,
            name: T::NAME,
            description: T::DESCRIPTION,
            interface,
            properties: SiftProperties::declared(),
        }
    }
}

/// Components declared by this module, in declaration order.
pub fn components() -> Vec<ComponentInfo> {
    vec![
        ComponentInfo::of::<SiftDescriptorsExtractor>("DescriptorsExtractorFromImage"),
        ComponentInfo::of::<SiftImageMatcher>("ImageMatcher"),
    ]
}

pub fn find_component(name: &str) -> Option<ComponentInfo> {
    components().into_iter().find(|info| info.name == name)
}

/// A freshly created, not yet configured component.
pub enum Component {
    Extractor(SiftDescriptorsExtractor),
    Matcher(SiftImageMatcher),
}

impl Component {
    pub fn uuid(&self) -> Uuid {
        match self {
            Component::Extractor(_) => SiftDescriptorsExtractor::UUID,
            Component::Matcher(_) => SiftImageMatcher::UUID,
        }
    }

    pub fn as_configurable_mut(&mut self) -> &mut dyn Configurable {
        match self {
            Component::Extractor(extractor) => extractor,
            Component::Matcher(matcher) => matcher,
        }
    }

    pub fn into_extractor(self) -> Option<SiftDescriptorsExtractor> {
        match self {
            Component::Extractor(extractor) => Some(extractor),
            Component::Matcher(_) => None,
        }
    }

    pub fn into_matcher(self) -> Option<SiftImageMatcher> {
        match self {
            Component::Matcher(matcher) => Some(matcher),
            Component::Extractor(_) => None,
        }
    }
}

/// Creates the component registered under `uuid`, backed by engines from `engine_factory`.
pub fn create_component_with(uuid: Uuid, engine_factory: EngineFactory) -> Result<Component> {
    if uuid == SiftDescriptorsExtractor::UUID {
        Ok(Component::Extractor(SiftDescriptorsExtractor::with_engine_factory(
            engine_factory,
        )))
    } else if uuid == SiftImageMatcher::UUID {
        Ok(Component::Matcher(SiftImageMatcher::with_engine_factory(engine_factory)))
    } else {
        Err(SiftModuleError::UnknownComponent(uuid).into())
    }
}

/// Creates the component registered under `uuid`, backed by the OpenCV engine.
#[cfg(feature = "opencv")]
pub fn create_component(uuid: Uuid) -> Result<Component> {
    create_component_with(uuid, crate::engine::opencv_factory())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineConfig, SiftEngine};

    fn failing_factory() -> EngineFactory {
        Box::new(|_: &EngineConfig| -> Result<Box<dyn SiftEngine>> { Err(anyhow::anyhow!("no engine in unit tests")) })
    }

    #[test]
    fn test_components_are_listed() {
        let infos = components();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].uuid.to_string(), "7fb2aace-a1b1-11eb-bcbc-0242ac130002");
        assert_eq!(infos[1].uuid.to_string(), "3baab95a-ad25-11eb-8529-0242ac130003");
        assert_eq!(MODULE_UUID.to_string(), "4a43732c-a1b2-11eb-bcbc-0242ac130002");
        assert!(find_component("SiftImageMatcher").is_some());
        assert!(find_component("SiftDetector").is_none());
    }

    #[test]
    fn test_create_by_uuid() {
        let component = create_component_with(SiftImageMatcher::UUID, failing_factory()).unwrap();
        assert_eq!(component.uuid(), SiftImageMatcher::UUID);
        assert!(component.into_matcher().is_some());

        let component = create_component_with(SiftDescriptorsExtractor::UUID, failing_factory()).unwrap();
        assert!(component.into_matcher().is_none());
    }

    #[test]
    fn test_unknown_uuid() {
        let err = create_component_with(MODULE_UUID, failing_factory()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<SiftModuleError>(),
            Some(SiftModuleError::UnknownComponent(uuid)) if *uuid == MODULE_UUID
        ));
    }

    #[test]
    fn test_factory_error_surfaces_on_configure() {
        let mut component = create_component_with(SiftDescriptorsExtractor::UUID, failing_factory()).unwrap();
        let configurable = component.as_configurable_mut();
        assert_eq!(configurable.component_name(), "SiftDescriptorsExtractor");
        assert!(configurable.on_configured().is_err());
    }
}
