mod common;

use common::*;
use sift_module::engine::{ImageMode, SiftMode};
use sift_module::*;

fn configured_extractor(properties: PropertyMap) -> (SiftDescriptorsExtractor, std::rc::Rc<std::cell::Cell<usize>>) {
    let (factory, calls) = scripted_factory();
    let mut extractor = SiftDescriptorsExtractor::with_engine_factory(factory);
    extractor.configure(&properties).unwrap();
    (extractor, calls)
}

fn unsigned_char() -> PropertyMap {
    PropertyMap::new().with_param("imageMode", "Unsigned Char")
}

#[test]
fn test_one_keypoint_per_feature() {
    let (extractor, calls) = configured_extractor(unsigned_char());
    let image = grey_with_points(32, 32, &[(4, 4), (9, 20), (16, 7)]);

    let (keypoints, descriptors) = extractor.extract(&image).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(keypoints.len(), 3);
    assert_eq!(descriptors.nb_descriptors(), keypoints.len());
    assert_eq!(descriptors.descriptor_length(), SIFT_DESCRIPTOR_LENGTH);
    assert_eq!(descriptors.descriptor_type(), DescriptorType::SiftUint8);
    assert_eq!(descriptors.data_type(), DescriptorDataType::U8);
    assert_eq!(extractor.type_string(), "DescriptorsExtractorType::SIFT");

    for (i, keypoint) in keypoints.iter().enumerate() {
        assert_eq!(keypoint.id, i);
        assert_eq!(keypoint.angle, 0.0);
        assert!(keypoint.size > 0.0);
    }
    let positions: Vec<(f32, f32)> = keypoints.iter().map(|k| (k.x, k.y)).collect();
    assert!(positions.contains(&(9.0, 20.0)));
}

#[test]
fn test_descriptors_are_quantized() {
    let (extractor, _) = configured_extractor(unsigned_char());
    let image = grey_with_points(32, 32, &[(3, 3)]);

    let (_, descriptors) = extractor.extract(&image).unwrap();
    let rows = descriptors.as_u8().unwrap();
    assert_eq!(rows.nrows(), 1);
    assert!(rows.row(0).iter().any(|&v| v > 0));
}

#[test]
fn test_keypoint_color_comes_from_source_image() {
    let (extractor, _) = configured_extractor(unsigned_char());
    let warm = [255, 220, 180];
    let cool = [200, 255, 230];
    let image = rgb_with_points(24, 24, &[((5, 6), warm), ((17, 11), cool)]);

    let (keypoints, descriptors) = extractor.extract(&image).unwrap();

    assert_eq!(keypoints.len(), 2);
    assert_eq!(descriptors.nb_descriptors(), 2);
    for keypoint in &keypoints {
        let expected = if (keypoint.x, keypoint.y) == (5.0, 6.0) { warm } else { cool };
        assert_eq!(keypoint.rgb(), expected);
    }
}

#[test]
fn test_image_mode_mismatch_is_rejected_before_the_engine() {
    // default imageMode is Float
    let (extractor, calls) = configured_extractor(PropertyMap::new());
    let image = grey_with_points(16, 16, &[(2, 2)]);

    let err = extractor.extract(&image).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SiftModuleError>(),
        Some(SiftModuleError::ImageModeMismatch { image_mode: ImageMode::Float, .. })
    ));
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_float_images_in_float_mode() {
    let (extractor, _) = configured_extractor(PropertyMap::new());
    let image = grey_f32_with_points(16, 16, &[(2, 2), (11, 5)]);

    let (keypoints, descriptors) = extractor.extract(&image).unwrap();
    assert_eq!(keypoints.len(), 2);
    assert_eq!(descriptors.nb_descriptors(), 2);
    assert_eq!(keypoints[0].rgb(), [255, 255, 255]);
}

#[test]
fn test_texture_fit_failure() {
    let (extractor, calls) = configured_extractor(unsigned_char());
    // upscaled by 2, one column past the texture limit
    let image = Image::grey_u8(32769, 1, vec![0; 32769]).unwrap();

    let err = extractor.extract(&image).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SiftModuleError>(),
        Some(SiftModuleError::TextureFit { width: 32769, height: 1, .. })
    ));
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_downsampling_lifts_texture_limit() {
    let (extractor, _) = configured_extractor(unsigned_char().with_param("downsampling", 1.0));
    let image = Image::grey_u8(32769, 1, vec![0; 32769]).unwrap();

    let (keypoints, descriptors) = extractor.extract(&image).unwrap();
    assert!(keypoints.is_empty());
    assert!(descriptors.is_empty());
}

#[test]
fn test_max_total_keypoints_keeps_largest_scales() {
    let (extractor, _) = configured_extractor(unsigned_char().with_param("maxTotalKeypoints", 2));
    let image = grey_with_points(32, 32, &[(1, 1), (20, 20), (3, 2), (25, 28)]);

    let (keypoints, descriptors) = extractor.extract(&image).unwrap();
    assert_eq!(keypoints.len(), 2);
    assert_eq!(descriptors.nb_descriptors(), 2);
    for keypoint in &keypoints {
        assert!(keypoint.x >= 20.0, "kept small-scale keypoint at {}", keypoint.x);
    }
}

#[test]
fn test_extract_before_configure() {
    let (factory, calls) = scripted_factory();
    let extractor = SiftDescriptorsExtractor::with_engine_factory(factory);
    let image = grey_with_points(16, 16, &[(2, 2)]);

    let err = extractor.extract(&image).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SiftModuleError>(),
        Some(SiftModuleError::NotConfigured("SiftDescriptorsExtractor"))
    ));
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_unload_and_reconfigure() {
    let (mut extractor, _) = configured_extractor(unsigned_char());
    let image = grey_with_points(16, 16, &[(2, 2)]);
    assert!(extractor.is_configured());

    extractor.unload_component();
    assert!(!extractor.is_configured());
    assert!(extractor.extract(&image).is_err());

    extractor.on_configured().unwrap();
    assert_eq!(extractor.extract(&image).unwrap().0.len(), 1);
}

#[test]
fn test_invalid_choices_fall_back() {
    let properties = PropertyMap::new()
        .with_param("mode", "SURF")
        .with_param("imageMode", "Double");
    let (extractor, _) = configured_extractor(properties);

    let config = extractor.engine_config().unwrap();
    assert_eq!(config.mode, SiftMode::PopSift);
    assert_eq!(config.image_mode, ImageMode::UnsignedChar);
    assert_eq!(extractor.get_property("mode"), Some(serde_json::json!("SURF")));
}

#[test]
fn test_property_errors() {
    let (factory, _) = scripted_factory();
    let mut extractor = SiftDescriptorsExtractor::with_engine_factory(factory);

    let err = extractor.set_property("octaves", &serde_json::json!(4)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SiftModuleError>(),
        Some(SiftModuleError::UnknownProperty { .. })
    ));

    let err = extractor.set_property("nbOctaves", &serde_json::json!("four")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SiftModuleError>(),
        Some(SiftModuleError::InvalidProperty { .. })
    ));
    assert_eq!(extractor.get_property("nbOctaves"), Some(serde_json::json!(0)));
}
