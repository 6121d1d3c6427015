//! End-to-end use of the library the way a host would drive it: discover
//! nodes through the registry, bind raw input values, invoke.

use ndarray::Array4;
use quicksize::config::{self, QuickSizeConfig};
use quicksize::crop::CropRect;
use quicksize::imaging;
use quicksize::nodes::{Bindings, CropNode, Node};
use quicksize::registry::NodeRegistry;
use quicksize::resolution::OrientedSize;
use std::fs;
use tempfile::TempDir;

fn size_node(registry: &NodeRegistry, name: &str) -> quicksize::nodes::SizeNode {
    match registry.find(name).expect("node is registered").create() {
        Node::Size(node) => node,
        Node::Crop(_) => panic!("{name} is a crop node"),
    }
}

fn bind(pairs: &[(&str, &str)]) -> Bindings {
    pairs
        .iter()
        .fold(Bindings::new(), |b, (k, v)| b.with(k, v))
}

// =============================================================================
// Size nodes through the registry
// =============================================================================

#[test]
fn flux_tier_one_four_by_three() {
    let registry = NodeRegistry::builtin();
    let flux = size_node(&registry, "QuickSizeFluxNode");
    assert_eq!(
        flux.get_size(&bind(&[("preset", "4:3"), ("orientation", "horizontal")])),
        OrientedSize::new(1152, 896)
    );
    assert_eq!(
        flux.get_size(&bind(&[("preset", "4:3"), ("orientation", "vertical")])),
        OrientedSize::new(896, 1152)
    );
}

#[test]
fn sdxl_square_at_one_and_a_half() {
    let registry = NodeRegistry::builtin();
    let sdxl = size_node(&registry, "sdxl");
    for orientation in ["horizontal", "vertical"] {
        let b = bind(&[("preset", "1:1"), ("1.5x", "true"), ("orientation", orientation)]);
        assert_eq!(sdxl.get_size(&b), OrientedSize::new(1536, 1536));
    }
}

#[test]
fn wan_falls_back_through_every_level() {
    let registry = NodeRegistry::builtin();
    let wan = size_node(&registry, "wan");
    // Unknown model and video size: Wan 14B at 720p. Unknown aspect: 16:9.
    let b = bind(&[
        ("model_size", "Wan 99B"),
        ("video_size", "4k"),
        ("preset", "99:1"),
    ]);
    let r = wan.invoke(&b);
    assert_eq!(r.size, OrientedSize::new(1280, 720));
    assert_eq!(r.path, vec!["Wan 14B", "720p"]);
    assert_eq!(r.aspect, "16:9");
    assert_eq!(r.fallback.selectors, vec![0, 1]);
    assert!(r.fallback.aspect);
}

#[test]
fn wan_5b_720p_vertical() {
    let registry = NodeRegistry::builtin();
    let wan = size_node(&registry, "QuickSizeWan");
    let b = bind(&[
        ("model_size", "Wan 5B"),
        ("video_size", "720p"),
        ("preset", "21:9"),
        ("orientation", "vertical"),
    ]);
    assert_eq!(wan.get_size(&b), OrientedSize::new(708, 1652));
}

#[test]
fn qwen_megapixel_choice() {
    let registry = NodeRegistry::builtin();
    let qwen = size_node(&registry, "qwen");
    let b = bind(&[("megapixels", "1.5"), ("preset", "16:9")]);
    assert_eq!(qwen.get_size(&b), OrientedSize::new(2496, 1392));
}

#[test]
fn sd15_advertised_nine_by_sixteen_uses_square() {
    let registry = NodeRegistry::builtin();
    let sd15 = size_node(&registry, "sd15");
    assert_eq!(
        sd15.get_size(&bind(&[("preset", "9:16")])),
        OrientedSize::new(512, 512)
    );
}

// =============================================================================
// Crop node through the registry
// =============================================================================

#[test]
fn crop_node_from_registry_clamps_and_slices() {
    let registry = NodeRegistry::builtin();
    let Node::Crop(node) = registry.find("crop").unwrap().create() else {
        panic!("crop alias should build the crop node");
    };
    let image = Array4::<f32>::from_shape_fn((1, 100, 100, 3), |(_, y, x, c)| {
        (y * 300 + x * 3 + c) as f32
    });
    let request = node.request(&bind(&[("x", "90"), ("y", "0"), ("width", "50"), ("height", "50")]));
    assert_eq!(request.rect, CropRect::new(90, 0, 50, 50));
    let out = node.do_crop(image.view(), request);
    assert_eq!(out.dim(), (1, 50, 10, 3));
    assert_eq!(out[[0, 0, 0, 0]], image[[0, 0, 90, 0]]);
}

#[test]
fn crop_node_full_rect_is_identity() {
    let image = Array4::<f32>::from_shape_fn((2, 8, 6, 1), |(b, y, x, _)| (b * 100 + y * 10 + x) as f32);
    let request = CropNode.request(&bind(&[("width", "6"), ("height", "8")]));
    assert_eq!(CropNode.do_crop(image.view(), request), image.view());
}

// =============================================================================
// Config-defined nodes
// =============================================================================

#[test]
fn configured_node_joins_registry() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("quicksize.toml");
    fs::write(
        &path,
        r#"
[nodes.Cascade]
display_name = "Quick Size (Cascade)"
selector = "stage"
default_tier = "b"

[nodes.Cascade.tiers.a]
"1:1" = [1024, 1024]
"3:2" = [1216, 832]

[nodes.Cascade.tiers.b]
"1:1" = [2048, 2048]
"3:2" = [2432, 1664]
"#,
    )
    .unwrap();

    let config = config::load_config(&path).unwrap();
    let registry = NodeRegistry::from_config(&config).unwrap();
    assert_eq!(registry.len(), 7);
    assert_eq!(registry.entries().last().unwrap().display_name, "Quick Size (Cascade)");

    let node = size_node(&registry, "cascade");
    assert_eq!(node.get_size(&Bindings::new()), OrientedSize::new(2048, 2048));
    let b = bind(&[("stage", "a"), ("preset", "3:2"), ("orientation", "vertical")]);
    assert_eq!(node.get_size(&b), OrientedSize::new(832, 1216));
}

#[test]
fn default_config_registers_builtins_only() {
    let registry = NodeRegistry::from_config(&QuickSizeConfig::default()).unwrap();
    assert_eq!(registry.len(), 6);
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn crop_image_files_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in.png");
    image::RgbImage::from_fn(40, 30, |x, y| image::Rgb([x as u8, y as u8, 7]))
        .save(&input)
        .unwrap();

    let batch = imaging::load_batch(&[input]).unwrap();
    let request = CropNode.request(&bind(&[("x", "35"), ("y", "10"), ("width", "20"), ("height", "5")]));
    let cropped = CropNode.do_crop(batch.view(), request);
    let out = tmp.path().join("out/crop.png");
    let written = imaging::save_batch(cropped, &out).unwrap();

    assert_eq!(written, vec![out.clone()]);
    let img = image::open(&out).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (5, 5));
    assert_eq!(img.get_pixel(0, 0).0, [35, 10, 7]);
}
