//! Built-in resolution presets.
//!
//! Pairs are stored unoriented, exactly as each model family publishes
//! them; orientation is applied at lookup time.
//!
//! | Node | Selectors | Default preset |
//! |---|---|---|
//! | Flux | `1.5x` toggle | `1:1` |
//! | Qwen | `megapixels` (`1.0`, `1.5`) | `1:1` |
//! | SD 1.5 | `1.5x` toggle | `1:1` |
//! | SDXL | `1.5x` toggle | `1:1` |
//! | WAN | `model_size`, `video_size` | `16:9` |

use crate::nodes::{InputSpec, SizeNode};
use crate::resolution::{Branch, ResolutionTable, TableTree};

type Rows = &'static [(&'static str, (u32, u32))];

pub const FLUX_ID: &str = "QuickSizeFluxNode";
pub const QWEN_ID: &str = "QuickSizeQwen";
pub const SD15_ID: &str = "QuickSizeSD15Node";
pub const SDXL_ID: &str = "QuickSizeSDXLNode";
pub const WAN_ID: &str = "QuickSizeWan";

const TIER_TOGGLE: &str = "1.5x";

// -----------------------------------------------------------------------------
// Flux
// -----------------------------------------------------------------------------

const FLUX_ASPECTS: &[&str] = &["1:1", "2:3", "4:3", "16:9", "21:9"];

const FLUX_1X: Rows = &[
    ("1:1", (1024, 1024)),
    ("2:3", (832, 1216)),
    ("4:3", (1152, 896)),
    ("16:9", (1344, 768)),
    ("21:9", (1536, 640)),
];

const FLUX_15X: Rows = &[
    ("1:1", (1536, 1536)),
    ("2:3", (1248, 1824)),
    ("4:3", (1728, 1344)),
    ("16:9", (2016, 1152)),
    ("21:9", (2304, 960)),
];

// -----------------------------------------------------------------------------
// Qwen
// -----------------------------------------------------------------------------

const QWEN_ASPECTS: &[&str] = &["1:1", "2:3", "4:3", "16:9", "21:9"];

const QWEN_1_0: Rows = &[
    ("1:1", (1328, 1328)),
    ("2:3", (1056, 1584)),
    ("4:3", (1472, 1104)),
    ("16:9", (1664, 928)),
    ("21:9", (1536, 640)),
];

const QWEN_1_5: Rows = &[
    ("1:1", (1992, 1992)),
    ("2:3", (1584, 2376)),
    ("4:3", (2208, 1656)),
    ("16:9", (2496, 1392)),
    ("21:9", (2304, 960)),
];

// -----------------------------------------------------------------------------
// SD 1.5
// -----------------------------------------------------------------------------

// 9:16 is advertised but has no row; it resolves through the 1:1 fallback.
const SD15_ASPECTS: &[&str] = &["1:1", "3:2", "2:3", "4:3", "16:9", "9:16"];

const SD15_1X: Rows = &[
    ("1:1", (512, 512)),
    ("3:2", (768, 512)),
    ("2:3", (512, 768)),
    ("4:3", (768, 576)),
    ("16:9", (912, 512)),
];

const SD15_15X: Rows = &[
    ("1:1", (768, 768)),
    ("3:2", (1152, 768)),
    ("2:3", (768, 1152)),
    ("4:3", (1152, 864)),
    ("16:9", (1360, 768)),
];

// -----------------------------------------------------------------------------
// SDXL
// -----------------------------------------------------------------------------

const SDXL_ASPECTS: &[&str] = &["1:1", "3:2", "2:3", "4:3", "3:4", "16:9", "21:9"];

const SDXL_1X: Rows = &[
    ("1:1", (1024, 1024)),
    ("3:2", (1216, 832)),
    ("2:3", (832, 1216)),
    ("4:3", (1152, 864)),
    ("3:4", (864, 1152)),
    ("16:9", (1344, 768)),
    ("21:9", (1536, 640)),
];

const SDXL_15X: Rows = &[
    ("1:1", (1536, 1536)),
    ("3:2", (1824, 1216)),
    ("2:3", (1216, 1824)),
    ("4:3", (1728, 1296)),
    ("3:4", (1296, 1728)),
    ("16:9", (2016, 1152)),
    ("21:9", (2304, 960)),
];

// -----------------------------------------------------------------------------
// WAN
// -----------------------------------------------------------------------------

const WAN_ASPECTS: &[&str] = &[
    "1:1", "3:2", "2:3", "4:3", "3:4", "16:9", "9:16", "21:9", "9:21",
];
const WAN_DEFAULT_ASPECT: &str = "16:9";

// Shared by both model sizes.
const WAN_480P: Rows = &[
    ("16:9", (832, 480)),
    ("9:16", (480, 832)),
    ("4:3", (640, 480)),
    ("3:4", (480, 640)),
    ("1:1", (576, 576)),
    ("21:9", (896, 384)),
    ("9:21", (384, 896)),
    ("3:2", (720, 480)),
    ("2:3", (480, 720)),
];

// The 5B model's native 720p grid has a 708px short side.
const WAN_5B_720P: Rows = &[
    ("16:9", (1280, 708)),
    ("9:16", (708, 1280)),
    ("4:3", (944, 708)),
    ("3:4", (708, 944)),
    ("1:1", (708, 708)),
    ("21:9", (1652, 708)),
    ("9:21", (708, 1652)),
    ("3:2", (1062, 708)),
    ("2:3", (708, 1062)),
];

const WAN_14B_720P: Rows = &[
    ("16:9", (1280, 720)),
    ("9:16", (720, 1280)),
    ("4:3", (960, 720)),
    ("3:4", (720, 960)),
    ("1:1", (720, 720)),
    ("21:9", (1680, 720)),
    ("9:21", (720, 1680)),
    ("3:2", (1080, 720)),
    ("2:3", (720, 1080)),
];

fn table(rows: Rows) -> ResolutionTable {
    ResolutionTable::new(rows.iter().copied()).expect("built-in rows are non-empty and positive")
}

fn branch(entries: Vec<(&'static str, TableTree)>) -> Branch {
    Branch::new(entries).expect("built-in branches are non-empty")
}

fn tiered(base: Rows, large: Rows) -> TableTree {
    branch(vec![("1.0", table(base).into()), ("1.5", table(large).into())]).into()
}

fn tier_toggle() -> InputSpec {
    InputSpec::toggle(TIER_TOGGLE, false, "1.0", "1.5")
}

pub fn flux() -> SizeNode {
    SizeNode::new(FLUX_ID, "Quick Size (Flux)", tiered(FLUX_1X, FLUX_15X))
        .with_selector(tier_toggle())
        .with_aspects(FLUX_ASPECTS, "1:1")
}

pub fn qwen() -> SizeNode {
    SizeNode::new(QWEN_ID, "Quick Size (Qwen)", tiered(QWEN_1_0, QWEN_1_5))
        .with_selector(InputSpec::choice("megapixels", &["1.0", "1.5"], "1.0"))
        .with_aspects(QWEN_ASPECTS, "1:1")
}

pub fn sd15() -> SizeNode {
    SizeNode::new(SD15_ID, "Quick Size (SD 1.5)", tiered(SD15_1X, SD15_15X))
        .with_selector(tier_toggle())
        .with_aspects(SD15_ASPECTS, "1:1")
}

pub fn sdxl() -> SizeNode {
    SizeNode::new(SDXL_ID, "Quick Size (SDXL)", tiered(SDXL_1X, SDXL_15X))
        .with_selector(tier_toggle())
        .with_aspects(SDXL_ASPECTS, "1:1")
}

pub fn wan() -> SizeNode {
    let video = |p480: Rows, p720: Rows| -> TableTree {
        branch(vec![
            ("480p", wan_table(p480)),
            ("720p", wan_table(p720)),
        ])
        .with_default("720p")
        .into()
    };
    let models = branch(vec![
        ("Wan 5B", video(WAN_480P, WAN_5B_720P)),
        ("Wan 14B", video(WAN_480P, WAN_14B_720P)),
    ])
    .with_default("Wan 14B");

    SizeNode::new(WAN_ID, "Quick Size (WAN)", models.into())
        .in_category("video/utils")
        .with_selector(InputSpec::choice(
            "model_size",
            &["Wan 14B", "Wan 5B"],
            "Wan 14B",
        ))
        .with_selector(InputSpec::choice("video_size", &["720p", "480p"], "720p"))
        .with_aspects(WAN_ASPECTS, WAN_DEFAULT_ASPECT)
}

fn wan_table(rows: Rows) -> TableTree {
    table(rows).with_default(WAN_DEFAULT_ASPECT).into()
}

/// Every built-in size node, in registration order.
pub fn all() -> Vec<SizeNode> {
    vec![flux(), qwen(), sd15(), sdxl(), wan()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Bindings;
    use crate::resolution::{OrientedSize, Orientation};
    use crate::test_helpers::assert_permutation;

    fn size(node: &SizeNode, bindings: &[(&str, &str)]) -> (u32, u32) {
        let mut b = Bindings::new();
        for (k, v) in bindings {
            b.set(k, v);
        }
        let s = node.get_size(&b);
        (s.width, s.height)
    }

    // =========================================================================
    // Table-wide properties
    // =========================================================================

    #[test]
    fn every_entry_resolves_to_a_permutation() {
        for node in all() {
            for table in node.tables().tables() {
                for entry in table.entries() {
                    for o in Orientation::ALL {
                        let got = crate::resolution::orient(entry.width, entry.height, o);
                        assert_permutation(got, entry.width, entry.height);
                        assert!(got.larger() >= got.smaller() && got.smaller() >= 1);
                    }
                }
            }
        }
    }

    #[test]
    fn orientations_are_swaps_for_every_preset() {
        for node in all() {
            for key in node.aspect_keys() {
                let h = node.resolve(&[], key, Orientation::Horizontal).size;
                let v = node.resolve(&[], key, Orientation::Vertical).size;
                assert_eq!((h.width, h.height), (v.height, v.width), "{} {key}", node.id());
            }
        }
    }

    #[test]
    fn advertised_aspects_exist_in_every_table_except_sd15_9_16() {
        for node in all() {
            for table in node.tables().tables() {
                for key in node.aspect_keys() {
                    if node.id() == SD15_ID && key == "9:16" {
                        assert!(!table.contains(key));
                    } else {
                        assert!(table.contains(key), "{} missing {key}", node.id());
                    }
                }
            }
        }
    }

    #[test]
    fn unknown_aspect_matches_node_default() {
        for node in all() {
            let unknown = node.resolve(&[], "99:1", Orientation::Horizontal);
            let default = node.resolve(&[], node.default_aspect(), Orientation::Horizontal);
            assert_eq!(unknown.size, default.size, "{}", node.id());
        }
    }

    // =========================================================================
    // Flux
    // =========================================================================

    #[test]
    fn flux_4_3_both_orientations() {
        let n = flux();
        assert_eq!(size(&n, &[("preset", "4:3")]), (1152, 896));
        assert_eq!(
            size(&n, &[("preset", "4:3"), ("orientation", "vertical")]),
            (896, 1152)
        );
    }

    #[test]
    fn flux_portrait_row_is_reoriented() {
        // Stored as 832x1216; horizontal puts the long side first.
        assert_eq!(size(&flux(), &[("preset", "2:3")]), (1216, 832));
    }

    #[test]
    fn flux_large_tier() {
        assert_eq!(
            size(&flux(), &[("preset", "16:9"), ("1.5x", "true")]),
            (2016, 1152)
        );
    }

    // =========================================================================
    // Qwen
    // =========================================================================

    #[test]
    fn qwen_megapixel_tiers() {
        let n = qwen();
        assert_eq!(size(&n, &[("preset", "16:9")]), (1664, 928));
        assert_eq!(
            size(&n, &[("megapixels", "1.5"), ("preset", "16:9")]),
            (2496, 1392)
        );
    }

    #[test]
    fn qwen_unknown_tier_uses_1_0() {
        assert_eq!(
            size(&qwen(), &[("megapixels", "4.0"), ("preset", "1:1")]),
            (1328, 1328)
        );
    }

    // =========================================================================
    // SD 1.5
    // =========================================================================

    #[test]
    fn sd15_9_16_falls_back_to_square() {
        let n = sd15();
        assert_eq!(size(&n, &[("preset", "9:16")]), (512, 512));
        assert_eq!(
            size(&n, &[("preset", "9:16"), ("1.5x", "true")]),
            (768, 768)
        );
    }

    #[test]
    fn sd15_16_9_vertical() {
        assert_eq!(
            size(&sd15(), &[("preset", "16:9"), ("orientation", "vertical")]),
            (512, 912)
        );
    }

    // =========================================================================
    // SDXL
    // =========================================================================

    #[test]
    fn sdxl_square_large_tier_ignores_orientation() {
        let n = sdxl();
        for o in ["horizontal", "vertical"] {
            assert_eq!(
                size(&n, &[("preset", "1:1"), ("1.5x", "true"), ("orientation", o)]),
                (1536, 1536)
            );
        }
    }

    #[test]
    fn sdxl_3_4_horizontal_is_landscape() {
        assert_eq!(size(&sdxl(), &[("preset", "3:4")]), (1152, 864));
    }

    // =========================================================================
    // WAN
    // =========================================================================

    #[test]
    fn wan_defaults_are_14b_720p_16_9() {
        assert_eq!(size(&wan(), &[]), (1280, 720));
    }

    #[test]
    fn wan_5b_uses_native_708_grid() {
        let n = wan();
        assert_eq!(
            size(&n, &[("model_size", "Wan 5B"), ("preset", "21:9")]),
            (1652, 708)
        );
        assert_eq!(
            size(
                &n,
                &[
                    ("model_size", "Wan 5B"),
                    ("preset", "9:16"),
                    ("orientation", "horizontal")
                ]
            ),
            (1280, 708)
        );
    }

    #[test]
    fn wan_480p_shared_between_models() {
        let n = wan();
        for model in ["Wan 5B", "Wan 14B"] {
            assert_eq!(
                size(
                    &n,
                    &[("model_size", model), ("video_size", "480p"), ("preset", "4:3")]
                ),
                (640, 480)
            );
        }
    }

    #[test]
    fn wan_unknown_selectors_fall_back_per_level() {
        let n = wan();
        // Unknown model → 14B; unknown video size → that model's 720p.
        let r = n.invoke(
            &Bindings::new()
                .with("model_size", "Wan 99B")
                .with("video_size", "4k")
                .with("preset", "1:1"),
        );
        assert_eq!(r.size, OrientedSize::new(720, 720));
        assert_eq!(r.path, vec!["Wan 14B", "720p"]);
        assert_eq!(r.fallback.selectors, vec![0, 1]);
    }

    #[test]
    fn wan_unknown_aspect_uses_16_9() {
        assert_eq!(
            size(&wan(), &[("video_size", "480p"), ("preset", "5:4")]),
            (832, 480)
        );
    }

    #[test]
    fn wan_is_a_video_node() {
        assert_eq!(wan().category(), "video/utils");
        assert_eq!(flux().category(), "image/utils");
    }
}
