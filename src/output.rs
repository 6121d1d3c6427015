//! CLI output formatting.
//!
//! Each command has a `format_*` function returning `Vec<String>` and a
//! `print_*` wrapper that writes to stdout. Format functions are pure. The
//! `--json` forms serialize the [`SizeReport`] and [`NodeSummary`] types.
//!
//! # Output Format
//!
//! ## Nodes
//!
//! ```text
//! 001 Quick Size (Flux) [QuickSizeFluxNode]
//!     Category: image/utils
//!     Aliases: flux
//!     Input preset: CHOICE 1:1 | 2:3 | 4:3 | 16:9 | 21:9 (default 1:1)
//!     Input orientation: CHOICE horizontal | vertical (default horizontal)
//!     Input 1.5x: BOOLEAN (default false)
//!     Output width: INT
//!     Output height: INT
//! ```
//!
//! ## Size
//!
//! ```text
//! Quick Size (Flux) → 1152x896
//!     Preset: 4:3
//!     Orientation: horizontal
//!     1.5x: false
//! ```
//!
//! ## Crop
//!
//! ```text
//! Cropped 2 frames 100x100 → 10x50 at (90, 0)
//!     Wrote crop_0.png
//!     Wrote crop_1.png
//! ```

use crate::crop::SliceBounds;
use crate::nodes::{InputKind, InputSpec, Node, OutputSpec, SizeNode};
use crate::registry::NodeRegistry;
use crate::resolution::{Orientation, Resolution};
use serde::Serialize;
use std::path::PathBuf;

fn index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// One-line description of an input's type, range and default.
fn describe_input(spec: &InputSpec) -> String {
    let ty = spec.kind.type_name();
    let body = match &spec.kind {
        InputKind::Choice { options, default } => {
            format!("{ty} {} (default {default})", options.join(" | "))
        }
        InputKind::Toggle { default, .. } | InputKind::Boolean { default } => {
            format!("{ty} (default {default})")
        }
        InputKind::Int {
            default, min, max, ..
        } => format!("{ty} {min}..={max} (default {default})"),
        InputKind::Image => ty.to_string(),
    };
    if spec.optional {
        format!("{body}, optional")
    } else {
        body
    }
}

// ============================================================================
// Nodes
// ============================================================================

pub fn format_node_list(registry: &NodeRegistry) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, entry) in registry.entries().iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        let node = entry.create();
        lines.push(format!(
            "{} {} [{}]",
            index(i + 1),
            entry.display_name,
            entry.id
        ));
        lines.push(format!("{}Category: {}", indent(1), entry.category));
        if !entry.aliases.is_empty() {
            lines.push(format!("{}Aliases: {}", indent(1), entry.aliases.join(", ")));
        }
        for input in node.inputs() {
            lines.push(format!(
                "{}Input {}: {}",
                indent(1),
                input.name,
                describe_input(&input)
            ));
        }
        for output in node.outputs() {
            lines.push(format!(
                "{}Output {}: {}",
                indent(1),
                output.name,
                output.kind.type_name()
            ));
        }
    }
    lines
}

pub fn print_node_list(registry: &NodeRegistry) {
    for line in format_node_list(registry) {
        println!("{}", line);
    }
}

/// Serializable view of one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub optional: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl From<&InputSpec> for InputSummary {
    fn from(spec: &InputSpec) -> Self {
        let mut summary = InputSummary {
            name: spec.name.clone(),
            type_name: spec.kind.type_name(),
            optional: spec.optional,
            options: Vec::new(),
            default: None,
            min: None,
            max: None,
        };
        match &spec.kind {
            InputKind::Choice { options, default } => {
                summary.options = options.clone();
                summary.default = Some(default.clone().into());
            }
            InputKind::Toggle { default, .. } | InputKind::Boolean { default } => {
                summary.default = Some((*default).into());
            }
            InputKind::Int {
                default, min, max, ..
            } => {
                summary.default = Some((*default).into());
                summary.min = Some(*min);
                summary.max = Some(*max);
            }
            InputKind::Image => {}
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSummary {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub type_name: &'static str,
}

impl From<OutputSpec> for OutputSummary {
    fn from(spec: OutputSpec) -> Self {
        Self {
            name: spec.name,
            type_name: spec.kind.type_name(),
        }
    }
}

/// Serializable node schema, as listed by `nodes --json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub function: &'static str,
    pub aliases: Vec<String>,
    pub inputs: Vec<InputSummary>,
    pub outputs: Vec<OutputSummary>,
}

impl NodeSummary {
    pub fn new(node: &Node, aliases: &[String]) -> Self {
        Self {
            id: node.id().to_string(),
            display_name: node.display_name().to_string(),
            category: node.category().to_string(),
            function: node.function(),
            aliases: aliases.to_vec(),
            inputs: node.inputs().iter().map(InputSummary::from).collect(),
            outputs: node.outputs().into_iter().map(OutputSummary::from).collect(),
        }
    }
}

pub fn node_summaries(registry: &NodeRegistry) -> Vec<NodeSummary> {
    registry
        .entries()
        .iter()
        .map(|e| NodeSummary::new(&e.create(), &e.aliases))
        .collect()
}

// ============================================================================
// Size
// ============================================================================

/// Result of one size lookup, as printed by `size --json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeReport {
    pub node: String,
    pub width: u32,
    pub height: u32,
    pub preset: String,
    pub orientation: Orientation,
    /// Selector input name → value in effect: the table key for choices,
    /// `true`/`false` for toggles.
    pub selectors: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<u32>,
    /// True when any selector or the preset fell back to a default.
    pub fallback: bool,
}

impl SizeReport {
    pub fn new(node: &SizeNode, orientation: Orientation, resolution: &Resolution<'_>) -> Self {
        Self {
            node: node.id().to_string(),
            width: resolution.size.width,
            height: resolution.size.height,
            preset: resolution.aspect.to_string(),
            orientation,
            selectors: node
                .selectors()
                .iter()
                .zip(&resolution.path)
                .map(|(spec, key)| {
                    let value = match &spec.kind {
                        InputKind::Toggle { on, .. } => (*key == on.as_str()).to_string(),
                        _ => key.to_string(),
                    };
                    (spec.name.clone(), value)
                })
                .collect(),
            align: node.align(),
            fallback: resolution.fallback.any(),
        }
    }
}

pub fn format_size(node: &SizeNode, report: &SizeReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} → {}x{}",
        node.display_name(),
        report.width,
        report.height
    )];
    lines.push(format!("{}Preset: {}", indent(1), report.preset));
    lines.push(format!("{}Orientation: {}", indent(1), report.orientation));
    for (name, key) in &report.selectors {
        lines.push(format!("{}{}: {}", indent(1), name, key));
    }
    if let Some(align) = report.align {
        lines.push(format!("{}Aligned to: {}", indent(1), align));
    }
    if report.fallback {
        lines.push(format!("{}(defaults substituted for unknown inputs)", indent(1)));
    }
    lines
}

pub fn print_size(node: &SizeNode, report: &SizeReport) {
    for line in format_size(node, report) {
        println!("{}", line);
    }
}

// ============================================================================
// Crop
// ============================================================================

/// Summary of one `crop` run.
#[derive(Debug, Clone, PartialEq)]
pub struct CropSummary {
    pub frames: usize,
    pub source_width: usize,
    pub source_height: usize,
    pub bounds: SliceBounds,
    pub written: Vec<PathBuf>,
}

pub fn format_crop(summary: &CropSummary) -> Vec<String> {
    let b = &summary.bounds;
    let mut lines = vec![format!(
        "Cropped {} {}x{} → {}x{} at ({}, {})",
        plural(summary.frames, "frame"),
        summary.source_width,
        summary.source_height,
        b.width(),
        b.height(),
        b.x0,
        b.y0
    )];
    for path in &summary.written {
        lines.push(format!("{}Wrote {}", indent(1), path.display()));
    }
    lines
}

pub fn print_crop(summary: &CropSummary) {
    for line in format_crop(summary) {
        println!("{}", line);
    }
}
