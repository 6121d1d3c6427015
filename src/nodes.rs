//! Nodes as the host sees them: declared inputs and outputs plus one entry
//! operation.
//!
//! Hosts hand node inputs over as loosely typed values. [`Bindings`] carries
//! those values by input name; each node turns them into the typed
//! arguments of its operation, substituting declared defaults for anything
//! missing or unparsable. Neither node kind has an error path once inputs
//! are bound.

use crate::crop::{self, CropRect, MAX_EXTENT};
use crate::resolution::{OrientedSize, Orientation, Resolution, TableTree};
use ndarray::ArrayView4;
use std::collections::BTreeMap;
use thiserror::Error;

pub const PRESET_INPUT: &str = "preset";
pub const ORIENTATION_INPUT: &str = "orientation";
pub const CROP_NODE_ID: &str = "QuickCrop";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("expected name=value, got {0:?}")]
    Malformed(String),
}

/// Declared type of one node input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// One of a fixed list of strings.
    Choice { options: Vec<String>, default: String },
    /// A boolean that selects between two table keys.
    Toggle {
        default: bool,
        off: String,
        on: String,
    },
    /// A bounded integer.
    Int {
        default: u32,
        min: u32,
        max: u32,
        step: u32,
    },
    Boolean { default: bool },
    Image,
}

impl InputKind {
    /// Host-facing type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Choice { .. } => "CHOICE",
            Self::Toggle { .. } | Self::Boolean { .. } => "BOOLEAN",
            Self::Int { .. } => "INT",
            Self::Image => "IMAGE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub name: String,
    pub kind: InputKind,
    pub optional: bool,
}

impl InputSpec {
    pub fn choice(name: &str, options: &[&str], default: &str) -> Self {
        Self::required(
            name,
            InputKind::Choice {
                options: options.iter().map(|o| o.to_string()).collect(),
                default: default.to_string(),
            },
        )
    }

    pub fn toggle(name: &str, default: bool, off: &str, on: &str) -> Self {
        Self::required(
            name,
            InputKind::Toggle {
                default,
                off: off.to_string(),
                on: on.to_string(),
            },
        )
    }

    pub fn int(name: &str, default: u32, min: u32, max: u32) -> Self {
        Self::required(
            name,
            InputKind::Int {
                default,
                min,
                max,
                step: 1,
            },
        )
    }

    pub fn boolean(name: &str, default: bool) -> Self {
        Self::required(name, InputKind::Boolean { default })
    }

    pub fn image(name: &str) -> Self {
        Self::required(name, InputKind::Image)
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn required(name: &str, kind: InputKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            optional: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Int,
    Image,
}

impl OutputKind {
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Image => "IMAGE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    pub name: &'static str,
    pub kind: OutputKind,
}

/// Raw input values keyed by input name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(BTreeMap<String, String>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Bind from a `name=value` assignment. The value may contain `=`.
    pub fn assign(&mut self, assignment: &str) -> Result<(), BindingError> {
        match assignment.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                self.set(name.trim(), value.trim());
                Ok(())
            }
            _ => Err(BindingError::Malformed(assignment.to_string())),
        }
    }
}

/// Parse the spellings hosts and shells use for booleans.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Clamp an integer binding into `[min, max]`; unparsable values are `None`.
fn parse_bounded(value: &str, min: u32, max: u32) -> Option<u32> {
    let v: i64 = value.trim().parse().ok()?;
    Some(v.clamp(min as i64, max as i64) as u32)
}

/// Outputs a fixed `(width, height)` pair from a preset table tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeNode {
    id: String,
    display_name: String,
    category: String,
    selectors: Vec<InputSpec>,
    aspect_keys: Vec<String>,
    default_aspect: String,
    tables: TableTree,
    align: Option<u32>,
}

impl SizeNode {
    /// A node over `tables`. Aspect keys default to those of the first
    /// table, the preset default to that table's default key.
    pub fn new(id: &str, display_name: &str, tables: TableTree) -> Self {
        let (aspect_keys, default_aspect) = match tables.tables().first() {
            Some(t) => (
                t.keys().map(str::to_string).collect(),
                t.default_key().to_string(),
            ),
            None => (Vec::new(), String::new()),
        };
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            category: "image/utils".to_string(),
            selectors: Vec::new(),
            aspect_keys,
            default_aspect,
            tables,
            align: None,
        }
    }

    pub fn in_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    /// Add the input that picks the next branch level of the table tree.
    /// Only choices and toggles make sense here.
    pub fn with_selector(mut self, spec: InputSpec) -> Self {
        self.selectors.push(spec);
        self
    }

    /// Override the advertised preset list and its default.
    pub fn with_aspects(mut self, keys: &[&str], default: &str) -> Self {
        self.aspect_keys = keys.iter().map(|k| k.to_string()).collect();
        self.default_aspect = default.to_string();
        self
    }

    /// Snap raw table dimensions down to a multiple of `align`.
    pub fn with_alignment(mut self, align: Option<u32>) -> Self {
        self.align = align;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn tables(&self) -> &TableTree {
        &self.tables
    }

    pub fn align(&self) -> Option<u32> {
        self.align
    }

    /// Selector inputs, one per branch level of the table tree.
    pub fn selectors(&self) -> &[InputSpec] {
        &self.selectors
    }

    pub fn aspect_keys(&self) -> &[String] {
        &self.aspect_keys
    }

    pub fn default_aspect(&self) -> &str {
        &self.default_aspect
    }

    /// Declared inputs in host order: choice selectors, preset, orientation,
    /// then toggles.
    pub fn inputs(&self) -> Vec<InputSpec> {
        let keys: Vec<&str> = self.aspect_keys.iter().map(String::as_str).collect();
        let mut out: Vec<InputSpec> = self
            .selectors
            .iter()
            .filter(|s| !matches!(s.kind, InputKind::Toggle { .. }))
            .cloned()
            .collect();
        out.push(InputSpec::choice(PRESET_INPUT, &keys, &self.default_aspect));
        out.push(InputSpec::choice(
            ORIENTATION_INPUT,
            &[
                Orientation::Horizontal.as_str(),
                Orientation::Vertical.as_str(),
            ],
            Orientation::Horizontal.as_str(),
        ));
        out.extend(
            self.selectors
                .iter()
                .filter(|s| matches!(s.kind, InputKind::Toggle { .. }))
                .cloned(),
        );
        out
    }

    pub fn outputs(&self) -> Vec<OutputSpec> {
        vec![
            OutputSpec {
                name: "width",
                kind: OutputKind::Int,
            },
            OutputSpec {
                name: "height",
                kind: OutputKind::Int,
            },
        ]
    }

    /// Table keys for each selector level, from bound values or defaults.
    pub fn bind(&self, bindings: &Bindings) -> Vec<String> {
        self.selectors
            .iter()
            .map(|spec| {
                let raw = bindings.get(&spec.name);
                match &spec.kind {
                    InputKind::Choice { default, .. } => raw.unwrap_or(default).to_string(),
                    InputKind::Toggle { default, off, on } => {
                        if raw.and_then(parse_bool).unwrap_or(*default) {
                            on.clone()
                        } else {
                            off.clone()
                        }
                    }
                    // Not a table selector; an empty key takes the branch default.
                    _ => String::new(),
                }
            })
            .collect()
    }

    pub fn resolve(
        &self,
        selectors: &[&str],
        aspect: &str,
        orientation: Orientation,
    ) -> Resolution<'_> {
        self.tables
            .resolve_aligned(selectors, aspect, orientation, self.align)
    }

    /// Resolve from host bindings, keeping the lookup details.
    pub fn invoke(&self, bindings: &Bindings) -> Resolution<'_> {
        let selectors = self.bind(bindings);
        let refs: Vec<&str> = selectors.iter().map(String::as_str).collect();
        let preset = bindings.get(PRESET_INPUT).unwrap_or(&self.default_aspect);
        let orientation = bindings
            .get(ORIENTATION_INPUT)
            .map(Orientation::from_binding)
            .unwrap_or_default();
        let resolution = self.resolve(&refs, preset, orientation);
        if resolution.fallback.any() {
            tracing::debug!(
                node = %self.id,
                requested = preset,
                aspect = resolution.aspect,
                path = ?resolution.path,
                levels = ?resolution.fallback.selectors,
                "size lookup used defaults"
            );
        }
        resolution
    }

    /// The node's entry operation: `(width, height)` for the bound inputs.
    pub fn get_size(&self, bindings: &Bindings) -> OrientedSize {
        self.invoke(bindings).size
    }
}

/// Arguments of the crop operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRequest {
    pub rect: CropRect,
    pub constrain_to_image: bool,
}

impl Default for CropRequest {
    fn default() -> Self {
        Self {
            rect: CropRect::default(),
            constrain_to_image: true,
        }
    }
}

/// Crops an image buffer to a rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CropNode;

impl CropNode {
    pub fn id(&self) -> &'static str {
        CROP_NODE_ID
    }

    pub fn display_name(&self) -> &'static str {
        "QuickCrop"
    }

    pub fn category(&self) -> &'static str {
        "QuickSize"
    }

    pub fn inputs(&self) -> Vec<InputSpec> {
        let d = CropRect::default();
        vec![
            InputSpec::image("image"),
            InputSpec::int("x", d.x, 0, MAX_EXTENT),
            InputSpec::int("y", d.y, 0, MAX_EXTENT),
            InputSpec::int("width", d.width, 1, MAX_EXTENT),
            InputSpec::int("height", d.height, 1, MAX_EXTENT),
            InputSpec::boolean("constrain_to_image", true).optional(),
        ]
    }

    pub fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec {
            name: "image",
            kind: OutputKind::Image,
        }]
    }

    /// Typed crop arguments from bindings, clamped to the declared bounds.
    pub fn request(&self, bindings: &Bindings) -> CropRequest {
        let mut req = CropRequest::default();
        for spec in self.inputs() {
            let Some(raw) = bindings.get(&spec.name) else {
                continue;
            };
            match (spec.name.as_str(), &spec.kind) {
                ("x", InputKind::Int { min, max, .. }) => {
                    req.rect.x = parse_bounded(raw, *min, *max).unwrap_or(req.rect.x)
                }
                ("y", InputKind::Int { min, max, .. }) => {
                    req.rect.y = parse_bounded(raw, *min, *max).unwrap_or(req.rect.y)
                }
                ("width", InputKind::Int { min, max, .. }) => {
                    req.rect.width = parse_bounded(raw, *min, *max).unwrap_or(req.rect.width)
                }
                ("height", InputKind::Int { min, max, .. }) => {
                    req.rect.height = parse_bounded(raw, *min, *max).unwrap_or(req.rect.height)
                }
                ("constrain_to_image", _) => {
                    req.constrain_to_image = parse_bool(raw).unwrap_or(req.constrain_to_image)
                }
                _ => {}
            }
        }
        req
    }

    /// The node's entry operation.
    pub fn do_crop<'a>(
        &self,
        image: ArrayView4<'a, f32>,
        request: CropRequest,
    ) -> ArrayView4<'a, f32> {
        crop::crop(image, request.rect, request.constrain_to_image)
    }
}

/// Any node the registry can hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Size(SizeNode),
    Crop(CropNode),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Self::Size(n) => n.id(),
            Self::Crop(n) => n.id(),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Size(n) => n.display_name(),
            Self::Crop(n) => n.display_name(),
        }
    }

    pub fn category(&self) -> &str {
        match self {
            Self::Size(n) => n.category(),
            Self::Crop(n) => n.category(),
        }
    }

    /// Name of the entry operation.
    pub fn function(&self) -> &'static str {
        match self {
            Self::Size(_) => "get_size",
            Self::Crop(_) => "do_crop",
        }
    }

    pub fn inputs(&self) -> Vec<InputSpec> {
        match self {
            Self::Size(n) => n.inputs(),
            Self::Crop(n) => n.inputs(),
        }
    }

    pub fn outputs(&self) -> Vec<OutputSpec> {
        match self {
            Self::Size(n) => n.outputs(),
            Self::Crop(n) => n.outputs(),
        }
    }
}
