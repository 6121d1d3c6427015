//! Configuration module.
//!
//! Handles loading, validating, and merging `quicksize.toml`. The user file
//! is layered over stock defaults, so it only needs the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! [size]
//! orientation = "horizontal"  # used when --orientation is omitted
//! # align = 8                 # snap every size node to a multiple of 8
//!
//! [crop]
//! constrain_to_image = true   # clamp the rectangle inside the image first
//!
//! # User-defined size nodes, one table per node id.
//! [nodes.MyModel]
//! display_name = "Quick Size (My Model)"
//! selector = "tier"           # name of the tier input
//! default_tier = "1.0"
//! default_aspect = "1:1"
//! align = 16
//!
//! [nodes.MyModel.tiers."1.0"]
//! "1:1" = [1024, 1024]
//! "16:9" = [1344, 768]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::nodes::{InputSpec, SizeNode};
use crate::registry;
use crate::resolution::{Branch, Orientation, ResolutionTable, TableTree};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level `quicksize.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuickSizeConfig {
    /// Size command defaults.
    pub size: SizeConfig,
    /// Crop command defaults.
    pub crop: CropConfig,
    /// User-defined size nodes keyed by node id.
    pub nodes: IndexMap<String, CustomNodeConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizeConfig {
    pub orientation: Orientation,
    /// Alignment applied to every size node when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    pub constrain_to_image: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            constrain_to_image: true,
        }
    }
}

/// A size node described in config: one selector level of tiers, each a
/// table of aspect key → `[w, h]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomNodeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_selector")]
    pub selector: String,
    /// Tier used when the selector is unbound or unknown. Defaults to the
    /// first declared tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tier: Option<String>,
    #[serde(default = "default_aspect")]
    pub default_aspect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<u32>,
    /// Tiers and their aspect rows, kept in declaration order. Every tier
    /// defines the same aspect keys.
    pub tiers: IndexMap<String, IndexMap<String, [u32; 2]>>,
}

fn default_category() -> String {
    "image/utils".to_string()
}

fn default_selector() -> String {
    "tier".to_string()
}

fn default_aspect() -> String {
    crate::resolution::DEFAULT_ASPECT.to_string()
}

impl CustomNodeConfig {
    fn validate(&self, id: &str) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Validation(format!("nodes.{id}: {msg}")));
        if self.tiers.is_empty() {
            return invalid("tiers must not be empty".into());
        }
        if let Some(tier) = &self.default_tier {
            if !self.tiers.contains_key(tier) {
                return invalid(format!("default_tier {tier:?} is not a defined tier"));
            }
        }
        if self.align == Some(0) {
            return invalid("align must be at least 1".into());
        }
        let first = self.tiers.values().next();
        for (tier, table) in &self.tiers {
            if table.is_empty() {
                return invalid(format!("tier {tier:?} has no aspects"));
            }
            if !table.contains_key(&self.default_aspect) {
                return invalid(format!(
                    "tier {tier:?} lacks default_aspect {:?}",
                    self.default_aspect
                ));
            }
            if let Some((aspect, _)) = table.iter().find(|(_, [w, h])| *w == 0 || *h == 0) {
                return invalid(format!("tier {tier:?} aspect {aspect:?} has a zero dimension"));
            }
            if let Some(first) = first {
                let differs = table.len() != first.len()
                    || table.keys().any(|k| !first.contains_key(k));
                if differs {
                    let expected: Vec<&str> = first.keys().map(String::as_str).collect();
                    return invalid(format!(
                        "tier {tier:?} must define the same aspects as the first tier {expected:?}"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Build the size node this entry describes.
    pub fn to_size_node(&self, id: &str) -> Result<SizeNode, ConfigError> {
        self.validate(id)?;
        let mut tiers = Vec::new();
        for (tier, rows) in &self.tiers {
            let table = ResolutionTable::new(rows.iter().map(|(k, [w, h])| (k.as_str(), (*w, *h))))
                .map_err(|e| ConfigError::Validation(format!("nodes.{id}.tiers.{tier}: {e}")))?
                .with_default(&self.default_aspect);
            tiers.push((tier.as_str(), TableTree::from(table)));
        }
        let mut branch =
            Branch::new(tiers).map_err(|e| ConfigError::Validation(format!("nodes.{id}: {e}")))?;
        if let Some(tier) = &self.default_tier {
            branch = branch.with_default(tier);
        }

        let options: Vec<&str> = branch.keys().collect();
        let selector = InputSpec::choice(&self.selector, &options, branch.default_key());
        let display_name = self
            .display_name
            .clone()
            .unwrap_or_else(|| format!("Quick Size ({id})"));
        let default_aspect = self.default_aspect.clone();
        let aspect_keys: Vec<String> = self
            .tiers
            .values()
            .next()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        let aspect_refs: Vec<&str> = aspect_keys.iter().map(String::as_str).collect();

        Ok(SizeNode::new(id, &display_name, branch.into())
            .in_category(&self.category)
            .with_selector(selector)
            .with_aspects(&aspect_refs, &default_aspect)
            .with_alignment(self.align))
    }
}

impl QuickSizeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size.align == Some(0) {
            return Err(ConfigError::Validation(
                "size.align must be at least 1".into(),
            ));
        }
        for (id, node) in &self.nodes {
            if registry::builtin_ids().any(|b| b == id) {
                return Err(ConfigError::Validation(format!(
                    "nodes.{id}: id is taken by a built-in node"
                )));
            }
            node.validate(id)?;
        }
        Ok(())
    }

    /// User-defined size nodes, in declaration order.
    pub fn custom_nodes(&self) -> Result<Vec<SizeNode>, ConfigError> {
        self.nodes
            .iter()
            .map(|(id, node)| node.to_size_node(id))
            .collect()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// The stock defaults as a TOML table: the base layer user files merge onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(QuickSizeConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as raw TOML. `Ok(None)` when the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto `base`, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<QuickSizeConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: QuickSizeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `path` over the stock defaults. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<QuickSizeConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// A fully commented stock `quicksize.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# quicksize configuration
# =======================
# All settings are optional; values shown are the defaults.
# Unknown keys cause an error.

# ---------------------------------------------------------------------------
# size: defaults for `quicksize size`
# ---------------------------------------------------------------------------
[size]
# Orientation used when --orientation is not given: "horizontal" puts the
# larger dimension in width, "vertical" puts it in height.
orientation = "horizontal"

# Snap both dimensions of every size node down to a multiple of this value
# (never below 1). Leave unset to use table values verbatim.
# align = 8

# ---------------------------------------------------------------------------
# crop: defaults for `quicksize crop`
# ---------------------------------------------------------------------------
[crop]
# Clamp the requested rectangle inside the image before slicing.
constrain_to_image = true

# ---------------------------------------------------------------------------
# nodes: user-defined size nodes
# ---------------------------------------------------------------------------
# Each [nodes.<id>] table adds a node next to the built-ins. Tiers are the
# values of one selector input; each tier maps aspect keys to [w, h].
# Every tier must contain default_aspect.
#
# [nodes.MyModel]
# display_name = "Quick Size (My Model)"
# category = "image/utils"
# selector = "tier"
# default_tier = "1.0"
# default_aspect = "1:1"
# align = 16
#
# [nodes.MyModel.tiers."1.0"]
# "1:1" = [1024, 1024]
# "16:9" = [1344, 768]
"##
}
