//! Explicit node registry: identifier → display name, category and factory.
//!
//! Hosts discover nodes through this table instead of scanning for
//! classes. Entries keep registration order, which is also listing order.

use crate::config::QuickSizeConfig;
use crate::nodes::{CropNode, Node, SizeNode};
use crate::presets;

/// Builds a fresh node on every call.
pub type NodeFactory = Box<dyn Fn() -> Node + Send + Sync>;

pub struct NodeEntry {
    pub id: String,
    pub display_name: String,
    pub category: String,
    /// Extra names accepted by [`NodeRegistry::find`].
    pub aliases: Vec<String>,
    factory: NodeFactory,
}

impl NodeEntry {
    pub fn create(&self) -> Node {
        (self.factory)()
    }

    fn answers_to(&self, name: &str) -> bool {
        self.id.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Debug for NodeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeEntry")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("category", &self.category)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct NodeRegistry {
    entries: Vec<NodeEntry>,
}

/// Short names for the built-in nodes.
const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    (presets::FLUX_ID, &["flux"]),
    (presets::QWEN_ID, &["qwen"]),
    (presets::SD15_ID, &["sd15", "sd1.5"]),
    (presets::SDXL_ID, &["sdxl"]),
    (presets::WAN_ID, &["wan"]),
    (crate::nodes::CROP_NODE_ID, &["crop"]),
];

/// Identifiers of the built-in nodes.
pub fn builtin_ids() -> impl Iterator<Item = &'static str> {
    BUILTIN_ALIASES.iter().map(|(id, _)| *id)
}

fn builtin_aliases(id: &str) -> Vec<String> {
    BUILTIN_ALIASES
        .iter()
        .find(|(i, _)| *i == id)
        .map(|(_, a)| a.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five preset size nodes followed by the crop node.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for node in presets::all() {
            let aliases = builtin_aliases(node.id());
            registry.register_size_node(node, aliases);
        }
        registry.register(builtin_aliases(crate::nodes::CROP_NODE_ID), || {
            Node::Crop(CropNode)
        });
        registry
    }

    /// Built-ins plus the user-defined size nodes from `config`.
    pub fn from_config(config: &QuickSizeConfig) -> Result<Self, crate::config::ConfigError> {
        let mut registry = Self::builtin();
        for node in config.custom_nodes()? {
            registry.register_size_node(node, Vec::new());
        }
        Ok(registry)
    }

    /// Register a factory. Id, display name and category are read from a
    /// node it builds. An entry with the same id is replaced in place.
    pub fn register<F>(&mut self, aliases: Vec<String>, factory: F)
    where
        F: Fn() -> Node + Send + Sync + 'static,
    {
        let sample = factory();
        let entry = NodeEntry {
            id: sample.id().to_string(),
            display_name: sample.display_name().to_string(),
            category: sample.category().to_string(),
            aliases,
            factory: Box::new(factory),
        };
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Register a size node; the factory hands out clones of it.
    pub fn register_size_node(&mut self, node: SizeNode, aliases: Vec<String>) {
        self.register(aliases, move || Node::Size(node.clone()));
    }

    /// Exact id lookup.
    pub fn get(&self, id: &str) -> Option<&NodeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Id or alias, ASCII case-insensitive.
    pub fn find(&self, name: &str) -> Option<&NodeEntry> {
        self.get(name)
            .or_else(|| self.entries.iter().find(|e| e.answers_to(name)))
    }

    pub fn entries(&self) -> &[NodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
