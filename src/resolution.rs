//! Table-driven dimension resolution.
//!
//! A [`ResolutionTable`] maps aspect keys (`"16:9"`, `"2:3"`, ...) to an
//! unoriented `(w, h)` pair. Tables are grouped into a [`TableTree`] whose
//! branch levels are picked by selector values (tier, model, video size).
//! Resolution walks the tree, looks up the aspect key, optionally snaps
//! both dimensions to an alignment unit, then applies the orientation rule:
//!
//! ```text
//! larger  = max(w, h)
//! smaller = min(w, h)
//! horizontal → (larger, smaller)
//! vertical   → (smaller, larger)
//! ```
//!
//! Every lookup is total. Unknown selector values fall back to the branch
//! default and unknown aspect keys fall back to the table default, so any
//! input yields a deterministic size. [`Fallback`] records which defaults
//! were taken.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Aspect key used as the table default when a table contains it.
pub const DEFAULT_ASPECT: &str = "1:1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("table has no entries")]
    Empty,
    #[error("entry {0:?} has a zero dimension")]
    ZeroDimension(String),
    #[error("duplicate key {0:?}")]
    DuplicateKey(String),
}

/// Which way the larger dimension points.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Larger dimension becomes the width.
    #[default]
    Horizontal,
    /// Larger dimension becomes the height.
    Vertical,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Horizontal, Orientation::Vertical];

    /// Lenient parse for host-bound values: anything that is not
    /// `horizontal` is treated as vertical.
    pub fn from_binding(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("horizontal") {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved output dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrientedSize {
    pub width: u32,
    pub height: u32,
}

impl OrientedSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn larger(self) -> u32 {
        self.width.max(self.height)
    }

    pub fn smaller(self) -> u32 {
        self.width.min(self.height)
    }
}

impl fmt::Display for OrientedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Assign the larger of `w`/`h` to the axis named by `orientation`.
///
/// The result is always a permutation of `(w, h)`; square inputs come back
/// unchanged for both orientations.
pub fn orient(w: u32, h: u32, orientation: Orientation) -> OrientedSize {
    let (larger, smaller) = if w >= h { (w, h) } else { (h, w) };
    match orientation {
        Orientation::Horizontal => OrientedSize::new(larger, smaller),
        Orientation::Vertical => OrientedSize::new(smaller, larger),
    }
}

/// Floor `value` to a multiple of `unit`, never below 1.
///
/// Units of 0 or 1 leave the value alone (apart from the floor of 1).
pub fn snap_to_multiple(value: u32, unit: u32) -> u32 {
    if unit <= 1 {
        return value.max(1);
    }
    (value - value % unit).max(1)
}

/// One row of a [`ResolutionTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AspectEntry {
    pub key: String,
    pub width: u32,
    pub height: u32,
}

/// Ordered aspect key → unoriented size mapping with a designated default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTable {
    entries: Vec<AspectEntry>,
    default_index: usize,
}

impl ResolutionTable {
    /// Build a table from `(key, (w, h))` pairs in display order.
    ///
    /// The default key is [`DEFAULT_ASPECT`] when present, otherwise the
    /// first entry.
    pub fn new<K: Into<String>>(
        entries: impl IntoIterator<Item = (K, (u32, u32))>,
    ) -> Result<Self, TableError> {
        let mut rows: Vec<AspectEntry> = Vec::new();
        for (key, (width, height)) in entries {
            let key = key.into();
            if width == 0 || height == 0 {
                return Err(TableError::ZeroDimension(key));
            }
            if rows.iter().any(|r| r.key == key) {
                return Err(TableError::DuplicateKey(key));
            }
            rows.push(AspectEntry { key, width, height });
        }
        if rows.is_empty() {
            return Err(TableError::Empty);
        }
        let default_index = rows
            .iter()
            .position(|r| r.key == DEFAULT_ASPECT)
            .unwrap_or(0);
        Ok(Self {
            entries: rows,
            default_index,
        })
    }

    /// Designate the fallback key. A key the table does not contain leaves
    /// the current default in place.
    pub fn with_default(mut self, key: &str) -> Self {
        if let Some(i) = self.position(key) {
            self.default_index = i;
        }
        self
    }

    pub fn default_key(&self) -> &str {
        &self.entries[self.default_index].key
    }

    pub fn entries(&self) -> &[AspectEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|r| r.key.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Entry for `key`, or the default entry when `key` is absent.
    /// The flag is true when the default was substituted.
    pub fn lookup(&self, key: &str) -> (&AspectEntry, bool) {
        match self.position(key) {
            Some(i) => (&self.entries[i], false),
            None => (&self.entries[self.default_index], true),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|r| r.key == key)
    }
}

/// A selector level: selector value → subtree, with a default entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    entries: Vec<(String, TableTree)>,
    default_index: usize,
}

impl Branch {
    /// Build a branch in display order. The first entry is the default.
    pub fn new<K: Into<String>>(
        entries: impl IntoIterator<Item = (K, TableTree)>,
    ) -> Result<Self, TableError> {
        let mut rows: Vec<(String, TableTree)> = Vec::new();
        for (key, tree) in entries {
            let key = key.into();
            if rows.iter().any(|(k, _)| *k == key) {
                return Err(TableError::DuplicateKey(key));
            }
            rows.push((key, tree));
        }
        if rows.is_empty() {
            return Err(TableError::Empty);
        }
        Ok(Self {
            entries: rows,
            default_index: 0,
        })
    }

    /// Designate the fallback entry. Unknown keys are ignored.
    pub fn with_default(mut self, key: &str) -> Self {
        if let Some(i) = self.entries.iter().position(|(k, _)| k == key) {
            self.default_index = i;
        }
        self
    }

    pub fn default_key(&self) -> &str {
        &self.entries[self.default_index].0
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// The child for `key`; the default child when `key` is absent or unknown.
    fn select(&self, key: Option<&str>) -> (&str, &TableTree, bool) {
        let hit = key.and_then(|k| self.entries.iter().position(|(e, _)| e == k));
        let (i, missed) = match hit {
            Some(i) => (i, false),
            None => (self.default_index, true),
        };
        let (k, tree) = &self.entries[i];
        (k.as_str(), tree, missed)
    }
}

/// Nested tables selected by zero or more selector values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableTree {
    Leaf(ResolutionTable),
    Branch(Branch),
}

impl From<ResolutionTable> for TableTree {
    fn from(table: ResolutionTable) -> Self {
        Self::Leaf(table)
    }
}

impl From<Branch> for TableTree {
    fn from(branch: Branch) -> Self {
        Self::Branch(branch)
    }
}

/// Defaults taken during a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fallback {
    /// Selector levels (0-based) whose value was missing or unknown.
    pub selectors: Vec<usize>,
    /// Whether the aspect key was replaced by the table default.
    pub aspect: bool,
}

impl Fallback {
    pub fn any(&self) -> bool {
        self.aspect || !self.selectors.is_empty()
    }
}

/// The table picked by a selector walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    pub table: &'a ResolutionTable,
    /// Branch keys actually taken, one per level.
    pub path: Vec<&'a str>,
    /// Levels that fell back to their default.
    pub fallback_levels: Vec<usize>,
}

/// Outcome of [`TableTree::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub size: OrientedSize,
    /// Branch keys actually taken, one per level.
    pub path: Vec<&'a str>,
    /// Aspect key actually used.
    pub aspect: &'a str,
    pub fallback: Fallback,
}

impl TableTree {
    /// Walk branch levels, consuming one selector per level. Extra
    /// selectors are ignored; missing ones take the branch default.
    pub fn select<'a>(&'a self, selectors: &[&str]) -> Selection<'a> {
        let mut node = self;
        let mut path = Vec::new();
        let mut fallback_levels = Vec::new();
        let mut level = 0;
        loop {
            match node {
                Self::Leaf(table) => {
                    return Selection {
                        table,
                        path,
                        fallback_levels,
                    };
                }
                Self::Branch(branch) => {
                    let (key, child, missed) = branch.select(selectors.get(level).copied());
                    if missed {
                        fallback_levels.push(level);
                    }
                    path.push(key);
                    node = child;
                    level += 1;
                }
            }
        }
    }

    /// Resolve an oriented size. Never fails.
    pub fn resolve<'a>(
        &'a self,
        selectors: &[&str],
        aspect: &str,
        orientation: Orientation,
    ) -> Resolution<'a> {
        self.resolve_aligned(selectors, aspect, orientation, None)
    }

    /// Like [`resolve`](Self::resolve), snapping both raw dimensions down to
    /// a multiple of `align` before orientation.
    pub fn resolve_aligned<'a>(
        &'a self,
        selectors: &[&str],
        aspect: &str,
        orientation: Orientation,
        align: Option<u32>,
    ) -> Resolution<'a> {
        let selection = self.select(selectors);
        let (entry, aspect_missed) = selection.table.lookup(aspect);
        let (w, h) = match align {
            Some(unit) => (
                snap_to_multiple(entry.width, unit),
                snap_to_multiple(entry.height, unit),
            ),
            None => (entry.width, entry.height),
        };
        Resolution {
            size: orient(w, h, orientation),
            path: selection.path,
            aspect: &entry.key,
            fallback: Fallback {
                selectors: selection.fallback_levels,
                aspect: aspect_missed,
            },
        }
    }

    /// Every table in the tree, depth first.
    pub fn tables(&self) -> Vec<&ResolutionTable> {
        let mut out = Vec::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables<'a>(&'a self, out: &mut Vec<&'a ResolutionTable>) {
        match self {
            Self::Leaf(t) => out.push(t),
            Self::Branch(b) => {
                for (_, child) in &b.entries {
                    child.collect_tables(out);
                }
            }
        }
    }
}
