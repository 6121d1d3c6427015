//! # QuickSize
//!
//! Preset width/height nodes and a bounds-safe crop node for node-based
//! image generation hosts.
//!
//! Each size node looks up a fixed `(width, height)` pair for a chosen
//! aspect preset in a per-model resolution table, then orients it: the
//! larger dimension goes to width for horizontal, to height for vertical.
//! The crop node slices a `(batch, height, width, channel)` buffer to a
//! rectangle that is clamped so it always fits and is never empty.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resolution`] | Table lookup with fallback defaults, alignment, and the orientation rule |
//! | [`crop`] | Rectangle clamping and zero-copy slicing of `ndarray` buffers |
//! | [`presets`] | Built-in tables for Flux, Qwen, SD 1.5, SDXL and WAN |
//! | [`nodes`] | Input/output schemas, host value binding, and node entry operations |
//! | [`registry`] | Identifier → display name, category and factory |
//! | [`config`] | `quicksize.toml` loading, merging, validation, and user-defined nodes |
//! | [`imaging`] | Image files ⇄ f32 batch buffers for the `crop` command |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Total Lookups
//!
//! Size nodes never fail. An unknown selector value takes its branch's
//! default, an unknown preset takes the table's default aspect, and the
//! [`resolution::Fallback`] on each result records what was substituted.
//! Hosts get a usable size for any input; the CLI reports the fallback.
//!
//! ## One Resolver, Many Tables
//!
//! Every model family is data: a [`resolution::TableTree`] whose branch
//! levels are picked by selector inputs (a `1.5x` toggle, a megapixel
//! choice, model and video size). Adding a model means adding a table, not
//! another copy of the orientation logic. The same shape is what
//! `[nodes.*]` tables in `quicksize.toml` build.
//!
//! ## Explicit Registry
//!
//! Hosts discover nodes through [`registry::NodeRegistry`], a plain value
//! built at startup, instead of scanning for types at load time.
//!
//! ## Views, Not Copies
//!
//! [`crop::crop`] returns an `ArrayView4` borrowing the caller's buffer.
//! Batch and channel axes pass through untouched.

pub mod config;
pub mod crop;
pub mod imaging;
pub mod nodes;
pub mod output;
pub mod presets;
pub mod registry;
pub mod resolution;

#[cfg(test)]
pub(crate) mod test_helpers;
