//! # Sprig
//!
//! Abstract syntax trees with relation-keyed children, and structural edit
//! scripts between two versions of a tree.
//!
//! ## Overview
//!
//! - [`Ast`] stores nodes in an arena. Every child sits in a named slot (its
//!   *relation*) under exactly one parent.
//! - [`NodeMapping`] holds a correspondence between the nodes of two trees.
//! - [`NodeReference`] and [`Slot`] address nodes structurally, so positions in
//!   two different trees can be compared.
//! - [`extract_edits`] turns two trees into [`Edit`]s: insertions, deletions and
//!   moves.
//!
//! The correspondence comes from shared node ids when trees carry them. When they
//! don't, an external [`Aligner`] (for example the `sprig-ted` crate) provides one,
//! driven by an explicit [`CostModel`].
//!
//! ## Usage
//!
//! ```
//! use sprig::{extract_edits, json};
//!
//! let before = json::parse(r#"{"type": "script", "id": "s", "children": [
//!     {"type": "block", "id": "b1", "children": [{"type": "call", "id": "c"}]},
//!     {"type": "block", "id": "b2"}
//! ]}"#)?;
//! let mut after = before.copy();
//! let call = after.find_by_id("c").unwrap();
//! let target = after.find_by_id("b2").unwrap();
//! after.add_child(target, call)?;
//!
//! let edits = extract_edits(&before, &after)?;
//! assert_eq!(edits[0].to_string(), "M: {b1}->{call#00} -> {b2}->{call#00}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]

pub use indextree;

mod tracing_macros;

/// Alignment collaborator contract
pub mod align;
/// Parallel extraction
pub mod batch;
/// Bidirectional mapping
pub mod bimap;
mod edit;
mod extract;
/// JSON exchange format
pub mod json;
/// Pretty-printing and text diffs
pub mod pretty;
/// Node references and slots
pub mod reference;
/// Source locations
pub mod span;
/// Tree representation
pub mod tree;

pub use align::{Aligner, CostModel, UnitCost, mapping_from_pairs};
pub use batch::{extract_all, extract_all_aligned};
pub use bimap::{BiMap, ByAddress, ByValue, Equivalence, NodeMapping};
pub use edit::*;
pub use extract::*;
pub use json::{ParseError, SerializeOptions};
pub use pretty::{LanguageConfig, PrettyOptions};
pub use reference::{NodeReference, Slot, reference_from, reference_to};
pub use span::SourceLocation;
pub use tree::{Ast, AstNode, EMPTY_TYPE, NodePath, TreeError};
