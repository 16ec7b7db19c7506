//! Human-readable rendering of trees.
//!
//! Nodes print as `type` or `type|value`. A node with children prints them
//! inline, `call(name, literal|1)`, unless its type is a *body type* for the
//! source language: those open a block with one child per line.
//!
//! ```text
//! script {
//!   if(bool|true, block {
//!     call|print(literal|1)
//!   })
//! }
//! ```
//!
//! Which types have bodies is not known here; it is injected through
//! [`PrettyOptions::is_body_type`], usually from a [`LanguageConfig`].

use core::fmt;
use std::sync::Arc;

use indextree::NodeId;
use similar::{ChangeTag, TextDiff};

use crate::tree::Ast;

/// Per-language knowledge the printer needs.
pub trait LanguageConfig {
    /// Whether nodes of this type hold a block of statements.
    fn node_type_has_body(&self, kind: &str) -> bool;
}

/// Predicate deciding whether a node type renders as a block.
pub type BodyTypePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options for pretty-printing.
#[derive(Clone)]
pub struct PrettyOptions {
    /// Whether to append `|value` to nodes that have one (default: false)
    pub show_values: bool,
    /// Whether to wrap values containing whitespace in backquotes (default: false)
    pub backquote_values_with_whitespace: bool,
    /// Indentation string for one block level (default: "  ")
    pub indent: String,
    /// Which node types render as blocks (default: none)
    pub is_body_type: BodyTypePredicate,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            show_values: false,
            backquote_values_with_whitespace: false,
            indent: "  ".to_string(),
            is_body_type: Arc::new(|_: &str| false),
        }
    }
}

impl fmt::Debug for PrettyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrettyOptions")
            .field("show_values", &self.show_values)
            .field(
                "backquote_values_with_whitespace",
                &self.backquote_values_with_whitespace,
            )
            .field("indent", &self.indent)
            .finish_non_exhaustive()
    }
}

impl PrettyOptions {
    /// Create new default options (compact, no values, no blocks).
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a source language: values shown, body types from `config`.
    pub fn for_language<C>(config: C) -> Self
    where
        C: LanguageConfig + Send + Sync + 'static,
    {
        Self::default()
            .show_values()
            .with_body_types(move |kind| config.node_type_has_body(kind))
    }

    /// Append values to node labels.
    pub fn show_values(mut self) -> Self {
        self.show_values = true;
        self
    }

    /// Backquote values that contain whitespace.
    pub fn backquote_values(mut self) -> Self {
        self.backquote_values_with_whitespace = true;
        self
    }

    /// Set a custom indentation string.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Set the body-type predicate.
    pub fn with_body_types(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_body_type = Arc::new(predicate);
        self
    }
}

impl Ast {
    /// Render the subtree at `node`.
    pub fn pretty_print(&self, node: NodeId, options: &PrettyOptions) -> String {
        let mut out = String::new();
        self.write_pretty(node, options, 0, &mut out);
        out
    }

    fn write_pretty(&self, node: NodeId, options: &PrettyOptions, depth: usize, out: &mut String) {
        let data = self.get(node);
        out.push_str(&data.kind);
        if options.show_values
            && let Some(value) = &data.value
        {
            out.push('|');
            if options.backquote_values_with_whitespace && value.contains(char::is_whitespace) {
                out.push('`');
                out.push_str(value);
                out.push('`');
            } else {
                out.push_str(value);
            }
        }

        if self.child_count(node) == 0 {
            return;
        }

        if (options.is_body_type)(&data.kind) {
            out.push_str(" {\n");
            for child in self.children(node) {
                push_indent(out, &options.indent, depth + 1);
                self.write_pretty(child, options, depth + 1, out);
                out.push('\n');
            }
            push_indent(out, &options.indent, depth);
            out.push('}');
        } else {
            out.push('(');
            for (i, child) in self.children(node).enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                self.write_pretty(child, options, depth, out);
            }
            out.push(')');
        }
    }
}

fn push_indent(out: &mut String, indent: &str, depth: usize) {
    for _ in 0..depth {
        out.push_str(indent);
    }
}

/// Compact single-line form: types only, no blocks.
impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print(self.root(), &PrettyOptions::default()))
    }
}

/// Line diff of two pretty-printed trees.
///
/// Removed lines start with `- `, added lines with `+ `, unchanged lines with
/// two spaces. Only `context` unchanged lines are kept around each change;
/// skipped stretches are marked with `...`. Returns an empty string when the
/// renderings are identical.
pub fn diff(a: &Ast, b: &Ast, options: &PrettyOptions, context: usize) -> String {
    let old = a.pretty_print(a.root(), options) + "\n";
    let new = b.pretty_print(b.root(), options) + "\n";
    let diff = TextDiff::from_lines(&old, &new);

    let mut out = String::new();
    for (i, group) in diff.grouped_ops(context).iter().enumerate() {
        if i > 0 {
            out.push_str("...\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let prefix = match change.tag() {
                    ChangeTag::Delete => "- ",
                    ChangeTag::Insert => "+ ",
                    ChangeTag::Equal => "  ",
                };
                out.push_str(prefix);
                out.push_str(change.value());
                if !change.value().ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }
    out
}
