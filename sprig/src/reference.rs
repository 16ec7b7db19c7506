//! Structural addresses of nodes.
//!
//! A [`NodeReference`] names a node either by its id or by its position: the
//! reference of its parent, its child index, and its own type and value. Two
//! references built from different trees compare equal when they describe the
//! same slot, which is what edit extraction diffs.

use core::fmt;

use indextree::NodeId;
use serde::Serialize;

use crate::bimap::NodeMapping;
use crate::tree::Ast;

/// Identity descriptor of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "ref", rename_all = "camelCase")]
pub enum NodeReference {
    /// A node carrying a stable id.
    Id {
        /// The node's id
        id: String,
    },
    /// A node addressed through its parent.
    Child {
        /// Reference of the parent; `None` when the parent is a root without id.
        parent: Option<Box<NodeReference>>,
        /// Position among the parent's children
        index: usize,
        /// Node type
        #[serde(rename = "type")]
        kind: String,
        /// Node value
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

impl NodeReference {
    /// Find the node this reference describes in `ast`.
    ///
    /// Positional steps must agree on type and value, not only on the index.
    pub fn resolve(&self, ast: &Ast) -> Option<NodeId> {
        match self {
            NodeReference::Id { id } => ast.find_by_id(id),
            NodeReference::Child {
                parent,
                index,
                kind,
                value,
            } => {
                let parent = match parent {
                    Some(parent) => parent.resolve(ast)?,
                    None => ast.root(),
                };
                let node = ast.child(parent, *index)?;
                let data = ast.get(node);
                (data.kind == *kind && data.value == *value).then_some(node)
            }
        }
    }
}

impl fmt::Display for NodeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeReference::Id { id } => write!(f, "{{{id}}}"),
            NodeReference::Child {
                parent,
                index,
                kind,
                ..
            } => {
                match parent {
                    Some(parent) => write!(f, "{parent}")?,
                    None => write!(f, "root")?,
                }
                write!(f, "->{{{kind}#{index:02}}}")
            }
        }
    }
}

/// Address of a node in the tree it belongs to.
///
/// An id reference when the node has an id, otherwise a positional reference
/// built toward the nearest ancestor with an id. `None` for a root without id.
pub fn reference_from(ast: &Ast, node: NodeId) -> Option<NodeReference> {
    let data = ast.get(node);
    if let Some(id) = &data.id {
        return Some(NodeReference::Id { id: id.clone() });
    }
    let parent = ast.parent(node)?;
    Some(NodeReference::Child {
        parent: reference_from(ast, parent).map(Box::new),
        index: ast.index(node)?,
        kind: data.kind.clone(),
        value: data.value.clone(),
    })
}

/// Address of a node of `to`, expressed in terms of `from` where possible.
///
/// `mapping` associates nodes of `from` with nodes of `to`. A node whose
/// counterpart has an id gets that id; a node whose counterpart has none gets
/// the counterpart's own [`reference_from`]. Unmatched nodes are addressed
/// positionally through their (substituted) ancestors, so an unchanged node
/// under a matched ancestor resolves to the same reference in both trees.
pub fn reference_to(
    from: &Ast,
    to: &Ast,
    node: NodeId,
    mapping: &NodeMapping,
) -> Option<NodeReference> {
    if let Some(&counterpart) = mapping.get_to(&node) {
        return reference_from(from, counterpart);
    }
    let data = to.get(node);
    let parent = to.parent(node)?;
    Some(NodeReference::Child {
        parent: reference_to(from, to, parent, mapping).map(Box::new),
        index: to.index(node)?,
        kind: data.kind.clone(),
        value: data.value.clone(),
    })
}

/// The position a non-root node occupies, paired with the node itself.
///
/// The reference is always positional: the parent's reference, the child index,
/// and the node's type and value. Equality and hashing look at the reference
/// only, so slots from two different trees can be compared.
#[derive(Debug, Clone)]
pub struct Slot {
    /// Where the node sits
    pub reference: NodeReference,
    /// The node in its own tree
    pub node: NodeId,
}

impl Slot {
    /// Slot of a node of the source tree. `None` for the root.
    pub fn from_side(ast: &Ast, node: NodeId) -> Option<Slot> {
        let parent = ast.parent(node)?;
        let data = ast.get(node);
        Some(Slot {
            reference: NodeReference::Child {
                parent: reference_from(ast, parent).map(Box::new),
                index: ast.index(node)?,
                kind: data.kind.clone(),
                value: data.value.clone(),
            },
            node,
        })
    }

    /// Slot of a node of the target tree. `None` for the root.
    ///
    /// The parent is addressed with [`reference_to`]. When the node's counterpart
    /// carries an id, the counterpart's type and value stand in for the node's
    /// own, so a value change on an id-stable node does not alter its slot.
    pub fn to_side(from: &Ast, to: &Ast, node: NodeId, mapping: &NodeMapping) -> Option<Slot> {
        let parent = to.parent(node)?;
        let data = match mapping.get_to(&node) {
            Some(&counterpart) if from.get(counterpart).id.is_some() => from.get(counterpart),
            _ => to.get(node),
        };
        Some(Slot {
            reference: NodeReference::Child {
                parent: reference_to(from, to, parent, mapping).map(Box::new),
                index: to.index(node)?,
                kind: data.kind.clone(),
                value: data.value.clone(),
            },
            node,
        })
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Slot {}

impl core::hash::Hash for Slot {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.reference.fmt(f)
    }
}

impl Serialize for Slot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.reference.serialize(serializer)
    }
}
