//! Arena-based AST with relation-keyed children.
//!
//! All nodes of a tree live in one [`indextree::Arena`]. Ownership flows strictly
//! from parent to children through the arena's links; a node's parent is a plain
//! [`NodeId`] lookup, never an owning edge. Every reparenting operation detaches
//! the node from its old parent before linking it under the new one, so a node
//! has at most one parent and the structure cannot become cyclic.
//!
//! Each child is stored together with a *relation key* naming its slot under the
//! parent (e.g. `"condition"`, `"body"`, or a synthesized `"0"`, `"1"`, …). Keys
//! are unique among a node's own children.

use core::fmt;
use core::hash::{Hash, Hasher};

use indextree::{Arena, NodeEdge, NodeId};
use smallvec::SmallVec;

use crate::span::SourceLocation;
use crate::trace;

/// Type tag of the placeholder node standing in for a deliberately absent child.
///
/// The exchange format encodes such a child as an explicit `null`. Keeping a node
/// in its place preserves the index ordering of its siblings. This is distinct
/// from a node representing a null literal in the source language, which would
/// carry its own type.
pub const EMPTY_TYPE: &str = "null";

/// Errors raised by tree construction and mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// A node was constructed with an empty type.
    #[error("node type cannot be empty")]
    InvalidNode,

    /// The relation key is already used by another child of the same parent.
    #[error("relation {relation:?} is already used by a child of this node")]
    RelationInUse {
        /// The rejected key
        relation: String,
    },

    /// The operation would make a node its own ancestor.
    #[error("operation would make a node its own ancestor")]
    WouldCycle,
}

/// Payload of one AST node.
#[derive(Debug, Clone)]
pub struct AstNode {
    /// The node type, e.g. `literal`, `varDecl`, `binaryOp`. Never empty.
    pub kind: String,
    /// Literal value, function name, variable name, …
    pub value: Option<String>,
    /// Caller-assigned identifier. Expected to be unique within a tree, but
    /// uniqueness is only enforced where edits are extracted.
    pub id: Option<String>,
    /// Explicit start of the node in its source text.
    pub source_start: Option<SourceLocation>,
    /// Explicit end of the node in its source text.
    pub source_end: Option<SourceLocation>,
    /// Key of the slot this node occupies under its parent. Empty when detached.
    relation: String,
}

impl AstNode {
    /// Create a node with the given type and no value or id.
    pub fn new(kind: impl Into<String>) -> Result<Self, TreeError> {
        let kind = kind.into();
        if kind.is_empty() {
            return Err(TreeError::InvalidNode);
        }
        Ok(Self {
            kind,
            value: None,
            id: None,
            source_start: None,
            source_end: None,
            relation: String::new(),
        })
    }

    /// The placeholder for an absent child (see [`EMPTY_TYPE`]).
    pub fn empty() -> Self {
        Self {
            kind: EMPTY_TYPE.to_owned(),
            value: None,
            id: None,
            source_start: None,
            source_end: None,
            relation: String::new(),
        }
    }

    /// Set the value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set explicit source start and end.
    pub fn with_span(mut self, start: SourceLocation, end: SourceLocation) -> Self {
        self.source_start = Some(start);
        self.source_end = Some(end);
        self
    }

    /// Whether this is an [`EMPTY_TYPE`] placeholder.
    pub fn is_empty_placeholder(&self) -> bool {
        self.kind == EMPTY_TYPE
    }

    /// Compare type and value, and the id too if `compare_ids` is set.
    pub fn shallow_equals(&self, other: &AstNode, compare_ids: bool) -> bool {
        self.kind == other.kind
            && self.value == other.value
            && (!compare_ids || self.id == other.id)
    }

    /// Copy of this node's metadata, detached from any slot.
    fn detached_copy(&self) -> Self {
        Self {
            relation: String::new(),
            ..self.clone()
        }
    }
}

/// Child-index path from the root of a tree to a node.
///
/// Uses `SmallVec<[u32; 16]>` since AST paths rarely go deeper than that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(pub SmallVec<[u32; 16]>);

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", idx)?;
        }
        Ok(())
    }
}

/// An abstract syntax tree.
///
/// Nodes are addressed by [`NodeId`] handles into this tree's arena. Handles stay
/// valid for the lifetime of the tree: removing a child only detaches it, so the
/// detached node can be inspected or re-added later. Passing a handle that
/// belongs to a different tree is a programming error.
///
/// `Clone` duplicates the arena, so handles obtained from the original address
/// the same nodes in the clone. [`Ast::copy`] instead builds a compact tree with
/// fresh handles.
#[derive(Debug, Clone)]
pub struct Ast {
    arena: Arena<AstNode>,
    root: NodeId,
}

impl Ast {
    /// Create a tree consisting of a single root node.
    pub fn new(root: AstNode) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(root.detached_copy());
        Self { arena, root }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node payload.
    pub fn get(&self, id: NodeId) -> &AstNode {
        self.arena[id].get()
    }

    /// Mutable node payload.
    pub fn get_mut(&mut self, id: NodeId) -> &mut AstNode {
        self.arena[id].get_mut()
    }

    /// Allocate a detached node in this tree's arena.
    pub fn new_node(&mut self, node: AstNode) -> NodeId {
        self.arena.new_node(node.detached_copy())
    }

    /// Allocate a node and add it as the last child of `parent`.
    pub fn append_new(
        &mut self,
        parent: NodeId,
        relation: Option<&str>,
        node: AstNode,
    ) -> Result<NodeId, TreeError> {
        let child = self.new_node(node);
        let index = self.child_count(parent);
        self.add_child_at(parent, index, relation, child)?;
        Ok(child)
    }

    /// Parent of a node, `None` for the root and for detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// Children of a node, in order.
    pub fn children(&self, id: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Number of children.
    pub fn child_count(&self, id: NodeId) -> usize {
        id.children(&self.arena).count()
    }

    /// The child at `index`, if any.
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        id.children(&self.arena).nth(index)
    }

    /// The child occupying the slot named `relation`, if any.
    pub fn child_by_relation(&self, id: NodeId, relation: &str) -> Option<NodeId> {
        id.children(&self.arena)
            .find(|&child| self.arena[child].get().relation == relation)
    }

    /// Relation key of a node under its parent, `None` when it has no parent.
    pub fn relation(&self, id: NodeId) -> Option<&str> {
        self.parent(id).map(|_| self.arena[id].get().relation.as_str())
    }

    /// Relation keys of a node's children, in child order.
    pub fn relations(&self, id: NodeId) -> impl Iterator<Item = &str> + '_ {
        id.children(&self.arena)
            .map(|child| self.arena[child].get().relation.as_str())
    }

    /// Position of a node among its siblings, `None` when it has no parent.
    pub fn index(&self, id: NodeId) -> Option<usize> {
        self.parent(id)?;
        Some(id.preceding_siblings(&self.arena).count() - 1)
    }

    /// Number of ancestors above the node.
    pub fn depth(&self, id: NodeId) -> usize {
        id.ancestors(&self.arena).count() - 1
    }

    /// Type of the node's parent.
    pub fn parent_type(&self, id: NodeId) -> Option<&str> {
        self.parent(id).map(|p| self.get(p).kind.as_str())
    }

    /// The subtree rooted at `id`, in pre-order (the node itself first).
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
    }

    /// The subtree rooted at `id`, in post-order (the node itself last).
    pub fn post_order(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.traverse(&self.arena).filter_map(|edge| match edge {
            NodeEdge::End(node) => Some(node),
            NodeEdge::Start(_) => None,
        })
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.descendants(self.root).count()
    }

    /// First node in pre-order carrying the given id.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|&node| self.get(node).id.as_deref() == Some(id))
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        id.ancestors(&self.arena).any(|a| a == ancestor)
    }

    /// Child-index path from the topmost ancestor down to `id`.
    pub fn path_of(&self, id: NodeId) -> NodePath {
        let mut path: SmallVec<[u32; 16]> = id
            .ancestors(&self.arena)
            .filter_map(|node| self.index(node))
            .map(|index| index as u32)
            .collect();
        path.reverse();
        NodePath(path)
    }

    /// Follow a child-index path from the root.
    pub fn node_at(&self, path: &NodePath) -> Option<NodeId> {
        path.0
            .iter()
            .try_fold(self.root, |node, &index| self.child(node, index as usize))
    }

    /// Add `child` as the last child of `parent` under a synthesized relation key.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let index = self.insertion_bound(parent, child);
        self.add_child_at(parent, index, None, child)
    }

    /// Add `child` as the last child of `parent` under the given relation key.
    pub fn add_child_with(
        &mut self,
        parent: NodeId,
        relation: &str,
        child: NodeId,
    ) -> Result<(), TreeError> {
        let index = self.insertion_bound(parent, child);
        self.add_child_at(parent, index, Some(relation), child)
    }

    /// Insert `child` under `parent` at `index`.
    ///
    /// Without a `relation`, the lowest unused integer key not below the current
    /// child count is synthesized. `child` is detached from its previous parent
    /// first; `index` counts the children of `parent` after that detachment.
    ///
    /// Fails without touching the tree if `relation` is already in use under
    /// `parent`, or if `child` is `parent` or one of its ancestors.
    ///
    /// # Panics
    ///
    /// If `index` is greater than the number of children.
    pub fn add_child_at(
        &mut self,
        parent: NodeId,
        index: usize,
        relation: Option<&str>,
        child: NodeId,
    ) -> Result<(), TreeError> {
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::WouldCycle);
        }
        if let Some(relation) = relation
            && self
                .child_by_relation(parent, relation)
                .is_some_and(|taken| taken != child)
        {
            return Err(TreeError::RelationInUse {
                relation: relation.to_owned(),
            });
        }
        let bound = self.insertion_bound(parent, child);
        assert!(
            index <= bound,
            "child index {index} out of range for {bound} children"
        );

        child.detach(&mut self.arena);
        let relation = match relation {
            Some(relation) => relation.to_owned(),
            None => self.synthesize_relation(parent),
        };
        trace!(relation = %relation, index, "add_child");
        self.arena[child].get_mut().relation = relation;

        match self.child(parent, index) {
            Some(anchor) => anchor.insert_before(child, &mut self.arena),
            None => parent.append(child, &mut self.arena),
        }
        Ok(())
    }

    /// Detach and return the child at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> NodeId {
        let Some(child) = self.child(parent, index) else {
            panic!(
                "child index {index} out of range for {} children",
                self.child_count(parent)
            );
        };
        child.detach(&mut self.arena);
        self.arena[child].get_mut().relation.clear();
        child
    }

    /// Detach every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) {
        let children: Vec<NodeId> = self.children(parent).collect();
        for child in children {
            child.detach(&mut self.arena);
            self.arena[child].get_mut().relation.clear();
        }
    }

    /// Put `other` in place of `node`.
    ///
    /// `other` takes `node`'s slot (same index and relation key) under `node`'s
    /// parent, and receives all of `node`'s children with their relation keys and
    /// order. Afterwards `node` has no parent and no children. If `node` is the
    /// root of this tree, `other` becomes the root.
    ///
    /// Fails without touching the tree if `other` lies inside `node`'s subtree or
    /// above it, or if one of `node`'s relation keys is already used by a child
    /// of `other`.
    pub fn replace_with(&mut self, node: NodeId, other: NodeId) -> Result<(), TreeError> {
        if node == other {
            return Ok(());
        }
        if self.is_ancestor_or_self(node, other) || self.is_ancestor_or_self(other, node) {
            return Err(TreeError::WouldCycle);
        }
        if let Some(taken) = self
            .relations(node)
            .find(|&relation| self.child_by_relation(other, relation).is_some())
        {
            return Err(TreeError::RelationInUse {
                relation: taken.to_owned(),
            });
        }

        other.detach(&mut self.arena);
        self.arena[other].get_mut().relation.clear();

        if let (Some(parent), Some(index)) = (self.parent(node), self.index(node)) {
            let relation = self.arena[node].get().relation.clone();
            self.remove_child(parent, index);
            self.add_child_at(parent, index, Some(&relation), other)?;
        }

        let children: Vec<NodeId> = self.children(node).collect();
        for child in children {
            child.detach(&mut self.arena);
            other.append(child, &mut self.arena);
        }

        if self.root == node {
            self.root = other;
        }
        Ok(())
    }

    /// Deep copy of the whole tree into a fresh arena.
    pub fn copy(&self) -> Ast {
        self.copy_subtree(self.root)
    }

    /// Deep copy of the subtree at `id` as a standalone tree.
    ///
    /// Type, value, id, relation keys and source spans are preserved. The copy
    /// shares nothing with this tree.
    pub fn copy_subtree(&self, id: NodeId) -> Ast {
        let mut arena = Arena::with_capacity(self.descendants(id).count());
        let root = clone_subtree(&self.arena, id, &mut arena);
        arena[root].get_mut().relation.clear();
        Ast { arena, root }
    }

    /// Deep copy a subtree of `other` into this arena as a detached node.
    pub fn import(&mut self, other: &Ast, id: NodeId) -> NodeId {
        let copy = clone_subtree(&other.arena, id, &mut self.arena);
        self.arena[copy].get_mut().relation.clear();
        copy
    }

    /// New detached node with `id`'s type, value, id and spans, but no children.
    pub fn shallow_copy(&mut self, id: NodeId) -> NodeId {
        let node = self.get(id).detached_copy();
        self.arena.new_node(node)
    }

    /// Give every id-less node in the tree an id `prefix0`, `prefix1`, …
    ///
    /// Numbers are assigned in pre-order and only consumed by nodes that lacked an id.
    pub fn auto_id(&mut self, prefix: &str) {
        let nodes: Vec<NodeId> = self.descendants(self.root).collect();
        let mut next = 0usize;
        for node in nodes {
            let data = self.get_mut(node);
            if data.id.is_none() {
                data.id = Some(format!("{prefix}{next}"));
                next += 1;
            }
        }
    }

    /// Compare two subtrees node by node.
    ///
    /// Every pair of corresponding nodes must be [shallow-equal](AstNode::shallow_equals),
    /// with the same number of children in the same order. With `compare_relations`,
    /// the children's relation keys must match as well.
    pub fn subtree_equals(
        &self,
        id: NodeId,
        other: &Ast,
        other_id: NodeId,
        compare_ids: bool,
        compare_relations: bool,
    ) -> bool {
        if !self.get(id).shallow_equals(other.get(other_id), compare_ids) {
            return false;
        }
        if self.child_count(id) != other.child_count(other_id) {
            return false;
        }
        if compare_relations && !self.relations(id).eq(other.relations(other_id)) {
            return false;
        }
        self.children(id)
            .zip(other.children(other_id))
            .all(|(a, b)| self.subtree_equals(a, other, b, compare_ids, compare_relations))
    }

    /// Hash type, value and children of a subtree, consistently with [`Ast::subtree_equals`]
    /// without ids or relations.
    pub fn hash_subtree<H: Hasher>(&self, id: NodeId, state: &mut H) {
        let node = self.get(id);
        node.kind.hash(state);
        node.value.hash(state);
        self.child_count(id).hash(state);
        for child in self.children(id) {
            self.hash_subtree(child, state);
        }
    }
}

/// Structural equality of whole trees, ignoring ids and relation keys.
impl PartialEq for Ast {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_equals(self.root, other, other.root, false, false)
    }
}

impl Eq for Ast {}

impl Hash for Ast {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_subtree(self.root, state);
    }
}

impl Ast {
    /// Child count of `parent` once `child` has been detached from it.
    fn insertion_bound(&self, parent: NodeId, child: NodeId) -> usize {
        let count = self.child_count(parent);
        if self.parent(child) == Some(parent) {
            count - 1
        } else {
            count
        }
    }

    fn synthesize_relation(&self, parent: NodeId) -> String {
        let mut next = self.child_count(parent);
        loop {
            let candidate = next.to_string();
            if self.child_by_relation(parent, &candidate).is_none() {
                return candidate;
            }
            next += 1;
        }
    }
}

fn clone_subtree(src: &Arena<AstNode>, id: NodeId, dst: &mut Arena<AstNode>) -> NodeId {
    let copy = dst.new_node(src[id].get().clone());
    for child in id.children(src) {
        let child_copy = clone_subtree(src, child, dst);
        copy.append(child_copy, dst);
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use std::collections::hash_map::DefaultHasher;

    fn node(kind: &str) -> AstNode {
        AstNode::new(kind).unwrap()
    }

    /// script { a: call|print, b: literal|1 }
    fn sample() -> (Ast, NodeId, NodeId) {
        let mut ast = Ast::new(node("script").with_id("s"));
        let root = ast.root();
        let a = ast
            .append_new(root, Some("a"), node("call").with_value("print"))
            .unwrap();
        let b = ast
            .append_new(root, Some("b"), node("literal").with_value("1"))
            .unwrap();
        (ast, a, b)
    }

    fn assert_parent_links(ast: &Ast) {
        for n in ast.descendants(ast.root()) {
            if let Some(p) = ast.parent(n) {
                let index = ast.index(n).unwrap();
                assert!(index < ast.child_count(p));
                assert_eq!(ast.child(p, index), Some(n));
            }
        }
    }

    fn hash_of(ast: &Ast) -> u64 {
        let mut hasher = DefaultHasher::new();
        ast.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_empty_type_rejected() {
        assert_eq!(AstNode::new("").unwrap_err(), TreeError::InvalidNode);
    }

    #[test]
    fn test_synthesized_relations_skip_used_keys() {
        let mut ast = Ast::new(node("list"));
        let root = ast.root();
        ast.append_new(root, Some("1"), node("x")).unwrap();
        // One child exists, so synthesis starts at "1", which is taken.
        let second = ast.append_new(root, None, node("y")).unwrap();
        assert_eq!(ast.relation(second), Some("2"));
        let third = ast.append_new(root, None, node("z")).unwrap();
        assert_eq!(ast.relation(third), Some("3"));
        assert_parent_links(&ast);
    }

    #[test]
    fn test_duplicate_relation_leaves_tree_unchanged() {
        let (mut ast, a, _b) = sample();
        let root = ast.root();
        let extra = ast.new_node(node("extra"));
        let before = ast.copy();

        let err = ast.add_child_with(root, "a", extra).unwrap_err();
        assert_eq!(
            err,
            TreeError::RelationInUse {
                relation: "a".to_owned()
            }
        );
        assert!(ast.subtree_equals(root, &before, before.root(), true, true));
        assert_eq!(ast.parent(extra), None);
        assert_eq!(ast.child_by_relation(root, "a"), Some(a));
    }

    #[test]
    fn test_add_child_at_index() {
        let (mut ast, a, b) = sample();
        let root = ast.root();
        let mid = ast.new_node(node("mid"));
        ast.add_child_at(root, 1, Some("m"), mid).unwrap();
        let order: Vec<_> = ast.children(root).collect();
        assert_eq!(order, vec![a, mid, b]);
        assert_eq!(ast.relations(root).collect::<Vec<_>>(), vec!["a", "m", "b"]);
        assert_parent_links(&ast);
    }

    #[test]
    fn test_reparenting_detaches_first() {
        let (mut ast, a, b) = sample();
        let root = ast.root();
        ast.add_child_with(b, "inner", a).unwrap();
        assert_eq!(ast.parent(a), Some(b));
        assert_eq!(ast.children(root).collect::<Vec<_>>(), vec![b]);
        assert_eq!(ast.index(b), Some(0));
        assert_parent_links(&ast);
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut ast, a, _b) = sample();
        let root = ast.root();
        assert_eq!(ast.add_child(a, root), Err(TreeError::WouldCycle));
        assert_eq!(ast.add_child(a, a), Err(TreeError::WouldCycle));
        assert_eq!(ast.parent(a), Some(root));
    }

    #[test]
    fn test_remove_child_clears_parent() {
        let (mut ast, a, b) = sample();
        let root = ast.root();
        let removed = ast.remove_child(root, 0);
        assert_eq!(removed, a);
        assert_eq!(ast.parent(a), None);
        assert_eq!(ast.relation(a), None);
        assert_eq!(ast.index(b), Some(0));
        assert_parent_links(&ast);
    }

    #[test]
    fn test_remove_child_out_of_range_panics() {
        let (mut ast, _a, _b) = sample();
        let root = ast.root();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            ast.remove_child(root, 2);
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_copy_is_equal_and_independent() {
        let (ast, a, _b) = sample();
        let mut copy = ast.copy();
        assert_eq!(ast, copy);
        assert!(ast.subtree_equals(ast.root(), &copy, copy.root(), true, true));
        assert_eq!(hash_of(&ast), hash_of(&copy));

        let copy_root = copy.root();
        copy.remove_child(copy_root, 0);
        copy.get_mut(copy_root).value = Some("changed".to_owned());
        assert_eq!(ast.child_count(ast.root()), 2);
        assert_eq!(ast.child(ast.root(), 0), Some(a));
        assert_eq!(ast.get(ast.root()).value, None);
        assert_ne!(ast, copy);
    }

    #[test]
    fn test_shallow_copy_has_no_children() {
        let (mut ast, _a, _b) = sample();
        let root = ast.root();
        let copy = ast.shallow_copy(root);
        assert_eq!(ast.child_count(copy), 0);
        assert_eq!(ast.parent(copy), None);
        assert!(ast.get(copy).shallow_equals(ast.get(root), true));
    }

    #[test]
    fn test_replace_with_transfers_slot_and_children() {
        let mut ast = Ast::new(node("script"));
        let root = ast.root();
        let first = ast.append_new(root, Some("first"), node("a")).unwrap();
        let target = ast.append_new(root, Some("target"), node("if")).unwrap();
        let last = ast.append_new(root, Some("last"), node("c")).unwrap();
        let cond = ast.append_new(target, Some("cond"), node("bool")).unwrap();
        let body = ast.append_new(target, Some("body"), node("block")).unwrap();

        let replacement = ast.new_node(node("while"));
        ast.replace_with(target, replacement).unwrap();

        assert_eq!(ast.parent(target), None);
        assert_eq!(ast.child_count(target), 0);
        assert_eq!(
            ast.children(root).collect::<Vec<_>>(),
            vec![first, replacement, last]
        );
        assert_eq!(ast.relation(replacement), Some("target"));
        assert_eq!(
            ast.children(replacement).collect::<Vec<_>>(),
            vec![cond, body]
        );
        assert_eq!(
            ast.relations(replacement).collect::<Vec<_>>(),
            vec!["cond", "body"]
        );
        assert_parent_links(&ast);
    }

    #[test]
    fn test_replace_root_moves_children() {
        let (mut ast, a, b) = sample();
        let old_root = ast.root();
        let new_root = ast.new_node(node("program"));
        ast.replace_with(old_root, new_root).unwrap();
        assert_eq!(ast.root(), new_root);
        assert_eq!(ast.children(new_root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(ast.child_count(old_root), 0);
    }

    #[test]
    fn test_replace_with_descendant_rejected() {
        let (mut ast, a, _b) = sample();
        let root = ast.root();
        assert_eq!(ast.replace_with(root, a), Err(TreeError::WouldCycle));
        assert_eq!(ast.parent(a), Some(root));
    }

    #[test]
    fn test_equality_ignores_ids_unless_requested() {
        let (ast, _a, _b) = sample();
        let mut other = ast.copy();
        let other_root = other.root();
        other.get_mut(other_root).id = Some("different".to_owned());
        assert_eq!(ast, other);
        assert!(!ast.subtree_equals(ast.root(), &other, other_root, true, false));
    }

    #[test]
    fn test_equality_relations_only_when_requested() {
        let mut a = Ast::new(node("root"));
        let ar = a.root();
        a.append_new(ar, Some("x"), node("leaf")).unwrap();
        let mut b = Ast::new(node("root"));
        let br = b.root();
        b.append_new(br, Some("y"), node("leaf")).unwrap();
        assert_eq!(a, b);
        assert!(!a.subtree_equals(ar, &b, br, false, true));
    }

    #[test]
    fn test_import_copies_across_trees() {
        let (source, a, _b) = sample();
        let mut target = Ast::new(node("program"));
        let imported = target.import(&source, source.root());
        let target_root = target.root();
        target.add_child(target_root, imported).unwrap();
        assert!(target.subtree_equals(imported, &source, source.root(), true, true));
        assert_eq!(source.parent(a), Some(source.root()));
    }

    #[test]
    fn test_auto_id_only_fills_missing() {
        let (mut ast, a, b) = sample();
        ast.auto_id("n");
        assert_eq!(ast.get(ast.root()).id.as_deref(), Some("s"));
        assert_eq!(ast.get(a).id.as_deref(), Some("n0"));
        assert_eq!(ast.get(b).id.as_deref(), Some("n1"));
    }

    #[test]
    fn test_paths_and_depth() {
        let (mut ast, _a, b) = sample();
        let deep = ast.append_new(b, None, node("digit")).unwrap();
        let path = ast.path_of(deep);
        assert_eq!(path.to_string(), "1.0");
        assert_eq!(ast.node_at(&path), Some(deep));
        assert_eq!(ast.depth(deep), 2);
        assert_eq!(ast.parent_type(deep), Some("literal"));
        assert_eq!(ast.relation(deep), Some("0"));
    }

    #[test]
    fn test_post_order_ends_with_root() {
        let (ast, a, b) = sample();
        let order: Vec<_> = ast.post_order(ast.root()).collect();
        assert_eq!(order, vec![a, b, ast.root()]);
    }
}
