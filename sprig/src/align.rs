//! Contract for alignment collaborators.
//!
//! When trees carry no (or few) stable ids, a node correspondence has to come
//! from a tree alignment algorithm. This crate does not pick one: callers pass
//! an [`Aligner`] together with the [`CostModel`] it must use, and the returned
//! index pairs are turned into a [`NodeMapping`].

use indextree::NodeId;

use crate::bimap::NodeMapping;
use crate::extract::ExtractError;
use crate::tree::{Ast, AstNode};

/// Costs of the three tree edit operations.
pub trait CostModel {
    /// Cost of turning `a` into `b` in place.
    fn rename(&self, a: &AstNode, b: &AstNode) -> f64;

    /// Cost of inserting `node`.
    fn insert(&self, node: &AstNode) -> f64;

    /// Cost of deleting `node`.
    fn delete(&self, node: &AstNode) -> f64;
}

/// Rename is free between nodes with the same type and value and costs 1
/// otherwise; insertions and deletions cost 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitCost;

impl CostModel for UnitCost {
    fn rename(&self, a: &AstNode, b: &AstNode) -> f64 {
        if a.shallow_equals(b, false) { 0.0 } else { 1.0 }
    }

    fn insert(&self, _node: &AstNode) -> f64 {
        1.0
    }

    fn delete(&self, _node: &AstNode) -> f64 {
        1.0
    }
}

/// Produces a node correspondence between two trees.
pub trait Aligner {
    /// Pairs `(from_index, to_index)` of corresponding nodes, where each index is
    /// a position in [`Ast::post_order`] of the respective root.
    fn correspondence(&self, from: &Ast, to: &Ast, cost: &dyn CostModel) -> Vec<(usize, usize)>;
}

/// Turn post-order index pairs into a node mapping.
///
/// Later pairs win over earlier ones that share an endpoint.
pub fn mapping_from_pairs(
    from: &Ast,
    to: &Ast,
    pairs: &[(usize, usize)],
) -> Result<NodeMapping, ExtractError> {
    let from_nodes: Vec<NodeId> = from.post_order(from.root()).collect();
    let to_nodes: Vec<NodeId> = to.post_order(to.root()).collect();

    let mut mapping = NodeMapping::new();
    for &(a, b) in pairs {
        let (Some(&from_node), Some(&to_node)) = (from_nodes.get(a), to_nodes.get(b)) else {
            return Err(ExtractError::AlignmentOutOfRange {
                from: a,
                to: b,
                from_len: from_nodes.len(),
                to_len: to_nodes.len(),
            });
        };
        mapping.put(from_node, to_node);
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn tree() -> Ast {
        let mut ast = Ast::new(AstNode::new("root").unwrap());
        let root = ast.root();
        ast.append_new(root, None, AstNode::new("a").unwrap())
            .unwrap();
        ast.append_new(root, None, AstNode::new("b").unwrap())
            .unwrap();
        ast
    }

    #[test]
    fn test_unit_cost() {
        let a = AstNode::new("literal").unwrap().with_value("1");
        let b = AstNode::new("literal").unwrap().with_value("2");
        assert_eq!(UnitCost.rename(&a, &a.clone().with_id("x")), 0.0);
        assert_eq!(UnitCost.rename(&a, &b), 1.0);
        assert_eq!(UnitCost.insert(&a), 1.0);
        assert_eq!(UnitCost.delete(&b), 1.0);
    }

    #[test]
    fn test_pairs_use_post_order_positions() {
        let from = tree();
        let to = tree();
        let mapping = mapping_from_pairs(&from, &to, &[(0, 1), (2, 2)]).unwrap();
        assert_eq!(mapping.len(), 2);
        let from_a = from.child(from.root(), 0).unwrap();
        let to_b = to.child(to.root(), 1).unwrap();
        assert_eq!(mapping.get_from(&from_a), Some(&to_b));
        assert_eq!(mapping.get_from(&from.root()), Some(&to.root()));
    }

    #[test]
    fn test_out_of_range_pair() {
        let from = tree();
        let to = tree();
        let err = mapping_from_pairs(&from, &to, &[(0, 0), (3, 0)]).unwrap_err();
        assert_eq!(
            err,
            ExtractError::AlignmentOutOfRange {
                from: 3,
                to: 0,
                from_len: 3,
                to_len: 3,
            }
        );
    }
}
