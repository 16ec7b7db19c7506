//! Ordered tree edit distance for sprig ASTs.
//!
//! [`ZhangShasha`] implements the classic algorithm from "Simple Fast Algorithms
//! for the Editing Distance between Trees and Related Problems" (Zhang & Shasha,
//! 1989) and plugs into [`sprig::extract_edits_aligned`] as an [`Aligner`]:
//!
//! 1. Number both trees in post-order and record each node's leftmost leaf.
//! 2. For every pair of keyroots, fill a forest distance table; the entries
//!    where both forests are whole subtrees give the tree distances.
//! 3. Walk the tables back from the two roots to recover which nodes were kept
//!    (possibly renamed). Everything else is implied to be inserted or deleted.
//!
//! Time is O(n·m·min(depth, leaves)²) for trees of n and m nodes; it is the
//! expensive path, meant for trees without stable ids.

use rapidhash::RapidHashMap as HashMap;
use sprig::indextree::NodeId;
use sprig::{Aligner, Ast, AstNode, CostModel};

#[cfg(feature = "tracing")]
use tracing::debug;

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($tt:tt)*) => {};
}

const EPSILON: f64 = 1e-9;

/// Zhang–Shasha ordered tree edit distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZhangShasha;

impl ZhangShasha {
    /// Minimum total cost of turning `from` into `to`.
    pub fn distance(&self, from: &Ast, to: &Ast, cost: &dyn CostModel) -> f64 {
        let solver = Solver::new(from, to, cost);
        solver.tree_distance[solver.a.len() - 1][solver.b.len() - 1]
    }
}

impl Aligner for ZhangShasha {
    fn correspondence(&self, from: &Ast, to: &Ast, cost: &dyn CostModel) -> Vec<(usize, usize)> {
        let mut solver = Solver::new(from, to, cost);
        let pairs = solver.mapping();
        debug!(
            distance = solver.tree_distance[solver.a.len() - 1][solver.b.len() - 1],
            pairs = pairs.len(),
            "zhang-shasha"
        );
        pairs
    }
}

/// A tree numbered in post-order.
struct Indexed<'a> {
    nodes: Vec<&'a AstNode>,
    /// Post-order index of each node's leftmost leaf descendant
    leftmost: Vec<usize>,
    /// Highest node for each distinct leftmost leaf, ascending
    keyroots: Vec<usize>,
}

impl<'a> Indexed<'a> {
    fn new(ast: &'a Ast) -> Self {
        let order: Vec<NodeId> = ast.post_order(ast.root()).collect();
        let position: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let mut leftmost = vec![0; order.len()];
        for (i, &node) in order.iter().enumerate() {
            leftmost[i] = match ast.children(node).next() {
                // Children precede their parent in post-order.
                Some(first) => leftmost[position[&first]],
                None => i,
            };
        }

        let mut seen = vec![false; order.len()];
        let mut keyroots = Vec::new();
        for i in (0..order.len()).rev() {
            if !seen[leftmost[i]] {
                seen[leftmost[i]] = true;
                keyroots.push(i);
            }
        }
        keyroots.reverse();

        Self {
            nodes: order.iter().map(|&n| ast.get(n)).collect(),
            leftmost,
            keyroots,
        }
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

struct Solver<'a> {
    a: Indexed<'a>,
    b: Indexed<'a>,
    cost: &'a dyn CostModel,
    tree_distance: Vec<Vec<f64>>,
}

impl<'a> Solver<'a> {
    fn new(from: &'a Ast, to: &'a Ast, cost: &'a dyn CostModel) -> Self {
        let a = Indexed::new(from);
        let b = Indexed::new(to);
        let tree_distance = vec![vec![0.0; b.len()]; a.len()];
        let mut solver = Self {
            a,
            b,
            cost,
            tree_distance,
        };
        let (from_roots, to_roots) = (solver.a.keyroots.clone(), solver.b.keyroots.clone());
        for &i in &from_roots {
            for &j in &to_roots {
                solver.forest_distance(i, j);
            }
        }
        solver
    }

    fn delete(&self, i: usize) -> f64 {
        self.cost.delete(self.a.nodes[i])
    }

    fn insert(&self, j: usize) -> f64 {
        self.cost.insert(self.b.nodes[j])
    }

    fn rename(&self, i: usize, j: usize) -> f64 {
        self.cost.rename(self.a.nodes[i], self.b.nodes[j])
    }

    /// Forest distances between the subtrees rooted at `i` and `j`.
    ///
    /// Row `x` stands for the forest of nodes `leftmost(i) .. leftmost(i) + x`,
    /// column `y` likewise for `j`. Records tree distances along the way.
    fn forest_distance(&mut self, i: usize, j: usize) -> Vec<Vec<f64>> {
        let (li, lj) = (self.a.leftmost[i], self.b.leftmost[j]);
        let (rows, cols) = (i - li + 2, j - lj + 2);
        let mut fd = vec![vec![0.0; cols]; rows];

        for x in 1..rows {
            fd[x][0] = fd[x - 1][0] + self.delete(li + x - 1);
        }
        for y in 1..cols {
            fd[0][y] = fd[0][y - 1] + self.insert(lj + y - 1);
        }

        for x in 1..rows {
            for y in 1..cols {
                let (di, dj) = (li + x - 1, lj + y - 1);
                let delete = fd[x - 1][y] + self.delete(di);
                let insert = fd[x][y - 1] + self.insert(dj);
                if self.a.leftmost[di] == li && self.b.leftmost[dj] == lj {
                    let rename = fd[x - 1][y - 1] + self.rename(di, dj);
                    fd[x][y] = delete.min(insert).min(rename);
                    self.tree_distance[di][dj] = fd[x][y];
                } else {
                    let p = self.a.leftmost[di] - li;
                    let q = self.b.leftmost[dj] - lj;
                    let subtree = fd[p][q] + self.tree_distance[di][dj];
                    fd[x][y] = delete.min(insert).min(subtree);
                }
            }
        }
        fd
    }

    /// Kept node pairs of an optimal edit script, sorted.
    fn mapping(&mut self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        let mut pending = vec![(self.a.len() - 1, self.b.len() - 1)];

        while let Some((i, j)) = pending.pop() {
            let fd = self.forest_distance(i, j);
            let (li, lj) = (self.a.leftmost[i], self.b.leftmost[j]);
            let (mut x, mut y) = (i - li + 1, j - lj + 1);

            while x > 0 || y > 0 {
                if x > 0 && y > 0 {
                    let (di, dj) = (li + x - 1, lj + y - 1);
                    let whole = self.a.leftmost[di] == li && self.b.leftmost[dj] == lj;
                    if whole {
                        if close(fd[x][y], fd[x - 1][y - 1] + self.rename(di, dj)) {
                            pairs.push((di, dj));
                            x -= 1;
                            y -= 1;
                            continue;
                        }
                    } else {
                        let p = self.a.leftmost[di] - li;
                        let q = self.b.leftmost[dj] - lj;
                        if close(fd[x][y], fd[p][q] + self.tree_distance[di][dj]) {
                            pending.push((di, dj));
                            x = p;
                            y = q;
                            continue;
                        }
                    }
                }
                if x > 0 && close(fd[x][y], fd[x - 1][y] + self.delete(li + x - 1)) {
                    x -= 1;
                } else {
                    y -= 1;
                }
            }
        }

        pairs.sort_unstable();
        pairs
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use sprig::{UnitCost, extract_edits_aligned, json};

    fn tree(json: &str) -> Ast {
        json::parse(json).unwrap()
    }

    #[test]
    fn test_identical_trees_map_fully() {
        let a = tree(r#"{"type": "script", "children": [{"type": "a"}, {"type": "b", "children": [{"type": "c"}]}]}"#);
        let b = a.copy();
        assert_eq!(ZhangShasha.distance(&a, &b, &UnitCost), 0.0);
        assert_eq!(
            ZhangShasha.correspondence(&a, &b, &UnitCost),
            vec![(0, 0), (1, 1), (2, 2), (3, 3)]
        );
    }

    #[test]
    fn test_single_rename() {
        let a = tree(r#"{"type": "script", "children": [{"type": "literal", "value": "1"}]}"#);
        let b = tree(r#"{"type": "script", "children": [{"type": "literal", "value": "2"}]}"#);
        assert_eq!(ZhangShasha.distance(&a, &b, &UnitCost), 1.0);
        assert_eq!(
            ZhangShasha.correspondence(&a, &b, &UnitCost),
            vec![(0, 0), (1, 1)]
        );
    }

    #[test]
    fn test_single_insertion() {
        let a = tree(r#"{"type": "script", "children": [{"type": "a"}]}"#);
        let b = tree(r#"{"type": "script", "children": [{"type": "a"}, {"type": "b"}]}"#);
        assert_eq!(ZhangShasha.distance(&a, &b, &UnitCost), 1.0);
        assert_eq!(
            ZhangShasha.correspondence(&a, &b, &UnitCost),
            vec![(0, 0), (1, 2)]
        );
    }

    #[test]
    fn test_inner_deletion_reattaches_children() {
        let a = tree(
            r#"{"type": "script", "children": [{"type": "wrap", "children": [{"type": "a"}, {"type": "b"}]}]}"#,
        );
        let b = tree(r#"{"type": "script", "children": [{"type": "a"}, {"type": "b"}]}"#);
        assert_eq!(ZhangShasha.distance(&a, &b, &UnitCost), 1.0);
        // Post-order: a = [a, b, wrap, script], b = [a, b, script].
        assert_eq!(
            ZhangShasha.correspondence(&a, &b, &UnitCost),
            vec![(0, 0), (1, 1), (3, 2)]
        );
    }

    #[test]
    fn test_distance_is_symmetric_under_unit_cost() {
        let a = tree(
            r#"{"type": "f", "children": [{"type": "d", "children": [{"type": "a"}, {"type": "c", "children": [{"type": "b"}]}]}, {"type": "e"}]}"#,
        );
        let b = tree(
            r#"{"type": "f", "children": [{"type": "c", "children": [{"type": "d", "children": [{"type": "a"}, {"type": "b"}]}]}, {"type": "e"}]}"#,
        );
        // The textbook example from the paper.
        assert_eq!(ZhangShasha.distance(&a, &b, &UnitCost), 2.0);
        assert_eq!(ZhangShasha.distance(&b, &a, &UnitCost), 2.0);
    }

    #[test]
    fn test_aligned_extraction_without_ids() {
        let from = tree(
            r#"{"type": "script", "children": [{"type": "block", "children": [{"type": "call", "value": "say"}]}]}"#,
        );
        let to = tree(
            r#"{"type": "script", "children": [{"type": "block", "children": [{"type": "call", "value": "say"}, {"type": "stop"}]}]}"#,
        );
        let edits = extract_edits_aligned(&from, &to, &ZhangShasha, &UnitCost).unwrap();
        let lines: Vec<String> = edits.iter().map(ToString::to_string).collect();
        assert_eq!(lines, vec!["I: root->{block#00}->{stop#01}"]);
    }

    #[test]
    fn test_renamed_parent_keeps_children_stable() {
        let from = tree(
            r#"{"type": "script", "children": [{"type": "repeat", "value": "3", "children": [{"type": "call", "value": "say"}]}]}"#,
        );
        let to = tree(
            r#"{"type": "script", "children": [{"type": "repeat", "value": "4", "children": [{"type": "call", "value": "say"}]}]}"#,
        );
        let edits = extract_edits_aligned(&from, &to, &ZhangShasha, &UnitCost).unwrap();
        let lines: Vec<String> = edits.iter().map(ToString::to_string).collect();
        // Only the renamed node itself shows up; its child is addressed through
        // the aligned parent.
        assert_eq!(
            lines,
            vec!["D: root->{repeat#00}", "I: root->{repeat#00}"]
        );
    }
}
