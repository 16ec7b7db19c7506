//! Property tests over randomly shaped trees.

use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};
use sprig::{Ast, AstNode, Edit, extract_edits, json};

const KINDS: &[&str] = &["script", "block", "call", "literal", "if", "stop"];

/// Recipe for a tree: each entry attaches a new node under an earlier one.
#[derive(Debug, Clone)]
struct Shape(Vec<(u8, u8, Option<u8>)>);

impl Arbitrary for Shape {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 24;
        Shape(
            (0..len)
                .map(|_| (u8::arbitrary(g), u8::arbitrary(g), Option::<u8>::arbitrary(g)))
                .collect(),
        )
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Shape))
    }
}

impl Shape {
    fn build(&self) -> Ast {
        let mut ast = Ast::new(AstNode::new("script").unwrap());
        let mut nodes = vec![ast.root()];
        for &(parent, kind, value) in &self.0 {
            let parent = nodes[parent as usize % nodes.len()];
            let mut node = AstNode::new(KINDS[kind as usize % KINDS.len()]).unwrap();
            if let Some(value) = value {
                node = node.with_value(format!("v{}", value % 4));
            }
            nodes.push(ast.append_new(parent, None, node).unwrap());
        }
        ast
    }
}

fn parent_links_hold(ast: &Ast) -> bool {
    ast.descendants(ast.root()).all(|n| match ast.parent(n) {
        None => n == ast.root(),
        Some(p) => ast
            .index(n)
            .is_some_and(|i| i < ast.child_count(p) && ast.child(p, i) == Some(n)),
    })
}

#[test]
fn copy_is_equal_and_independent() {
    fn prop(shape: Shape) -> TestResult {
        let original = shape.build();
        let mut copy = original.copy();
        if original != copy || !parent_links_hold(&copy) {
            return TestResult::failed();
        }
        let count = original.node_count();
        let root = copy.root();
        copy.clear_children(root);
        copy.get_mut(root).value = Some("mutated".into());
        TestResult::from_bool(
            original.node_count() == count
                && original.get(original.root()).value.is_none()
                && parent_links_hold(&original),
        )
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Shape) -> TestResult);
}

#[test]
fn json_round_trip_keeps_ids_and_relations() {
    fn prop(shape: Shape) -> TestResult {
        let mut ast = shape.build();
        ast.auto_id("n");
        let parsed = match json::parse(&ast.to_json()) {
            Ok(parsed) => parsed,
            Err(_) => return TestResult::failed(),
        };
        TestResult::from_bool(ast.subtree_equals(ast.root(), &parsed, parsed.root(), true, true))
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Shape) -> TestResult);
}

#[test]
fn copy_yields_no_edits() {
    fn prop(shape: Shape) -> TestResult {
        let mut ast = shape.build();
        ast.auto_id("n");
        let copy = ast.copy();
        TestResult::from_bool(extract_edits(&ast, &copy).is_ok_and(|edits| edits.is_empty()))
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Shape) -> TestResult);
}

#[test]
fn removing_a_last_leaf_is_one_deletion() {
    fn prop(shape: Shape, pick: usize) -> TestResult {
        let mut from = shape.build();
        from.auto_id("n");
        let leaves: Vec<_> = from
            .descendants(from.root())
            .filter(|&n| {
                from.child_count(n) == 0
                    && from
                        .parent(n)
                        .is_some_and(|p| from.children(p).next_back() == Some(n))
            })
            .collect();
        if leaves.is_empty() {
            return TestResult::discard();
        }
        let leaf = leaves[pick % leaves.len()];

        let mut to = from.copy();
        let to_leaf = to.node_at(&from.path_of(leaf)).unwrap();
        let parent = to.parent(to_leaf).unwrap();
        let index = to.index(to_leaf).unwrap();
        to.remove_child(parent, index);

        let edits = match extract_edits(&from, &to) {
            Ok(edits) => edits,
            Err(_) => return TestResult::failed(),
        };
        TestResult::from_bool(matches!(
            edits.as_slice(),
            [Edit::Deletion { at }] if at.node == leaf
        ))
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Shape, usize) -> TestResult);
}

#[test]
fn replace_with_moves_slot_and_children() {
    fn prop(shape: Shape, pick: usize) -> TestResult {
        let mut ast = shape.build();
        let candidates: Vec<_> = ast
            .descendants(ast.root())
            .filter(|&n| n != ast.root())
            .collect();
        if candidates.is_empty() {
            return TestResult::discard();
        }
        let node = candidates[pick % candidates.len()];
        let parent = ast.parent(node).unwrap();
        let index = ast.index(node).unwrap();
        let relation = ast.relation(node).unwrap().to_owned();
        let children: Vec<_> = ast.children(node).collect();
        let relations: Vec<String> = ast.relations(node).map(str::to_owned).collect();

        let replacement = ast.new_node(AstNode::new("replacement").unwrap());
        if ast.replace_with(node, replacement).is_err() {
            return TestResult::failed();
        }

        TestResult::from_bool(
            ast.parent(node).is_none()
                && ast.child_count(node) == 0
                && ast.child(parent, index) == Some(replacement)
                && ast.relation(replacement) == Some(relation.as_str())
                && ast.children(replacement).collect::<Vec<_>>() == children
                && ast.relations(replacement).collect::<Vec<_>>() == relations
                && parent_links_hold(&ast),
        )
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Shape, usize) -> TestResult);
}
