//! Edit script extraction.
//!
//! Turns a node correspondence between two trees into insertions, deletions and
//! moves:
//! 1. Correspondence: pair nodes sharing an id, or ask an [`Aligner`].
//! 2. Slots: the positional [`Slot`] of every non-root node, source nodes
//!    addressed within the source tree, target nodes addressed through their
//!    counterparts.
//! 3. Difference: slots only in the source are removed, slots only in the
//!    target are added.
//! 4. Moves: a removed slot whose node has an id is paired with the first added
//!    slot whose node has the same id.
//! 5. Everything left over becomes a deletion or an insertion.
//!
//! The script lists moves, then deletions, then insertions. Within each group
//! edits follow the pre-order of the tree their (first) slot belongs to.

use crate::{debug, trace};

use indextree::NodeId;
use rapidhash::{RapidHashMap as HashMap, RapidHashSet as HashSet};

use crate::align::{Aligner, CostModel, mapping_from_pairs};
use crate::bimap::NodeMapping;
use crate::edit::Edit;
use crate::reference::Slot;
use crate::tree::Ast;

/// Errors that abort an extraction. No partial script is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// Two nodes of the same tree carry the same id.
    #[error("duplicate id {id:?} in tree")]
    DuplicateId {
        /// The repeated id
        id: String,
    },

    /// An aligner returned an index outside the post-order of a tree.
    #[error(
        "alignment pair ({from}, {to}) out of range for trees of {from_len} and {to_len} nodes"
    )]
    AlignmentOutOfRange {
        /// Index into the source tree
        from: usize,
        /// Index into the target tree
        to: usize,
        /// Node count of the source tree
        from_len: usize,
        /// Node count of the target tree
        to_len: usize,
    },
}

/// Wrapper for collecting edits with automatic tracing.
struct Edits {
    inner: Vec<Edit>,
}

impl Edits {
    fn new() -> Self {
        Self { inner: Vec::new() }
    }

    fn push(&mut self, edit: Edit) {
        debug!(%edit, "emit");
        self.inner.push(edit);
    }

    fn into_inner(self) -> Vec<Edit> {
        self.inner
    }
}

/// Map every id in `ast` to its node.
pub fn id_index(ast: &Ast) -> Result<HashMap<&str, NodeId>, ExtractError> {
    let mut index = HashMap::default();
    for node in ast.descendants(ast.root()) {
        if let Some(id) = ast.get(node).id.as_deref()
            && index.insert(id, node).is_some()
        {
            return Err(ExtractError::DuplicateId { id: id.to_owned() });
        }
    }
    trace!(ids = index.len(), "id_index");
    Ok(index)
}

/// Pair up the nodes of two trees that carry the same id.
pub fn id_mapping(from: &Ast, to: &Ast) -> Result<NodeMapping, ExtractError> {
    let from_ids = id_index(from)?;
    let to_ids = id_index(to)?;
    let mut mapping = NodeMapping::new();
    for (id, &from_node) in &from_ids {
        if let Some(&to_node) = to_ids.get(id) {
            mapping.put(from_node, to_node);
        }
    }
    debug!(
        from_ids = from_ids.len(),
        to_ids = to_ids.len(),
        matched = mapping.len(),
        "id_mapping"
    );
    Ok(mapping)
}

/// Extract the edit script between two trees, matching nodes by id.
///
/// Fails with [`ExtractError::DuplicateId`] if either tree repeats an id.
pub fn extract_edits(from: &Ast, to: &Ast) -> Result<Vec<Edit>, ExtractError> {
    let mapping = id_mapping(from, to)?;
    Ok(extract_edits_with_mapping(from, to, &mapping))
}

/// Extract the edit script between two trees, matching nodes with an aligner.
///
/// The aligner receives `cost` explicitly; nothing about it is kept between calls.
pub fn extract_edits_aligned(
    from: &Ast,
    to: &Ast,
    aligner: &dyn Aligner,
    cost: &dyn CostModel,
) -> Result<Vec<Edit>, ExtractError> {
    let pairs = aligner.correspondence(from, to, cost);
    let mapping = mapping_from_pairs(from, to, &pairs)?;
    debug!(
        pairs = pairs.len(),
        matched = mapping.len(),
        "aligned mapping"
    );
    Ok(extract_edits_with_mapping(from, to, &mapping))
}

/// Extract the edit script for a given correspondence (`from` nodes to `to` nodes).
pub fn extract_edits_with_mapping(from: &Ast, to: &Ast, mapping: &NodeMapping) -> Vec<Edit> {
    let from_slots = unique_slots(
        from.descendants(from.root())
            .filter_map(|node| Slot::from_side(from, node)),
    );
    let to_slots = unique_slots(
        to.descendants(to.root())
            .filter_map(|node| Slot::to_side(from, to, node, mapping)),
    );
    trace!(
        from_slots = from_slots.len(),
        to_slots = to_slots.len(),
        "slots"
    );

    let from_set: HashSet<&Slot> = from_slots.iter().collect();
    let to_set: HashSet<&Slot> = to_slots.iter().collect();

    let removed: Vec<&Slot> = from_slots
        .iter()
        .filter(|slot| !to_set.contains(slot))
        .collect();
    let mut added: Vec<Option<&Slot>> = to_slots
        .iter()
        .filter(|slot| !from_set.contains(slot))
        .map(Some)
        .collect();
    debug!(
        removed = removed.len(),
        added = added.len(),
        "slot difference"
    );

    let mut edits = Edits::new();
    let mut deleted = Vec::new();
    for slot in removed {
        let matched = from.get(slot.node).id.as_deref().and_then(|id| {
            added.iter_mut().find(|candidate| {
                candidate.is_some_and(|added| to.get(added.node).id.as_deref() == Some(id))
            })
        });
        match matched.and_then(Option::take) {
            Some(target) => edits.push(Edit::Move {
                from: slot.clone(),
                to: target.clone(),
            }),
            None => deleted.push(slot),
        }
    }
    for slot in deleted {
        edits.push(Edit::Deletion { at: slot.clone() });
    }
    for slot in added.into_iter().flatten() {
        edits.push(Edit::Insertion { at: slot.clone() });
    }
    edits.into_inner()
}

/// Keep the first occurrence of every slot, preserving order.
fn unique_slots(slots: impl Iterator<Item = Slot>) -> Vec<Slot> {
    let mut seen = HashSet::default();
    slots
        .filter(|slot| seen.insert(slot.reference.clone()))
        .collect()
}
