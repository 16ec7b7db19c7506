//! Parallel extraction over many independent tree pairs.
//!
//! Each pair is diffed on its own; trees are only read, so a rayon worker pool
//! can run extractions side by side. Results keep the order of the input.

use crate::debug;

use rayon::prelude::*;

use crate::align::{Aligner, CostModel};
use crate::edit::Edit;
use crate::extract::{ExtractError, extract_edits, extract_edits_aligned};
use crate::tree::Ast;

/// Run [`extract_edits`] on every `(from, to)` pair.
///
/// A failing pair does not affect the others.
pub fn extract_all(pairs: &[(Ast, Ast)]) -> Vec<Result<Vec<Edit>, ExtractError>> {
    debug!(pairs = pairs.len(), "extract_all");
    pairs
        .par_iter()
        .map(|(from, to)| extract_edits(from, to))
        .collect()
}

/// Run [`extract_edits_aligned`] on every `(from, to)` pair with a shared aligner
/// and cost model.
pub fn extract_all_aligned<A, C>(
    pairs: &[(Ast, Ast)],
    aligner: &A,
    cost: &C,
) -> Vec<Result<Vec<Edit>, ExtractError>>
where
    A: Aligner + Sync,
    C: CostModel + Sync,
{
    debug!(pairs = pairs.len(), "extract_all_aligned");
    pairs
        .par_iter()
        .map(|(from, to)| extract_edits_aligned(from, to, aligner, cost))
        .collect()
}
