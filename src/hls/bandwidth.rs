//! Nearest-bandwidth matching for ad rendition selection.

use crate::error::{Result, StitchError};

/// Find the candidate bandwidth closest to `target`.
///
/// Candidates are scanned in descending order and a candidate only displaces
/// the current best when it is strictly closer to the target, so an exact
/// distance tie is resolved in favor of the higher bandwidth reached first.
/// Downstream ABR matching depends on this exact reduction order; the master
/// rewriter also nudges advertised bandwidths by -100 so a source value never
/// ties with its own advertised variant.
pub fn nearest_bandwidth(target: u64, candidates: &[u64]) -> Result<u64> {
    let mut sorted: Vec<u64> = candidates.to_vec();
    if sorted.is_empty() {
        return Err(StitchError::EmptyCandidateSet);
    }
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let mut best = sorted[0];
    for &candidate in &sorted[1..] {
        if candidate.abs_diff(target) < best.abs_diff(target) {
            best = candidate;
        }
    }
    Ok(best)
}
