//! Affine run consolidation
//!
//! Contiguous affine transforms are merged into a single model. Any other
//! transform is a barrier: it is copied through unchanged and nothing is
//! merged or reordered across it.

use super::affine::AffineModel;
use super::polynomial::Polynomial2D;
use super::range::TransformRange;
use super::resolve::resolve;
use super::types::{PolyDegree, Transform, TransformError};
use crate::registry::SharedPool;

/// Accumulator for one run of affine transforms.
#[derive(Debug, Default)]
struct AffineRun {
    total: AffineModel,
    count: usize,
}

impl AffineRun {
    /// Append `next` to the run; it applies after everything accumulated so far.
    fn push(&mut self, next: &AffineModel) {
        self.total = next.concatenate(&self.total);
        self.count += 1;
    }

    /// Emit the merged run, if any, and reset the accumulator.
    fn flush(&mut self, degree: PolyDegree) -> Result<Option<Transform>, TransformError> {
        if self.count == 0 {
            return Ok(None);
        }
        let merged = std::mem::take(&mut self.total);
        self.count = 0;

        if degree.promotes() {
            let poly = Polynomial2D::from_affine(&merged).as_order(degree.get())?;
            Ok(Some(Transform::Polynomial(poly)))
        } else {
            Ok(Some(Transform::Affine(merged)))
        }
    }
}

/// Merge the affine runs of an already flattened and dereferenced sequence.
///
/// Each maximal run is replaced by one transform: an affine model for
/// `PolyDegree::AFFINE`, otherwise a polynomial of the requested degree (a
/// single affine is promoted too). Anything else, including references or
/// lists left in the input, passes through as a barrier.
pub fn consolidate_flat(
    flat: Vec<Transform>,
    degree: PolyDegree,
) -> Result<Vec<Transform>, TransformError> {
    let input_len = flat.len();
    let mut run = AffineRun::default();
    let mut consolidated = Vec::with_capacity(input_len);

    for transform in flat {
        match transform {
            Transform::Affine(affine) => run.push(&affine),
            barrier => {
                log::trace!("consolidate: barrier {}", barrier.describe());
                consolidated.extend(run.flush(degree)?);
                consolidated.push(barrier);
            }
        }
    }
    consolidated.extend(run.flush(degree)?);

    if consolidated.len() > input_len {
        return Err(TransformError::LengthIncreased {
            input: input_len,
            output: consolidated.len(),
        });
    }
    Ok(consolidated)
}

/// Resolve a transform list against the shared pool and merge its affine runs.
pub fn consolidate(
    list: &[Transform],
    pool: &SharedPool,
    degree: PolyDegree,
) -> Result<Vec<Transform>, TransformError> {
    let flat = resolve(list, pool)?;
    consolidate_flat(flat, degree)
}

/// Consolidate only the `range` of a tile's list, keeping the transforms
/// before and after it untouched and in place.
pub fn consolidate_range(
    list: &[Transform],
    range: &TransformRange,
    pool: &SharedPool,
    degree: PolyDegree,
) -> Result<Vec<Transform>, TransformError> {
    if list.is_empty() && !range.is_full() {
        return Err(TransformError::EmptyTransformList { range: range.to_string() });
    }

    let (start, end) = range.bounds(list.len());
    let middle = consolidate(&list[start..end], pool, degree)?;

    let mut spliced = Vec::with_capacity(start + middle.len() + list.len() - end);
    spliced.extend_from_slice(&list[..start]);
    spliced.extend(middle);
    spliced.extend_from_slice(&list[end..]);
    Ok(spliced)
}
