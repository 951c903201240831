//! Flattening and dereferencing of transform lists
//!
//! Nested lists are walked with an explicit stack of iterators rather than
//! recursion, so adversarial nesting fails with an error instead of
//! overflowing the thread stack.

use super::types::{Transform, TransformError};
use crate::registry::SharedPool;

/// Deepest list nesting accepted below the top-level list.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Visit every non-list transform depth-first, left to right.
fn walk<'a, F>(list: &'a [Transform], mut visit: F) -> Result<(), TransformError>
where
    F: FnMut(&'a Transform) -> Result<(), TransformError>,
{
    let mut stack = vec![list.iter()];
    while let Some(top) = stack.last_mut() {
        let Some(transform) = top.next() else {
            stack.pop();
            continue;
        };
        match transform {
            Transform::List(items) => {
                if stack.len() > MAX_NESTING_DEPTH {
                    return Err(TransformError::NestingTooDeep(MAX_NESTING_DEPTH));
                }
                stack.push(items.iter());
            }
            leaf => visit(leaf)?,
        }
    }
    Ok(())
}

/// Replace every nested list by its contents, keeping references as they are.
pub fn flatten(list: &[Transform]) -> Result<Vec<Transform>, TransformError> {
    let mut flat = Vec::with_capacity(list.len());
    walk(list, |t| {
        flat.push(t.clone());
        Ok(())
    })?;
    Ok(flat)
}

/// Flatten a transform list and replace every reference by its pool entry.
///
/// The result contains only concrete transforms. The pool is only read.
pub fn resolve(list: &[Transform], pool: &SharedPool) -> Result<Vec<Transform>, TransformError> {
    let mut resolved = Vec::with_capacity(list.len());
    walk(list, |t| {
        match t {
            Transform::Reference { ref_id } => resolved.push(pool.resolve(ref_id)?.clone()),
            concrete => resolved.push(concrete.clone()),
        }
        Ok(())
    })?;
    Ok(resolved)
}
