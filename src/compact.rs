// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sorted-index array compaction
//!
//! Removing a seam from a flat, row-major buffer means deleting one
//! element per row; removing a batch of seams means deleting several.
//! Rather than shifting the tail of the buffer once per deletion, we
//! walk the buffer once and copy the untouched runs between deletion
//! points.

use crate::error::{Result, SeamError};

/// Check that `indices` is strictly ascending and that every removal
/// of `group` elements fits inside a buffer of `len`.
pub fn validate_indices(indices: &[usize], len: usize, group: usize) -> Result<()> {
    for pair in indices.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        if current == previous {
            return Err(SeamError::DuplicateIndex(current));
        }
        if current < previous {
            return Err(SeamError::UnsortedIndices { previous, current });
        }
    }
    if let Some(&last) = indices.last() {
        if last + group > len {
            return Err(SeamError::IndexOutOfBounds {
                index: last,
                group,
                len,
            });
        }
    }
    Ok(())
}

/// Remove `group` consecutive elements at each of `indices`, which
/// must be strictly ascending.  Indices refer to positions in the
/// input buffer, so with `group = 4` an RGBA pixel at pixel index `p`
/// is removed by passing `4 * p`.
///
/// The output is always `buffer.len() - indices.len() * group` long.
pub fn remove_indices<T: Copy>(buffer: &[T], indices: &[usize], group: usize) -> Result<Vec<T>> {
    validate_indices(indices, buffer.len(), group)?;
    // Removals closer together than `group` would overlap.
    if group > 1 {
        if let Some(pair) = indices.windows(2).find(|p| p[1] - p[0] < group) {
            return Err(SeamError::IndexOutOfBounds {
                index: pair[1],
                group,
                len: buffer.len(),
            });
        }
    }

    let mut result = Vec::with_capacity(buffer.len() - indices.len() * group);
    let mut source_start = 0;
    for &index in indices {
        result.extend_from_slice(&buffer[source_start..index]);
        source_start = index + group;
    }
    result.extend_from_slice(&buffer[source_start..]);
    Ok(result)
}
