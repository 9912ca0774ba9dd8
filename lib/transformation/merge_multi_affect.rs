//! Merging of partial writes to the same destination.
//!
//! Some instructions write several sub-fields of one wide register, and
//! lower to several assignments to that register in the same group. Swapping
//! the two low bytes of `r0` gives:
//!
//! ```text
//! r0 = {r0[0:8] 0 8, r0[0:8] 8 16, r0[16:32] 16 32}
//! r0 = {r0[8:16] 0 8, r0[8:32] 8 32}
//! ```
//!
//! Each of these keeps the bits it does not change with an identity slice.
//! Only the remaining parts are written, so the two merge into:
//!
//! ```text
//! r0 = {r0[8:16] 0 8, r0[0:8] 8 16, r0[16:32] 16 32}
//! ```

use crate::il::*;
use crate::Error;
use std::collections::{BTreeMap, BTreeSet};

fn malformed(destination: &Expression, reason: String) -> Error {
    Error::MalformedPartialWrite {
        destination: destination.to_string(),
        reason,
    }
}

/// Merge the assignments of `group` which write the same destination.
///
/// A destination is merged only when all of its assignments have a `Compose`
/// source. Otherwise its assignments are left as they are. Merged
/// assignments are appended after the untouched ones.
///
/// # Errors
/// `Error::MalformedPartialWrite` if the written parts of one destination
/// overlap, or do not fit its width.
pub fn merge_multi_affect(group: &InstructionGroup) -> Result<InstructionGroup, Error> {
    let mut by_destination: BTreeMap<&Expression, Vec<usize>> = BTreeMap::new();
    let mut order: Vec<&Expression> = Vec::new();
    for (index, assignment) in group.iter().enumerate() {
        let indices = by_destination.entry(assignment.dst()).or_default();
        if indices.is_empty() {
            order.push(assignment.dst());
        }
        indices.push(index);
    }

    let mut merged_indices = BTreeSet::new();
    let mut merged = Vec::new();

    for destination in order {
        let indices = &by_destination[destination];
        if indices.len() <= 1 {
            continue;
        }

        let assignments: Vec<&Assignment> = indices
            .iter()
            .map(|index| &group.assignments()[*index])
            .collect();

        // Only compose sources say which bits they leave alone.
        let mut known: BTreeSet<ComposePart> = BTreeSet::new();
        let mut all_compose = true;
        for assignment in &assignments {
            match assignment.modified_slices() {
                Some(slices) => known.extend(slices),
                None => {
                    all_compose = false;
                    break;
                }
            }
        }
        if !all_compose {
            continue;
        }

        merged.push(Assignment::new(
            destination.clone(),
            merge_parts(destination, known)?,
        ));
        merged_indices.extend(indices.iter().cloned());
    }

    if merged.is_empty() {
        return Ok(group.clone());
    }

    let mut result: Vec<Assignment> = group
        .iter()
        .enumerate()
        .filter(|(index, _)| !merged_indices.contains(index))
        .map(|(_, assignment)| assignment.clone())
        .collect();
    result.append(&mut merged);

    Ok(InstructionGroup::from(result))
}

/// Fill the gaps between the written parts of `destination` with identity
/// slices, and compose the result.
fn merge_parts(
    destination: &Expression,
    known: BTreeSet<ComposePart>,
) -> Result<Expression, Error> {
    let bits = destination.bits();

    let mut parts: Vec<ComposePart> = known.into_iter().collect();
    parts.sort_by_key(|part| (part.1, part.2));

    let mut filled = Vec::new();
    let mut next = 0;
    for (expression, start, end) in parts {
        if end > bits || start >= end || expression.bits() != end - start {
            return Err(malformed(
                destination,
                format!("part {} {} {} does not fit {} bits", expression, start, end, bits),
            ));
        }
        if start < next {
            return Err(malformed(
                destination,
                format!("part {} {} {} overlaps bit {}", expression, start, end, next - 1),
            ));
        }
        if start > next {
            filled.push((Expression::slice(destination.clone(), next, start)?, next, start));
        }
        filled.push((expression, start, end));
        next = end;
    }
    if next < bits {
        filled.push((Expression::slice(destination.clone(), next, bits)?, next, bits));
    }

    Expression::compose(filled).map_err(|_| {
        malformed(
            destination,
            "merged parts do not tile the destination".to_string(),
        )
    })
}
