//! Flattening of associative chains
//!
//! Right- or left-recursive grammar rules produce nested nodes such as
//! `((a + b) + c) + d`. When an associative node closes, every direct
//! child of the same kind is replaced by that child's own children, so the
//! tree above becomes a single `Add` with four children. Children close
//! before their parent, so one level of splicing exposes the whole chain.

use tracing::trace;

use super::builder::TreeBuilder;
use super::NodeId;
use crate::error::BuildError;

/// Splice same-kind children of `id` into it. Returns whether anything changed.
pub(super) fn flatten(builder: &mut TreeBuilder, id: NodeId) -> Result<bool, BuildError> {
    let slot = builder.slot(id)?;
    let kind = slot.kind;
    let children = slot.children.clone();

    let absorbed = |child: &Option<NodeId>| match child {
        Some(child) => builder.slots[child.index()].kind == kind,
        None => false,
    };

    let mut expected = 0;
    let mut should_flatten = false;
    for child in &children {
        if absorbed(child) {
            should_flatten = true;
            expected += child.map_or(0, |c| builder.slots[c.index()].children.len());
        } else {
            expected += 1;
        }
    }
    if !should_flatten {
        return Ok(false);
    }

    let mut rebuilt = Vec::with_capacity(expected);
    let mut spliced = Vec::new();
    for child in &children {
        match child {
            Some(inner) if absorbed(child) => {
                rebuilt.extend(builder.slots[inner.index()].children.iter().copied());
                spliced.push(*inner);
            }
            other => rebuilt.push(*other),
        }
    }

    if rebuilt.len() != expected {
        return Err(BuildError::InternalConsistency {
            node: id,
            expected,
            actual: rebuilt.len(),
        });
    }

    // The absorbed nodes become orphans; their children now belong to `id`.
    for inner in spliced {
        let slot = &mut builder.slots[inner.index()];
        slot.children.clear();
        slot.parent = None;
    }
    for grandchild in rebuilt.iter().flatten() {
        builder.slots[grandchild.index()].parent = Some(id);
    }

    trace!(
        node = %id,
        kind = %kind,
        before = children.len(),
        after = rebuilt.len(),
        "flattened node"
    );
    builder.slots[id.index()].children = rebuilt;
    Ok(true)
}
