//! Cursor anchor remapping across full document reassembly.
//!
//! When the store rebuilds the edit tree, the anchor from the previous
//! tree must land at the equivalent position in the new one: same
//! surrounding node, same offset within it, recomputed from the cumulative
//! size of the preceding nodes in the new tree.

use crate::doc::Doc;

/// Remap an anchor offset from `prev` into `next`.
///
/// The surrounding node is matched by id; when it no longer exists the
/// anchor falls back to the node at the same (clamped) index. Returns
/// `None` when there is nothing to anchor to.
pub fn remap_anchor(prev: &Doc, next: &Doc, anchor: usize) -> Option<usize> {
    let (index, in_node) = prev.locate(anchor)?;
    if next.is_empty() {
        return None;
    }
    let id = prev.children()[index].id();
    let new_index = next
        .children()
        .iter()
        .position(|child| child.id() == id)
        .unwrap_or_else(|| index.min(next.len() - 1));
    let node_size = next.children()[new_index].size();
    Some(next.offset_of(new_index) + in_node.min(node_size.saturating_sub(1)))
}
