//! Fold selection: which block is promoted to the page-lead slot.

use crate::block::Block;

/// Result of splitting a block list into its fold and body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FoldSplit {
    /// The promoted block, if any.
    pub media: Option<Block>,
    /// The remaining blocks, in order.
    pub content: Vec<Block>,
}

/// The fold is the first block iff it is starred. Only position 0 is
/// consulted; a starred block anywhere else in the list is not promoted.
pub fn determine_fold(blocks: &[Block]) -> FoldSplit {
    match blocks.split_first() {
        Some((first, rest)) if first.is_starred() => FoldSplit {
            media: Some(first.clone()),
            content: rest.to_vec(),
        },
        _ => FoldSplit {
            media: None,
            content: blocks.to_vec(),
        },
    }
}
