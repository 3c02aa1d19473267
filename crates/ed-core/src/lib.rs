//! ed-core: the synchronization engine behind a rich-media content editor.
//!
//! A document lives in two representations: the persisted **block list**
//! (an ordered sequence of typed content blocks) and the **edit tree**
//! (the structured rich-text document owned by an external editing
//! engine). This crate keeps the two consistent while the user edits
//! freely, pending uploads resolve, and one block is promoted to the
//! page-lead "fold" slot:
//!
//! - `block` - the block model and kind classification
//! - `doc` - the edit tree and its offset arithmetic
//! - `convert` - pure block <-> node conversion, assembly, disassembly
//! - `fold` - fold selection over the block list
//! - `selection` - cursor anchor remapping across reassembly
//! - `store` - the stateful core: event routing, merging, notifications
//!
//! Rendering, text-editing primitives, and network transport stay behind
//! the collaborator traits in [`store`].

pub mod block;
pub mod convert;
pub mod doc;
pub mod error;
pub mod fold;
pub mod selection;
pub mod store;

pub use block::{mint_id, Block, BlockId, BlockKind, Cover};
pub use convert::{assemble, block_to_node, cache_from, disassemble, node_to_block, BlockCache};
pub use doc::{Doc, DocNode};
pub use error::StoreError;
pub use fold::{determine_fold, FoldSplit};
pub use selection::remap_anchor;
pub use store::{
    ChangeSink, PlaceholderUpdate, ShareHandler, Store, StoreEvent, StoreOptions, TextEngine,
};
