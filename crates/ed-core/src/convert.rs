//! Pure, stateless conversion between blocks and edit-tree nodes, and
//! full-document assembly/disassembly.
//!
//! The edit tree never carries authoritative media metadata, only an id
//! reference, so disassembly recovers full media blocks through a cache of
//! the previously-known block list. Rich-text nodes also start from the
//! cached block when one exists, so metadata the tree cannot represent
//! survives an assemble/disassemble round-trip.

use std::collections::HashMap;

use crate::block::{Block, BlockId};
use crate::doc::{Doc, DocNode};

/// The previously-known block list, keyed by id.
pub type BlockCache = HashMap<BlockId, Block>;

/// Build a lookup cache from an ordered block list.
pub fn cache_from(blocks: &[Block]) -> BlockCache {
    blocks
        .iter()
        .map(|block| (block.id.clone(), block.clone()))
        .collect()
}

/// Convert one block to its edit-tree node. Unrepresentable kinds return
/// `None`; the caller decides how to report the drop.
pub fn block_to_node(block: &Block) -> Option<DocNode> {
    if block.kind.is_rich_text() {
        Some(DocNode::Text {
            id: block.id.clone(),
            kind: block.kind.clone(),
            html: block.html.clone().unwrap_or_default(),
        })
    } else if block.kind.is_media() {
        Some(DocNode::Media {
            id: block.id.clone(),
            kind: block.kind.clone(),
            cover: block.cover.clone(),
        })
    } else {
        None
    }
}

/// Convert one edit-tree node back to a block.
///
/// A rich-text node starts from the cached block of the same id when
/// present and overwrites its fragment; a media leaf is an identity lookup
/// through the cache. A media leaf whose id is unknown is dropped with a
/// warning - the tree alone cannot reconstruct it.
pub fn node_to_block(node: &DocNode, cache: &BlockCache) -> Option<Block> {
    match node {
        DocNode::Text { id, kind, html } => {
            let mut block = cache.get(id).cloned().unwrap_or_else(|| Block {
                id: id.clone(),
                kind: kind.clone(),
                html: None,
                cover: None,
                metadata: None,
            });
            block.kind = kind.clone();
            block.html = Some(html.clone());
            Some(block)
        }
        DocNode::Media { id, .. } => {
            let block = cache.get(id).cloned();
            if block.is_none() {
                tracing::warn!(
                    target: "ed::convert",
                    id = %id,
                    "media leaf has no cached block, dropping"
                );
            }
            block
        }
    }
}

/// Build a full edit tree from an ordered block list.
///
/// Fold-agnostic: the caller excludes the fold block. Unrepresentable
/// kinds are skipped (they stay in the block list, so no data is lost).
pub fn assemble(blocks: &[Block]) -> Doc {
    let mut children = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block_to_node(block) {
            Some(node) => children.push(node),
            None => {
                tracing::warn!(
                    target: "ed::convert",
                    id = %block.id,
                    kind = %block.kind,
                    "unrepresentable block kind, skipping during assembly"
                );
            }
        }
    }
    Doc::new(children)
}

/// Rebuild the ordered block list from an edit tree. An empty tree yields
/// an empty list.
pub fn disassemble(doc: &Doc, cache: &BlockCache) -> Vec<Block> {
    doc.children()
        .iter()
        .filter_map(|node| node_to_block(node, cache))
        .collect()
}
