//! The synchronization store: canonical owner of the block list, the fold
//! pointer, and the cover-preview cache.
//!
//! Every mutation flows through [`Store::route_event`] or one of the
//! collaborator-facing methods. The store is explicitly constructed and
//! passed by reference; event routing takes `&mut self`, so nested routing
//! is unrepresentable. Processing is synchronous and strictly ordered: a
//! later event always observes the fully-applied effects of every earlier
//! one.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use smol_str::SmolStr;

use crate::block::{mint_id, Block, BlockId, BlockKind};
use crate::convert::{assemble, cache_from, disassemble};
use crate::doc::Doc;
use crate::error::StoreError;
use crate::fold::{determine_fold, FoldSplit};
use crate::selection::remap_anchor;

/// Handle onto the external text-editing engine. The engine owns the edit
/// tree; its content is fully determined by the store and replaced on
/// every structural change.
pub trait TextEngine {
    /// The current edit tree, including any edits made since the last
    /// `set_doc`.
    fn current_doc(&self) -> Doc;

    /// Replace the edit tree, optionally placing the cursor anchor.
    fn set_doc(&mut self, doc: Doc, selection: Option<usize>);

    /// The current cursor anchor, if any.
    fn selection(&self) -> Option<usize> {
        None
    }
}

/// Outbound calls to the upload/share collaborator. Progress and
/// completion come back through `route_event` / `update_placeholder` /
/// `set_content`.
pub trait ShareHandler {
    /// A placeholder was minted for a shared link; resolve it.
    fn request_share_url(&mut self, block_id: &BlockId, url: &str);

    /// The user asked for an upload at the given insertion index.
    fn request_upload(&mut self, _index: usize) {}

    /// A pending placeholder was cancelled; abort the in-flight work.
    fn placeholder_cancelled(&mut self, _id: &BlockId) {}
}

/// Change notifications consumed by the view layer. All payload-free:
/// consumers re-read store state.
pub trait ChangeSink {
    /// The block list changed; re-read content.
    fn change(&mut self) {}

    /// The fold block changed (or was cleared).
    fn fold_change(&mut self, _fold: Option<&Block>) {}

    /// Media block internals changed without a structural edit.
    fn media_update(&mut self) {}
}

/// Partial in-place update for a pending placeholder's upload state.
#[derive(Clone, Debug, Default)]
pub struct PlaceholderUpdate {
    pub status: Option<String>,
    pub progress: Option<f64>,
    pub failed: Option<bool>,
}

/// The closed catalogue of events accepted by [`Store::route_event`].
pub enum StoreEvent {
    /// Binds the text-engine handle and pushes the initial tree. Fatal if
    /// fired twice.
    EditorReady(Box<dyn TextEngine>),
    /// Replace a block wholesale by id.
    BlockUpdate(Block),
    /// Deep-set `metadata` at `path`; the mutated block is returned to the
    /// caller for optimistic UI.
    BlockUpdateMeta {
        id: BlockId,
        path: Vec<SmolStr>,
        value: Value,
    },
    /// Delete a block; clears the fold pointer when it was the fold.
    BlockRemove(BlockId),
    /// Mint fresh ids for duplicate-id blocks introduced by copy/paste.
    DedupeIds,
    /// Share a pasted link: mint a placeholder fold and hand the URL to
    /// the collaborator. Leftover text becomes a new leading block.
    ShareLink { url: String, rest: Option<String> },
    /// Delegate an upload request to the collaborator.
    UploadRequest,
    /// Insert a block and promote it to fold.
    FoldInit(Block),
    /// Update the current fold block's content.
    FoldChange(Block),
    /// Update the fold's text, minting a starred text block when no fold
    /// exists yet.
    FoldTextChange(String),
    /// Remove a pending placeholder and notify the collaborator.
    PlaceholderCancel(BlockId),
    /// The engine reported a structural edit; the body is re-read from the
    /// tree on next access.
    TextEngineChange,
}

impl StoreEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::EditorReady(_) => "editor_ready",
            Self::BlockUpdate(_) => "block_update",
            Self::BlockUpdateMeta { .. } => "block_update_meta",
            Self::BlockRemove(_) => "block_remove",
            Self::DedupeIds => "dedupe_ids",
            Self::ShareLink { .. } => "share_link",
            Self::UploadRequest => "upload_request",
            Self::FoldInit(_) => "fold_init",
            Self::FoldChange(_) => "fold_change",
            Self::FoldTextChange(_) => "fold_text_change",
            Self::PlaceholderCancel(_) => "placeholder_cancel",
            Self::TextEngineChange => "text_engine_change",
        }
    }
}

/// Construction options for [`Store`].
#[derive(Default)]
pub struct StoreOptions {
    initial_content: Vec<Block>,
    share: Option<Box<dyn ShareHandler>>,
    sinks: Vec<Box<dyn ChangeSink>>,
}

impl StoreOptions {
    pub fn new(initial_content: Vec<Block>) -> Self {
        Self {
            initial_content,
            share: None,
            sinks: Vec::new(),
        }
    }

    pub fn with_share_handler(mut self, handler: Box<dyn ShareHandler>) -> Self {
        self.share = Some(handler);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn ChangeSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

/// One store per editor instance. See the module docs for the mutation
/// discipline.
pub struct Store {
    engine: Option<Box<dyn TextEngine>>,
    /// Body blocks in document order, fold excluded.
    body: Vec<Block>,
    fold: Option<Block>,
    cover_previews: HashMap<BlockId, String>,
    share: Option<Box<dyn ShareHandler>>,
    sinks: Vec<Box<dyn ChangeSink>>,
    /// Set after a structural engine edit; the body is lazily rebuilt from
    /// the live tree on next read.
    body_dirty: bool,
}

impl Store {
    pub fn new(options: StoreOptions) -> Result<Self, StoreError> {
        if options.initial_content.is_empty() {
            return Err(StoreError::MissingOption("initial_content"));
        }
        let FoldSplit { media, content } = determine_fold(&options.initial_content);
        Ok(Self {
            engine: None,
            body: content,
            fold: media,
            cover_previews: HashMap::new(),
            share: options.share,
            sinks: options.sinks,
            body_dirty: false,
        })
    }

    /// Register an additional change-notification sink.
    pub fn add_sink(&mut self, sink: Box<dyn ChangeSink>) {
        self.sinks.push(sink);
    }

    /// The single serialized entry point for every mutation.
    ///
    /// Returns the mutated block for `BlockUpdateMeta`, `None` for every
    /// other event. Any event referencing an unknown id fails before
    /// mutating anything.
    pub fn route_event(&mut self, event: StoreEvent) -> Result<Option<Block>, StoreError> {
        tracing::debug!(target: "ed::store", event = event.name(), "routing event");
        match event {
            StoreEvent::EditorReady(engine) => {
                if self.engine.is_some() {
                    return Err(StoreError::EngineAlreadyBound);
                }
                self.engine = Some(engine);
                let doc = assemble(&self.body);
                if let Some(engine) = self.engine.as_mut() {
                    engine.set_doc(doc, None);
                }
                Ok(None)
            }
            StoreEvent::BlockUpdate(block) => {
                self.replace_block(block)?;
                self.notify_change();
                Ok(None)
            }
            StoreEvent::BlockUpdateMeta { id, path, value } => {
                let block = self
                    .block_mut(&id)
                    .ok_or_else(|| StoreError::BlockNotFound(id.clone()))?;
                block.set_meta_path(&path, value)?;
                let mutated = block.clone();
                self.notify_change();
                Ok(Some(mutated))
            }
            StoreEvent::BlockRemove(id) => {
                let mut content = self.get_content();
                let index = index_with_id(&content, &id)
                    .ok_or_else(|| StoreError::BlockNotFound(id.clone()))?;
                content.remove(index);
                self.set_merged_content(content);
                self.notify_change();
                Ok(None)
            }
            StoreEvent::DedupeIds => {
                let mut content = self.get_content();
                let mut seen: HashSet<BlockId> = HashSet::new();
                for block in &mut content {
                    if !seen.insert(block.id.clone()) {
                        let fresh = mint_id();
                        tracing::warn!(
                            target: "ed::store",
                            duplicate = %block.id,
                            minted = %fresh,
                            "duplicate block id, minting a fresh one"
                        );
                        block.id = fresh.clone();
                        seen.insert(fresh);
                    }
                }
                self.set_merged_content(content);
                self.notify_change();
                Ok(None)
            }
            StoreEvent::ShareLink { url, rest } => {
                let id = mint_id();
                let mut share = Block::placeholder(id.clone());
                share.set_starred(true);
                share.metadata_mut().insert(
                    "status".to_owned(),
                    Value::String(format!("Sharing... {url}")),
                );
                self.fold = Some(share);
                self.notify_fold_change();
                if let Some(handler) = self.share.as_mut() {
                    handler.request_share_url(&id, &url);
                }
                if let Some(rest) = rest {
                    let below_fold =
                        Block::rich_text(mint_id(), BlockKind::Text, format!("<p>{rest}</p>"));
                    self.insert_blocks(0, vec![below_fold]);
                    self.notify_change();
                }
                Ok(None)
            }
            StoreEvent::UploadRequest => {
                if let Some(handler) = self.share.as_mut() {
                    handler.request_upload(0);
                }
                Ok(None)
            }
            StoreEvent::FoldInit(block) => {
                self.fold = Some(block);
                self.notify_fold_change();
                self.notify_change();
                Ok(None)
            }
            StoreEvent::FoldChange(block) => {
                self.replace_block(block)?;
                self.notify_fold_change();
                self.notify_change();
                Ok(None)
            }
            StoreEvent::FoldTextChange(text) => {
                if self.fold.is_none() {
                    let mut title = Block::rich_text(mint_id(), BlockKind::Text, "");
                    title.set_starred(true);
                    self.fold = Some(title);
                }
                if let Some(fold) = self.fold.as_mut() {
                    fold.html = Some(format!("<p>{text}</p>"));
                }
                self.notify_change();
                Ok(None)
            }
            StoreEvent::PlaceholderCancel(id) => {
                self.require_placeholder(&id)?;
                let mut content = self.get_content();
                if let Some(index) = index_with_id(&content, &id) {
                    content.remove(index);
                }
                self.set_merged_content(content);
                if let Some(handler) = self.share.as_mut() {
                    handler.placeholder_cancelled(&id);
                }
                Ok(None)
            }
            StoreEvent::TextEngineChange => {
                self.body_dirty = true;
                self.notify_change();
                Ok(None)
            }
        }
    }

    /// Look up a block by id (fold included). Reads the cached list; it
    /// does not force a re-read of the edit tree.
    pub fn get_block(&self, id: &BlockId) -> Option<&Block> {
        if let Some(fold) = &self.fold {
            if fold.id == *id {
                return Some(fold);
            }
        }
        self.body.iter().find(|block| block.id == *id)
    }

    /// The full ordered block list: the live body (re-read from the edit
    /// tree after a structural edit) with the fold re-prepended. The fold
    /// always reports `starred: true`, even when the caller omitted it.
    pub fn get_content(&mut self) -> Vec<Block> {
        self.refresh_body();
        let mut content = self.body.clone();
        if let Some(fold) = &self.fold {
            let mut fold = fold.clone();
            fold.set_starred(true);
            content.insert(0, fold);
        }
        content
    }

    /// Merge externally-pushed content into the current list.
    ///
    /// The merge is placeholder-aware and one-directional: incoming
    /// placeholders are inserted (or overwrite the same-id placeholder)
    /// position-preservingly, and current placeholders whose id appears in
    /// the incoming list are replaced by the incoming full block. Every
    /// other current block is left untouched, so a concurrent upload
    /// completion never disturbs unrelated edits.
    pub fn set_content(&mut self, new_content: Vec<Block>) {
        let merged = merge_content(self.get_content(), &new_content);
        self.set_merged_content(merged);
    }

    /// Mint `count` placeholder blocks at the given body index and return
    /// their ids, in order.
    pub fn insert_placeholders(&mut self, index: usize, count: usize) -> Vec<BlockId> {
        let mut ids = Vec::with_capacity(count);
        let mut blocks = Vec::with_capacity(count);
        for _ in 0..count {
            let id = mint_id();
            ids.push(id.clone());
            blocks.push(Block::placeholder(id));
        }
        self.insert_blocks(index, blocks);
        ids
    }

    /// Apply upload progress to a pending placeholder, in place.
    pub fn update_placeholder(
        &mut self,
        id: &BlockId,
        update: PlaceholderUpdate,
    ) -> Result<(), StoreError> {
        self.require_placeholder(id)?;
        let is_fold = self.fold.as_ref().is_some_and(|fold| fold.id == *id);
        let block = self
            .block_mut(id)
            .ok_or_else(|| StoreError::BlockNotFound(id.clone()))?;
        let metadata = block.metadata_mut();
        if let Some(status) = update.status {
            metadata.insert("status".to_owned(), Value::String(status));
        }
        if let Some(progress) = update.progress {
            metadata.insert("progress".to_owned(), progress.into());
        }
        if let Some(failed) = update.failed {
            metadata.insert("failed".to_owned(), Value::Bool(failed));
        }
        self.notify_media_update();
        if is_fold {
            self.notify_fold_change();
        }
        Ok(())
    }

    /// Overlay a transient preview image URL for a media block's cover.
    pub fn set_cover_preview(&mut self, id: &BlockId, src: String) -> Result<(), StoreError> {
        if self.get_block(id).is_none() {
            return Err(StoreError::BlockNotFound(id.clone()));
        }
        self.cover_previews.insert(id.clone(), src);
        if self.fold.as_ref().is_some_and(|fold| fold.id == *id) {
            self.notify_fold_change();
        }
        Ok(())
    }

    pub fn cover_preview(&self, id: &BlockId) -> Option<&str> {
        self.cover_previews.get(id).map(String::as_str)
    }

    /// The current fold block, if any.
    pub fn fold(&self) -> Option<&Block> {
        self.fold.as_ref()
    }

    // --- internals ---

    /// Re-read the body from the live edit tree after a structural edit,
    /// recovering full media blocks through the previous list.
    fn refresh_body(&mut self) {
        if !self.body_dirty {
            return;
        }
        self.body_dirty = false;
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let doc = engine.current_doc();
        let mut cache = cache_from(&self.body);
        if let Some(fold) = &self.fold {
            cache.insert(fold.id.clone(), fold.clone());
        }
        self.body = disassemble(&doc, &cache);
    }

    /// Reconcile a full (fold-inclusive) list: recompute the fold, rebuild
    /// the edit tree, remap the cursor, and notify.
    fn set_merged_content(&mut self, merged: Vec<Block>) {
        let FoldSplit { media, content } = determine_fold(&merged);
        self.fold = media;
        self.body = content;
        self.body_dirty = false;
        self.notify_fold_change();
        self.render();
        self.notify_media_update();
    }

    /// Push the assembled body into the engine, preserving the cursor.
    fn render(&mut self) {
        let doc = assemble(&self.body);
        if let Some(engine) = self.engine.as_mut() {
            let prev = engine.current_doc();
            let selection = engine
                .selection()
                .and_then(|anchor| remap_anchor(&prev, &doc, anchor));
            engine.set_doc(doc, selection);
        }
    }

    /// Insert blocks at a body index (offset past the fold when present).
    fn insert_blocks(&mut self, index: usize, blocks: Vec<Block>) {
        let mut merged = self.get_content();
        let index = if self.fold.is_some() { index + 1 } else { index };
        let index = index.min(merged.len());
        merged.splice(index..index, blocks);
        self.set_merged_content(merged);
    }

    /// Replace a block wholesale by id, fold included.
    fn replace_block(&mut self, block: Block) -> Result<(), StoreError> {
        if self.fold.as_ref().is_some_and(|fold| fold.id == block.id) {
            self.fold = Some(block);
            return Ok(());
        }
        match self.body.iter_mut().find(|current| current.id == block.id) {
            Some(slot) => {
                *slot = block;
                Ok(())
            }
            None => Err(StoreError::BlockNotFound(block.id)),
        }
    }

    fn block_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        if self.fold.as_ref().is_some_and(|fold| fold.id == *id) {
            return self.fold.as_mut();
        }
        self.body.iter_mut().find(|block| block.id == *id)
    }

    fn require_placeholder(&self, id: &BlockId) -> Result<(), StoreError> {
        let block = self
            .get_block(id)
            .ok_or_else(|| StoreError::BlockNotFound(id.clone()))?;
        if !block.is_placeholder() {
            return Err(StoreError::NotAPlaceholder(id.clone()));
        }
        Ok(())
    }

    fn notify_change(&mut self) {
        for sink in &mut self.sinks {
            sink.change();
        }
    }

    fn notify_fold_change(&mut self) {
        let fold = self.fold.clone();
        for sink in &mut self.sinks {
            sink.fold_change(fold.as_ref());
        }
    }

    fn notify_media_update(&mut self) {
        for sink in &mut self.sinks {
            sink.media_update();
        }
    }
}

fn index_with_id(blocks: &[Block], id: &BlockId) -> Option<usize> {
    blocks.iter().position(|block| block.id == *id)
}

/// The asymmetric placeholder-only merge: see [`Store::set_content`].
/// Non-placeholder blocks already in `old` always win, even when the
/// incoming list carries a newer version of them.
fn merge_content(old: Vec<Block>, new: &[Block]) -> Vec<Block> {
    let mut merged = old;
    // Incoming placeholders: overwrite in place, or insert at their
    // incoming position.
    for (position, block) in new.iter().enumerate() {
        if block.is_placeholder() {
            match index_with_id(&merged, &block.id) {
                Some(index) => merged[index] = block.clone(),
                None => merged.insert(position.min(merged.len()), block.clone()),
            }
        }
    }
    // Current placeholders resolved by the incoming list: complete the
    // placeholder -> real-block transition.
    for slot in &mut merged {
        if slot.is_placeholder() {
            if let Some(index) = index_with_id(new, &slot.id) {
                *slot = new[index].clone();
            }
        }
    }
    merged
}
