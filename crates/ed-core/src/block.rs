//! Block model: the atomic content unit and its classification.
//!
//! A document is an ordered list of blocks. Rich-text blocks carry a
//! serialized HTML fragment; media blocks carry kind-specific metadata and
//! an optional resolved cover image. Block ids are stable once assigned and
//! must be unique within a document instance.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::error::StoreError;

/// Stable block identifier. Freshly minted ids are UUID v4 strings.
pub type BlockId = SmolStr;

/// Mint a fresh block id.
pub fn mint_id() -> BlockId {
    SmolStr::new(uuid::Uuid::new_v4().to_string())
}

/// The fixed set of block kinds, plus a catch-all so foreign JSON survives
/// list round-trips without data loss. Unknown kinds never reach the edit
/// tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SmolStr", into = "SmolStr")]
pub enum BlockKind {
    // Media kinds
    Image,
    Video,
    Audio,
    Article,
    Location,
    Share,
    Interactive,
    /// Stand-in for content pending an asynchronous upload or share.
    Placeholder,
    // Rich-text kinds
    Text,
    P,
    Code,
    Quote,
    Blockquote,
    List,
    Ol,
    Ul,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Unknown(SmolStr),
}

impl BlockKind {
    /// Parse a raw type tag. Anything outside the fixed set becomes
    /// `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "article" => Self::Article,
            "location" => Self::Location,
            "share" => Self::Share,
            "interactive" => Self::Interactive,
            "placeholder" => Self::Placeholder,
            "text" => Self::Text,
            "p" => Self::P,
            "code" => Self::Code,
            "quote" => Self::Quote,
            "blockquote" => Self::Blockquote,
            "list" => Self::List,
            "ol" => Self::Ol,
            "ul" => Self::Ul,
            "h1" => Self::H1,
            "h2" => Self::H2,
            "h3" => Self::H3,
            "h4" => Self::H4,
            "h5" => Self::H5,
            "h6" => Self::H6,
            other => Self::Unknown(SmolStr::new(other)),
        }
    }

    /// The raw type tag as it appears in the block JSON shape.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Article => "article",
            Self::Location => "location",
            Self::Share => "share",
            Self::Interactive => "interactive",
            Self::Placeholder => "placeholder",
            Self::Text => "text",
            Self::P => "p",
            Self::Code => "code",
            Self::Quote => "quote",
            Self::Blockquote => "blockquote",
            Self::List => "list",
            Self::Ol => "ol",
            Self::Ul => "ul",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
            Self::Unknown(tag) => tag,
        }
    }

    /// Media kinds render as a single atomic leaf in the edit tree.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Self::Image
                | Self::Video
                | Self::Audio
                | Self::Article
                | Self::Location
                | Self::Share
                | Self::Interactive
                | Self::Placeholder
        )
    }

    /// Rich-text kinds render as editable nodes in the edit tree.
    pub fn is_rich_text(&self) -> bool {
        matches!(
            self,
            Self::Text
                | Self::P
                | Self::Code
                | Self::Quote
                | Self::Blockquote
                | Self::List
                | Self::Ol
                | Self::Ul
                | Self::H1
                | Self::H2
                | Self::H3
                | Self::H4
                | Self::H5
                | Self::H6
        )
    }

    /// Whether blocks of this kind can appear in the edit tree at all.
    pub fn is_representable(&self) -> bool {
        self.is_media() || self.is_rich_text()
    }
}

impl From<SmolStr> for BlockKind {
    fn from(tag: SmolStr) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<BlockKind> for SmolStr {
    fn from(kind: BlockKind) -> Self {
        SmolStr::new(kind.as_str())
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved cover preview image for a media block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cover {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// The atomic content unit.
///
/// `html` is present only for rich-text kinds; `cover` and typed metadata
/// only for media kinds. This split is not statically enforced, matching
/// the persisted JSON shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<Cover>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Block {
    /// Create a rich-text block with the given fragment.
    pub fn rich_text(id: BlockId, kind: BlockKind, html: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            html: Some(html.into()),
            cover: None,
            metadata: None,
        }
    }

    /// Create an empty placeholder block for a pending upload.
    pub fn placeholder(id: BlockId) -> Self {
        Self {
            id,
            kind: BlockKind::Placeholder,
            html: None,
            cover: None,
            metadata: Some(Map::new()),
        }
    }

    /// Fold eligibility: `metadata.starred == true`.
    pub fn is_starred(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("starred"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Set the `starred` flag, creating the metadata map on demand.
    pub fn set_starred(&mut self, starred: bool) {
        self.metadata_mut()
            .insert("starred".to_owned(), Value::Bool(starred));
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == BlockKind::Placeholder
    }

    /// The metadata map, created on demand.
    pub fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        self.metadata.get_or_insert_with(Map::new)
    }

    /// Deep-set a metadata value at `path`, creating intermediate objects
    /// as needed. Fails without mutating the block when the path is empty
    /// or crosses a non-object value.
    pub fn set_meta_path(&mut self, path: &[SmolStr], value: Value) -> Result<(), StoreError> {
        if path.is_empty() {
            return Err(StoreError::InvalidMetadataPath(self.id.clone()));
        }
        // Work on a copy so a bad path leaves the block untouched.
        let mut map = self.metadata.clone().unwrap_or_default();
        {
            let mut parent = &mut map;
            for segment in &path[..path.len() - 1] {
                let slot = parent
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                match slot {
                    Value::Object(inner) => parent = inner,
                    _ => return Err(StoreError::InvalidMetadataPath(self.id.clone())),
                }
            }
            parent.insert(path[path.len() - 1].to_string(), value);
        }
        self.metadata = Some(map);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use smol_str::SmolStr;

    use super::*;

    #[test]
    fn test_kind_classification() {
        assert!(BlockKind::Image.is_media());
        assert!(BlockKind::Placeholder.is_media());
        assert!(!BlockKind::Image.is_rich_text());

        assert!(BlockKind::Text.is_rich_text());
        assert!(BlockKind::H3.is_rich_text());
        assert!(!BlockKind::H3.is_media());

        let unknown = BlockKind::from_tag("hologram");
        assert_eq!(unknown, BlockKind::Unknown(SmolStr::new("hologram")));
        assert!(!unknown.is_representable());
    }

    #[test]
    fn test_kind_tag_round_trip() {
        for tag in ["image", "article", "placeholder", "text", "blockquote", "h6"] {
            assert_eq!(BlockKind::from_tag(tag).as_str(), tag);
        }
        assert_eq!(BlockKind::from_tag("hologram").as_str(), "hologram");
    }

    #[test]
    fn test_block_json_shape() {
        let json = json!({
            "id": "a",
            "type": "image",
            "cover": {"src": "https://img.example/1.jpg", "width": 800, "height": 600},
            "metadata": {"title": "A photo", "starred": true}
        });
        let block: Block = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(block.kind, BlockKind::Image);
        assert!(block.is_starred());
        assert_eq!(block.cover.as_ref().unwrap().width, Some(800));

        // Unknown kinds survive a round-trip untouched.
        let foreign: Block =
            serde_json::from_value(json!({"id": "z", "type": "hologram"})).unwrap();
        let back = serde_json::to_value(&foreign).unwrap();
        assert_eq!(back["type"], "hologram");
    }

    #[test]
    fn test_set_starred_creates_metadata() {
        let mut block = Block::rich_text(SmolStr::new("a"), BlockKind::Text, "<p>hi</p>");
        assert!(!block.is_starred());
        block.set_starred(true);
        assert!(block.is_starred());
    }

    #[test]
    fn test_set_meta_path_deep() {
        let mut block = Block::placeholder(SmolStr::new("p1"));
        block
            .set_meta_path(
                &[SmolStr::new("author"), SmolStr::new("name")],
                json!("jo"),
            )
            .unwrap();
        assert_eq!(block.metadata.as_ref().unwrap()["author"]["name"], "jo");

        // A path through a non-object value fails and leaves the block as-is.
        block
            .set_meta_path(&[SmolStr::new("progress")], json!(50))
            .unwrap();
        let before = block.clone();
        let err = block
            .set_meta_path(&[SmolStr::new("progress"), SmolStr::new("pct")], json!(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidMetadataPath(_)));
        assert_eq!(block, before);

        let err = block.set_meta_path(&[], json!(1)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidMetadataPath(_)));
    }

    #[test]
    fn test_mint_id_unique() {
        assert_ne!(mint_id(), mint_id());
    }
}
