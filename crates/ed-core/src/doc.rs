//! The edit tree: the structured document handed to the text-editing
//! engine.
//!
//! Rich-text blocks become editable nodes carrying their serialized
//! fragment; media blocks become atomic leaves tagged with id and kind. The
//! fold block is never part of the tree. Node sizes follow the editing
//! engine's convention: an atomic leaf counts as 1, an editable node counts
//! as its visible character length plus 2 boundary markers.

use crate::block::{BlockId, BlockKind, Cover};

/// A single node in the edit tree.
#[derive(Clone, Debug, PartialEq)]
pub enum DocNode {
    /// An editable rich-text node.
    Text {
        id: BlockId,
        kind: BlockKind,
        html: String,
    },
    /// An atomic, non-editable media leaf. `cover` is renderable
    /// decoration only; `None` renders as an inert placeholder.
    Media {
        id: BlockId,
        kind: BlockKind,
        cover: Option<Cover>,
    },
}

impl DocNode {
    pub fn id(&self) -> &BlockId {
        match self {
            Self::Text { id, .. } | Self::Media { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &BlockKind {
        match self {
            Self::Text { kind, .. } | Self::Media { kind, .. } => kind,
        }
    }

    /// Node size in the document's flat offset space.
    pub fn size(&self) -> usize {
        match self {
            Self::Media { .. } => 1,
            Self::Text { html, .. } => visible_len(html) + 2,
        }
    }
}

/// The full edit tree: an ordered sequence of top-level nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Doc {
    children: Vec<DocNode>,
}

impl Doc {
    pub fn new(children: Vec<DocNode>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[DocNode] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Total size of the tree in flat offsets.
    pub fn size(&self) -> usize {
        self.children.iter().map(DocNode::size).sum()
    }

    /// Cumulative size of the children before `index`.
    pub fn offset_of(&self, index: usize) -> usize {
        self.children[..index.min(self.children.len())]
            .iter()
            .map(DocNode::size)
            .sum()
    }

    /// Find the child containing the given flat offset. Returns the child
    /// index and the offset within that child, or `None` when the offset is
    /// at or past the end of the tree.
    pub fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        let mut cum = 0;
        for (index, child) in self.children.iter().enumerate() {
            let size = child.size();
            if offset < cum + size {
                return Some((index, offset - cum));
            }
            cum += size;
        }
        None
    }
}

/// Count the visible characters of an HTML fragment, skipping tags.
pub(crate) fn visible_len(html: &str) -> usize {
    let mut len = 0;
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => len += 1,
            _ => {}
        }
    }
    len
}

#[cfg(test)]
mod tests {
    use smol_str::SmolStr;

    use super::*;

    fn text(id: &str, html: &str) -> DocNode {
        DocNode::Text {
            id: SmolStr::new(id),
            kind: BlockKind::Text,
            html: html.to_owned(),
        }
    }

    fn media(id: &str) -> DocNode {
        DocNode::Media {
            id: SmolStr::new(id),
            kind: BlockKind::Image,
            cover: None,
        }
    }

    #[test]
    fn test_visible_len() {
        assert_eq!(visible_len(""), 0);
        assert_eq!(visible_len("<p></p>"), 0);
        assert_eq!(visible_len("<p>hi</p>"), 2);
        assert_eq!(visible_len("<h1>héllo</h1>"), 5);
    }

    #[test]
    fn test_node_sizes() {
        assert_eq!(media("m").size(), 1);
        assert_eq!(text("a", "<p>hi</p>").size(), 4);
        assert_eq!(text("b", "<p></p>").size(), 2);
    }

    #[test]
    fn test_locate_and_offsets() {
        // Sizes: 4, 1, 4 -> total 9.
        let doc = Doc::new(vec![text("a", "<p>hi</p>"), media("m"), text("b", "<p>ok</p>")]);
        assert_eq!(doc.size(), 9);
        assert_eq!(doc.offset_of(0), 0);
        assert_eq!(doc.offset_of(1), 4);
        assert_eq!(doc.offset_of(2), 5);

        assert_eq!(doc.locate(0), Some((0, 0)));
        assert_eq!(doc.locate(3), Some((0, 3)));
        assert_eq!(doc.locate(4), Some((1, 0)));
        assert_eq!(doc.locate(5), Some((2, 0)));
        assert_eq!(doc.locate(8), Some((2, 3)));
        assert_eq!(doc.locate(9), None);
    }

    #[test]
    fn test_empty_doc() {
        let doc = Doc::default();
        assert!(doc.is_empty());
        assert_eq!(doc.size(), 0);
        assert_eq!(doc.locate(0), None);
    }
}
