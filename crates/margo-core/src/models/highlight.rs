use serde::{Deserialize, Serialize};

/// A user-created annotation anchored to a region or text span of a
/// document.
///
/// Serialized with the same camelCase shape the archive file uses, so a
/// highlight written by earlier builds round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    /// Client-generated id, unique within a document's registry.
    pub id: String,
    pub content: HighlightContent,
    pub position: HighlightPosition,
    pub comment: Comment,
    /// False for a highlight created in-session but not yet written to the
    /// archive; forced true when its thread is persisted.
    pub is_saved: bool,
}

/// Captured content of a highlight. Exactly one of `text` / `image` is
/// populated: `text` for a text-span highlight, `image` (a base64
/// screenshot, captured after first render) for an area highlight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,
}

/// Geometric region of a highlight within the document, as reported by the
/// rendering overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightPosition {
    pub bounding_rect: Rect,
    #[serde(default)]
    pub rects: Vec<Rect>,
    pub page_number: u32,
}

/// An axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub height: f64,
}

/// Reader-entered note attached to a highlight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub emoji: String,
}

/// A completed selection that has not been registered yet: everything a
/// [`Highlight`] carries except its id and saved flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHighlight {
    pub content: HighlightContent,
    pub position: HighlightPosition,
    pub comment: Comment,
}

/// Partial update merged shallowly into an existing highlight.
///
/// Used for the two-phase area highlight: geometry is registered first and
/// the screenshot arrives after first render.
#[derive(Debug, Clone, Default)]
pub struct HighlightPatch {
    pub position: PositionPatch,
    pub content: ContentPatch,
}

#[derive(Debug, Clone, Default)]
pub struct PositionPatch {
    pub bounding_rect: Option<Rect>,
    pub rects: Option<Vec<Rect>>,
    pub page_number: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ContentPatch {
    pub text: Option<String>,
    pub image: Option<String>,
}

impl Highlight {
    /// Register a draft under a fresh id. The highlight is unsaved until
    /// its thread is written to the archive.
    pub fn from_draft(id: String, draft: NewHighlight) -> Self {
        Self {
            id,
            content: draft.content,
            position: draft.position,
            comment: draft.comment,
            is_saved: false,
        }
    }

    /// Whether this is an area (screenshot) highlight rather than a text
    /// span.
    pub fn is_area(&self) -> bool {
        self.content.image.is_some()
    }

    /// Merge a partial update into this highlight. Fields absent from the
    /// patch are left untouched.
    pub fn apply(&mut self, patch: &HighlightPatch) {
        if let Some(rect) = patch.position.bounding_rect {
            self.position.bounding_rect = rect;
        }
        if let Some(rects) = &patch.position.rects {
            self.position.rects = rects.clone();
        }
        if let Some(page) = patch.position.page_number {
            self.position.page_number = page;
        }
        if let Some(text) = &patch.content.text {
            self.content.text = Some(text.clone());
        }
        if let Some(image) = &patch.content.image {
            self.content.image = Some(image.clone());
        }
    }
}
