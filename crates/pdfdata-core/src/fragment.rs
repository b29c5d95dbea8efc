//! Positioned text fragments and the per-page content stream.
//!
//! A content source reports each page as an ordered sequence of
//! [`ContentItem`]s: text [`Fragment`]s interleaved with marked-content
//! begin/end events.

use crate::geometry::BBox;

/// Font size assumed when a fragment carries no usable height or width.
pub const DEFAULT_FONT_SIZE: f64 = 10.0;

/// Writing direction of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum TextDirection {
    /// Left-to-right (the only direction laid out into cells).
    #[default]
    Ltr,
    /// Right-to-left.
    Rtl,
    /// Top-to-bottom.
    Ttb,
    /// Bottom-to-top.
    Btt,
}

impl TextDirection {
    /// Returns the lowercase tag for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
            TextDirection::Ttb => "ttb",
            TextDirection::Btt => "btt",
        }
    }
}

/// One positioned run of text reported by a content source.
///
/// `(x, y)` is the baseline origin in PDF user space (y grows upward).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    /// Glyph height, normally the effective font size.
    #[cfg_attr(feature = "serde", serde(default))]
    pub height: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub direction: TextDirection,
    /// The fragment is the last one on its visual line.
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_eol: bool,
    /// Structure tag of the innermost enclosing marked-content section.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tag: Option<String>,
    /// Marked-content identifier (MCID) of the enclosing section.
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: Option<u32>,
    /// The fragment belongs to pagination artifacts (running headers, page numbers).
    #[cfg_attr(feature = "serde", serde(default))]
    pub artifact: bool,
}

impl Fragment {
    /// Create a left-to-right fragment with no height, tag, or line end.
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height: None,
            direction: TextDirection::Ltr,
            has_eol: false,
            tag: None,
            id: None,
            artifact: false,
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_eol(mut self) -> Self {
        self.has_eol = true;
        self
    }

    pub fn with_direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>, id: Option<u32>) -> Self {
        self.tag = Some(tag.into());
        self.id = id;
        self
    }

    pub fn as_artifact(mut self) -> Self {
        self.artifact = true;
        self
    }

    /// Estimated font size.
    ///
    /// Uses the reported height when positive, otherwise assumes glyphs
    /// average half an em wide, and finally falls back to
    /// [`DEFAULT_FONT_SIZE`].
    pub fn font_size(&self) -> f64 {
        if let Some(h) = self.height.filter(|h| *h > 0.0) {
            return h;
        }
        let chars = self.text.chars().count();
        if self.width > 0.0 && chars > 0 {
            return self.width / chars as f64 * 2.0;
        }
        DEFAULT_FONT_SIZE
    }

    /// Right edge of the fragment.
    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    /// Extent of the fragment: baseline to baseline plus font size.
    pub fn bbox(&self) -> BBox {
        BBox::new(self.x, self.y, self.x2(), self.y + self.font_size())
    }

    /// True for fragments consisting only of whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// One entry of a page's content stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "camelCase")
)]
pub enum ContentItem {
    /// A positioned text run.
    Text(Fragment),
    /// `BMC`: marked content without a property list.
    BeginMarkedContent { tag: String },
    /// `BDC`: marked content with a property list, `id` is the MCID.
    BeginMarkedContentProps { tag: String, id: Option<u32> },
    /// `EMC`: end of the innermost marked-content section.
    EndMarkedContent,
}

impl From<Fragment> for ContentItem {
    fn from(fragment: Fragment) -> Self {
        ContentItem::Text(fragment)
    }
}
