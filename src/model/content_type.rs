//! MIME content-type value type.

use serde::{Deserialize, Serialize};

/// A parsed `Content-Type` pair, e.g. `("text", "html")`.
///
/// Media type and subtype are stored lowercase; MIME types are
/// case-insensitive (RFC 2045 §5.1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentType {
    /// Top-level media type (`"text"`, `"image"`, `"application"`, …).
    pub media_type: String,
    /// Subtype (`"plain"`, `"html"`, `"png"`, …).
    pub subtype: String,
}

impl ContentType {
    /// Create a content type, normalizing both components to lowercase.
    pub fn new(media_type: impl AsRef<str>, subtype: impl AsRef<str>) -> Self {
        Self {
            media_type: media_type.as_ref().trim().to_ascii_lowercase(),
            subtype: subtype.as_ref().trim().to_ascii_lowercase(),
        }
    }

    /// Parse a `"media/subtype"` string.
    ///
    /// A missing subtype yields an empty one: `"text"` → `("text", "")`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('/') {
            Some((media, sub)) => Self::new(media, sub),
            None => Self::new(raw, ""),
        }
    }

    /// Case-insensitive match against a media type and subtype pattern.
    ///
    /// `"*"` as the subtype pattern matches any subtype:
    /// `ct.matches("image", "*")` is true for every image part.
    pub fn matches(&self, media_type: &str, subtype: &str) -> bool {
        self.media_type.eq_ignore_ascii_case(media_type)
            && (subtype == "*" || self.subtype.eq_ignore_ascii_case(subtype))
    }

    /// `true` for `text/html`.
    pub fn is_html(&self) -> bool {
        self.matches("text", "html")
    }

    /// `true` for any `image/*` subtype.
    pub fn is_image(&self) -> bool {
        self.matches("image", "*")
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.media_type, self.subtype)
    }
}
