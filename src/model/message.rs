//! Message identity and the parsed-message view consumed by classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content_type::ContentType;

/// Opaque identifier for a message in the external mailbox store.
///
/// The core never interprets the contents; it only hands the entry to the
/// [`MessageLoader`](crate::loader::MessageLoader). The bundled
/// [`EmlDirLoader`](crate::loader::eml::EmlDirLoader) treats it as a file
/// path relative to its root directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageEntry(String);

impl MessageEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessageEntry {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MessageEntry {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One leaf part of a parsed MIME tree, as seen by the classifier.
///
/// Position within [`ParsedMessage::parts`] is the document order from the
/// parse; the classifier never re-sorts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MimePart {
    /// Declared (or defaulted) content type of the part.
    pub content_type: ContentType,

    /// `true` when `Content-Disposition` marks the part `attachment`,
    /// independent of its media type.
    pub is_attachment: bool,

    /// Decoded text content. Present only for textual parts.
    pub text: Option<String>,

    /// Filename from the part headers, if any.
    pub filename: Option<String>,

    /// Decoded size in bytes.
    pub size: u64,
}

impl MimePart {
    /// A part is textual when it carries decoded text content.
    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }
}

/// The parsed MIME entity tree flattened to what display needs: envelope
/// strings plus the ordered leaf parts.
///
/// Produced by a [`MessageLoader`](crate::loader::MessageLoader); address
/// lists arrive pre-formatted (`"Name <addr>, …"`) so the core carries no
/// address-parsing dependency of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedMessage {
    /// Decoded subject line (may be empty).
    pub subject: String,

    /// Formatted `From:` address list.
    pub from: String,

    /// Formatted `To:` address list.
    pub to: String,

    /// Formatted `CC:` address list.
    pub cc: String,

    /// Formatted `BCC:` address list.
    pub bcc: String,

    /// Parsed `Date:` header.
    pub date: Option<DateTime<Utc>>,

    /// Raw header block, verbatim from the message source.
    pub raw_headers: String,

    /// Leaf parts in document order.
    pub parts: Vec<MimePart>,
}
