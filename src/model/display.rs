//! The display snapshot published to presentation code.
//!
//! A `DisplayState` is produced fresh on every successful load or explicit
//! clear and never mutated afterwards; each update replaces the whole
//! value. A superseded load simply never produces a replacement snapshot,
//! which is what keeps the cancellation race tractable.

use serde::{Deserialize, Serialize};

use crate::classify;
use crate::model::content_type::ContentType;
use crate::model::message::ParsedMessage;

/// Per-attachment metadata surfaced for save/download flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSummary {
    /// Filename from the part headers, if any.
    pub filename: Option<String>,
    /// Content type of the attachment part.
    pub content_type: ContentType,
    /// Decoded size in bytes.
    pub size: u64,
}

/// Immutable aggregate of everything presentation needs to render one
/// message.
///
/// `Default` is the cleared state: all fields empty/false/zero and
/// `is_loading == false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Decoded subject line.
    pub subject: String,
    /// Formatted `From:` address list.
    pub from: String,
    /// Formatted `To:` address list.
    pub to: String,
    /// Formatted `CC:` address list.
    pub cc: String,
    /// Formatted `BCC:` address list.
    pub bcc: String,
    /// `Date:` header rendered as RFC 2822, or empty.
    pub date: String,
    /// The raw header block, line endings preserved from the source.
    pub headers: String,

    /// Text of the selected main body part, if any.
    pub main_body: Option<String>,
    /// Whether the main body is `text/html`.
    pub main_body_is_html: bool,
    /// Plain-text sibling of an HTML main body, when one exists.
    pub alternate_body: Option<String>,

    /// Number of parts flagged as attachments, independent of media type.
    pub attachment_count: usize,
    /// Number of `image/*` parts, independent of the attachment flag.
    pub image_count: usize,
    /// One summary per attachment-flagged part, in document order.
    pub attachments: Vec<AttachmentSummary>,

    /// `true` while a load is in flight for the current selection.
    pub is_loading: bool,
}

impl DisplayState {
    /// Build a complete snapshot from a parsed message by running the
    /// part classifier over its leaf parts.
    pub fn compose(message: &ParsedMessage) -> Self {
        let parts = &message.parts;

        let main = classify::main_body(parts);
        let main_body = main.and_then(|i| parts[i].text.clone());
        let main_body_is_html = main.is_some_and(|i| parts[i].content_type.is_html());
        let alternate_body = main
            .and_then(|i| classify::alternate_body(parts, i))
            .and_then(|i| parts[i].text.clone());

        let attachment_indices = classify::attachments(parts);
        let attachments: Vec<AttachmentSummary> = attachment_indices
            .iter()
            .map(|&i| AttachmentSummary {
                filename: parts[i].filename.clone(),
                content_type: parts[i].content_type.clone(),
                size: parts[i].size,
            })
            .collect();

        Self {
            subject: message.subject.clone(),
            from: message.from.clone(),
            to: message.to.clone(),
            cc: message.cc.clone(),
            bcc: message.bcc.clone(),
            date: message.date.map(|d| d.to_rfc2822()).unwrap_or_default(),
            headers: message.raw_headers.clone(),
            main_body,
            main_body_is_html,
            alternate_body,
            attachment_count: attachment_indices.len(),
            image_count: classify::images(parts).len(),
            attachments,
            is_loading: false,
        }
    }

    /// The snapshot published while a new load is in flight: previous
    /// content retained, `is_loading` raised.
    pub fn loading_from(previous: &DisplayState) -> Self {
        Self {
            is_loading: true,
            ..previous.clone()
        }
    }

    /// Convenience for presentation: any attachments at all?
    pub fn has_attachments(&self) -> bool {
        self.attachment_count > 0
    }
}
