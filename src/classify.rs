//! Part classification: which leaf part is the body, which are images,
//! which are attachments.
//!
//! All functions are pure and total over any part slice, including the
//! empty one. They return indices into the input slice so identity and
//! document order are preserved; callers index back into the same slice.

use crate::model::message::MimePart;

/// Select the main body part.
///
/// Survivors are textual parts not flagged as attachments. Among them the
/// first `text/html` part wins regardless of position; with no HTML the
/// first survivor in document order is used.
pub fn main_body(parts: &[MimePart]) -> Option<usize> {
    let survivors: Vec<usize> = parts
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_text() && !p.is_attachment)
        .map(|(i, _)| i)
        .collect();

    // HTML if available first
    survivors
        .iter()
        .copied()
        .find(|&i| parts[i].content_type.is_html())
        .or_else(|| survivors.first().copied())
}

/// Select the plain-text sibling shown next to an HTML main body.
///
/// Returns `None` whenever `parts[main]` is not HTML; otherwise the first
/// textual non-attachment part distinct from `main`, in document order.
pub fn alternate_body(parts: &[MimePart], main: usize) -> Option<usize> {
    if !parts.get(main)?.content_type.is_html() {
        return None;
    }
    parts
        .iter()
        .enumerate()
        .filter(|&(i, p)| i != main && p.is_text() && !p.is_attachment)
        .map(|(i, _)| i)
        .next()
}

/// All `image/*` parts in document order, independent of the attachment
/// flag.
pub fn images(parts: &[MimePart]) -> Vec<usize> {
    parts
        .iter()
        .enumerate()
        .filter(|(_, p)| p.content_type.is_image())
        .map(|(i, _)| i)
        .collect()
}

/// All attachment-flagged parts in document order, regardless of media
/// type.
pub fn attachments(parts: &[MimePart]) -> Vec<usize> {
    parts
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_attachment)
        .map(|(i, _)| i)
        .collect()
}
