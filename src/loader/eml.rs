//! Filesystem loader: `.eml` files under a root directory.
//!
//! Entries name files relative to the root. Decoded messages are kept in
//! an LRU cache so re-selecting a message does not repeat MIME decoding.

use std::num::NonZeroUsize;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use futures::future::BoxFuture;
use lru::LruCache;
use mail_parser::{Address, MessageParser, MimeHeaders, PartType};
use tracing::debug;

use crate::error::{LoadError, Result};
use crate::loader::MessageLoader;
use crate::model::content_type::ContentType;
use crate::model::message::{MessageEntry, MimePart, ParsedMessage};

/// Default number of decoded messages to keep in the LRU cache.
const DEFAULT_CACHE_SIZE: usize = 50;

/// Loads and parses `.eml` files from a directory.
pub struct EmlDirLoader {
    root: PathBuf,
    cache: Mutex<LruCache<String, ParsedMessage>>,
}

impl EmlDirLoader {
    /// Open a message directory for loading.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_cache_size(root, DEFAULT_CACHE_SIZE)
    }

    /// Open with an explicit decoded-message cache capacity.
    pub fn with_cache_size(root: impl AsRef<Path>, cache_size: usize) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(LoadError::NotFound(root.display().to_string()));
        }
        let cache_size = NonZeroUsize::new(cache_size.max(1)).expect("clamped to at least 1");
        Ok(Self {
            root,
            cache: Mutex::new(LruCache::new(cache_size)),
        })
    }

    /// Map an entry to a path under the root, refusing anything that
    /// escapes it.
    fn resolve(&self, entry: &MessageEntry) -> Result<PathBuf> {
        let rel = Path::new(entry.id());
        if entry.id().is_empty()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(LoadError::InvalidEntry(entry.id().to_string()));
        }
        Ok(self.root.join(rel))
    }
}

impl MessageLoader for EmlDirLoader {
    fn load<'a>(&'a self, entry: &'a MessageEntry) -> BoxFuture<'a, Result<ParsedMessage>> {
        Box::pin(async move {
            if let Some(hit) = self
                .cache
                .lock()
                .expect("cache mutex poisoned")
                .get(entry.id())
            {
                debug!(entry = %entry, "Decoded-message cache hit");
                return Ok(hit.clone());
            }

            let path = self.resolve(entry)?;
            debug!(entry = %entry, path = %path.display(), "Reading message file");
            let raw = tokio::fs::read(&path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LoadError::NotFound(entry.id().to_string())
                } else {
                    LoadError::io(&path, e)
                }
            })?;

            let message = parse_message(&raw)?;
            self.cache
                .lock()
                .expect("cache mutex poisoned")
                .put(entry.id().to_string(), message.clone());
            Ok(message)
        })
    }
}

/// Parse raw RFC 822 bytes into the flattened view the core consumes.
pub fn parse_message(raw: &[u8]) -> Result<ParsedMessage> {
    let parser = MessageParser::default();
    let message = parser
        .parse(raw)
        .ok_or_else(|| LoadError::Parse("not a parseable MIME message".into()))?;

    Ok(ParsedMessage {
        subject: message.subject().unwrap_or_default().to_string(),
        from: format_addresses(message.from()),
        to: format_addresses(message.to()),
        cc: format_addresses(message.cc()),
        bcc: format_addresses(message.bcc()),
        date: message
            .date()
            .and_then(|d| chrono::DateTime::from_timestamp(d.to_timestamp(), 0)),
        raw_headers: extract_raw_headers(raw),
        parts: collect_leaf_parts(&message),
    })
}

/// Walk the parse tree in document order, keeping leaf parts only.
fn collect_leaf_parts(message: &mail_parser::Message<'_>) -> Vec<MimePart> {
    let mut result = Vec::new();

    for part in &message.parts {
        let (text, size) = match &part.body {
            PartType::Text(t) => (Some(t.to_string()), t.len() as u64),
            PartType::Html(h) => (Some(h.to_string()), h.len() as u64),
            PartType::Binary(b) | PartType::InlineBinary(b) => (None, b.len() as u64),
            PartType::Message(_) => (None, 0),
            // Containers are structure, not content.
            PartType::Multipart(_) => continue,
        };

        let content_type = part
            .content_type()
            .map(|ct| ContentType::new(ct.ctype(), ct.subtype().unwrap_or("")))
            .unwrap_or_else(|| default_content_type(&part.body));

        let is_attachment = part
            .content_disposition()
            .is_some_and(|cd| cd.ctype().eq_ignore_ascii_case("attachment"));

        result.push(MimePart {
            content_type,
            is_attachment,
            text,
            filename: part.attachment_name().map(String::from),
            size,
        });
    }

    result
}

/// Content type to assume when a part carries no `Content-Type` header.
fn default_content_type(body: &PartType<'_>) -> ContentType {
    match body {
        PartType::Text(_) => ContentType::new("text", "plain"),
        PartType::Html(_) => ContentType::new("text", "html"),
        PartType::Message(_) => ContentType::new("message", "rfc822"),
        _ => ContentType::new("application", "octet-stream"),
    }
}

/// Format an address list as `"Name <addr>, …"`.
fn format_addresses(addr: Option<&Address<'_>>) -> String {
    let Some(addr) = addr else {
        return String::new();
    };
    addr.iter()
        .filter_map(|a| match (a.name(), a.address()) {
            (Some(name), Some(address)) => Some(format!("{name} <{address}>")),
            (None, Some(address)) => Some(address.to_string()),
            (Some(name), None) => Some(name.to_string()),
            (None, None) => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extract the raw header block (everything before the first blank line).
fn extract_raw_headers(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    // The separator is whichever blank line comes first.
    let lf = text.find("\n\n");
    let crlf = text.find("\r\n\r\n");
    match (lf, crlf) {
        (Some(a), Some(b)) => text[..a.min(b)].to_string(),
        (Some(a), None) => text[..a].to_string(),
        (None, Some(b)) => text[..b].to_string(),
        (None, None) => text.to_string(),
    }
}
