//! Content-type → file-extension resolution.
//!
//! The lookup itself is an injected capability so the core never depends
//! on any operating system's association database. Hosts that have one
//! (Windows registry, xdg-mime, …) implement [`ExtensionLookup`] over it;
//! everyone else uses the portable [`StaticExtensionTable`].

use std::collections::{BTreeMap, HashMap};

/// Pluggable lookup capability: `(media_type, subtype)` → extension.
///
/// A miss is a normal outcome, never an error.
pub trait ExtensionLookup: Send + Sync {
    /// Return the extension (without a leading dot) for the given type,
    /// or `None` when the type is unknown.
    fn lookup(&self, media_type: &str, subtype: &str) -> Option<String>;
}

/// Portable default mapping for well-known media types.
#[derive(Debug, Clone)]
pub struct StaticExtensionTable {
    map: HashMap<String, String>,
}

impl StaticExtensionTable {
    /// Build the table with the built-in well-known mappings.
    pub fn new() -> Self {
        let mut map = HashMap::new();
        for (mime, ext) in [
            ("text/plain", "txt"),
            ("text/html", "html"),
            ("text/csv", "csv"),
            ("text/calendar", "ics"),
            ("text/xml", "xml"),
            ("image/png", "png"),
            ("image/jpeg", "jpg"),
            ("image/gif", "gif"),
            ("image/webp", "webp"),
            ("image/svg+xml", "svg"),
            ("image/bmp", "bmp"),
            ("image/tiff", "tiff"),
            ("application/pdf", "pdf"),
            ("application/zip", "zip"),
            ("application/gzip", "gz"),
            ("application/json", "json"),
            ("application/xml", "xml"),
            ("application/msword", "doc"),
            (
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "docx",
            ),
            (
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "xlsx",
            ),
            ("audio/mpeg", "mp3"),
            ("audio/ogg", "ogg"),
            ("video/mp4", "mp4"),
            ("video/mpeg", "mpeg"),
            ("message/rfc822", "eml"),
        ] {
            map.insert(mime.to_string(), ext.to_string());
        }
        Self { map }
    }

    /// Build the default table with host-supplied overrides layered on
    /// top. Keys are `"media/subtype"` strings, values bare extensions.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut table = Self::new();
        for (mime, ext) in overrides {
            table
                .map
                .insert(mime.trim().to_ascii_lowercase(), ext.trim().to_string());
        }
        table
    }
}

impl Default for StaticExtensionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionLookup for StaticExtensionTable {
    fn lookup(&self, media_type: &str, subtype: &str) -> Option<String> {
        self.map
            .get(&format!("{media_type}/{subtype}"))
            .cloned()
    }
}

/// Resolver facade over an injected [`ExtensionLookup`].
///
/// Normalizes case before delegating; consumed by presentation code (e.g.
/// to suggest a filename when saving an attachment), not by the
/// classifier.
pub struct ExtensionResolver {
    lookup: Box<dyn ExtensionLookup>,
}

impl ExtensionResolver {
    /// Wrap a host-supplied lookup capability.
    pub fn new(lookup: impl ExtensionLookup + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// A resolver over the portable default table.
    pub fn with_defaults() -> Self {
        Self::new(StaticExtensionTable::new())
    }

    /// Resolve an extension for the given type. `None` on a miss.
    pub fn resolve(&self, media_type: &str, subtype: &str) -> Option<String> {
        self.lookup.lookup(
            &media_type.trim().to_ascii_lowercase(),
            &subtype.trim().to_ascii_lowercase(),
        )
    }
}
