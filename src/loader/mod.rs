//! The mailbox/loader capability consumed by the load controller.
//!
//! Fetch-and-parse is external to the core: anything that can turn a
//! [`MessageEntry`] into a [`ParsedMessage`] plugs in here. The bundled
//! [`eml::EmlDirLoader`] serves `.eml` files from a directory.

pub mod eml;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::model::message::{MessageEntry, ParsedMessage};

/// Asynchronous message-loading capability.
///
/// Implementations must tolerate overlapping calls: a new `load` may be
/// issued before a prior one resolves. The controller discards superseded
/// results by generation, so a loader need not be interruptible.
pub trait MessageLoader: Send + Sync {
    /// Fetch and parse the message named by `entry`.
    fn load<'a>(&'a self, entry: &'a MessageEntry) -> BoxFuture<'a, Result<ParsedMessage>>;
}
