//! `mailview` — headless message-display core for email clients.
//!
//! Given a parsed MIME entity tree, this crate decides which leaf part is
//! the main body, which parts are inline images, and which are
//! attachments, and manages the asynchronous, cancellable loading of the
//! currently selected message. Presentation code subscribes to immutable
//! [`model::display::DisplayState`] snapshots; a superseded load never
//! overwrites a newer selection.

pub mod classify;
pub mod config;
pub mod controller;
pub mod error;
pub mod extension;
pub mod loader;
pub mod model;
