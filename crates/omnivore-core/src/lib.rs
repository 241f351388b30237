//! # Omnivore Core
//!
//! The undoable editing pipeline that sits on top of `omnivore-segment`.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Editor                           │
//! │  ┌───────────┐ ┌───────────┐ ┌──────────┐ ┌───────────┐  │
//! │  │ CaretList │ │ UndoStack │ │ Searches │ │ EventBus  │  │
//! │  └───────────┘ └─────┬─────┘ └────┬─────┘ └───────────┘  │
//! │                      │ perform    │ find                 │
//! │               ┌──────┴────────────┴──────┐               │
//! │               │    Box<dyn Command>      │               │
//! │               └──────────┬───────────────┘               │
//! │                          │ mutate                        │
//! │  ┌───────────────────────┴──────────────────────────┐    │
//! │  │ Document: shared store, baseline, segment views  │    │
//! │  └──────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command returns a [`StatusFlags`] value describing what changed.
//! The editor folds those flags into caret updates and [`DocumentEvent`]s;
//! nothing is reported back to the host through callbacks.
//!
//! ## Learning: Module Organization
//!
//! - `mod foo;` looks for `foo.rs` or `foo/mod.rs`
//! - `pub use` re-exports items for cleaner public APIs

pub mod clipboard;
pub mod command;
pub mod commands;
pub mod config;
pub mod document;
pub mod editor;
pub mod event;
pub mod flags;
pub mod search;
pub mod sidecar;
pub mod undo;

pub use clipboard::{ClipboardBlob, ClipboardKind};
pub use command::{Batch, Command, FieldKind, UndoInfo};
pub use config::Config;
pub use document::{Document, DocumentId};
pub use editor::Editor;
pub use event::{DocumentEvent, EventBus};
pub use flags::StatusFlags;
pub use search::{SearchResults, Searcher, SearcherFactory};
pub use undo::UndoStack;

use omnivore_segment::SegmentError;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Segment not found: {0}")]
    SegmentNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Segment error: {0}")]
    Segment(#[from] SegmentError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] clipboard::ClipboardError),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Failures a command can hit while changing the document.
///
/// These never escape `Command::perform`; they become the `message` of the
/// returned flags with `success` cleared.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Index {start}..{end} out of range for segment of length {len}")]
    IndexOutOfRange { start: usize, end: usize, len: usize },

    #[error("Not found")]
    EmptyResult,

    #[error("Failed to load {uri}: {reason}")]
    FileLoad { uri: String, reason: String },

    #[error("{0}")]
    InvalidSearchQuery(String),

    #[error("Unsupported clipboard data: {0}")]
    ClipboardFormatUnsupported(String),

    #[error("Divide by zero")]
    DivideByZero,

    #[error("No baseline data loaded")]
    NoBaseline,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Segment(SegmentError),
}

impl From<SegmentError> for EditError {
    fn from(err: SegmentError) -> Self {
        match err {
            SegmentError::IndexOutOfRange { start, end, len } => {
                EditError::IndexOutOfRange { start, end, len }
            }
            SegmentError::NoBaseline => EditError::NoBaseline,
            other => EditError::Segment(other),
        }
    }
}

/// Result type for a single command step
pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_errors_map_to_edit_errors() {
        let err: EditError = SegmentError::IndexOutOfRange {
            start: 4,
            end: 40,
            len: 16,
        }
        .into();
        assert_eq!(
            err,
            EditError::IndexOutOfRange {
                start: 4,
                end: 40,
                len: 16
            }
        );
        assert_eq!(EditError::from(SegmentError::NoBaseline), EditError::NoBaseline);
        assert_eq!(EditError::EmptyResult.to_string(), "Not found");
    }
}
