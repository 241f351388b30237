//! Main editor orchestration.
//!
//! ## Learning: The Facade Pattern
//!
//! `Editor` acts as a facade over the document, the carets, the undo stack
//! and the last search. Hosts hand it commands and get `StatusFlags` back;
//! the editor itself applies the caret side of those flags and publishes the
//! document side as events.

use std::path::Path;

use omnivore_segment::{Caret, CaretHistory, CaretList, IndexRange, Segment};

use crate::clipboard::{ClipboardBlob, ClipboardKind, JSON_FORMAT, TEXT_FORMAT};
use crate::command::Command;
use crate::commands::{ByteOp, Paste, PasteMode, PasteRect, PasteTarget, TransformRanges};
use crate::config::Config;
use crate::document::Document;
use crate::event::{DocumentEvent, EventBus};
use crate::flags::StatusFlags;
use crate::search::{SearchOptions, SearchResults, SearcherFactory};
use crate::undo::UndoStack;
use crate::{CoreResult, EditError};

/// Editing state for one open document.
///
/// ## Thread Safety
///
/// `Editor` is owned by the UI thread. Segments share their store through
/// `Rc`, so neither the editor nor its commands are `Send`; observers on
/// other tasks follow changes through [`Editor::subscribe`].
pub struct Editor {
    /// The open document
    document: Document,

    /// Index of the segment being edited
    segment_index: usize,

    /// Carets over the current segment
    carets: CaretList,

    /// Caret positions, separate from command undo
    caret_history: CaretHistory,

    /// Performed commands
    undo_stack: UndoStack,

    /// Results of the last find
    search: SearchResults,

    /// Event bus for notifications
    event_bus: EventBus,

    /// Editor configuration
    config: Config,
}

impl Editor {
    /// Creates an editor over `document` editing its container segment.
    pub fn new(document: Document, config: Config) -> Self {
        let len = document.container().len();
        Self {
            document,
            segment_index: 0,
            carets: CaretList::new(len),
            caret_history: CaretHistory::new(config.editor.caret_history_limit),
            undo_stack: UndoStack::with_limits(
                config.editor.undo_limit,
                config.editor.coalesce_window_ms,
            ),
            search: SearchResults::default(),
            event_bus: EventBus::new(),
            config,
        }
    }

    /// Opens a file and its sidecar metadata.
    pub fn open(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let document = Document::open(path, &config.metadata)?;
        Ok(Self::new(document, config))
    }

    // ==================== Accessors ====================

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The segment being edited.
    pub fn segment(&self) -> &Segment {
        &self.document.segments()[self.segment_index]
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    /// Switches to another segment; carets and search results are reset.
    pub fn select_segment(&mut self, index: usize) -> CoreResult<()> {
        let len = self.document.segment(index)?.len();
        tracing::debug!("editing segment {}", index);
        self.segment_index = index;
        self.carets = CaretList::new(len);
        self.search = SearchResults::default();
        self.caret_history.update(&self.carets);
        Ok(())
    }

    pub fn carets(&self) -> &CaretList {
        &self.carets
    }

    /// Carets for direct manipulation; call [`Editor::record_carets`]
    /// afterwards to add the new position to the caret history.
    pub fn carets_mut(&mut self) -> &mut CaretList {
        &mut self.carets
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo_stack
    }

    pub fn search_results(&self) -> &SearchResults {
        &self.search
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DocumentEvent> {
        self.event_bus.subscribe()
    }

    pub fn is_dirty(&self) -> bool {
        self.undo_stack.is_dirty()
    }

    // ==================== Commands ====================

    /// Performs a command and processes its flags.
    pub fn perform(&mut self, command: Box<dyn Command>) -> StatusFlags {
        let was_dirty = self.is_dirty();
        let mut flags = self.undo_stack.perform(command).flags;
        self.process_flags(&mut flags, was_dirty);
        flags
    }

    pub fn undo(&mut self) -> StatusFlags {
        let was_dirty = self.is_dirty();
        let mut flags = self.undo_stack.undo().flags;
        self.process_flags(&mut flags, was_dirty);
        flags
    }

    pub fn redo(&mut self) -> StatusFlags {
        let was_dirty = self.is_dirty();
        let mut flags = self.undo_stack.redo().flags;
        self.process_flags(&mut flags, was_dirty);
        flags
    }

    /// Collects following commands into one undo step.
    pub fn start_batch(&mut self) {
        self.undo_stack.start_batch();
    }

    pub fn end_batch(&mut self) {
        let was_dirty = self.is_dirty();
        self.undo_stack.end_batch();
        self.emit_save_point(was_dirty);
    }

    /// Applies a byte transform to the selection, or to the byte under each
    /// caret when nothing is selected.
    pub fn transform(&mut self, op: ByteOp) -> StatusFlags {
        let ranges = self.edit_ranges();
        let command = TransformRanges::new(self.segment(), ranges, op);
        self.perform(Box::new(command))
    }

    /// Resolves a transform by short name. A missing operand is the
    /// configured NOP byte for `nop` and zero for everything else.
    pub fn byte_op(&self, name: &str, value: Option<u8>) -> Option<ByteOp> {
        let value = value.unwrap_or(match name {
            "nop" => self.config.editor.nop_byte,
            _ => 0,
        });
        ByteOp::from_short_name(name, value)
    }

    /// Selected ranges, or one-byte ranges at each caret.
    pub fn edit_ranges(&self) -> Vec<IndexRange> {
        if self.carets.has_selection() {
            self.carets.selected_ranges_and_indexes().0
        } else {
            let len = self.segment().len();
            self.carets
                .indexes()
                .into_iter()
                .filter(|&i| i < len)
                .map(|i| (i, i + 1))
                .collect()
        }
    }

    // ==================== Flags ====================

    fn process_flags(&mut self, flags: &mut StatusFlags, was_dirty: bool) {
        tracing::trace!("processing flags: {:?}", flags);
        if let Some(message) = &flags.message {
            tracing::info!("{}", message);
        }
        if flags.success {
            self.process_caret_flags(flags);
            if flags.data_model_changed {
                flags.rebuild_ui = true;
            } else if flags.byte_values_changed || flags.byte_style_changed {
                flags.refresh_needed = true;
            }
            let id = self.document.id();
            for event in DocumentEvent::from_flags(id, flags) {
                self.event_bus.emit(event);
            }
        }
        self.emit_save_point(was_dirty);
    }

    fn process_caret_flags(&mut self, flags: &mut StatusFlags) {
        flags.old_carets = Some(self.carets.state());
        match (flags.select_range, flags.index_range, flags.caret_index) {
            (true, Some(range), caret_index) => {
                let mut caret = Caret::with_selection(range);
                if let Some(index) = caret_index {
                    caret.index = index;
                }
                self.carets.restore(&[caret]);
            }
            (_, _, Some(index)) if flags.add_caret => self.carets.add_caret(index),
            (_, _, Some(index)) if flags.keep_selection => {
                let mut state = self.carets.state();
                if let Some(current) = state.last_mut() {
                    current.index = index;
                }
                self.carets.restore(&state);
            }
            (_, _, Some(index)) => {
                self.carets.set_caret(index);
            }
            _ => {}
        }
        if flags.force_single_caret && self.carets.len() > 1 {
            let current = self.carets.current();
            self.carets.restore(&[current]);
        }
        self.carets.collapse_overlapping();
        self.caret_history.update(&self.carets);
    }

    fn emit_save_point(&self, was_dirty: bool) {
        let dirty = self.is_dirty();
        if dirty != was_dirty {
            self.event_bus.emit(DocumentEvent::SavePointChanged {
                document: self.document.id(),
                dirty,
            });
        }
    }

    // ==================== Caret History ====================

    /// Records the current carets in the caret history.
    pub fn record_carets(&mut self) {
        self.caret_history.update(&self.carets);
    }

    pub fn undo_caret_history(&mut self) -> bool {
        self.caret_history.undo(&mut self.carets)
    }

    pub fn redo_caret_history(&mut self) -> bool {
        self.caret_history.redo(&mut self.carets)
    }

    // ==================== Search ====================

    /// Finds `query` with the searchers enabled in the config.
    pub fn find_all(&mut self, query: &str) -> StatusFlags {
        let factories = SearcherFactory::by_names(&self.config.search.enabled_searchers);
        self.find_all_with(&factories, query)
    }

    /// Finds `query` with an explicit list of searchers.
    pub fn find_all_with(&mut self, factories: &[SearcherFactory], query: &str) -> StatusFlags {
        let options = SearchOptions {
            case_sensitive_text: self.config.search.case_sensitive_text,
        };
        let caret = self.carets.current().index;
        let (results, mut flags) =
            SearchResults::find_all(self.segment(), factories, query, caret, &options);
        self.search = results;
        let was_dirty = self.is_dirty();
        self.process_flags(&mut flags, was_dirty);
        flags
    }

    pub fn find_next(&mut self) -> StatusFlags {
        self.search.set_caret_index(self.carets.current().index);
        let mut flags = self.search.find_next();
        let was_dirty = self.is_dirty();
        self.process_flags(&mut flags, was_dirty);
        flags
    }

    pub fn find_prev(&mut self) -> StatusFlags {
        self.search.set_caret_index(self.carets.current().index);
        let mut flags = self.search.find_prev();
        let was_dirty = self.is_dirty();
        self.process_flags(&mut flags, was_dirty);
        flags
    }

    // ==================== Clipboard ====================

    /// Copies the selected bytes with their style and comments.
    pub fn copy(&self) -> CoreResult<ClipboardBlob> {
        let (ranges, _) = self.carets.selected_ranges_and_indexes();
        Ok(ClipboardBlob::from_ranges(self.segment(), &ranges)?)
    }

    /// Copies the rectangle spanned by the current caret's selection.
    pub fn copy_rect(&self) -> CoreResult<ClipboardBlob> {
        let caret = self.carets.current();
        let (start, end) = caret.range();
        let bytes_per_row = self.config.editor.bytes_per_row;
        Ok(ClipboardBlob::from_rect(self.segment(), start, end, bytes_per_row)?)
    }

    /// Decodes clipboard content and pastes it at the carets.
    pub fn paste_bytes(&mut self, format: &str, bytes: &[u8], mode: PasteMode) -> StatusFlags {
        match self.decode_clipboard(format, bytes) {
            Ok(blob) => self.paste(blob, mode),
            Err(err) => rejected_paste(err),
        }
    }

    fn decode_clipboard(&self, format: &str, bytes: &[u8]) -> Result<ClipboardBlob, EditError> {
        let legacy = format != JSON_FORMAT && format != TEXT_FORMAT;
        if legacy && !self.config.clipboard.accept_legacy {
            return Err(EditError::ClipboardFormatUnsupported(format.to_string()));
        }
        ClipboardBlob::decode(format, bytes)
            .map_err(|err| EditError::ClipboardFormatUnsupported(err.to_string()))
    }

    /// Pastes a decoded blob at the carets. Rectangular blobs land with
    /// their corner at the current caret.
    pub fn paste(&mut self, blob: ClipboardBlob, mode: PasteMode) -> StatusFlags {
        if let Err(err) = blob.validate() {
            return rejected_paste(EditError::ClipboardFormatUnsupported(err.to_string()));
        }
        let segment = self.segment().clone();
        let command: Box<dyn Command> = match (blob.kind, mode) {
            (ClipboardKind::Rect, PasteMode::Normal) => Box::new(PasteRect::new(
                &segment,
                blob,
                self.carets.current().index,
                self.config.editor.bytes_per_row,
            )),
            _ => Box::new(Paste::new(
                &segment,
                blob,
                PasteTarget::from_carets(&self.carets),
                mode,
            )),
        };
        self.perform(command)
    }

    // ==================== Saving ====================

    /// Saves data and sidecar, then marks the save point.
    pub fn save(&mut self) -> CoreResult<()> {
        self.document.save(&self.config.metadata)?;
        self.mark_saved();
        Ok(())
    }

    pub fn save_as(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        self.document.save_as(path, &self.config.metadata)?;
        self.mark_saved();
        Ok(())
    }

    fn mark_saved(&mut self) {
        let was_dirty = self.is_dirty();
        self.undo_stack.set_save_point();
        self.emit_save_point(was_dirty);
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("document", &self.document)
            .field("segment_index", &self.segment_index)
            .field("carets", &self.carets)
            .field("undo_depth", &self.undo_stack.len())
            .finish()
    }
}

fn rejected_paste(err: EditError) -> StatusFlags {
    tracing::warn!("paste rejected: {}", err);
    let mut flags = StatusFlags::new();
    flags.changed_document = false;
    flags.errors.push(err.to_string());
    flags.fail(err.to_string());
    flags
}
