//! Document change notifications.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! Commands report what they changed through `StatusFlags`. The editor turns
//! those flags into `DocumentEvent` values on a `tokio::sync::broadcast`
//! channel, so any number of observers can follow changes without holding
//! references into the editor.

use omnivore_segment::IndexRange;
use tokio::sync::broadcast;

use crate::document::DocumentId;
use crate::flags::StatusFlags;

/// Something that changed in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Byte values changed over a span of segment indexes.
    ByteValuesChanged(DocumentId, Option<IndexRange>),
    /// Style bits changed over a span of segment indexes.
    ByteStyleChanged(DocumentId, Option<IndexRange>),
    /// Segments were added, removed or resized.
    StructureChanged(DocumentId),
    /// Comments or labels need saving.
    MetadataDirty(DocumentId),
    /// The undo stack moved relative to the save point.
    SavePointChanged { document: DocumentId, dirty: bool },
}

impl DocumentEvent {
    /// Events implied by a command's flags.
    pub fn from_flags(document: DocumentId, flags: &StatusFlags) -> Vec<DocumentEvent> {
        let mut events = Vec::new();
        if flags.byte_values_changed {
            events.push(DocumentEvent::ByteValuesChanged(document, flags.index_range));
        }
        if flags.byte_style_changed {
            events.push(DocumentEvent::ByteStyleChanged(document, flags.index_range));
        }
        if flags.data_model_changed || flags.rebuild_ui {
            events.push(DocumentEvent::StructureChanged(document));
        }
        if flags.metadata_dirty {
            events.push(DocumentEvent::MetadataDirty(document));
        }
        events
    }
}

/// Broadcasts document events to every subscriber.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DocumentEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event; having no subscribers is fine.
    pub fn emit(&self, event: DocumentEvent) {
        tracing::trace!("event {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let id = DocumentId::new();

        bus.emit(DocumentEvent::MetadataDirty(id));

        assert_eq!(rx1.recv().await.unwrap(), DocumentEvent::MetadataDirty(id));
        assert!(rx2.recv().await.is_ok());
    }

    #[test]
    fn test_events_from_flags() {
        let id = DocumentId::new();
        let mut flags = StatusFlags::new();
        flags.byte_values_changed = true;
        flags.metadata_dirty = true;
        flags.index_range = Some((2, 6));
        assert_eq!(
            DocumentEvent::from_flags(id, &flags),
            vec![
                DocumentEvent::ByteValuesChanged(id, Some((2, 6))),
                DocumentEvent::MetadataDirty(id),
            ]
        );
    }
}
