//! Document management.
//!
//! ## Learning: Type Aliases and Newtypes
//!
//! `DocumentId` is a newtype wrapper around `Uuid`. This provides:
//! - Type safety: Can't accidentally pass a segment ID where a document ID
//!   is expected
//! - Encapsulation: Can change the underlying type without breaking APIs
//! - Documentation: The type name explains its purpose

use omnivore_segment::{
    IndexRange, Segment, SegmentDescriptor, SharedData, StyleBits, indexes_to_ranges,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::MetadataConfig;
use crate::sidecar::{self, ExtraMetadata};
use crate::{CoreError, CoreResult};

/// Unique identifier for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new unique document ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A loaded binary file: one shared byte store plus the segments viewing it.
///
/// ## Learning: Composition over Inheritance
///
/// A `Document` does not own bytes directly. It owns the shared store and a
/// list of `Segment` handles into it; segment 0 always covers the whole
/// store.
pub struct Document {
    /// Unique identifier
    id: DocumentId,

    /// Bytes, style, comments, labels and baseline
    store: SharedData,

    /// Views into the store; index 0 is the container
    segments: Vec<Segment>,

    /// File path (None for untitled documents)
    path: Option<PathBuf>,

    /// Display name
    name: String,

    /// Tile layout saved alongside the metadata
    layout: Option<serde_json::Value>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("path", &self.path)
            .field("len", &self.len())
            .field("segments", &self.segments)
            .finish()
    }
}

impl Document {
    /// Creates an untitled document over `data`.
    pub fn new(data: Vec<u8>, name: impl Into<String>) -> Self {
        let container = Segment::new(data, 0, "All");
        Self {
            id: DocumentId::new(),
            store: container.store().clone(),
            segments: vec![container],
            path: None,
            name: name.into(),
            layout: None,
        }
    }

    /// Opens a document from a file.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        tracing::debug!("loaded {} bytes from {}", data.len(), path.display());

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Unknown")
            .to_string();

        let mut document = Self::new(data, name);
        document.path = Some(path.to_path_buf());
        Ok(document)
    }

    /// Opens a document and applies its sidecar metadata, if any.
    pub fn open(path: impl AsRef<Path>, config: &MetadataConfig) -> CoreResult<Self> {
        let path = path.as_ref();
        let mut document = Self::from_file(path)?;
        let sidecar_path = sidecar::sidecar_path(path, &config.sidecar_extension);
        let metadata = ExtraMetadata::load(&sidecar_path)?;
        document.restore_extra_metadata(&metadata)?;
        Ok(document)
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the raw bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.store.borrow().bytes().to_vec()
    }

    pub fn store(&self) -> &SharedData {
        &self.store
    }

    // ==================== Segments ====================

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment covering the whole store.
    pub fn container(&self) -> &Segment {
        &self.segments[0]
    }

    pub fn segment(&self, index: usize) -> CoreResult<&Segment> {
        self.segments
            .get(index)
            .ok_or_else(|| CoreError::SegmentNotFound(index.to_string()))
    }

    pub fn segment_by_name(&self, name: &str) -> CoreResult<&Segment> {
        self.segments
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| CoreError::SegmentNotFound(name.to_string()))
    }

    /// Adds a named view of `length` bytes at `offset`.
    pub fn add_segment(
        &mut self,
        offset: usize,
        length: usize,
        start_addr: usize,
        name: impl Into<String>,
    ) -> CoreResult<&Segment> {
        let segment = Segment::view(&self.store, offset, length, start_addr, name)?;
        tracing::debug!("added segment {:?}", segment);
        self.segments.push(segment);
        Ok(&self.segments[self.segments.len() - 1])
    }

    // ==================== Baseline ====================

    /// Installs baseline bytes, truncating or zero padding them to the
    /// document length. Returns the size difference that was corrected.
    pub fn load_baseline(&mut self, bytes: Vec<u8>) -> isize {
        let difference = self.store.borrow_mut().set_baseline(bytes);
        if difference > 0 {
            tracing::info!("baseline truncated by {} bytes", difference);
        } else if difference < 0 {
            tracing::info!("baseline padded with {} zeros", -difference);
        }
        difference
    }

    pub fn load_baseline_file(&mut self, path: impl AsRef<Path>) -> CoreResult<isize> {
        let path = path.as_ref();
        tracing::debug!("loading baseline data from {}", path.display());
        let bytes = std::fs::read(path)?;
        Ok(self.load_baseline(bytes))
    }

    pub fn clear_baseline(&mut self) {
        self.store.borrow_mut().clear_baseline();
        if let Err(err) = self.container().clear_style(None, StyleBits::DIFF) {
            tracing::warn!("clearing diff style: {}", err);
        }
    }

    pub fn has_baseline(&self) -> bool {
        self.store.borrow().baseline().is_some()
    }

    /// Marks bytes that differ from the baseline with the `diff` style.
    ///
    /// Returns the number of differing bytes.
    pub fn compare_to_baseline(&self) -> CoreResult<usize> {
        Ok(self.container().compare_to_baseline()?)
    }

    // ==================== Metadata ====================

    pub fn layout(&self) -> Option<&serde_json::Value> {
        self.layout.as_ref()
    }

    pub fn set_layout(&mut self, layout: Option<serde_json::Value>) {
        self.layout = layout;
    }

    /// Ranges of each non-zero user style value, keyed by value.
    fn user_style_ranges(&self) -> Vec<(u8, Vec<IndexRange>)> {
        let store = self.store.borrow();
        (1..=StyleBits::USER.bits())
            .filter_map(|value| {
                let indexes: Vec<usize> = store
                    .styles()
                    .iter()
                    .enumerate()
                    .filter(|&(_, &raw)| StyleBits::user_value(raw) == value)
                    .map(|(i, _)| i)
                    .collect();
                (!indexes.is_empty()).then(|| (value, indexes_to_ranges(&indexes)))
            })
            .collect()
    }

    /// Collects the metadata that is saved next to the data file.
    pub fn extra_metadata(&self) -> ExtraMetadata {
        let store = self.store.borrow();
        let comments = store
            .comments()
            .iter()
            .map(|(&i, text)| (i, text.clone()))
            .collect();
        let labels = store
            .labels()
            .iter()
            .map(|(&addr, text)| (addr, text.clone()))
            .collect();
        drop(store);

        ExtraMetadata {
            document_uuid: Some(self.id),
            comments,
            labels,
            user_style: self.user_style_ranges(),
            serialized_segments: self.segments[1..].iter().map(Segment::descriptor).collect(),
            layout: self.layout.clone(),
            other: Default::default(),
        }
    }

    /// Applies metadata read from a sidecar.
    ///
    /// Entries that point outside the document are skipped with a warning.
    pub fn restore_extra_metadata(&mut self, metadata: &ExtraMetadata) -> CoreResult<()> {
        if let Some(id) = metadata.document_uuid {
            self.id = id;
        }
        let container = self.container().clone();
        let len = container.len();
        for (index, text) in &metadata.comments {
            if *index < len {
                container.set_comment(*index, text.clone())?;
            } else {
                tracing::warn!("skipping comment at {} beyond document end", index);
            }
        }
        for (addr, text) in &metadata.labels {
            container.set_label(*addr, text.clone());
        }
        for (value, ranges) in &metadata.user_style {
            let ranges: Vec<IndexRange> = ranges
                .iter()
                .map(|&(s, e)| (s.min(len), e.min(len)))
                .collect();
            container.set_user_style(&ranges, *value)?;
        }
        for desc in &metadata.serialized_segments {
            self.restore_segment(desc);
        }
        if metadata.layout.is_some() {
            self.layout = metadata.layout.clone();
        }
        Ok(())
    }

    fn restore_segment(&mut self, desc: &SegmentDescriptor) {
        match Segment::from_descriptor(&self.store, desc) {
            Ok(segment) => self.segments.push(segment),
            Err(err) => tracing::warn!("skipping segment {}: {}", desc.name, err),
        }
    }

    // ==================== Saving ====================

    /// Saves the data and its sidecar to the document's path.
    pub fn save(&self, config: &MetadataConfig) -> CoreResult<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| CoreError::InvalidOperation("document has no file path".to_string()))?;
        self.write_files(path, config)
    }

    /// Saves to a new path and makes it the document's path.
    pub fn save_as(&mut self, path: impl AsRef<Path>, config: &MetadataConfig) -> CoreResult<()> {
        let path = path.as_ref();
        self.write_files(path, config)?;
        self.path = Some(path.to_path_buf());
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            self.name = name.to_string();
        }
        Ok(())
    }

    fn write_files(&self, path: &Path, config: &MetadataConfig) -> CoreResult<()> {
        tracing::debug!("saving {} bytes to {}", self.len(), path.display());
        std::fs::write(path, self.store.borrow().bytes())?;
        let sidecar_path = sidecar::sidecar_path(path, &config.sidecar_extension);
        self.extra_metadata().save(&sidecar_path, config.pretty_print)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(len: usize) -> Document {
        Document::new((0..len).map(|i| i as u8).collect(), "test")
    }

    #[test]
    fn test_new_has_container_segment() {
        let doc = counting(32);
        assert_eq!(doc.segments().len(), 1);
        assert_eq!(doc.container().len(), 32);
        assert_eq!(doc.segment(0).unwrap().name(), "All");
        assert!(matches!(doc.segment(1), Err(CoreError::SegmentNotFound(_))));
    }

    #[test]
    fn test_segments_share_the_store() {
        let mut doc = counting(32);
        doc.add_segment(16, 8, 0x2000, "code").unwrap();
        let code = doc.segment_by_name("code").unwrap().clone();
        code.write(0, 2, &[0xaa, 0xbb]).unwrap();
        assert_eq!(doc.container().read(16, 18).unwrap(), vec![0xaa, 0xbb]);
        assert!(doc.add_segment(30, 8, 0, "overflow").is_err());
    }

    #[test]
    fn test_baseline_is_resized() {
        let mut doc = counting(8);
        assert_eq!(doc.load_baseline(vec![0; 10]), 2);
        assert!(doc.has_baseline());
        assert_eq!(doc.load_baseline(vec![0, 1]), -6);
        assert_eq!(doc.store().borrow().baseline().unwrap().len(), 8);
        assert_eq!(doc.compare_to_baseline().unwrap(), 6);
        doc.clear_baseline();
        assert!(!doc.has_baseline());
    }

    #[test]
    fn test_save_writes_data_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.xex");
        let config = MetadataConfig::default();

        let mut doc = counting(16);
        doc.container().set_comment(3, "entry").unwrap();
        doc.container().set_label(0x0a, "loop");
        doc.container().set_user_style(&[(4, 6)], 2).unwrap();
        doc.add_segment(8, 8, 0x3000, "tail").unwrap();
        doc.save_as(&path, &config).unwrap();
        assert_eq!(doc.name(), "game.xex");

        let reopened = Document::open(&path, &config).unwrap();
        assert_eq!(reopened.id(), doc.id());
        assert_eq!(reopened.bytes(), doc.bytes());
        assert_eq!(reopened.container().comment_at(3).as_deref(), Some("entry"));
        assert_eq!(reopened.container().label_at(0x0a).as_deref(), Some("loop"));
        assert_eq!(reopened.segment_by_name("tail").unwrap().start_addr(), 0x3000);
        let style = reopened.container().style_range(4, 6).unwrap();
        assert!(style.iter().all(|&s| StyleBits::user_value(s) == 2));
    }

    #[test]
    fn test_open_without_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.bin");
        std::fs::write(&path, [1, 2, 3]).unwrap();
        let doc = Document::open(&path, &MetadataConfig::default()).unwrap();
        assert_eq!(doc.bytes(), vec![1, 2, 3]);
        assert_eq!(doc.path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_without_path_fails() {
        let doc = counting(4);
        assert!(matches!(
            doc.save(&MetadataConfig::default()),
            Err(CoreError::InvalidOperation(_))
        ));
    }
}
