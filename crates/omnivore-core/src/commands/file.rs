//! Overwriting bytes with the contents of a file.

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use omnivore_segment::Segment;

use crate::command::{Command, FieldKind};
use crate::flags::StatusFlags;
use crate::{EditError, EditResult};

/// Returned by a [`FileLoader`] when the user aborts a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("load cancelled")]
pub struct LoadCancelled;

/// Source of file bytes for [`InsertFile`].
///
/// Loading is synchronous; a loader that shows progress or talks to a
/// remote store does so inside `load`.
pub trait FileLoader: fmt::Debug {
    fn load(&self, uri: &str) -> anyhow::Result<Vec<u8>>;
}

/// Reads local paths, with or without a `file://` prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl FileLoader for FsLoader {
    fn load(&self, uri: &str) -> anyhow::Result<Vec<u8>> {
        let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))
    }
}

/// Overwrites bytes from `start` with a file's contents, clamped to the
/// end of the segment.
#[derive(Debug, Clone)]
pub struct InsertFile {
    segment: Segment,
    start: usize,
    uri: String,
    loader: Rc<dyn FileLoader>,
    /// Loaded once so redo does not read the file again.
    data: Option<Vec<u8>>,
    old_data: Vec<u8>,
}

impl InsertFile {
    pub fn new(segment: &Segment, start: usize, uri: impl Into<String>, loader: Rc<dyn FileLoader>) -> Self {
        Self {
            segment: segment.clone(),
            start,
            uri: uri.into(),
            loader,
            data: None,
            old_data: Vec::new(),
        }
    }

    fn load(&self) -> EditResult<Vec<u8>> {
        self.loader.load(&self.uri).map_err(|err| {
            if err.downcast_ref::<LoadCancelled>().is_some() {
                EditError::Cancelled
            } else {
                EditError::FileLoad {
                    uri: self.uri.clone(),
                    reason: format!("{err:#}"),
                }
            }
        })
    }
}

impl Command for InsertFile {
    fn short_name(&self) -> &'static str {
        "in"
    }

    fn ui_name(&self) -> &'static str {
        "Insert File"
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        &[
            ("segment", FieldKind::Segment),
            ("start_index", FieldKind::Int),
            ("uri", FieldKind::Text),
        ]
    }

    fn describe(&self) -> String {
        format!("{} @ {:04x}", self.ui_name(), self.segment.address(self.start))
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        flags.byte_values_changed = true;
    }

    fn do_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        let len = self.segment.len();
        if self.start >= len {
            return Err(EditError::IndexOutOfRange {
                start: self.start,
                end: self.start + 1,
                len,
            });
        }
        let data = match self.data.take() {
            Some(data) => data,
            None => {
                let mut data = self.load()?;
                data.truncate(len - self.start);
                tracing::debug!("loaded {} bytes from {}", data.len(), self.uri);
                data
            }
        };
        let end = self.start + data.len();
        let old_data = self.segment.read(self.start, end)?;
        self.segment.write(self.start, end, &data)?;
        flags.index_range = Some((self.start, end));
        self.old_data = old_data;
        self.data = Some(data);
        Ok(())
    }

    fn undo_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        let end = self.start + self.old_data.len();
        self.segment.write(self.start, end, &self.old_data)?;
        flags.index_range = Some((self.start, end));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(Debug)]
    struct Cancelling;

    impl FileLoader for Cancelling {
        fn load(&self, _uri: &str) -> anyhow::Result<Vec<u8>> {
            Err(LoadCancelled.into())
        }
    }

    #[test]
    fn test_insert_clamps_to_tail() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xaa; 10]).unwrap();
        let uri = format!("file://{}", file.path().display());

        let seg = Segment::new(vec![0; 8], 0, "test");
        let mut cmd = InsertFile::new(&seg, 4, uri, Rc::new(FsLoader));
        let info = cmd.perform();
        assert!(info.success());
        assert_eq!(info.flags.index_range, Some((4, 8)));
        assert_eq!(seg.to_vec(), vec![0, 0, 0, 0, 0xaa, 0xaa, 0xaa, 0xaa]);

        drop(file);
        cmd.undo();
        assert_eq!(seg.to_vec(), vec![0; 8]);
        assert!(cmd.perform().success());
        assert_eq!(seg.byte(7).unwrap(), 0xaa);
    }

    #[test]
    fn test_missing_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        let seg = Segment::new(vec![0; 8], 0, "test");
        let mut cmd = InsertFile::new(&seg, 0, missing.display().to_string(), Rc::new(FsLoader));
        let info = cmd.perform();
        assert!(!info.success());
        let message = info.flags.message.unwrap_or_default();
        assert!(message.starts_with("Failed to load"), "{message}");
    }

    #[test]
    fn test_cancel() {
        let seg = Segment::new(vec![0; 8], 0, "test");
        let mut cmd = InsertFile::new(&seg, 0, "x", Rc::new(Cancelling));
        let info = cmd.perform();
        assert_eq!(info.flags.message.as_deref(), Some("Operation cancelled"));
    }
}
