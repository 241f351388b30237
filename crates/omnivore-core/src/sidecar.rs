//! Extra metadata saved next to a data file.
//!
//! The sidecar is `<file>.<ext>` and looks like:
//!
//! ```text
//! # omnivore 0.1.0 extra_metadata=v1
//! {
//!     "comments": [
//!         [3, "entry point"]
//!     ],
//!     "document uuid": "6f1c...",
//!     "labels": [],
//!     ...
//! }
//! ```
//!
//! Keys are sorted. Lists made only of scalars (the `[index, text]` pairs
//! and `[start, end]` ranges) are kept on one line so the file stays short
//! and diffs stay readable.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use omnivore_segment::{IndexRange, SegmentDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CoreResult;
use crate::document::DocumentId;

/// Version tag written in the header line.
pub const FORMAT_TAG: &str = "extra_metadata=v1";

/// Path of the sidecar for `data_path`, with `extension` appended to the
/// full file name.
pub fn sidecar_path(data_path: &Path, extension: &str) -> PathBuf {
    let mut name = data_path.as_os_str().to_owned();
    name.push(".");
    name.push(extension.trim_start_matches('.'));
    PathBuf::from(name)
}

/// Everything the sidecar stores.
///
/// Unknown keys survive a load/save cycle through `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraMetadata {
    #[serde(rename = "document uuid", default, skip_serializing_if = "Option::is_none")]
    pub document_uuid: Option<DocumentId>,

    /// `[raw index, text]`, sorted by index
    #[serde(default)]
    pub comments: Vec<(usize, String)>,

    /// `[address, name]`, sorted by address
    #[serde(default)]
    pub labels: Vec<(usize, String)>,

    /// `[user value, ranges]` for every user style value in use
    #[serde(rename = "user style", default)]
    pub user_style: Vec<(u8, Vec<IndexRange>)>,

    #[serde(rename = "serialized segments", default)]
    pub serialized_segments: Vec<SegmentDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Value>,

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl ExtraMetadata {
    /// Parses sidecar text. A missing header is accepted; unparseable text
    /// gives empty metadata.
    pub fn parse(text: &str) -> Self {
        let body = match text.strip_prefix('#') {
            Some(rest) => rest.split_once('\n').map(|(_, body)| body).unwrap_or(""),
            None => text,
        };
        match serde_json::from_str(body) {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::warn!("JSON parsing error for extra metadata: {}", err);
                Self::default()
            }
        }
    }

    /// Reads a sidecar file; a missing file gives empty metadata.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            tracing::debug!("no extra metadata at {}", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Header line plus JSON body.
    pub fn to_text(&self, pretty: bool) -> CoreResult<String> {
        let value = serde_json::to_value(self)?;
        let mut text = format!("# omnivore {} {}\n", env!("CARGO_PKG_VERSION"), FORMAT_TAG);
        if pretty {
            write_collapsed(&value, 0, &mut text);
        } else {
            text.push_str(&serde_json::to_string(&value)?);
        }
        text.push('\n');
        Ok(text)
    }

    pub fn save(&self, path: &Path, pretty: bool) -> CoreResult<()> {
        tracing::debug!("saving extra metadata to {}", path.display());
        std::fs::write(path, self.to_text(pretty)?)?;
        Ok(())
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str("    ");
    }
}

/// Pretty prints with 4-space indent, except that arrays holding only
/// scalars are written on one line.
fn write_collapsed(value: &Value, level: usize, out: &mut String) {
    match value {
        Value::Array(items) if items.iter().all(is_scalar) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&item.to_string());
            }
            out.push(']');
        }
        Value::Array(items) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                indent(level + 1, out);
                write_collapsed(item, level + 1, out);
                out.push_str(if i + 1 < items.len() { ",\n" } else { "\n" });
            }
            indent(level, out);
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                indent(level + 1, out);
                let _ = write!(out, "{}: ", Value::String(key.clone()));
                write_collapsed(item, level + 1, out);
                out.push_str(if i + 1 < map.len() { ",\n" } else { "\n" });
            }
            indent(level, out);
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtraMetadata {
        ExtraMetadata {
            document_uuid: Some(DocumentId::new()),
            comments: vec![(3, "entry".to_string()), (10, "loop".to_string())],
            labels: vec![(0x600, "start".to_string())],
            user_style: vec![(1, vec![(0, 4), (8, 9)])],
            serialized_segments: vec![SegmentDescriptor {
                name: "code".to_string(),
                offset: 0,
                length: 16,
                start_addr: 0x600,
            }],
            layout: None,
            other: BTreeMap::new(),
        }
    }

    #[test]
    fn test_sidecar_path_appends_extension() {
        assert_eq!(
            sidecar_path(Path::new("/tmp/game.xex"), "omnivore"),
            PathBuf::from("/tmp/game.xex.omnivore")
        );
    }

    #[test]
    fn test_text_has_header_and_sorted_keys() {
        let text = sample().to_text(true).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().ends_with(FORMAT_TAG));
        assert!(text.contains("        [3, \"entry\"],\n"));
        assert!(text.contains("\"start addr\": 1536"));
        let comments = text.find("\"comments\"").unwrap();
        let uuid = text.find("\"document uuid\"").unwrap();
        let labels = text.find("\"labels\"").unwrap();
        assert!(comments < uuid && uuid < labels);
    }

    #[test]
    fn test_parse_round_trip() {
        let metadata = sample();
        assert_eq!(ExtraMetadata::parse(&metadata.to_text(true).unwrap()), metadata);
        assert_eq!(ExtraMetadata::parse(&metadata.to_text(false).unwrap()), metadata);
    }

    #[test]
    fn test_parse_without_header_and_unknown_keys() {
        let parsed = ExtraMetadata::parse(r#"{"comments": [[1, "x"]], "emulator": "atari800"}"#);
        assert_eq!(parsed.comments, vec![(1, "x".to_string())]);
        assert_eq!(parsed.other.get("emulator"), Some(&Value::from("atari800")));
    }

    #[test]
    fn test_parse_error_gives_empty() {
        assert_eq!(ExtraMetadata::parse("# omnivore\n{not json"), ExtraMetadata::default());
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin.omnivore");
        assert_eq!(ExtraMetadata::load(&path).unwrap(), ExtraMetadata::default());
        let metadata = sample();
        metadata.save(&path, true).unwrap();
        assert_eq!(ExtraMetadata::load(&path).unwrap(), metadata);
    }
}
