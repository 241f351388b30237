//! Clipboard blobs: the selection data carried between copy and paste.
//!
//! The primary wire form is JSON:
//!
//! ```json
//! { "kind": "multi", "data": [1, 2, 3], "indexes": [4, 5, 9],
//!   "style": [0, 0, 32], "comment_positions": [2], "comment_texts": ["hi"] }
//! ```
//!
//! With the `legacy-clipboard` feature the comma-prefixed byte strings of
//! older releases are also accepted.

use omnivore_segment::{
    IndexRange, Segment, SegmentResult, collapse_overlapping_ranges, ranges_to_indexes,
};
use serde::{Deserialize, Serialize};

/// Format name of the JSON blob.
pub const JSON_FORMAT: &str = "omnivore/blob+json";
/// Format name of plain text pasted as bytes.
pub const TEXT_FORMAT: &str = "text";

/// Errors decoding clipboard data
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("Unsupported clipboard format: {0}")]
    Unsupported(String),

    #[error("Malformed clipboard data: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shape of the copied selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardKind {
    /// One contiguous range.
    Single,
    /// Several ranges; `indexes` keeps their relative spacing.
    Multi,
    /// A rectangle of `num_rows` by `num_cols` bytes.
    Rect,
}

/// Bytes plus optional style and comments of a copied selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardBlob {
    pub kind: ClipboardKind,
    pub data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment_positions: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment_texts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_cols: Option<usize>,
}

impl ClipboardBlob {
    /// A plain single-range blob with no metadata.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            kind: ClipboardKind::Single,
            data,
            indexes: None,
            style: None,
            comment_positions: Vec::new(),
            comment_texts: Vec::new(),
            num_rows: None,
            num_cols: None,
        }
    }

    /// Copies the bytes, style and comments under `ranges`.
    ///
    /// One range gives a `Single` blob; more give a `Multi` blob that
    /// remembers the source indexes.
    pub fn from_ranges(segment: &Segment, ranges: &[IndexRange]) -> SegmentResult<Self> {
        let ranges = collapse_overlapping_ranges(ranges);
        let indexes = ranges_to_indexes(&ranges);
        let data = segment.read_at(&indexes)?;
        let meta = segment.calc_selected_index_metadata(&indexes)?;
        let multi = ranges.len() > 1;
        Ok(Self {
            kind: if multi { ClipboardKind::Multi } else { ClipboardKind::Single },
            data,
            indexes: multi.then_some(indexes),
            style: Some(meta.style),
            comment_positions: meta.comment_positions,
            comment_texts: meta.comment_texts,
            num_rows: None,
            num_cols: None,
        })
    }

    /// Copies the rectangle spanned by two anchors on a grid
    /// `bytes_per_row` wide.
    pub fn from_rect(
        segment: &Segment,
        anchor_start: usize,
        anchor_end: usize,
        bytes_per_row: usize,
    ) -> SegmentResult<Self> {
        let indexes = segment.rect_indexes(anchor_start, anchor_end, bytes_per_row);
        let num_rows = match (indexes.first(), indexes.last()) {
            (Some(first), Some(last)) => last / bytes_per_row - first / bytes_per_row + 1,
            _ => 0,
        };
        let num_cols = if num_rows == 0 { 0 } else { indexes.len() / num_rows };
        let mut blob = Self::from_bytes(segment.read_at(&indexes)?);
        blob.kind = ClipboardKind::Rect;
        blob.style = Some(segment.style_at(&indexes)?);
        blob.num_rows = Some(num_rows);
        blob.num_cols = Some(num_cols);
        Ok(blob)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn has_comments(&self) -> bool {
        !self.comment_positions.is_empty()
    }

    /// `(rows, cols)` of a rectangular blob.
    pub fn rect_shape(&self) -> Option<(usize, usize)> {
        match (self.kind, self.num_rows, self.num_cols) {
            (ClipboardKind::Rect, Some(rows), Some(cols)) => Some((rows, cols)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<String, ClipboardError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ClipboardError> {
        let blob: Self = serde_json::from_str(text)?;
        blob.validate()?;
        Ok(blob)
    }

    /// Decodes clipboard content published under `format`.
    pub fn decode(format: &str, bytes: &[u8]) -> Result<Self, ClipboardError> {
        match format {
            JSON_FORMAT => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| ClipboardError::Malformed(e.to_string()))?;
                Self::from_json(text)
            }
            TEXT_FORMAT => Ok(Self::from_bytes(bytes.to_vec())),
            #[cfg(feature = "legacy-clipboard")]
            legacy::SINGLE_FORMAT | legacy::MULTI_FORMAT | legacy::RECT_FORMAT => {
                legacy::decode(format, bytes)
            }
            other => Err(ClipboardError::Unsupported(other.to_string())),
        }
    }

    /// Checks that the parallel fields agree in length.
    pub fn validate(&self) -> Result<(), ClipboardError> {
        if let Some(indexes) = &self.indexes {
            if indexes.len() != self.data.len() {
                return Err(ClipboardError::Malformed(format!(
                    "{} indexes for {} bytes",
                    indexes.len(),
                    self.data.len()
                )));
            }
        }
        if self.comment_positions.len() != self.comment_texts.len() {
            return Err(ClipboardError::Malformed(
                "comment positions and texts differ in length".to_string(),
            ));
        }
        if let Some((rows, cols)) = self.rect_shape() {
            if rows.checked_mul(cols) != Some(self.data.len()) {
                return Err(ClipboardError::Malformed(format!(
                    "{rows}x{cols} rectangle with {} bytes",
                    self.data.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "legacy-clipboard")]
mod legacy {
    //! Comma-prefixed byte strings:
    //!
    //! - single: `<len_data>,<data><meta_json>`
    //! - multi: `<len_data>,<len_idx>,<data><idx_raw><meta_json>` where
    //!   `idx_raw` is little-endian `u32` indexes
    //! - rect: `<rows>,<cols>,<raw>`

    use serde::Deserialize;

    use super::{ClipboardBlob, ClipboardError, ClipboardKind};

    pub const SINGLE_FORMAT: &str = "numpy";
    pub const MULTI_FORMAT: &str = "numpy,multiple";
    pub const RECT_FORMAT: &str = "numpy,columns";

    #[derive(Debug, Default, Deserialize)]
    struct Meta {
        #[serde(default)]
        style: Option<Vec<u8>>,
        #[serde(default)]
        comments: Vec<(usize, String)>,
    }

    /// Splits off a decimal length prefix terminated by a comma.
    fn take_len(bytes: &[u8]) -> Result<(usize, &[u8]), ClipboardError> {
        let comma = bytes
            .iter()
            .position(|&b| b == b',')
            .ok_or_else(|| ClipboardError::Malformed("missing length prefix".to_string()))?;
        let len = std::str::from_utf8(&bytes[..comma])
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| ClipboardError::Malformed("bad length prefix".to_string()))?;
        Ok((len, &bytes[comma + 1..]))
    }

    fn split(bytes: &[u8], len: usize) -> Result<(&[u8], &[u8]), ClipboardError> {
        if bytes.len() < len {
            return Err(ClipboardError::Malformed(format!(
                "expected {len} bytes, found {}",
                bytes.len()
            )));
        }
        Ok(bytes.split_at(len))
    }

    fn apply_meta(blob: &mut ClipboardBlob, rest: &[u8]) -> Result<(), ClipboardError> {
        if rest.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        let meta: Meta = serde_json::from_slice(rest)?;
        blob.style = meta.style;
        for (position, text) in meta.comments {
            blob.comment_positions.push(position);
            blob.comment_texts.push(text);
        }
        Ok(())
    }

    pub fn decode(format: &str, bytes: &[u8]) -> Result<ClipboardBlob, ClipboardError> {
        match format {
            SINGLE_FORMAT => {
                let (len, rest) = take_len(bytes)?;
                let (data, rest) = split(rest, len)?;
                let mut blob = ClipboardBlob::from_bytes(data.to_vec());
                apply_meta(&mut blob, rest)?;
                Ok(blob)
            }
            MULTI_FORMAT => {
                let (len, rest) = take_len(bytes)?;
                let (idx_len, rest) = take_len(rest)?;
                let (data, rest) = split(rest, len)?;
                let (raw, rest) = split(rest, idx_len)?;
                let indexes = raw
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as usize)
                    .collect();
                let mut blob = ClipboardBlob::from_bytes(data.to_vec());
                blob.kind = ClipboardKind::Multi;
                blob.indexes = Some(indexes);
                apply_meta(&mut blob, rest)?;
                blob.validate()?;
                Ok(blob)
            }
            RECT_FORMAT => {
                let (rows, rest) = take_len(bytes)?;
                let (cols, rest) = take_len(rest)?;
                let size = rows
                    .checked_mul(cols)
                    .ok_or_else(|| ClipboardError::Malformed(format!("{rows}x{cols} rectangle too large")))?;
                let (data, _) = split(rest, size)?;
                let mut blob = ClipboardBlob::from_bytes(data.to_vec());
                blob.kind = ClipboardKind::Rect;
                blob.num_rows = Some(rows);
                blob.num_cols = Some(cols);
                Ok(blob)
            }
            other => Err(ClipboardError::Unsupported(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> Segment {
        Segment::new((0..32).collect(), 0, "test")
    }

    #[test]
    fn test_single_and_multi() {
        let seg = segment();
        seg.set_comment(3, "three").unwrap();
        let blob = ClipboardBlob::from_ranges(&seg, &[(2, 5)]).unwrap();
        assert_eq!(blob.kind, ClipboardKind::Single);
        assert_eq!(blob.data, vec![2, 3, 4]);
        assert_eq!(blob.indexes, None);
        assert_eq!(blob.comment_positions, vec![1]);
        assert_eq!(blob.comment_texts, vec!["three".to_string()]);

        let blob = ClipboardBlob::from_ranges(&seg, &[(10, 12), (2, 4)]).unwrap();
        assert_eq!(blob.kind, ClipboardKind::Multi);
        assert_eq!(blob.data, vec![2, 3, 10, 11]);
        assert_eq!(blob.indexes, Some(vec![2, 3, 10, 11]));
    }

    #[test]
    fn test_rect_shape() {
        let seg = segment();
        let blob = ClipboardBlob::from_rect(&seg, 1, 11, 4).unwrap();
        assert_eq!(blob.rect_shape(), Some((3, 2)));
        assert_eq!(blob.data, vec![1, 2, 5, 6, 9, 10]);
    }

    #[test]
    fn test_json_decode() {
        let seg = segment();
        let blob = ClipboardBlob::from_ranges(&seg, &[(0, 2), (8, 9)]).unwrap();
        let json = blob.to_json().unwrap();
        assert!(json.contains("\"kind\":\"multi\""));
        let decoded = ClipboardBlob::decode(JSON_FORMAT, json.as_bytes()).unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_rejects_inconsistent_json() {
        let json = r#"{"kind":"multi","data":[1,2],"indexes":[0]}"#;
        assert!(matches!(ClipboardBlob::from_json(json), Err(ClipboardError::Malformed(_))));
    }

    #[test]
    fn test_rejects_rect_with_overflowing_shape() {
        let json = r#"{"kind":"rect","data":[1,2],"num_rows":9223372036854775807,"num_cols":4}"#;
        assert!(matches!(ClipboardBlob::from_json(json), Err(ClipboardError::Malformed(_))));
        let json = r#"{"kind":"rect","data":[1,2],"num_rows":2,"num_cols":2}"#;
        assert!(ClipboardBlob::from_json(json).is_err());
    }

    #[test]
    fn test_unknown_format() {
        let err = ClipboardBlob::decode("image/png", b"").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported clipboard format: image/png");
        let text = ClipboardBlob::decode(TEXT_FORMAT, b"AB").unwrap();
        assert_eq!(text.data, b"AB".to_vec());
    }

    #[cfg(feature = "legacy-clipboard")]
    #[test]
    fn test_legacy_formats() {
        let single = ClipboardBlob::decode("numpy", b"3,abc{\"comments\":[[1,\"b\"]]}").unwrap();
        assert_eq!(single.data, b"abc".to_vec());
        assert_eq!(single.comment_positions, vec![1]);

        let mut multi = b"2,8,xy".to_vec();
        multi.extend_from_slice(&4u32.to_le_bytes());
        multi.extend_from_slice(&9u32.to_le_bytes());
        let multi = ClipboardBlob::decode("numpy,multiple", &multi).unwrap();
        assert_eq!(multi.indexes, Some(vec![4, 9]));

        let rect = ClipboardBlob::decode("numpy,columns", b"2,2,wxyz").unwrap();
        assert_eq!(rect.rect_shape(), Some((2, 2)));
        assert!(ClipboardBlob::decode("numpy", b"9,ab").is_err());
        let huge = format!("{},4,wxyz", usize::MAX);
        assert!(matches!(
            ClipboardBlob::decode("numpy,columns", huge.as_bytes()),
            Err(ClipboardError::Malformed(_))
        ));
    }
}
