//! Concrete commands.
//!
//! - `byte`: per-byte transforms, literal byte changes, baseline revert
//! - `metadata`: comments, labels and style bits
//! - `paste`: clipboard pastes
//! - `file`: overwriting from a file

mod byte;
mod file;
mod metadata;
mod paste;

pub use byte::{ByteOp, ChangeBytes, Ramp, RangeMode, RevertToBaseline, TransformRanges, Transformed};
pub use file::{FileLoader, FsLoader, InsertFile, LoadCancelled};
pub use metadata::{ClearComment, ClearLabel, SetComment, SetLabel, SetStyle, StyleChange};
pub use paste::{Paste, PasteMode, PasteRect, PasteTarget};
