//! Foundation types for the skein toolchain.
//!
//! - [`FileId`], [`FileSet`] - Script identifiers and their paths
//! - [`Position`], [`Range`], [`Location`] - Source coordinates
//! - [`LineIndex`] - Byte offset to line/character conversion
//!
//! This module has NO dependencies on other skein modules.

mod file_id;
mod source;
mod span;

pub use file_id::FileId;
pub use source::FileSet;
pub use span::{LineIndex, Location, Position, Range, TextRange, TextSize};

pub use text_size;
