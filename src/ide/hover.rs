//! Hover: documentation of the declaration under the cursor.

use crate::base::{Position, Range};
use crate::syntax::Script;

use super::symbols::symbol_at;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverResult {
    /// Markdown.
    pub contents: String,
    /// Range of the hovered reference.
    pub range: Range,
}

/// Documentation for the reference at `position`.
///
/// `None` when there is no reference there, when it never resolved, or when
/// its declaration is undocumented.
pub fn hover(script: &Script, position: Position) -> Option<HoverResult> {
    let symbol = symbol_at(script, position)?;
    Some(HoverResult {
        contents: symbol.target_documentation()?,
        range: symbol.range(),
    })
}
