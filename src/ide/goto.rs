//! Go to definition.

use crate::base::{Location, Position, Range};
use crate::syntax::Script;

use super::symbols::symbol_at;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GotoResult {
    /// Range of the reference the request started from.
    pub origin: Range,
    /// The declaration it resolved to.
    pub target: Location,
}

/// Declaration of the reference at `position`, if it resolved.
pub fn goto_definition(script: &Script, position: Position) -> Option<GotoResult> {
    let symbol = symbol_at(script, position)?;
    Some(GotoResult {
        origin: symbol.range(),
        target: symbol.target_location()?,
    })
}
