//! Symbol lookup by position.

use crate::base::Position;
use crate::syntax::{Script, Symbol};

/// The innermost reference of `script` whose range contains `position`.
pub(crate) fn symbol_at(script: &Script, position: Position) -> Option<&dyn Symbol> {
    script
        .symbols()
        .into_iter()
        .filter(|symbol| symbol.range().contains(position))
        .reduce(|best, symbol| {
            if best.range().covers(symbol.range()) {
                symbol
            } else {
                best
            }
        })
}
