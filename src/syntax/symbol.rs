//! The symbol capability: what a resolved reference exposes to editors.

use crate::base::{Location, Range};

use super::WrittenName;

/// A reference in the tree that resolution may link to a declaration.
///
/// Both accessors return `None` until the resolver has linked the reference,
/// and stay `None` if it never does (unresolved or ambiguous).
pub trait Symbol {
    /// Range of the reference itself (what the user hovers or clicks).
    fn range(&self) -> Range;

    fn target_location(&self) -> Option<Location>;

    fn target_documentation(&self) -> Option<String>;
}

impl Symbol for WrittenName {
    fn range(&self) -> Range {
        WrittenName::range(self)
    }

    fn target_location(&self) -> Option<Location> {
        self.target().map(|t| t.location)
    }

    fn target_documentation(&self) -> Option<String> {
        self.target().and_then(|t| t.documentation.clone())
    }
}
