//! Document links: clickable references to definitions.

use std::borrow::Cow;

use crate::base::{FileSet, Location, Range};
use crate::syntax::Script;

/// A resolved reference, as a link to its declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    /// The span of the link in the source file.
    pub range: Range,
    pub target: Location,
    /// Tooltip text for the link.
    pub tooltip: Cow<'static, str>,
}

/// Links for every resolved reference of `script`, in source order.
///
/// Unresolved and ambiguous references produce no link.
pub fn document_links(script: &Script, files: &FileSet) -> Vec<DocumentLink> {
    script
        .symbols()
        .into_iter()
        .filter_map(|symbol| {
            let target = symbol.target_location()?;
            Some(DocumentLink {
                range: symbol.range(),
                target,
                tooltip: Cow::Owned(format!(
                    "Go to {}:{}",
                    files.display_name(target.file),
                    target.range.start
                )),
            })
        })
        .collect()
}
