//! IDE features: editor queries over resolved scripts.
//!
//! Everything here reads the targets resolution linked into the tree,
//! through the [`Symbol`] capability. Nothing re-resolves.
//!
//! ## Usage
//!
//! ```ignore
//! use skein::ide::AnalysisHost;
//!
//! let mut host = AnalysisHost::new();
//! let file = host.file_id("game/main.sk");
//! host.set_script(bundle, parse(file, text));
//!
//! let analysis = host.analysis()?;
//! let hover = analysis.hover(file, position);
//! ```

mod analysis;
mod document_links;
mod goto;
mod hover;
mod symbols;

pub use crate::syntax::Symbol;
pub use analysis::{Analysis, AnalysisHost};
pub use document_links::{DocumentLink, document_links};
pub use goto::{GotoResult, goto_definition};
pub use hover::{HoverResult, hover};
