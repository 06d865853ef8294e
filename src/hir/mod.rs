//! Semantic model: package indices, the bundle registry and name resolution.
//!
//! ## Phases
//!
//! ```text
//! RegistryBuilder::build   → TypeIndex + BundleRegistry (+ indexing diagnostics)
//!   ↓ (registry frozen)
//! resolve_script(s)        → links every reference (+ resolution diagnostics)
//! ```
//!
//! The registry is a plain value owned by whoever drives a session (usually
//! [`crate::ide::AnalysisHost`]) and borrowed by every call.

mod config;
mod diagnostics;
mod index;
mod link;
mod registry;
mod resolve;

pub use config::{DuplicatePolicy, ResolverConfig};
pub use diagnostics::{
    DeclarationKind, Diagnostic, DiagnosticCollector, MemberKind, ReferenceKind, RelatedInfo,
    SemanticError, Severity, codes,
};
pub use index::{FuncDefinition, MemberDefinition, PackageIndex, ParamDefinition, StructDefinition};
pub use link::{resolve_script, resolve_scripts};
pub use registry::{
    BundleRegistry, Bundles, Indexed, RegistryBuilder, TypeIndex, TypeNameDefinition,
    TypeNameIndex,
};
pub use resolve::{
    Alternative, Candidate, FuncAlternative, Query, QueryTarget, ResolveAlternative,
    ResolveResult, StructAlternative, TypeAlternative, link_single, resolve_func_name,
    resolve_global_scope_name, resolve_struct_name, resolve_type,
};
