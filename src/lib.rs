//! # skein-base
//!
//! Core library for skein scripts: package indexing, cross-package name
//! resolution and the editor queries built on top of it.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide     → Hover, goto-definition, document links, AnalysisHost
//!   ↓
//! hir     → Package indices, bundle registry, resolver, diagnostics
//!   ↓
//! syntax  → Parsed-script interface: names, declarations, expressions
//!   ↓
//! base    → Primitives (FileId, FileSet, Position, Range, LineIndex)
//! ```
//!
//! Lexing and parsing happen outside this crate; a parser hands over
//! [`syntax::Script`] values.

/// Foundation types: FileId, FileSet, positions
pub mod base;

/// Semantic model: indices, registry, resolution
pub mod hir;

/// IDE features: hover, goto-definition, document links
pub mod ide;

/// Parsed-script interface and names
pub mod syntax;

pub use base::{FileId, FileSet, LineIndex, Location, Position, Range, TextRange, TextSize};
pub use hir::{
    BundleRegistry, Diagnostic, RegistryBuilder, ResolveResult, ResolverConfig, Severity,
};
pub use ide::{Analysis, AnalysisHost};
pub use syntax::{BundleName, QualifiedName, Script, WrittenName};
