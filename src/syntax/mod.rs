//! Syntax-side interface of the resolution engine.
//!
//! The lexer and parser live outside this crate. They hand over a
//! [`Script`] whose references are [`WrittenName`]s; resolution links those
//! names to declarations, after which the [`Symbol`] capability exposes the
//! targets to editor features.

mod names;
mod script;
mod symbol;
mod types;

pub use names::{
    BundleName, BundleQualifiedName, LinkError, NameError, QualifiedName, SymbolTarget,
    WrittenName,
};
pub use script::{
    Documented, Expr, FieldDecl, FieldExpression, FieldInit, FuncDecl, Ident, Identifier,
    Import, ImportSet, ParamDecl, Script, StructDecl, StructLiteral, TypeRef,
};
pub use symbol::Symbol;
pub use types::{PrimitiveType, VariableType, render_type};
