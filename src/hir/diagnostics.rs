//! Diagnostics: semantic error reporting for indexing and resolution.
//!
//! Errors in the user's program are never `Err` values of the engine: they
//! are [`Diagnostic`]s accumulated in a [`DiagnosticCollector`] local to one
//! indexing or resolution call and handed back to the caller.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{FileId, Location, Range};
use crate::syntax::{BundleQualifiedName, QualifiedName};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        })
    }
}

/// A message anchored to a range of one script.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub file: FileId,
    pub range: Range,
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    /// Secondary locations, such as a previous definition.
    pub related: Vec<RelatedInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelatedInfo {
    pub location: Location,
    pub message: Arc<str>,
}

impl RelatedInfo {
    pub fn new(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

impl Diagnostic {
    pub fn new(file: FileId, range: Range, severity: Severity, message: impl Into<Arc<str>>) -> Self {
        Self {
            file,
            range,
            severity,
            code: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    pub fn error(file: FileId, range: Range, message: impl Into<Arc<str>>) -> Self {
        Self::new(file, range, Severity::Error, message)
    }

    pub fn warning(file: FileId, range: Range, message: impl Into<Arc<str>>) -> Self {
        Self::new(file, range, Severity::Warning, message)
    }

    /// Build from a semantic error, taking its message and code.
    pub fn from_error(file: FileId, range: Range, severity: Severity, error: &SemanticError) -> Self {
        Self::new(file, range, severity, error.to_string()).with_code(error.code())
    }

    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn location(&self) -> Location {
        Location::new(self.file, self.range)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.range.start, self.severity)?;
        if let Some(code) = &self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes for semantic errors.
pub mod codes {
    /// No candidate anywhere.
    pub const UNRESOLVED_REFERENCE: &str = "E0001";
    /// Several imported candidates.
    pub const AMBIGUOUS_REFERENCE: &str = "E0002";
    /// Candidates exist, but none is imported.
    pub const OUT_OF_SCOPE_REFERENCE: &str = "E0003";
    /// Field or parameter name repeated within one declaration.
    pub const DUPLICATE_MEMBER: &str = "E0004";
    /// Struct or func name repeated within one package.
    pub const DUPLICATE_DECLARATION: &str = "E0005";
}

// ============================================================================
// ERROR TAXONOMY
// ============================================================================

/// What kind of declaration a reference was looked up as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Func,
    Struct,
    /// The declared type of a field, parameter or return value.
    TypeOf,
    Field,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceKind::Func => "func",
            ReferenceKind::Struct => "struct",
            ReferenceKind::TypeOf => "type of",
            ReferenceKind::Field => "field",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Parameter,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Field => "field",
            MemberKind::Parameter => "parameter",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Struct,
    Func,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeclarationKind::Struct => "struct",
            DeclarationKind::Func => "func",
        })
    }
}

/// The semantic errors indexing and resolution report.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SemanticError {
    #[error("could not resolve {kind} {name}")]
    Unresolved { kind: ReferenceKind, name: String },

    #[error(
        "could not resolve {kind} {name}; try one of the following:{}",
        render_suggestions(.suggestions, .omitted)
    )]
    OutOfScope {
        kind: ReferenceKind,
        name: String,
        /// One entry per candidate: the packages that would make it visible.
        suggestions: Vec<Vec<BundleQualifiedName>>,
        omitted: usize,
    },

    #[error(
        "reference to {kind} {name} was ambiguous, possibilities were: {}",
        .candidates.join(", ")
    )]
    Ambiguous {
        kind: ReferenceKind,
        name: String,
        candidates: Vec<String>,
    },

    #[error(
        "type of {member} was ambiguous, possibilities were: {}",
        .candidates.join(", ")
    )]
    AmbiguousType { member: String, candidates: Vec<String> },

    #[error("{member} {name} was already defined")]
    DuplicateMember { member: MemberKind, name: SmolStr },

    #[error("{kind} {name} was already declared in package {package}")]
    DuplicateDeclaration {
        kind: DeclarationKind,
        name: SmolStr,
        package: QualifiedName,
    },

    #[error("could not resolve field {field} of struct {owner}")]
    UnknownField { field: String, owner: QualifiedName },
}

impl SemanticError {
    pub fn code(&self) -> &'static str {
        match self {
            SemanticError::Unresolved { .. } | SemanticError::UnknownField { .. } => {
                codes::UNRESOLVED_REFERENCE
            }
            SemanticError::OutOfScope { .. } => codes::OUT_OF_SCOPE_REFERENCE,
            SemanticError::Ambiguous { .. } | SemanticError::AmbiguousType { .. } => {
                codes::AMBIGUOUS_REFERENCE
            }
            SemanticError::DuplicateMember { .. } => codes::DUPLICATE_MEMBER,
            SemanticError::DuplicateDeclaration { .. } => codes::DUPLICATE_DECLARATION,
        }
    }
}

fn render_suggestions(suggestions: &[Vec<BundleQualifiedName>], omitted: &usize) -> String {
    let mut out = String::new();
    for imports in suggestions {
        let packages: Vec<String> = imports.iter().map(ToString::to_string).collect();
        out.push_str("\n\u{2022} import ");
        out.push_str(&packages.join(", "));
    }
    if *omitted > 0 {
        out.push_str(&format!("\n\u{2022} ... and {omitted} more"));
    }
    out
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects the diagnostics of one indexing or resolution call on one script.
#[derive(Clone, Debug)]
pub struct DiagnosticCollector {
    file: FileId,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new(file: FileId) -> Self {
        Self {
            file,
            diagnostics: Vec::new(),
        }
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Report an error at `range` of the collector's file.
    pub fn report(&mut self, range: Range, error: SemanticError) -> &mut Diagnostic {
        self.report_with(range, Severity::Error, error)
    }

    pub fn report_with(
        &mut self,
        range: Range,
        severity: Severity,
        error: SemanticError,
    ) -> &mut Diagnostic {
        tracing::debug!(code = error.code(), %range, "{error}");
        let index = self.diagnostics.len();
        self.diagnostics
            .push(Diagnostic::from_error(self.file, range, severity, &error));
        &mut self.diagnostics[index]
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Position;
    use crate::syntax::BundleName;

    fn qn(text: &str) -> QualifiedName {
        QualifiedName::parse(text).unwrap()
    }

    #[test]
    fn test_unresolved_message() {
        let err = SemanticError::Unresolved {
            kind: ReferenceKind::Func,
            name: "foo".into(),
        };
        assert_eq!(err.to_string(), "could not resolve func foo");
        assert_eq!(err.code(), codes::UNRESOLVED_REFERENCE);
    }

    #[test]
    fn test_out_of_scope_message_lists_one_bullet_per_candidate() {
        let err = SemanticError::OutOfScope {
            kind: ReferenceKind::Struct,
            name: "Point".into(),
            suggestions: vec![
                vec![BundleQualifiedName::new(BundleName::from("core"), qn("a::b"))],
                vec![BundleQualifiedName::new(BundleName::from("extra"), qn("c::d"))],
            ],
            omitted: 0,
        };
        assert_eq!(
            err.to_string(),
            "could not resolve struct Point; try one of the following:\n\u{2022} import a::b (core)\n\u{2022} import c::d (extra)"
        );
        assert_eq!(err.code(), codes::OUT_OF_SCOPE_REFERENCE);
    }

    #[test]
    fn test_out_of_scope_message_mentions_omitted_candidates() {
        let err = SemanticError::OutOfScope {
            kind: ReferenceKind::Func,
            name: "f".into(),
            suggestions: vec![vec![BundleQualifiedName::new(BundleName::from("core"), qn("a"))]],
            omitted: 2,
        };
        assert!(err.to_string().ends_with("\n\u{2022} ... and 2 more"));
    }

    #[test]
    fn test_ambiguous_messages() {
        let err = SemanticError::Ambiguous {
            kind: ReferenceKind::Func,
            name: "foo".into(),
            candidates: vec!["a::b::foo".into(), "c::d::foo".into()],
        };
        assert_eq!(
            err.to_string(),
            "reference to func foo was ambiguous, possibilities were: a::b::foo, c::d::foo"
        );

        let err = SemanticError::AmbiguousType {
            member: "pos".into(),
            candidates: vec!["a::Vec".into(), "b::Vec".into()],
        };
        assert_eq!(err.to_string(), "type of pos was ambiguous, possibilities were: a::Vec, b::Vec");
        assert_eq!(err.code(), codes::AMBIGUOUS_REFERENCE);
    }

    #[test]
    fn test_type_of_wording() {
        let err = SemanticError::Unresolved {
            kind: ReferenceKind::TypeOf,
            name: "pos".into(),
        };
        assert_eq!(err.to_string(), "could not resolve type of pos");
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new(FileId::new(0));
        collector.report(
            Range::default(),
            SemanticError::DuplicateMember {
                member: MemberKind::Field,
                name: "x".into(),
            },
        );
        collector.add(Diagnostic::warning(FileId::new(0), Range::default(), "w"));

        assert_eq!(collector.len(), 2);
        assert_eq!(collector.error_count(), 1);
        assert_eq!(collector.warning_count(), 1);
        assert!(collector.has_errors());

        let taken = collector.take();
        assert_eq!(taken.len(), 2);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_report_returns_diagnostic_for_related_info() {
        let mut collector = DiagnosticCollector::new(FileId::new(3));
        let first = Location::new(FileId::new(3), Range::point(Position::new(1, 2)));
        collector
            .report(
                Range::point(Position::new(2, 2)),
                SemanticError::DuplicateMember {
                    member: MemberKind::Parameter,
                    name: "p".into(),
                },
            )
            .related
            .push(RelatedInfo::new(first, "previously defined here"));

        let diag = &collector.diagnostics()[0];
        assert_eq!(&*diag.message, "parameter p was already defined");
        assert_eq!(diag.code.as_deref(), Some(codes::DUPLICATE_MEMBER));
        assert_eq!(diag.related[0].location, first);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error(FileId::new(1), Range::point(Position::new(4, 2)), "boom")
            .with_code("E0001");
        assert_eq!(diag.to_string(), "file#1:5:3: error[E0001]: boom");
    }

    #[test]
    fn test_severity_to_lsp() {
        assert_eq!(Severity::Error.to_lsp(), 1);
        assert_eq!(Severity::Warning.to_lsp(), 2);
        assert_eq!(Severity::Info.to_lsp(), 3);
        assert_eq!(Severity::Hint.to_lsp(), 4);
    }
}
