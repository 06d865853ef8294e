//! Name resolution: global-scope lookup of written names.
//!
//! # Architecture
//!
//! Every lookup runs the same two-pass search over a [`Bundles`] table:
//!
//! 1. **Imported pass** - only packages in the script's import set are
//!    searched. Any match ends the search.
//! 2. **Unrestricted pass** - reached only when the imported pass found
//!    nothing. Every package is searched; what it finds is used purely for
//!    "try importing" suggestions.
//!
//! What counts as a match is decided by the closed [`Query`] enum, matched
//! inside each table's [`QueryTarget`] impl. The typed entry points
//! ([`resolve_func_name`], [`resolve_struct_name`], [`resolve_type`]) share
//! one four-way reporting policy:
//!
//! | Result                              | Outcome                           |
//! |-------------------------------------|-----------------------------------|
//! | nothing anywhere                    | unresolved error                  |
//! | nothing imported, some elsewhere    | unresolved error with suggestions |
//! | exactly one imported                | success, reference linked         |
//! | two or more imported                | ambiguity error, nothing linked   |

use smol_str::SmolStr;

use crate::base::{Location, Range};
use crate::syntax::{
    BundleQualifiedName, ImportSet, LinkError, PrimitiveType, QualifiedName, SymbolTarget,
    TypeRef, VariableType, WrittenName,
};

use super::config::ResolverConfig;
use super::diagnostics::{DiagnosticCollector, ReferenceKind, RelatedInfo, SemanticError};
use super::index::{FuncDefinition, PackageIndex, StructDefinition};
use super::registry::{BundleRegistry, Bundles, TypeIndex, TypeNameIndex};

// ============================================================================
// RESULTS
// ============================================================================

/// One candidate, with the packages whose import makes it reachable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveAlternative<T> {
    pub value: T,
    pub imports: Vec<BundleQualifiedName>,
}

impl<T> ResolveAlternative<T> {
    fn filter_map<U>(self, f: impl FnOnce(T) -> Option<U>) -> Option<ResolveAlternative<U>> {
        Some(ResolveAlternative {
            value: f(self.value)?,
            imports: self.imports,
        })
    }
}

/// Outcome of a global-scope lookup.
///
/// At most one of the two lists is non-empty: `non_imported_alternatives`
/// is only filled when no imported package matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveResult<T> {
    alternatives: Vec<ResolveAlternative<T>>,
    non_imported_alternatives: Vec<ResolveAlternative<T>>,
}

impl<T> ResolveResult<T> {
    /// Matches found among imported packages.
    pub fn success(alternatives: Vec<ResolveAlternative<T>>) -> Self {
        debug_assert!(!alternatives.is_empty(), "a success needs at least one alternative");
        Self {
            alternatives,
            non_imported_alternatives: Vec::new(),
        }
    }

    /// Nothing imported matched; `candidates` may still be empty.
    pub fn non_imported(candidates: Vec<ResolveAlternative<T>>) -> Self {
        Self {
            alternatives: Vec::new(),
            non_imported_alternatives: candidates,
        }
    }

    pub fn alternatives(&self) -> &[ResolveAlternative<T>] {
        &self.alternatives
    }

    pub fn non_imported_alternatives(&self) -> &[ResolveAlternative<T>] {
        &self.non_imported_alternatives
    }

    /// Exactly one imported match.
    pub fn is_resolved(&self) -> bool {
        self.alternatives.len() == 1
    }

    pub fn is_ambiguous(&self) -> bool {
        self.alternatives.len() > 1
    }

    /// The match, if there is exactly one.
    pub fn single(&self) -> Option<&T> {
        match self.alternatives.as_slice() {
            [only] => Some(&only.value),
            _ => None,
        }
    }

    fn filter_map<U>(self, mut f: impl FnMut(T) -> Option<U>) -> ResolveResult<U> {
        ResolveResult {
            alternatives: self
                .alternatives
                .into_iter()
                .filter_map(|a| a.filter_map(&mut f))
                .collect(),
            non_imported_alternatives: self
                .non_imported_alternatives
                .into_iter()
                .filter_map(|a| a.filter_map(&mut f))
                .collect(),
        }
    }
}

// ============================================================================
// ALTERNATIVES
// ============================================================================

/// What the reporting policy needs from a candidate.
pub trait Alternative {
    /// Fully qualified name, as listed in ambiguity messages.
    fn qualified_name(&self) -> String;

    /// Where a reference resolving to this candidate should point.
    fn target(&self) -> Option<SymbolTarget>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FuncAlternative<'r> {
    pub package: &'r QualifiedName,
    pub name: &'r SmolStr,
    pub def: &'r FuncDefinition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructAlternative<'r> {
    pub package: &'r QualifiedName,
    pub name: &'r SmolStr,
    pub def: &'r StructDefinition,
}

/// A resolved type annotation. Primitives have no declaration to point at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeAlternative {
    pub ty: VariableType,
    pub location: Option<Location>,
    pub documentation: Option<String>,
}

impl TypeAlternative {
    pub fn primitive(kind: PrimitiveType) -> Self {
        Self {
            ty: VariableType::Primitive(kind),
            location: None,
            documentation: None,
        }
    }
}

impl FuncAlternative<'_> {
    pub fn qualified(&self) -> QualifiedName {
        self.package.append_segment(self.name.clone())
    }
}

impl StructAlternative<'_> {
    pub fn qualified(&self) -> QualifiedName {
        self.package.append_segment(self.name.clone())
    }
}

impl Alternative for FuncAlternative<'_> {
    fn qualified_name(&self) -> String {
        self.qualified().to_string()
    }

    fn target(&self) -> Option<SymbolTarget> {
        Some(SymbolTarget::new(self.def.location, self.def.documentation.clone()))
    }
}

impl Alternative for StructAlternative<'_> {
    fn qualified_name(&self) -> String {
        self.qualified().to_string()
    }

    fn target(&self) -> Option<SymbolTarget> {
        Some(SymbolTarget::new(self.def.location, self.def.documentation.clone()))
    }
}

impl Alternative for TypeAlternative {
    fn qualified_name(&self) -> String {
        self.ty.to_string()
    }

    fn target(&self) -> Option<SymbolTarget> {
        self.location
            .map(|location| SymbolTarget::new(location, self.documentation.clone()))
    }
}

// ============================================================================
// QUERIES
// ============================================================================

/// What kind of declaration a written name is looked up as.
#[derive(Clone, Copy, Debug)]
pub enum Query<'n> {
    Func(&'n WrittenName),
    Struct(&'n WrittenName),
    /// A struct name used as a type.
    Type(&'n WrittenName),
}

impl<'n> Query<'n> {
    pub fn written(&self) -> &'n WrittenName {
        match *self {
            Query::Func(name) | Query::Struct(name) | Query::Type(name) => name,
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        match self {
            Query::Func(_) => ReferenceKind::Func,
            Query::Struct(_) => ReferenceKind::Struct,
            Query::Type(_) => ReferenceKind::TypeOf,
        }
    }
}

/// A match produced by one package's table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidate<'r> {
    Func(FuncAlternative<'r>),
    Struct(StructAlternative<'r>),
    Type(TypeAlternative),
}

impl<'r> Candidate<'r> {
    fn into_func(self) -> Option<FuncAlternative<'r>> {
        match self {
            Candidate::Func(alt) => Some(alt),
            _ => None,
        }
    }

    fn into_struct(self) -> Option<StructAlternative<'r>> {
        match self {
            Candidate::Struct(alt) => Some(alt),
            _ => None,
        }
    }

    fn into_type(self) -> Option<TypeAlternative> {
        match self {
            Candidate::Type(alt) => Some(alt),
            _ => None,
        }
    }
}

/// A per-package table the two-pass search can run over.
pub trait QueryTarget {
    /// Declarations of `package` that `query` matches.
    fn candidates<'r>(&'r self, package: &'r QualifiedName, query: Query<'_>) -> Vec<Candidate<'r>>;
}

impl QueryTarget for PackageIndex {
    fn candidates<'r>(&'r self, package: &'r QualifiedName, query: Query<'_>) -> Vec<Candidate<'r>> {
        let written = query.written();
        let wanted = written.as_qualified().last();
        let matches = |name: &str| name == wanted && written.matches(&package.append_segment(name));
        match query {
            Query::Func(_) => self
                .funcs()
                .filter(|(name, _)| matches(name.as_str()))
                .map(|(name, def)| Candidate::Func(FuncAlternative { package, name, def }))
                .collect(),
            Query::Struct(_) => self
                .structs()
                .filter(|(name, _)| matches(name.as_str()))
                .map(|(name, def)| Candidate::Struct(StructAlternative { package, name, def }))
                .collect(),
            Query::Type(_) => Vec::new(),
        }
    }
}

impl QueryTarget for TypeNameIndex {
    fn candidates<'r>(&'r self, package: &'r QualifiedName, query: Query<'_>) -> Vec<Candidate<'r>> {
        let Query::Type(written) = query else {
            return Vec::new();
        };
        let Some(def) = self.get(written.as_qualified().last()) else {
            return Vec::new();
        };
        let qualified = package.append_segment(written.as_qualified().last());
        if !written.matches(&qualified) {
            return Vec::new();
        }
        vec![Candidate::Type(TypeAlternative {
            ty: VariableType::Struct(qualified),
            location: Some(def.location),
            documentation: def.documentation.clone(),
        })]
    }
}

// ============================================================================
// TWO-PASS SEARCH
// ============================================================================

/// Look `query` up in every package of `bundles`, imported packages first.
///
/// The unrestricted pass runs only when the imported pass found nothing.
pub fn resolve_global_scope_name<'r, I: QueryTarget>(
    bundles: &'r Bundles<I>,
    imports: &ImportSet,
    query: Query<'_>,
) -> ResolveResult<Candidate<'r>> {
    let imported = collect_candidates(bundles, query, |package| imports.contains(package));
    if !imported.is_empty() {
        tracing::debug!(name = %query.written(), found = imported.len(), "resolved in imported packages");
        return ResolveResult::success(imported);
    }

    let everywhere = collect_candidates(bundles, query, |_| true);
    tracing::debug!(
        name = %query.written(),
        found = everywhere.len(),
        "no imported match, searched all packages"
    );
    ResolveResult::non_imported(everywhere)
}

fn collect_candidates<'r, I: QueryTarget>(
    bundles: &'r Bundles<I>,
    query: Query<'_>,
    include: impl Fn(&QualifiedName) -> bool,
) -> Vec<ResolveAlternative<Candidate<'r>>> {
    let mut out = Vec::new();
    for (bundle, package, table) in bundles.iter() {
        if !include(package) {
            continue;
        }
        for candidate in table.candidates(package, query) {
            tracing::trace!(%bundle, %package, "candidate");
            out.push(ResolveAlternative {
                value: candidate,
                imports: vec![BundleQualifiedName::new(bundle.clone(), package.clone())],
            });
        }
    }
    out
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Resolve a func reference, linking `name` when exactly one func matches.
///
/// Diagnostics go to `diagnostics`. The only `Err` is a second link of an
/// already resolved name.
#[tracing::instrument(skip_all, fields(name = %name))]
pub fn resolve_func_name<'r>(
    registry: &'r BundleRegistry,
    imports: &ImportSet,
    name: &mut WrittenName,
    diagnostics: &mut DiagnosticCollector,
    config: &ResolverConfig,
) -> Result<ResolveResult<FuncAlternative<'r>>, LinkError> {
    let result = resolve_global_scope_name(registry, imports, Query::Func(name))
        .filter_map(Candidate::into_func);
    report_outcome(&result, ReferenceKind::Func, &name.to_string(), name.range(), diagnostics, config);
    link_single(&result, name)?;
    Ok(result)
}

/// Resolve a struct reference, linking `name` when exactly one struct matches.
#[tracing::instrument(skip_all, fields(name = %name))]
pub fn resolve_struct_name<'r>(
    registry: &'r BundleRegistry,
    imports: &ImportSet,
    name: &mut WrittenName,
    diagnostics: &mut DiagnosticCollector,
    config: &ResolverConfig,
) -> Result<ResolveResult<StructAlternative<'r>>, LinkError> {
    let result = resolve_global_scope_name(registry, imports, Query::Struct(name))
        .filter_map(Candidate::into_struct);
    report_outcome(&result, ReferenceKind::Struct, &name.to_string(), name.range(), diagnostics, config);
    link_single(&result, name)?;
    Ok(result)
}

/// Resolve the declared type of `member` (a field, parameter or return value).
///
/// Does not link: indexing reads types through shared script references.
/// Callers holding the tree mutably link with [`link_single`].
pub fn resolve_type(
    ty: &TypeRef,
    member: &str,
    imports: &ImportSet,
    types: &TypeIndex,
    diagnostics: &mut DiagnosticCollector,
    config: &ResolverConfig,
) -> ResolveResult<TypeAlternative> {
    match ty {
        TypeRef::Primitive { kind, .. } => ResolveResult::success(vec![ResolveAlternative {
            value: TypeAlternative::primitive(*kind),
            imports: Vec::new(),
        }]),
        TypeRef::Named(name) => {
            let result = resolve_global_scope_name(types, imports, Query::Type(name))
                .filter_map(Candidate::into_type);
            report_outcome(&result, ReferenceKind::TypeOf, member, name.range(), diagnostics, config);
            result
        }
    }
}

/// Link `name` to the single alternative of `result`, if there is one.
pub fn link_single<T: Alternative>(
    result: &ResolveResult<T>,
    name: &mut WrittenName,
) -> Result<(), LinkError> {
    match result.single().and_then(Alternative::target) {
        Some(target) => name.link(target),
        None => Ok(()),
    }
}

fn report_outcome<T: Alternative>(
    result: &ResolveResult<T>,
    kind: ReferenceKind,
    name: &str,
    range: Range,
    diagnostics: &mut DiagnosticCollector,
    config: &ResolverConfig,
) {
    match result.alternatives.len() {
        1 => {}
        0 if result.non_imported_alternatives.is_empty() => {
            diagnostics.report(
                range,
                SemanticError::Unresolved {
                    kind,
                    name: name.to_string(),
                },
            );
        }
        0 => {
            let all = &result.non_imported_alternatives;
            let shown = config.max_suggestions.map_or(all.len(), |max| max.min(all.len()));
            let error = SemanticError::OutOfScope {
                kind,
                name: name.to_string(),
                suggestions: all[..shown].iter().map(|a| a.imports.clone()).collect(),
                omitted: all.len() - shown,
            };
            let diagnostic = diagnostics.report(range, error);
            add_candidates(&mut diagnostic.related, &all[..shown]);
        }
        _ => {
            let candidates = result
                .alternatives
                .iter()
                .map(|a| a.value.qualified_name())
                .collect();
            let error = match kind {
                ReferenceKind::TypeOf => SemanticError::AmbiguousType {
                    member: name.to_string(),
                    candidates,
                },
                _ => SemanticError::Ambiguous {
                    kind,
                    name: name.to_string(),
                    candidates,
                },
            };
            let diagnostic = diagnostics.report(range, error);
            add_candidates(&mut diagnostic.related, &result.alternatives);
        }
    }
}

fn add_candidates<T: Alternative>(related: &mut Vec<RelatedInfo>, alternatives: &[ResolveAlternative<T>]) {
    related.extend(alternatives.iter().filter_map(|alt| {
        let target = alt.value.target()?;
        Some(RelatedInfo::new(
            target.location,
            format!("candidate: {}", alt.value.qualified_name()),
        ))
    }));
}
