//! Package index: the structs and funcs one package declares.
//!
//! Built once per package from every script that contributes to it, then
//! queried many times by the resolver. Building is best effort: a duplicate
//! member or an unresolvable type produces a diagnostic and indexing goes on.

use indexmap::IndexMap;
use indexmap::map::Entry;
use smol_str::SmolStr;

use crate::base::Location;
use crate::syntax::{
    Documented, FuncDecl, ImportSet, QualifiedName, Script, StructDecl, TypeRef, VariableType,
};

use super::config::ResolverConfig;
use super::diagnostics::{
    DeclarationKind, Diagnostic, DiagnosticCollector, MemberKind, RelatedInfo, SemanticError,
};
use super::registry::TypeIndex;
use super::resolve::resolve_type;

/// A field or a parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberDefinition {
    pub documentation: Option<String>,
    pub location: Location,
    /// `None` when the declared type did not resolve to exactly one type.
    pub ty: Option<VariableType>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructDefinition {
    pub documentation: Option<String>,
    pub location: Location,
    pub fields: IndexMap<SmolStr, MemberDefinition>,
}

impl StructDefinition {
    pub fn field(&self, name: &str) -> Option<&MemberDefinition> {
        self.fields.get(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDefinition {
    pub name: SmolStr,
    pub member: MemberDefinition,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncDefinition {
    pub documentation: Option<String>,
    pub location: Location,
    /// In declaration order.
    pub params: Vec<ParamDefinition>,
    pub return_type: Option<VariableType>,
}

impl FuncDefinition {
    pub fn param(&self, name: &str) -> Option<&ParamDefinition> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Struct and func declarations of one package, keyed by unqualified name.
#[derive(Clone, Debug)]
pub struct PackageIndex {
    package: QualifiedName,
    structs: IndexMap<SmolStr, StructDefinition>,
    funcs: IndexMap<SmolStr, FuncDefinition>,
}

impl PackageIndex {
    pub fn new(package: QualifiedName) -> Self {
        Self {
            package,
            structs: IndexMap::new(),
            funcs: IndexMap::new(),
        }
    }

    pub fn package(&self) -> &QualifiedName {
        &self.package
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDefinition> {
        self.structs.get(name)
    }

    pub fn func_def(&self, name: &str) -> Option<&FuncDefinition> {
        self.funcs.get(name)
    }

    pub fn structs(&self) -> impl Iterator<Item = (&SmolStr, &StructDefinition)> {
        self.structs.iter()
    }

    pub fn funcs(&self) -> impl Iterator<Item = (&SmolStr, &FuncDefinition)> {
        self.funcs.iter()
    }

    /// Add the declarations of `script`, whose package must be this index's.
    ///
    /// Member types are resolved against `types` using the script's imports.
    /// Never fails: every problem is returned as a diagnostic.
    #[tracing::instrument(skip_all, fields(package = %self.package, file = %script.file))]
    pub fn add_from(
        &mut self,
        script: &Script,
        types: &TypeIndex,
        config: &ResolverConfig,
    ) -> Vec<Diagnostic> {
        debug_assert_eq!(script.package, self.package, "script indexed into the wrong package");

        let mut diagnostics = DiagnosticCollector::new(script.file);
        let imports = script.imported_packages(config.implicit_self_import);

        for decl in &script.structs {
            let def = build_struct(script, decl, &imports, types, config, &mut diagnostics);
            insert_declaration(
                &mut self.structs,
                DeclarationKind::Struct,
                &decl.node.name.text,
                decl.node.name.range,
                def,
                |d| d.location,
                &self.package,
                config,
                &mut diagnostics,
            );
        }

        for decl in &script.funcs {
            let def = build_func(script, decl, &imports, types, config, &mut diagnostics);
            insert_declaration(
                &mut self.funcs,
                DeclarationKind::Func,
                &decl.node.name.text,
                decl.node.name.range,
                def,
                |d| d.location,
                &self.package,
                config,
                &mut diagnostics,
            );
        }

        tracing::debug!(
            structs = self.structs.len(),
            funcs = self.funcs.len(),
            diagnostics = diagnostics.len(),
            "script indexed"
        );
        diagnostics.into_vec()
    }
}

fn build_struct(
    script: &Script,
    decl: &Documented<StructDecl>,
    imports: &ImportSet,
    types: &TypeIndex,
    config: &ResolverConfig,
    diagnostics: &mut DiagnosticCollector,
) -> StructDefinition {
    let mut def = StructDefinition {
        documentation: decl.documentation.clone(),
        location: script.location(decl.node.range),
        fields: IndexMap::new(),
    };

    for field in &decl.node.fields {
        let name = &field.node.name;
        if let Some(previous) = def.fields.get(&name.text) {
            report_duplicate_member(MemberKind::Field, name, previous.location, diagnostics);
            continue;
        }

        let ty = member_type(&field.node.ty, &name.text, imports, types, config, diagnostics);
        def.fields.insert(
            name.text.clone(),
            MemberDefinition {
                documentation: field.documentation.clone(),
                location: script.location(field.node.range),
                ty,
            },
        );
    }

    def
}

fn build_func(
    script: &Script,
    decl: &Documented<FuncDecl>,
    imports: &ImportSet,
    types: &TypeIndex,
    config: &ResolverConfig,
    diagnostics: &mut DiagnosticCollector,
) -> FuncDefinition {
    let func = &decl.node;
    let mut def = FuncDefinition {
        documentation: decl.documentation.clone(),
        location: script.location(func.range),
        params: Vec::with_capacity(func.params.len()),
        return_type: None,
    };

    for param in &func.params {
        // Only parameters accepted so far count as earlier definitions.
        if let Some(previous) = def.param(&param.name.text) {
            let location = previous.member.location;
            report_duplicate_member(MemberKind::Parameter, &param.name, location, diagnostics);
            continue;
        }

        let ty = member_type(&param.ty, &param.name.text, imports, types, config, diagnostics);
        def.params.push(ParamDefinition {
            name: param.name.text.clone(),
            member: MemberDefinition {
                documentation: None,
                location: script.location(param.range),
                ty,
            },
        });
    }

    if let Some(ret) = &func.return_type {
        let member = format!("return value of {}", func.name.text);
        def.return_type = member_type(ret, &member, imports, types, config, diagnostics);
    }

    def
}

/// Resolve a member's declared type, degrading failure to unknown.
fn member_type(
    ty: &TypeRef,
    member: &str,
    imports: &ImportSet,
    types: &TypeIndex,
    config: &ResolverConfig,
    diagnostics: &mut DiagnosticCollector,
) -> Option<VariableType> {
    resolve_type(ty, member, imports, types, diagnostics, config)
        .single()
        .map(|alt| alt.ty.clone())
}

fn report_duplicate_member(
    member: MemberKind,
    name: &crate::syntax::Ident,
    previous: Location,
    diagnostics: &mut DiagnosticCollector,
) {
    diagnostics
        .report(
            name.range,
            SemanticError::DuplicateMember {
                member,
                name: name.text.clone(),
            },
        )
        .related
        .push(RelatedInfo::new(previous, "previously defined here"));
}

#[allow(clippy::too_many_arguments)]
fn insert_declaration<D>(
    table: &mut IndexMap<SmolStr, D>,
    kind: DeclarationKind,
    name: &SmolStr,
    name_range: crate::base::Range,
    def: D,
    location_of: impl Fn(&D) -> Location,
    package: &QualifiedName,
    config: &ResolverConfig,
    diagnostics: &mut DiagnosticCollector,
) {
    match table.entry(name.clone()) {
        Entry::Vacant(slot) => {
            slot.insert(def);
        }
        Entry::Occupied(mut slot) => match config.duplicate_declarations.severity() {
            // Last write wins.
            None => {
                slot.insert(def);
            }
            Some(severity) => {
                let first = location_of(slot.get());
                diagnostics
                    .report_with(
                        name_range,
                        severity,
                        SemanticError::DuplicateDeclaration {
                            kind,
                            name: name.clone(),
                            package: package.clone(),
                        },
                    )
                    .related
                    .push(RelatedInfo::new(first, "first declared here"));
            }
        },
    }
}
