//! Script resolution: links every reference in a script's bodies and
//! annotations against a frozen registry.
//!
//! Runs after [`RegistryBuilder::build`](super::RegistryBuilder::build).
//! Scripts are independent of each other here, so [`resolve_scripts`]
//! resolves them in parallel.

use rayon::prelude::*;
use smol_str::SmolStr;

use crate::base::{FileId, Location};
use crate::syntax::{
    Expr, FieldInit, Identifier, ImportSet, LinkError, Script, StructLiteral, SymbolTarget,
    TypeRef, VariableType, WrittenName,
};

use super::config::ResolverConfig;
use super::diagnostics::{Diagnostic, DiagnosticCollector, SemanticError};
use super::index::StructDefinition;
use super::registry::{BundleRegistry, TypeIndex};
use super::resolve::{link_single, resolve_func_name, resolve_struct_name, resolve_type};

/// Resolve every reference of `script`, linking the ones with a single match.
///
/// Type annotation errors were already reported while indexing and are not
/// repeated. Returns `Err` only if `script` was resolved before.
#[tracing::instrument(skip_all, fields(file = %script.file, package = %script.package))]
pub fn resolve_script(
    registry: &BundleRegistry,
    types: &TypeIndex,
    script: &mut Script,
    config: &ResolverConfig,
) -> Result<Vec<Diagnostic>, LinkError> {
    let file = script.file;
    let imports = script.imported_packages(config.implicit_self_import);
    let annotations = Annotations {
        file,
        imports: &imports,
        types,
        config,
    };

    for decl in &mut script.structs {
        for field in &mut decl.node.fields {
            annotations.link(&mut field.node.ty, &field.node.name.text)?;
        }
    }

    let mut scope = BodyResolver {
        registry,
        imports: &imports,
        config,
        locals: Vec::new(),
        diagnostics: DiagnosticCollector::new(file),
    };
    for decl in &mut script.funcs {
        let func = &mut decl.node;

        scope.locals.clear();
        for param in &mut func.params {
            let ty = annotations.link(&mut param.ty, &param.name.text)?;
            if scope.local(&param.name.text).is_none() {
                scope.locals.push(Local {
                    name: param.name.text.clone(),
                    location: Location::new(file, param.range),
                    ty,
                });
            }
        }
        if let Some(ret) = &mut func.return_type {
            let member = format!("return value of {}", func.name.text);
            annotations.link(ret, &member)?;
        }

        for expr in &mut func.body {
            scope.expr(expr)?;
        }
    }

    tracing::debug!(diagnostics = scope.diagnostics.len(), "script resolved");
    Ok(scope.diagnostics.into_vec())
}

/// Resolve many scripts in parallel against one registry.
///
/// Diagnostics come back in script order.
pub fn resolve_scripts(
    registry: &BundleRegistry,
    types: &TypeIndex,
    scripts: &mut [Script],
    config: &ResolverConfig,
) -> Result<Vec<Diagnostic>, LinkError> {
    let per_script: Vec<Vec<Diagnostic>> = scripts
        .par_iter_mut()
        .map(|script| resolve_script(registry, types, script, config))
        .collect::<Result<_, _>>()?;
    Ok(per_script.into_iter().flatten().collect())
}

struct Annotations<'a> {
    file: FileId,
    imports: &'a ImportSet,
    types: &'a TypeIndex,
    config: &'a ResolverConfig,
}

impl Annotations<'_> {
    /// Link a type annotation and return the type it names.
    fn link(&self, ty: &mut TypeRef, member: &str) -> Result<Option<VariableType>, LinkError> {
        let mut reported = DiagnosticCollector::new(self.file);
        let result = resolve_type(ty, member, self.imports, self.types, &mut reported, self.config);
        if let TypeRef::Named(name) = ty {
            link_single(&result, name)?;
        }
        Ok(result.single().map(|alt| alt.ty.clone()))
    }
}

/// A parameter visible in a func body.
struct Local {
    name: SmolStr,
    location: Location,
    ty: Option<VariableType>,
}

struct BodyResolver<'a> {
    registry: &'a BundleRegistry,
    imports: &'a ImportSet,
    config: &'a ResolverConfig,
    locals: Vec<Local>,
    diagnostics: DiagnosticCollector,
}

impl<'a> BodyResolver<'a> {
    fn local(&self, name: &str) -> Option<&Local> {
        self.locals.iter().find(|l| l.name == name)
    }

    /// Resolve `expr` and return its static type when it is known.
    fn expr(&mut self, expr: &mut Expr) -> Result<Option<VariableType>, LinkError> {
        match expr {
            Expr::Identifier(ident) => self.identifier(ident),
            Expr::Call { callee, args, .. } => {
                let ty = self.call(callee)?;
                for arg in args {
                    self.expr(arg)?;
                }
                Ok(ty)
            }
            Expr::Field(access) => {
                let owner = self.expr(&mut access.value)?;
                self.field_access(owner, &mut access.field)
            }
            Expr::StructLiteral(literal) => self.struct_literal(literal),
            Expr::Literal { .. } => Ok(None),
        }
    }

    fn identifier(&mut self, ident: &mut Identifier) -> Result<Option<VariableType>, LinkError> {
        let local = ident.name.as_simple().and_then(|name| self.local(name));
        if let Some(local) = local {
            let target = SymbolTarget::new(local.location, None);
            ident.local = true;
            ident.ty = local.ty.clone();
            ident.name.link(target)?;
            return Ok(ident.ty.clone());
        }

        resolve_func_name(
            self.registry,
            self.imports,
            &mut ident.name,
            &mut self.diagnostics,
            self.config,
        )?;
        Ok(None)
    }

    /// Resolve a callee and return the called func's return type.
    fn call(&mut self, callee: &mut Identifier) -> Result<Option<VariableType>, LinkError> {
        let result = resolve_func_name(
            self.registry,
            self.imports,
            &mut callee.name,
            &mut self.diagnostics,
            self.config,
        )?;
        Ok(result.single().and_then(|func| func.def.return_type.clone()))
    }

    fn struct_literal(&mut self, literal: &mut StructLiteral) -> Result<Option<VariableType>, LinkError> {
        let registry = self.registry;
        let result = resolve_struct_name(
            registry,
            self.imports,
            &mut literal.name,
            &mut self.diagnostics,
            self.config,
        )?;
        let resolved = result.single().map(|alt| (alt.qualified(), alt.def));

        for FieldInit { name, value } in &mut literal.fields {
            if let Some((owner, def)) = &resolved {
                self.link_field(owner, def, name)?;
            }
            self.expr(value)?;
        }
        Ok(resolved.map(|(owner, _)| VariableType::Struct(owner)))
    }

    /// Link `value.field` when the type of `value` is a known struct.
    fn field_access(
        &mut self,
        owner: Option<VariableType>,
        field: &mut WrittenName,
    ) -> Result<Option<VariableType>, LinkError> {
        let Some(VariableType::Struct(owner)) = owner else {
            return Ok(None);
        };
        let registry = self.registry;
        match registry.find_struct(&owner) {
            Some(def) => self.link_field(&owner, def, field),
            None => Ok(None),
        }
    }

    fn link_field(
        &mut self,
        owner: &crate::syntax::QualifiedName,
        def: &StructDefinition,
        field: &mut WrittenName,
    ) -> Result<Option<VariableType>, LinkError> {
        match field.as_simple().and_then(|name| def.field(name)) {
            Some(member) => {
                field.link(SymbolTarget::new(member.location, member.documentation.clone()))?;
                Ok(member.ty.clone())
            }
            None => {
                self.diagnostics.report(
                    field.range(),
                    SemanticError::UnknownField {
                        field: field.to_string(),
                        owner: owner.clone(),
                    },
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{Position, Range};
    use crate::hir::registry::RegistryBuilder;
    use crate::syntax::{
        BundleName, Documented, FieldDecl, FuncDecl, Ident, ParamDecl, PrimitiveType,
        QualifiedName, StructDecl, Symbol,
    };

    fn qn(text: &str) -> QualifiedName {
        QualifiedName::parse(text).unwrap()
    }

    fn at(line: u32, start: u32, end: u32) -> Range {
        Range::new(Position::new(line, start), Position::new(line, end))
    }

    fn written(text: &str, range: Range) -> WrittenName {
        WrittenName::parse(text, range).unwrap()
    }

    /// `package geo; struct Point { x: int, next: Point }`
    fn geo() -> Script {
        let field = |name: &str, ty: TypeRef, line: u32, doc: &str| {
            Documented::new(FieldDecl {
                name: Ident::new(name, at(line, 4, 5)),
                ty,
                range: at(line, 4, 20),
            })
            .with_documentation(doc)
        };
        Script::new(FileId::new(0), qn("geo")).with_struct(
            Documented::new(StructDecl {
                name: Ident::new("Point", at(0, 7, 12)),
                range: Range::new(Position::new(0, 0), Position::new(3, 1)),
                fields: vec![
                    field(
                        "x",
                        TypeRef::Primitive {
                            kind: PrimitiveType::Int,
                            range: at(1, 7, 10),
                        },
                        1,
                        "Horizontal.",
                    ),
                    field("next", TypeRef::Named(written("Point", at(2, 10, 15))), 2, "Chain."),
                ],
            })
            .with_documentation("A point."),
        )
    }

    /// `package std::entity; func spawn() -> geo::Point`
    fn entity() -> Script {
        Script::new(FileId::new(1), qn("std::entity"))
            .with_import(qn("geo"), at(0, 7, 10))
            .with_func(
                Documented::new(FuncDecl {
                    name: Ident::new("spawn", at(1, 5, 10)),
                    range: at(1, 0, 30),
                    params: Vec::new(),
                    return_type: Some(TypeRef::Named(written("geo::Point", at(1, 16, 26)))),
                    body: Vec::new(),
                })
                .with_documentation("Spawns a point."),
            )
    }

    /// `func main(p: Point) -> int { body }` in package `game`.
    fn game(body: Vec<Expr>) -> Script {
        Script::new(FileId::new(2), qn("game"))
            .with_import(qn("geo"), at(0, 7, 10))
            .with_import(qn("std::entity"), at(1, 7, 18))
            .with_func(Documented::new(FuncDecl {
                name: Ident::new("main", at(3, 5, 9)),
                range: Range::new(Position::new(3, 0), Position::new(9, 1)),
                params: vec![ParamDecl {
                    name: Ident::new("p", at(3, 10, 11)),
                    ty: TypeRef::Named(written("Point", at(3, 13, 18))),
                    range: at(3, 10, 18),
                }],
                return_type: Some(TypeRef::Primitive {
                    kind: PrimitiveType::Int,
                    range: at(3, 23, 26),
                }),
                body,
            }))
    }

    fn resolve(script: &mut Script) -> Vec<Diagnostic> {
        let (geo, entity) = (geo(), entity());
        let mut builder = RegistryBuilder::new(ResolverConfig::default());
        builder
            .add_script(BundleName::from("core"), &geo)
            .add_script(BundleName::from("core"), &entity)
            .add_script(BundleName::from("game"), script);
        let indexed = builder.build();
        assert!(indexed.diagnostics.is_empty(), "{:?}", indexed.diagnostics);
        resolve_script(&indexed.registry, &indexed.types, script, &ResolverConfig::default())
            .unwrap()
    }

    fn body(script: &Script) -> &[Expr] {
        &script.funcs[0].node.body
    }

    #[test]
    fn test_parameter_reference_is_local() {
        let mut script = game(vec![Expr::identifier(written("p", at(4, 4, 5)))]);
        let diagnostics = resolve(&mut script);

        assert!(diagnostics.is_empty());
        let Expr::Identifier(ident) = &body(&script)[0] else { unreachable!() };
        assert!(ident.local);
        assert_eq!(ident.ty, Some(VariableType::Struct(qn("geo::Point"))));
        assert_eq!(ident.target_location(), Some(Location::new(FileId::new(2), at(3, 10, 18))));
        assert_eq!(ident.target_documentation().as_deref(), Some("`p: geo::Point`"));
    }

    #[test]
    fn test_field_access_on_parameter_links_field() {
        let mut script = game(vec![Expr::field(
            Expr::identifier(written("p", at(4, 4, 5))),
            written("x", at(4, 6, 7)),
        )]);
        let diagnostics = resolve(&mut script);

        assert!(diagnostics.is_empty());
        let Expr::Field(access) = &body(&script)[0] else { unreachable!() };
        assert_eq!(
            access.target_location(),
            Some(Location::new(FileId::new(0), at(1, 4, 20)))
        );
        assert_eq!(access.target_documentation().as_deref(), Some("Horizontal."));
    }

    #[test]
    fn test_chained_field_access_follows_field_types() {
        let mut script = game(vec![Expr::field(
            Expr::field(
                Expr::identifier(written("p", at(4, 4, 5))),
                written("next", at(4, 6, 10)),
            ),
            written("x", at(4, 11, 12)),
        )]);
        assert!(resolve(&mut script).is_empty());

        let Expr::Field(outer) = &body(&script)[0] else { unreachable!() };
        assert!(outer.field.is_linked());
    }

    #[test]
    fn test_unknown_field_is_reported() {
        let mut script = game(vec![Expr::field(
            Expr::identifier(written("p", at(4, 4, 5))),
            written("z", at(4, 6, 7)),
        )]);
        let diagnostics = resolve(&mut script);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(&*diagnostics[0].message, "could not resolve field z of struct geo::Point");
        assert_eq!(diagnostics[0].range, at(4, 6, 7));
    }

    #[test]
    fn test_call_return_type_flows_into_field_access() {
        let call = Expr::call(written("spawn", at(5, 4, 9)), Vec::new(), at(5, 4, 11));
        let mut script = game(vec![Expr::field(call, written("x", at(5, 12, 13)))]);
        let diagnostics = resolve(&mut script);

        assert!(diagnostics.is_empty());
        let Expr::Field(access) = &body(&script)[0] else { unreachable!() };
        let Expr::Call { callee, .. } = &*access.value else { unreachable!() };
        assert_eq!(
            callee.target_documentation().as_deref(),
            Some("`spawn`\n\n---\n\nSpawns a point.")
        );
        assert!(access.field.is_linked());
    }

    #[test]
    fn test_field_access_on_unknown_value_is_skipped() {
        let call = Expr::call(written("missing", at(5, 4, 11)), Vec::new(), at(5, 4, 13));
        let mut script = game(vec![Expr::field(call, written("x", at(5, 14, 15)))]);
        let diagnostics = resolve(&mut script);

        // Only the unresolved callee is reported.
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(&*diagnostics[0].message, "could not resolve func missing");
    }

    #[test]
    fn test_struct_literal_links_name_and_fields() {
        let literal = Expr::StructLiteral(StructLiteral {
            name: written("Point", at(6, 4, 9)),
            fields: vec![
                FieldInit {
                    name: written("x", at(6, 12, 13)),
                    value: Expr::Literal { range: at(6, 15, 16) },
                },
                FieldInit {
                    name: written("w", at(6, 18, 19)),
                    value: Expr::identifier(written("p", at(6, 21, 22))),
                },
            ],
            range: at(6, 4, 24),
        });
        let mut script = game(vec![literal]);
        let diagnostics = resolve(&mut script);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(&*diagnostics[0].message, "could not resolve field w of struct geo::Point");

        let Expr::StructLiteral(literal) = &body(&script)[0] else { unreachable!() };
        assert_eq!(literal.name.target_documentation().as_deref(), Some("A point."));
        assert!(literal.fields[0].name.is_linked());
        assert!(!literal.fields[1].name.is_linked());
        let Expr::Identifier(p) = &literal.fields[1].value else { unreachable!() };
        assert!(p.local);
    }

    #[test]
    fn test_type_annotations_are_linked() {
        let mut script = game(Vec::new());
        resolve(&mut script);

        let TypeRef::Named(name) = &script.funcs[0].node.params[0].ty else { unreachable!() };
        assert_eq!(name.target().unwrap().location.file, FileId::new(0));
    }

    #[test]
    fn test_resolving_twice_fails() {
        let (geo, entity) = (geo(), entity());
        let mut script = game(vec![Expr::identifier(written("p", at(4, 4, 5)))]);
        let mut builder = RegistryBuilder::new(ResolverConfig::default());
        builder
            .add_script(BundleName::from("core"), &geo)
            .add_script(BundleName::from("core"), &entity);
        let indexed = builder.build();
        let config = ResolverConfig::default();

        resolve_script(&indexed.registry, &indexed.types, &mut script, &config).unwrap();
        assert!(resolve_script(&indexed.registry, &indexed.types, &mut script, &config).is_err());
    }

    #[test]
    fn test_resolve_scripts_keeps_script_order() {
        let (geo, entity) = (geo(), entity());
        let mut builder = RegistryBuilder::new(ResolverConfig::default());
        builder
            .add_script(BundleName::from("core"), &geo)
            .add_script(BundleName::from("core"), &entity);
        let indexed = builder.build();

        let mut first = game(vec![Expr::identifier(written("nope", at(4, 4, 8)))]);
        first.file = FileId::new(5);
        let mut second = game(vec![Expr::identifier(written("nada", at(4, 4, 8)))]);
        second.file = FileId::new(6);
        let mut scripts = vec![first, second];

        let diagnostics = resolve_scripts(
            &indexed.registry,
            &indexed.types,
            &mut scripts,
            &ResolverConfig::default(),
        )
        .unwrap();
        let files: Vec<FileId> = diagnostics.iter().map(|d| d.file).collect();
        assert_eq!(files, vec![FileId::new(5), FileId::new(6)]);
        assert!(scripts.iter().all(|s| s.funcs[0].node.params[0].ty.target_location().is_some()));
    }
}
