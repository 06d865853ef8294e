//! The parsed-script interface handed over by the parser.
//!
//! Only the shapes the index and resolver need are modelled: imports,
//! top-level structs and funcs, type annotations and the expressions that
//! contain references.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::base::{FileId, Location, Range};

use super::{PrimitiveType, QualifiedName, Symbol, VariableType, WrittenName, render_type};

/// The packages a script may resolve names from.
pub type ImportSet = FxHashSet<QualifiedName>;

/// A declared (not referenced) identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub text: SmolStr,
    pub range: Range,
}

impl Ident {
    pub fn new(text: impl Into<SmolStr>, range: Range) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }
}

/// A node with its preceding documentation comment, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Documented<T> {
    pub documentation: Option<String>,
    pub node: T,
}

impl<T> Documented<T> {
    pub fn new(node: T) -> Self {
        Self {
            documentation: None,
            node,
        }
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub name: QualifiedName,
    pub range: Range,
}

/// One parsed script, already known to belong to `package`.
#[derive(Clone, Debug)]
pub struct Script {
    pub file: FileId,
    pub package: QualifiedName,
    pub imports: Vec<Import>,
    pub structs: Vec<Documented<StructDecl>>,
    pub funcs: Vec<Documented<FuncDecl>>,
}

impl Script {
    pub fn new(file: FileId, package: QualifiedName) -> Self {
        Self {
            file,
            package,
            imports: Vec::new(),
            structs: Vec::new(),
            funcs: Vec::new(),
        }
    }

    pub fn with_import(mut self, name: QualifiedName, range: Range) -> Self {
        self.imports.push(Import { name, range });
        self
    }

    pub fn with_struct(mut self, decl: Documented<StructDecl>) -> Self {
        self.structs.push(decl);
        self
    }

    pub fn with_func(mut self, decl: Documented<FuncDecl>) -> Self {
        self.funcs.push(decl);
        self
    }

    pub fn location(&self, range: Range) -> Location {
        Location::new(self.file, range)
    }

    /// The declared imports, plus the script's own package if `include_own`.
    pub fn imported_packages(&self, include_own: bool) -> ImportSet {
        let mut set: ImportSet = self.imports.iter().map(|i| i.name.clone()).collect();
        if include_own {
            set.insert(self.package.clone());
        }
        set
    }

    /// Every linkable reference in the script, in source order.
    pub fn symbols(&self) -> Vec<&dyn Symbol> {
        let mut out: Vec<&dyn Symbol> = Vec::new();
        for s in &self.structs {
            for field in &s.node.fields {
                out.push(&field.node.ty);
            }
        }
        for f in &self.funcs {
            for param in &f.node.params {
                out.push(&param.ty);
            }
            if let Some(ret) = &f.node.return_type {
                out.push(ret);
            }
            for expr in &f.node.body {
                expr.collect_symbols(&mut out);
            }
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructDecl {
    pub name: Ident,
    pub range: Range,
    pub fields: Vec<Documented<FieldDecl>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: Ident,
    pub ty: TypeRef,
    pub range: Range,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncDecl {
    pub name: Ident,
    pub range: Range,
    pub params: Vec<ParamDecl>,
    pub return_type: Option<TypeRef>,
    pub body: Vec<Expr>,
}

/// A parameter of a func.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: Ident,
    pub ty: TypeRef,
    pub range: Range,
}

/// A written type annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    Primitive { kind: PrimitiveType, range: Range },
    /// A struct type, named the way the script wrote it.
    Named(WrittenName),
}

impl TypeRef {
    pub fn range(&self) -> Range {
        match self {
            TypeRef::Primitive { range, .. } => *range,
            TypeRef::Named(name) => name.range(),
        }
    }
}

impl Symbol for TypeRef {
    fn range(&self) -> Range {
        TypeRef::range(self)
    }

    fn target_location(&self) -> Option<Location> {
        match self {
            TypeRef::Primitive { .. } => None,
            TypeRef::Named(name) => name.target_location(),
        }
    }

    fn target_documentation(&self) -> Option<String> {
        match self {
            TypeRef::Primitive { .. } => None,
            TypeRef::Named(name) => name.target_documentation(),
        }
    }
}

/// References a local variable, a parameter or a func.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifier {
    pub name: WrittenName,
    /// Set by resolution when the name is a parameter of the enclosing func.
    pub local: bool,
    /// Static type, when resolution could tell.
    pub ty: Option<VariableType>,
}

impl Identifier {
    pub fn new(name: WrittenName) -> Self {
        Self {
            name,
            local: false,
            ty: None,
        }
    }
}

impl Symbol for Identifier {
    fn range(&self) -> Range {
        self.name.range()
    }

    fn target_location(&self) -> Option<Location> {
        self.name.target_location()
    }

    fn target_documentation(&self) -> Option<String> {
        let target = self.name.target()?;
        let header = if self.local || self.ty.is_some() {
            format!("`{}: {}`", self.name, render_type(self.ty.as_ref()))
        } else {
            format!("`{}`", self.name)
        };
        Some(match &target.documentation {
            Some(doc) => format!("{header}\n\n---\n\n{doc}"),
            None => header,
        })
    }
}

/// `value.field`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldExpression {
    pub value: Box<Expr>,
    pub field: WrittenName,
}

impl FieldExpression {
    pub fn new(value: Expr, field: WrittenName) -> Self {
        Self {
            value: Box::new(value),
            field,
        }
    }

    /// Range of the whole expression, value included.
    pub fn full_range(&self) -> Range {
        Range::combine(self.value.range(), self.field.range())
    }
}

impl Symbol for FieldExpression {
    fn range(&self) -> Range {
        self.field.range()
    }

    fn target_location(&self) -> Option<Location> {
        self.field.target_location()
    }

    fn target_documentation(&self) -> Option<String> {
        self.field.target_documentation()
    }
}

/// `Name { field: value, ... }`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructLiteral {
    pub name: WrittenName,
    pub fields: Vec<FieldInit>,
    pub range: Range,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInit {
    pub name: WrittenName,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Identifier(Identifier),
    Call {
        callee: Identifier,
        args: Vec<Expr>,
        range: Range,
    },
    Field(FieldExpression),
    StructLiteral(StructLiteral),
    /// Any literal; carries no references.
    Literal { range: Range },
}

impl Expr {
    pub fn identifier(name: WrittenName) -> Self {
        Expr::Identifier(Identifier::new(name))
    }

    pub fn call(callee: WrittenName, args: Vec<Expr>, range: Range) -> Self {
        Expr::Call {
            callee: Identifier::new(callee),
            args,
            range,
        }
    }

    pub fn field(value: Expr, field: WrittenName) -> Self {
        Expr::Field(FieldExpression::new(value, field))
    }

    pub fn range(&self) -> Range {
        match self {
            Expr::Identifier(ident) => ident.name.range(),
            Expr::Call { range, .. } => *range,
            Expr::Field(field) => field.full_range(),
            Expr::StructLiteral(lit) => lit.range,
            Expr::Literal { range } => *range,
        }
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a dyn Symbol>) {
        match self {
            Expr::Identifier(ident) => out.push(ident),
            Expr::Call { callee, args, .. } => {
                out.push(callee);
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
            Expr::Field(field) => {
                field.value.collect_symbols(out);
                out.push(field);
            }
            Expr::StructLiteral(lit) => {
                out.push(&lit.name);
                for init in &lit.fields {
                    out.push(&init.name);
                    init.value.collect_symbols(out);
                }
            }
            Expr::Literal { .. } => {}
        }
    }
}
