//! Variable types as seen by the index.

use std::fmt;

use super::QualifiedName;

/// Built-in types, one per type keyword of the language.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveType {
    Int,
    Bool,
    String,
    Text,
    Entity,
    Ratio,
    Col,
    Pos,
    Texture,
    Player,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 10] = [
        PrimitiveType::Int,
        PrimitiveType::Bool,
        PrimitiveType::String,
        PrimitiveType::Text,
        PrimitiveType::Entity,
        PrimitiveType::Ratio,
        PrimitiveType::Col,
        PrimitiveType::Pos,
        PrimitiveType::Texture,
        PrimitiveType::Player,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Int => "int",
            PrimitiveType::Bool => "bool",
            PrimitiveType::String => "string",
            PrimitiveType::Text => "text",
            PrimitiveType::Entity => "entity",
            PrimitiveType::Ratio => "ratio",
            PrimitiveType::Col => "col",
            PrimitiveType::Pos => "pos",
            PrimitiveType::Texture => "texture",
            PrimitiveType::Player => "player",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The resolved type of a field, parameter or expression.
///
/// A type that failed to resolve is `None` wherever an
/// `Option<VariableType>` is stored; see [`render_type`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableType {
    Primitive(PrimitiveType),
    Struct(QualifiedName),
}

impl VariableType {
    pub fn as_struct(&self) -> Option<&QualifiedName> {
        match self {
            VariableType::Struct(name) => Some(name),
            VariableType::Primitive(_) => None,
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableType::Primitive(p) => p.fmt(f),
            VariableType::Struct(name) => name.fmt(f),
        }
    }
}

/// Render a possibly-unknown type.
pub fn render_type(ty: Option<&VariableType>) -> String {
    match ty {
        Some(ty) => ty.to_string(),
        None => "<unknown>".to_string(),
    }
}
