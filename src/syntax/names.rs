//! Qualified names, bundle-qualified names and names as written in scripts.

use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{Location, Range};

/// Errors from constructing names out of text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("a qualified name needs at least one segment")]
    Empty,
    #[error("'{segment}' is not a valid identifier in '{name}'")]
    InvalidSegment { segment: SmolStr, name: String },
}

/// Returned when a reference is linked a second time.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("reference '{name}' was already linked to {existing}")]
    AlreadyLinked { name: String, existing: Location },
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

/// A non-empty `::`-separated path such as `std::entity::spawn_entity`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualifiedName {
    segments: Vec<SmolStr>,
}

impl QualifiedName {
    /// Build from already-lexed segments.
    pub fn new<I, S>(segments: I) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let segments: Vec<SmolStr> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(NameError::Empty);
        }
        if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
            return Err(NameError::InvalidSegment {
                segment: bad.clone(),
                name: segments.join("::"),
            });
        }
        Ok(Self { segments })
    }

    /// Parse `a::b::c`.
    pub fn parse(text: &str) -> Result<Self, NameError> {
        if text.is_empty() {
            return Err(NameError::Empty);
        }
        Self::new(text.split("::"))
    }

    /// A new name with `segment` appended.
    pub fn append_segment(&self, segment: impl Into<SmolStr>) -> QualifiedName {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        QualifiedName { segments }
    }

    pub fn segments(&self) -> &[SmolStr] {
        &self.segments
    }

    pub fn last(&self) -> &str {
        // Non-empty by construction.
        self.segments.last().map(SmolStr::as_str).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QualifiedName({self})")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

/// Identifier of a bundle (a dependency unit).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BundleName(SmolStr);

impl BundleName {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BundleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BundleName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A package identified across bundles.
///
/// Two bundles may both declare a package `util`; only the pair is unique.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleQualifiedName {
    pub bundle: BundleName,
    pub name: QualifiedName,
}

impl BundleQualifiedName {
    pub fn new(bundle: BundleName, name: QualifiedName) -> Self {
        Self { bundle, name }
    }
}

impl fmt::Display for BundleQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.bundle)
    }
}

/// Where a resolved reference points: the declaration and its docs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolTarget {
    pub location: Location,
    pub documentation: Option<String>,
}

impl SymbolTarget {
    pub fn new(location: Location, documentation: Option<String>) -> Self {
        Self {
            location,
            documentation,
        }
    }
}

/// A name exactly as the script wrote it, possibly a suffix of the
/// qualified name it means.
///
/// Starts unlinked. Resolution links it at most once; see [`WrittenName::link`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenName {
    name: QualifiedName,
    range: Range,
    target: Option<SymbolTarget>,
}

impl WrittenName {
    pub fn new(name: QualifiedName, range: Range) -> Self {
        Self {
            name,
            range,
            target: None,
        }
    }

    pub fn parse(text: &str, range: Range) -> Result<Self, NameError> {
        Ok(Self::new(QualifiedName::parse(text)?, range))
    }

    /// True if the written segments are a trailing run of `target`'s segments.
    ///
    /// `spawn_entity` and `entity::spawn_entity` both match
    /// `std::entity::spawn_entity`; `std::spawn_entity` does not.
    pub fn matches(&self, target: &QualifiedName) -> bool {
        target.segments().ends_with(self.name.segments())
    }

    /// The written text as a qualified name.
    pub fn as_qualified(&self) -> &QualifiedName {
        &self.name
    }

    /// The single segment, if the name has exactly one.
    pub fn as_simple(&self) -> Option<&str> {
        match self.name.segments() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn target(&self) -> Option<&SymbolTarget> {
        self.target.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.target.is_some()
    }

    /// Record the declaration this name resolved to.
    pub fn link(&mut self, target: SymbolTarget) -> Result<(), LinkError> {
        if let Some(existing) = &self.target {
            return Err(LinkError::AlreadyLinked {
                name: self.name.to_string(),
                existing: existing.location,
            });
        }
        self.target = Some(target);
        Ok(())
    }
}

impl fmt::Display for WrittenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}
