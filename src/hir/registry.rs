//! Bundle registry: every loaded bundle and the indices of its packages.
//!
//! # Lifecycle
//!
//! 1. **Declaration pass** - every script's struct names go into the
//!    [`TypeIndex`], so field types can name structs declared later or in
//!    other scripts.
//! 2. **Indexing pass** - [`PackageIndex::add_from`] runs per script,
//!    resolving member types against the type index.
//! 3. **Resolution phase** - the registry is read-only and may be shared
//!    across threads.
//!
//! There is no incremental invalidation: changing any script means building
//! a fresh registry with [`RegistryBuilder`].

use indexmap::IndexMap;
use indexmap::map::Entry;
use smol_str::SmolStr;

use crate::base::Location;
use crate::syntax::{BundleName, QualifiedName, Script};

use super::config::ResolverConfig;
use super::diagnostics::Diagnostic;
use super::index::{PackageIndex, StructDefinition};

/// Per-bundle, per-package table of `I`.
///
/// Iteration follows insertion order, so repeated queries over the same
/// inputs report alternatives in the same order.
#[derive(Clone, Debug)]
pub struct Bundles<I> {
    bundles: IndexMap<BundleName, IndexMap<QualifiedName, I>>,
}

impl<I> Default for Bundles<I> {
    fn default() -> Self {
        Self {
            bundles: IndexMap::new(),
        }
    }
}

impl<I> Bundles<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package(&self, bundle: &BundleName, package: &QualifiedName) -> Option<&I> {
        self.bundles.get(bundle)?.get(package)
    }

    pub fn package_mut(&mut self, bundle: &BundleName, package: &QualifiedName) -> Option<&mut I> {
        self.bundles.get_mut(bundle)?.get_mut(package)
    }

    /// The entry for a package, created with `init` on first use.
    pub fn package_or_insert_with(
        &mut self,
        bundle: &BundleName,
        package: &QualifiedName,
        init: impl FnOnce() -> I,
    ) -> &mut I {
        self.bundles
            .entry(bundle.clone())
            .or_default()
            .entry(package.clone())
            .or_insert_with(init)
    }

    /// All packages of all bundles.
    pub fn iter(&self) -> impl Iterator<Item = (&BundleName, &QualifiedName, &I)> {
        self.bundles.iter().flat_map(|(bundle, packages)| {
            packages
                .iter()
                .map(move |(package, index)| (bundle, package, index))
        })
    }

    pub fn bundle_names(&self) -> impl Iterator<Item = &BundleName> {
        self.bundles.keys()
    }

    pub fn packages_in(&self, bundle: &BundleName) -> impl Iterator<Item = (&QualifiedName, &I)> {
        self.bundles.get(bundle).into_iter().flat_map(|p| p.iter())
    }

    /// Number of packages across all bundles.
    pub fn len(&self) -> usize {
        self.bundles.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All package indices of a session.
pub type BundleRegistry = Bundles<PackageIndex>;

impl BundleRegistry {
    /// Find a struct by its fully qualified name, in any bundle.
    pub fn find_struct(&self, name: &QualifiedName) -> Option<&StructDefinition> {
        self.iter().find_map(|(_, package, index)| {
            let def = index.struct_def(name.last())?;
            (package.append_segment(name.last()) == *name).then_some(def)
        })
    }
}

/// A struct name usable as a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeNameDefinition {
    pub location: Location,
    pub documentation: Option<String>,
}

/// Type names declared by one package.
#[derive(Clone, Debug, Default)]
pub struct TypeNameIndex {
    types: IndexMap<SmolStr, TypeNameDefinition>,
}

impl TypeNameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the struct names of `script`.
    ///
    /// A name declared twice keeps its first declaration unless duplicates
    /// are allowed, in which case the later one wins. Duplicates are
    /// reported by [`PackageIndex::add_from`], not here.
    pub fn declare_from(&mut self, script: &Script, config: &ResolverConfig) {
        for decl in &script.structs {
            let def = TypeNameDefinition {
                location: script.location(decl.node.range),
                documentation: decl.documentation.clone(),
            };
            match self.types.entry(decl.node.name.text.clone()) {
                Entry::Occupied(mut slot) => {
                    if config.duplicate_declarations.severity().is_none() {
                        slot.insert(def);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(def);
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeNameDefinition> {
        self.types.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &TypeNameDefinition)> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Type names of every package of a session.
pub type TypeIndex = Bundles<TypeNameIndex>;

/// Output of [`RegistryBuilder::build`].
#[derive(Debug)]
pub struct Indexed {
    pub registry: BundleRegistry,
    pub types: TypeIndex,
    /// Diagnostics of every script, in the order scripts were added.
    pub diagnostics: Vec<Diagnostic>,
}

/// Collects the scripts of a session and builds its indices.
#[derive(Debug)]
pub struct RegistryBuilder<'s> {
    config: ResolverConfig,
    scripts: Vec<(BundleName, &'s Script)>,
}

impl<'s> RegistryBuilder<'s> {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            scripts: Vec::new(),
        }
    }

    pub fn add_script(&mut self, bundle: BundleName, script: &'s Script) -> &mut Self {
        self.scripts.push((bundle, script));
        self
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    #[tracing::instrument(skip_all, fields(scripts = self.scripts.len()))]
    pub fn build(self) -> Indexed {
        let mut types = TypeIndex::new();
        for (bundle, script) in &self.scripts {
            types
                .package_or_insert_with(bundle, &script.package, TypeNameIndex::new)
                .declare_from(script, &self.config);
        }

        let mut registry = BundleRegistry::new();
        let mut diagnostics = Vec::new();
        for (bundle, script) in &self.scripts {
            let index = registry.package_or_insert_with(bundle, &script.package, || {
                PackageIndex::new(script.package.clone())
            });
            diagnostics.extend(index.add_from(script, &types, &self.config));
        }

        tracing::debug!(
            packages = registry.len(),
            diagnostics = diagnostics.len(),
            "indices built"
        );
        Indexed {
            registry,
            types,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, Position, Range};
    use crate::hir::config::DuplicatePolicy;
    use crate::syntax::{Documented, Ident, StructDecl};

    fn qn(text: &str) -> QualifiedName {
        QualifiedName::parse(text).unwrap()
    }

    fn struct_decl(name: &str, line: u32) -> Documented<StructDecl> {
        let range = Range::new(Position::new(line, 0), Position::new(line, 20));
        Documented::new(StructDecl {
            name: Ident::new(name, Range::point(Position::new(line, 7))),
            range,
            fields: Vec::new(),
        })
    }

    #[test]
    fn test_bundles_iterate_in_insertion_order() {
        let mut bundles: Bundles<u32> = Bundles::new();
        let core = BundleName::from("core");
        let game = BundleName::from("game");

        *bundles.package_or_insert_with(&game, &qn("game"), || 0) += 1;
        *bundles.package_or_insert_with(&core, &qn("std::entity"), || 10) += 1;
        *bundles.package_or_insert_with(&core, &qn("std::math"), || 20) += 1;
        *bundles.package_or_insert_with(&game, &qn("game"), || 0) += 1;

        let seen: Vec<(String, String, u32)> = bundles
            .iter()
            .map(|(b, p, v)| (b.to_string(), p.to_string(), *v))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("game".into(), "game".into(), 2),
                ("core".into(), "std::entity".into(), 11),
                ("core".into(), "std::math".into(), 21),
            ]
        );
        assert_eq!(bundles.len(), 3);
        assert_eq!(bundles.packages_in(&core).count(), 2);
        assert!(bundles.package(&core, &qn("game")).is_none());
    }

    #[test]
    fn test_same_package_name_in_two_bundles_is_kept_apart() {
        let mut bundles: Bundles<&str> = Bundles::new();
        bundles.package_or_insert_with(&BundleName::from("a"), &qn("util"), || "from a");
        bundles.package_or_insert_with(&BundleName::from("b"), &qn("util"), || "from b");

        assert_eq!(bundles.len(), 2);
        assert_eq!(
            bundles.package(&BundleName::from("b"), &qn("util")),
            Some(&"from b")
        );
    }

    #[test]
    fn test_type_names_keep_first_declaration_by_default() {
        let first = Script::new(FileId::new(0), qn("geo")).with_struct(struct_decl("Point", 1));
        let second = Script::new(FileId::new(1), qn("geo")).with_struct(struct_decl("Point", 5));

        let mut index = TypeNameIndex::new();
        let config = ResolverConfig::default();
        index.declare_from(&first, &config);
        index.declare_from(&second, &config);
        assert_eq!(index.get("Point").unwrap().location.file, FileId::new(0));

        let mut index = TypeNameIndex::new();
        let config = ResolverConfig::default().with_duplicate_declarations(DuplicatePolicy::Allow);
        index.declare_from(&first, &config);
        index.declare_from(&second, &config);
        assert_eq!(index.get("Point").unwrap().location.file, FileId::new(1));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_builder_merges_scripts_of_one_package() {
        let a = Script::new(FileId::new(0), qn("geo")).with_struct(struct_decl("Point", 1));
        let b = Script::new(FileId::new(1), qn("geo")).with_struct(struct_decl("Line", 1));
        let c = Script::new(FileId::new(2), qn("game")).with_struct(struct_decl("Player", 1));

        let mut builder = RegistryBuilder::new(ResolverConfig::default());
        builder
            .add_script(BundleName::from("core"), &a)
            .add_script(BundleName::from("core"), &b)
            .add_script(BundleName::from("game"), &c);
        let indexed = builder.build();

        assert!(indexed.diagnostics.is_empty());
        assert_eq!(indexed.registry.len(), 2);
        let geo = indexed
            .registry
            .package(&BundleName::from("core"), &qn("geo"))
            .unwrap();
        assert_eq!(geo.structs().count(), 2);
        assert!(indexed.registry.find_struct(&qn("geo::Line")).is_some());
        assert!(indexed.registry.find_struct(&qn("game::Line")).is_none());
        assert_eq!(indexed.types.len(), 2);
    }
}
