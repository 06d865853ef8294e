//! Analysis host: owns a session's scripts and hands out resolved snapshots.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::base::{FileId, FileSet, Position};
use crate::hir::{
    BundleRegistry, Diagnostic, Indexed, RegistryBuilder, ResolverConfig, Severity, TypeIndex,
    resolve_scripts,
};
use crate::syntax::{BundleName, LinkError, Script};

use super::{DocumentLink, GotoResult, HoverResult, document_links, goto_definition, hover};

/// Mutable side of a session: scripts go in, [`Analysis`] snapshots come out.
///
/// Scripts are kept unresolved. Every snapshot indexes and resolves fresh
/// copies, so a snapshot never sees a later edit.
#[derive(Debug, Default)]
pub struct AnalysisHost {
    files: Arc<FileSet>,
    config: ResolverConfig,
    scripts: IndexMap<FileId, (BundleName, Script)>,
    cached: Option<Arc<Analysis>>,
}

impl AnalysisHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ResolverConfig) {
        self.config = config;
        self.cached = None;
    }

    pub fn files(&self) -> &Arc<FileSet> {
        &self.files
    }

    /// Id for a script path; give it to the parser before building the script.
    pub fn file_id(&self, path: impl AsRef<Path>) -> FileId {
        self.files.file_id(path.as_ref())
    }

    /// Add or replace the script of `script.file`.
    pub fn set_script(&mut self, bundle: BundleName, script: Script) {
        self.scripts.insert(script.file, (bundle, script));
        self.cached = None;
    }

    pub fn remove_script(&mut self, file: FileId) -> Option<Script> {
        let (_, script) = self.scripts.shift_remove(&file)?;
        self.cached = None;
        Some(script)
    }

    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    /// The current snapshot, rebuilt if a script changed since the last one.
    pub fn analysis(&mut self) -> Result<Arc<Analysis>, LinkError> {
        if let Some(cached) = &self.cached {
            return Ok(Arc::clone(cached));
        }
        let analysis = Arc::new(self.build()?);
        self.cached = Some(Arc::clone(&analysis));
        Ok(analysis)
    }

    #[tracing::instrument(skip_all, fields(scripts = self.scripts.len()))]
    fn build(&self) -> Result<Analysis, LinkError> {
        let mut builder = RegistryBuilder::new(self.config.clone());
        for (bundle, script) in self.scripts.values() {
            builder.add_script(bundle.clone(), script);
        }
        let Indexed {
            registry,
            types,
            diagnostics: indexing,
        } = builder.build();

        let mut scripts: Vec<Script> = self.scripts.values().map(|(_, s)| s.clone()).collect();
        let resolution = resolve_scripts(&registry, &types, &mut scripts, &self.config)?;

        let mut diagnostics: FxHashMap<FileId, Vec<Diagnostic>> = FxHashMap::default();
        for diagnostic in indexing.into_iter().chain(resolution) {
            diagnostics.entry(diagnostic.file).or_default().push(diagnostic);
        }
        tracing::debug!(
            files_with_diagnostics = diagnostics.len(),
            "analysis rebuilt"
        );

        Ok(Analysis {
            files: Arc::clone(&self.files),
            registry,
            types,
            scripts: scripts.into_iter().map(|s| (s.file, s)).collect(),
            diagnostics,
        })
    }
}

/// An immutable, fully resolved view of a session.
#[derive(Debug)]
pub struct Analysis {
    files: Arc<FileSet>,
    registry: BundleRegistry,
    types: TypeIndex,
    scripts: IndexMap<FileId, Script>,
    diagnostics: FxHashMap<FileId, Vec<Diagnostic>>,
}

impl Analysis {
    pub fn registry(&self) -> &BundleRegistry {
        &self.registry
    }

    pub fn types(&self) -> &TypeIndex {
        &self.types
    }

    /// The resolved script of `file`.
    pub fn script(&self, file: FileId) -> Option<&Script> {
        self.scripts.get(&file)
    }

    /// Indexing diagnostics first, then resolution diagnostics.
    pub fn diagnostics(&self, file: FileId) -> &[Diagnostic] {
        self.diagnostics
            .get(&file)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .values()
            .flatten()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn hover(&self, file: FileId, position: Position) -> Option<HoverResult> {
        hover(self.script(file)?, position)
    }

    pub fn goto_definition(&self, file: FileId, position: Position) -> Option<GotoResult> {
        goto_definition(self.script(file)?, position)
    }

    pub fn document_links(&self, file: FileId) -> Vec<DocumentLink> {
        self.script(file)
            .map(|script| document_links(script, &self.files))
            .unwrap_or_default()
    }
}
