//! Session configuration for indexing and resolution.

use super::diagnostics::Severity;

/// What to do when two scripts declare the same struct or func name in one
/// package.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DuplicatePolicy {
    /// Report an error and keep the first declaration.
    #[default]
    Error,
    /// Report a warning and keep the first declaration.
    Warning,
    /// Say nothing; the last declaration indexed replaces earlier ones.
    Allow,
}

impl DuplicatePolicy {
    /// Severity to report with, or `None` when duplicates are allowed.
    pub fn severity(self) -> Option<Severity> {
        match self {
            DuplicatePolicy::Error => Some(Severity::Error),
            DuplicatePolicy::Warning => Some(Severity::Warning),
            DuplicatePolicy::Allow => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverConfig {
    pub duplicate_declarations: DuplicatePolicy,
    /// Treat a script's own package as imported.
    pub implicit_self_import: bool,
    /// Cap on "try importing" suggestions rendered into one message.
    pub max_suggestions: Option<usize>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            duplicate_declarations: DuplicatePolicy::Error,
            implicit_self_import: true,
            max_suggestions: None,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_declarations(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_declarations = policy;
        self
    }

    pub fn with_implicit_self_import(mut self, enabled: bool) -> Self {
        self.implicit_self_import = enabled;
        self
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = Some(max);
        self
    }
}
