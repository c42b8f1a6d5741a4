//! Name-based analyzer lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::ScanError;
use crate::analyzers::builtin;
use crate::domain::Analyzer;

/// Which analyzers a scan should run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnalyzerSelection {
    /// Every registered analyzer.
    #[default]
    All,
    /// The named analyzers, in the given order.
    Named(Vec<String>),
}

impl AnalyzerSelection {
    /// Builds a selection from user-supplied names.
    ///
    /// An empty list, or one containing `all`, selects everything.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case("all")) {
            Self::All
        } else {
            Self::Named(names)
        }
    }
}

/// Registry of analyzers keyed by name.
#[derive(Default, Clone)]
pub struct AnalyzerRegistry {
    analyzers: BTreeMap<String, Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in pattern analyzers.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for analyzer in builtin::all() {
            registry.register(Arc::new(analyzer));
        }
        registry
    }

    /// Registers an analyzer under its name, replacing any previous one.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) {
        let name = analyzer.name().to_string();
        if self.analyzers.insert(name.clone(), analyzer).is_some() {
            debug!("Replaced analyzer {name}");
        }
    }

    /// Looks up an analyzer by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Analyzer>> {
        self.analyzers.get(name).cloned()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.analyzers.keys().map(String::as_str)
    }

    /// All registered analyzers in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Analyzer>> {
        self.analyzers.values()
    }

    /// Number of registered analyzers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Resolves a selection to analyzer instances.
    ///
    /// Named selections keep the requested order and drop repeated names.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::UnknownAnalyzer`] for a name that is not
    /// registered.
    pub fn resolve(
        &self,
        selection: &AnalyzerSelection,
    ) -> Result<Vec<Arc<dyn Analyzer>>, ScanError> {
        match selection {
            AnalyzerSelection::All => Ok(self.analyzers.values().cloned().collect()),
            AnalyzerSelection::Named(names) => {
                let mut resolved: Vec<Arc<dyn Analyzer>> = Vec::with_capacity(names.len());
                for name in names {
                    if resolved.iter().any(|a| a.name() == name) {
                        continue;
                    }
                    let analyzer = self.get(name).ok_or_else(|| ScanError::UnknownAnalyzer {
                        name: name.clone(),
                        available: self.names().collect::<Vec<_>>().join(", "),
                    })?;
                    resolved.push(analyzer);
                }
                Ok(resolved)
            }
        }
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.analyzers.keys()).finish()
    }
}
