//! In-memory pattern table.

use super::rewrite::{PatternTable, ResolvedPackage};
use crate::pkg::error::PkgError;
use crate::pkg::workspaces::WorkspaceSet;
use std::collections::HashMap;

/// Patterns mapped to resolved packages; several patterns may share one package.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPatterns {
    packages: Vec<ResolvedPackage>,
    patterns: HashMap<String, usize>,
    aliases: usize,
}

impl ResolvedPatterns {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every workspace in a set under its own `name@version`.
    #[must_use]
    pub fn from_workspaces(workspaces: &WorkspaceSet) -> Self {
        let mut table = Self::new();
        for pkg in workspaces.iter() {
            table.insert(
                pkg.manifest.package_pattern(),
                ResolvedPackage::from_manifest(pkg.manifest.clone()),
            );
        }
        table
    }

    /// Record that `pattern` resolved to `pkg`.
    ///
    /// A package with the same name and version is shared rather than stored twice.
    pub fn insert(&mut self, pattern: impl Into<String>, pkg: ResolvedPackage) {
        let index = self
            .packages
            .iter()
            .position(|p| p.name == pkg.name && p.version == pkg.version)
            .unwrap_or_else(|| {
                self.packages.push(pkg);
                self.packages.len() - 1
            });
        self.patterns.insert(pattern.into(), index);
    }

    /// Whether a pattern is known.
    #[must_use]
    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.contains_key(pattern)
    }

    /// Number of aliases created through [`PatternTable::replace_pattern`].
    #[must_use]
    pub fn alias_count(&self) -> usize {
        self.aliases
    }

    /// Known patterns, sorted.
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        let mut patterns: Vec<&str> = self.patterns.keys().map(String::as_str).collect();
        patterns.sort_unstable();
        patterns
    }
}

impl PatternTable for ResolvedPatterns {
    fn resolved(&self, pattern: &str) -> Option<&ResolvedPackage> {
        self.patterns.get(pattern).map(|&i| &self.packages[i])
    }

    fn strict_resolved_mut(&mut self, pattern: &str) -> Result<&mut ResolvedPackage, PkgError> {
        let index = *self
            .patterns
            .get(pattern)
            .ok_or_else(|| PkgError::pattern_unresolved(pattern))?;
        Ok(&mut self.packages[index])
    }

    fn replace_pattern(&mut self, old: &str, new: &str) -> Result<(), PkgError> {
        let index = *self
            .patterns
            .get(old)
            .ok_or_else(|| PkgError::pattern_unresolved(old))?;

        if self.patterns.insert(new.to_string(), index) != Some(index) {
            self.aliases += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::manifest::Manifest;

    fn pkg(name: &str, version: &str) -> ResolvedPackage {
        ResolvedPackage::from_manifest(Manifest::new(name, version))
    }

    #[test]
    fn test_shared_package_for_equal_resolutions() {
        let mut table = ResolvedPatterns::new();
        table.insert("a@^1.0.0", pkg("a", "1.2.0"));
        table.insert("a@~1.2.0", pkg("a", "1.2.0"));

        table
            .strict_resolved_mut("a@^1.0.0")
            .unwrap()
            .reference
            .dependencies
            .push("x@1.0.0".to_string());

        assert_eq!(
            table.resolved("a@~1.2.0").unwrap().reference.dependencies,
            ["x@1.0.0"]
        );
    }

    #[test]
    fn test_replace_pattern_keeps_both_keys() {
        let mut table = ResolvedPatterns::new();
        table.insert("a@1.0.0", pkg("a", "1.0.0"));

        table.replace_pattern("a@1.0.0", "a@^1.0.0").unwrap();
        assert!(table.contains("a@1.0.0"));
        assert!(table.contains("a@^1.0.0"));
        assert_eq!(table.alias_count(), 1);

        table.replace_pattern("a@1.0.0", "a@^1.0.0").unwrap();
        assert_eq!(table.alias_count(), 1);
        assert_eq!(table.patterns(), ["a@1.0.0", "a@^1.0.0"]);
    }

    #[test]
    fn test_unknown_patterns() {
        let mut table = ResolvedPatterns::new();
        assert!(table.resolved("a@1.0.0").is_none());
        assert!(table.strict_resolved_mut("a@1.0.0").is_err());
        assert!(table.replace_pattern("a@1.0.0", "a@^1.0.0").is_err());
    }
}
