//! Pattern canonicalization and manifest folding.
//!
//! After resolution, injected patterns are rewritten to the specifier that
//! would be recorded for them. When the focused workspace is not the root,
//! they are then removed from the top-level pattern list and folded into the
//! workspace's in-memory manifest instead, so the linker treats them as
//! declared dependencies rather than fresh top-level installs.

use super::policy::{compute_version, injected_version, SaveOptions};
use crate::pkg::error::PkgError;
use crate::pkg::manifest::{DependencyType, Manifest, RegistryName};
use crate::pkg::spec::format_pattern;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

/// Root pattern -> the manifest section it was declared in.
pub type OriginMap = IndexMap<String, DependencyType>;

/// Backlinks from a resolved package to the patterns it depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyReference {
    pub dependencies: Vec<String>,
}

/// A package as the resolver resolved it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    pub registry: RegistryName,
    pub manifest: Manifest,
    pub reference: DependencyReference,
}

impl ResolvedPackage {
    /// Wrap a manifest resolved from the npm registry.
    #[must_use]
    pub fn from_manifest(manifest: Manifest) -> Self {
        Self {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            registry: RegistryName::Npm,
            manifest,
            reference: DependencyReference::default(),
        }
    }
}

/// The resolver's pattern table, as far as rewriting needs it.
pub trait PatternTable {
    /// Look up the package a pattern resolved to.
    fn resolved(&self, pattern: &str) -> Option<&ResolvedPackage>;

    /// Look up a package for mutation, failing if the pattern is unknown.
    fn strict_resolved_mut(&mut self, pattern: &str) -> Result<&mut ResolvedPackage, PkgError>;

    /// Make `new` resolve to whatever `old` resolved to.
    fn replace_pattern(&mut self, old: &str, new: &str) -> Result<(), PkgError>;
}

/// An injected dependency tracked through rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectedPattern {
    pub name: String,
    /// Pattern currently used for this dependency in the table.
    pub pattern: String,
    /// Recorded version specifier, once canonicalized.
    pub version: Option<String>,
    /// Whether the range in `pattern` was pinned by injection.
    #[serde(skip)]
    pub synthetic_range: bool,
}

impl InjectedPattern {
    /// Track a freshly injected `name@version` pattern.
    #[must_use]
    pub fn provisional(name: impl Into<String>, version: &str) -> Self {
        let name = name.into();
        Self {
            pattern: format_pattern(&name, version),
            name,
            version: None,
            synthetic_range: true,
        }
    }
}

/// Origin of a dependency by name, for preserving its section on upgrade.
///
/// The last origin pattern starting with `name@` wins.
#[must_use]
pub fn origin_of(name: &str, origins: &OriginMap, fallback: DependencyType) -> DependencyType {
    let prefix = format!("{name}@");
    origins
        .iter()
        .filter(|(pattern, _)| pattern.starts_with(&prefix))
        .last()
        .map_or(fallback, |(_, kind)| *kind)
}

/// Origin map for the dependencies a manifest declares.
#[must_use]
pub fn origins_from_manifest(manifest: &Manifest) -> OriginMap {
    let mut origins = OriginMap::new();
    for kind in [
        DependencyType::Dependencies,
        DependencyType::DevDependencies,
        DependencyType::OptionalDependencies,
        DependencyType::PeerDependencies,
    ] {
        for (name, range) in manifest.bucket(kind) {
            origins.insert(format_pattern(name, range), kind);
        }
    }
    origins
}

/// Rewrite injected patterns to their canonical specifiers.
///
/// Each canonical pattern is appended to `patterns` (once), and the table is
/// told to resolve it like the provisional one. Running this again on already
/// canonical patterns changes nothing.
///
/// # Errors
/// Fails if an injected pattern has no resolution.
pub fn canonicalize_patterns<T: PatternTable + ?Sized>(
    table: &mut T,
    injected: &mut [InjectedPattern],
    mut patterns: Vec<String>,
    options: &SaveOptions,
) -> Result<Vec<String>, PkgError> {
    for entry in injected.iter_mut() {
        let pkg = table
            .resolved(&entry.pattern)
            .ok_or_else(|| PkgError::pattern_unresolved(&entry.pattern))?;

        let version = if entry.synthetic_range {
            injected_version(&pkg.name, &pkg.version, options)
        } else {
            compute_version(&entry.pattern, &pkg.version, options)
        };
        let canonical = format_pattern(&pkg.name, &version);

        if !patterns.contains(&canonical) {
            patterns.push(canonical.clone());
        }

        if canonical != entry.pattern {
            debug!(from = %entry.pattern, to = %canonical, "Canonicalized injected pattern");
            table.replace_pattern(&entry.pattern, &canonical)?;
            entry.pattern = canonical;
        }

        entry.version = Some(version);
        entry.synthetic_range = false;
    }

    Ok(patterns)
}

/// Fold injected patterns into the target package instead of linking them at
/// the top level.
///
/// A root target keeps every pattern. If the target's own resolution can't be
/// found the patterns are returned unchanged with a warning.
///
/// # Errors
/// Fails with an invariant error if an injected pattern is missing from
/// `patterns`, which means canonicalization didn't run or was bypassed.
pub fn fold_for_linking<T: PatternTable + ?Sized>(
    table: &mut T,
    injected: &[InjectedPattern],
    mut patterns: Vec<String>,
    target: &Manifest,
    is_root: bool,
    origins: &OriginMap,
    fallback: DependencyType,
) -> Result<Vec<String>, PkgError> {
    if is_root {
        return Ok(patterns);
    }

    let target_pattern = target.package_pattern();
    let pkg = match table.strict_resolved_mut(&target_pattern) {
        Ok(pkg) => pkg,
        Err(e) => {
            warn!(package = %target_pattern, error = %e, "Unknown package; skipping workspace folding");
            return Ok(patterns);
        }
    };

    // Check everything before mutating anything
    for entry in injected {
        if !patterns.contains(&entry.pattern) {
            return Err(PkgError::invariant(format!(
                "expected injected pattern '{}' in the list: {}",
                entry.pattern,
                patterns.join(", ")
            )));
        }
        if entry.version.is_none() {
            return Err(PkgError::invariant(format!(
                "injected pattern '{}' was never canonicalized",
                entry.pattern
            )));
        }
    }

    for entry in injected {
        patterns.retain(|p| p != &entry.pattern);

        let Some(version) = entry.version.as_deref() else {
            continue;
        };
        let kind = origin_of(&entry.name, origins, fallback);
        let bucket = pkg.manifest.bucket_mut(kind);
        if bucket.get(&entry.name).map(String::as_str) == Some(version) {
            // Already declared
            continue;
        }

        debug!(name = %entry.name, version = %version, section = %kind, "Folding into manifest");
        bucket.insert(entry.name.clone(), version.to_string());

        if !pkg.reference.dependencies.contains(&entry.pattern) {
            pkg.reference.dependencies.push(entry.pattern.clone());
        }
    }

    Ok(patterns)
}
