//! Workspace support for monorepos.
//!
//! Parses the `workspaces` field from the root manifest and discovers workspace
//! packages. Supports glob patterns like `packages/*` and `apps/*`, and
//! negated patterns like `!packages/legacy`.
//!
//! Membership is ordered: packages appear in the order of the globs that
//! matched them, and in path order within a single glob.

use super::error::PkgError;
use super::manifest::{normalize_manifest, read_manifest_file, Manifest, RegistryName};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A discovered workspace package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePackage {
    /// Package name from the manifest
    pub name: String,
    /// Absolute path to the workspace directory
    pub path: PathBuf,
    /// Version from the manifest
    pub version: String,
    /// The normalized manifest
    pub manifest: Manifest,
}

/// Resolved workspace membership of a monorepo.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSet {
    /// Root directory of the monorepo
    pub root: PathBuf,
    /// Map of package name -> workspace info, in discovery order
    pub packages: IndexMap<String, WorkspacePackage>,
}

impl WorkspaceSet {
    /// Check if a package name is a workspace package.
    #[must_use]
    pub fn is_workspace_package(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Get workspace package info by name.
    #[must_use]
    pub fn get_package(&self, name: &str) -> Option<&WorkspacePackage> {
        self.packages.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterate packages in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &WorkspacePackage> {
        self.packages.values()
    }
}

/// Resolve workspace membership from a normalized root manifest.
///
/// Directories matched by a glob that have no manifest for `registry` are
/// skipped. The first package to claim a name wins.
///
/// # Errors
/// Returns an error if a workspace manifest is malformed or a glob is invalid.
pub fn resolve_workspaces(
    root: &Manifest,
    registry: RegistryName,
) -> Result<WorkspaceSet, PkgError> {
    let root_dir = root.location.as_path();
    // A relative root popped all the way up is the current directory
    let base = if root_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        root_dir
    };
    let escaped_root = PathBuf::from(glob::Pattern::escape(&base.to_string_lossy()));

    let (negated, included): (Vec<&String>, Vec<&String>) =
        root.workspaces.iter().partition(|p| p.starts_with('!'));

    let mut excluded = HashSet::new();
    for pattern in negated {
        for dir in expand_glob(&escaped_root, &pattern[1..])? {
            excluded.insert(dir);
        }
    }

    let mut packages = IndexMap::new();

    for pattern in included {
        for dir in expand_glob(&escaped_root, pattern)? {
            if excluded.contains(&dir) || !dir.is_dir() || dir == root_dir || dir == base {
                continue;
            }

            let Some(raw) = read_manifest_file(&dir, registry)? else {
                continue;
            };
            let manifest = normalize_manifest(&raw, &dir, false)?;

            if packages.contains_key(&manifest.name) {
                debug!(name = %manifest.name, path = %dir.display(), "Duplicate workspace name, keeping first");
                continue;
            }

            debug!(name = %manifest.name, version = %manifest.version, "Found workspace");
            packages.insert(
                manifest.name.clone(),
                WorkspacePackage {
                    name: manifest.name.clone(),
                    path: dir,
                    version: manifest.version.clone(),
                    manifest,
                },
            );
        }
    }

    Ok(WorkspaceSet {
        root: root_dir.to_path_buf(),
        packages,
    })
}

fn expand_glob(escaped_root: &Path, pattern: &str) -> Result<Vec<PathBuf>, PkgError> {
    let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
    let full_pattern = escaped_root.join(pattern);

    let entries = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
        PkgError::package_json_invalid(format!("Invalid workspace pattern '{pattern}': {e}"))
    })?;

    Ok(entries.flatten().collect())
}

/// Detect and resolve workspace configuration from a project root.
///
/// Returns `Ok(None)` if the project doesn't use workspaces.
///
/// # Errors
/// Returns an error if a manifest is malformed.
pub fn detect_workspaces(project_root: &Path) -> Result<Option<WorkspaceSet>, PkgError> {
    let Some(raw) = read_manifest_file(project_root, RegistryName::Npm)? else {
        return Ok(None);
    };

    let root = normalize_manifest(&raw, project_root, true)?;
    if !root.is_workspace_root() {
        return Ok(None);
    }

    let set = resolve_workspaces(&root, RegistryName::Npm)?;
    Ok((!set.is_empty()).then_some(set))
}

/// Find the workspace root by walking up the directory tree.
///
/// Returns the first directory containing a package.json with a "workspaces" field.
#[must_use]
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if let Ok(Some(raw)) = read_manifest_file(&current, RegistryName::Npm) {
            if raw.get("workspaces").is_some() {
                return Some(current);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
