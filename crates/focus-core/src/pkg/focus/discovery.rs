//! Sibling workspace discovery.
//!
//! Finds a registry manifest present at both the monorepo root and the focused
//! workspace, resolves the root's workspace membership, and returns every other
//! member as a sibling.

use crate::pkg::error::PkgError;
use crate::pkg::manifest::{self, Manifest, RegistryName};
use crate::pkg::spec::format_pattern;
use crate::pkg::workspaces::{self, WorkspaceSet};
use serde::Serialize;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Manifest I/O and workspace resolution, as consumed by discovery.
pub trait ManifestHost {
    /// Read the raw manifest for `registry` in `dir`, or `None` if absent.
    fn read_manifest_file(
        &self,
        dir: &Path,
        registry: RegistryName,
    ) -> Result<Option<Value>, PkgError>;

    /// Validate and normalize a raw manifest.
    fn normalize_manifest(
        &self,
        raw: &Value,
        location: &Path,
        is_root: bool,
    ) -> Result<Manifest, PkgError>;

    /// Resolve the full workspace membership of a root manifest.
    fn resolve_workspaces(
        &self,
        root: &Manifest,
        registry: RegistryName,
    ) -> Result<WorkspaceSet, PkgError>;
}

/// Filesystem-backed [`ManifestHost`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsManifestHost;

impl ManifestHost for FsManifestHost {
    fn read_manifest_file(
        &self,
        dir: &Path,
        registry: RegistryName,
    ) -> Result<Option<Value>, PkgError> {
        manifest::read_manifest_file(dir, registry)
    }

    fn normalize_manifest(
        &self,
        raw: &Value,
        location: &Path,
        is_root: bool,
    ) -> Result<Manifest, PkgError> {
        manifest::normalize_manifest(raw, location, is_root)
    }

    fn resolve_workspaces(
        &self,
        root: &Manifest,
        registry: RegistryName,
    ) -> Result<WorkspaceSet, PkgError> {
        workspaces::resolve_workspaces(root, registry)
    }
}

/// A workspace in the same monorepo as the focused one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sibling {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
}

impl Sibling {
    /// Provisional `name@version` pattern used during resolution.
    #[must_use]
    pub fn pattern(&self) -> String {
        format_pattern(&self.name, &self.version)
    }
}

/// Outcome of sibling discovery.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Registry whose manifest exists at both locations, if any.
    pub registry: Option<RegistryName>,
    /// The focused workspace's normalized manifest.
    pub workspace: Option<Manifest>,
    /// Full membership, including the focused workspace.
    pub workspaces: WorkspaceSet,
    /// Every member except the focused workspace, in membership order.
    pub siblings: Vec<Sibling>,
}

/// Discover the siblings of the workspace at `workspace_dir`.
///
/// Missing manifests are not an error: the result is simply empty and a
/// warning is logged.
///
/// # Errors
/// Fails before touching the filesystem if `workspace_dir` is the root itself.
/// Malformed manifests propagate their normalization errors.
pub fn discover_siblings<H: ManifestHost>(
    host: &H,
    root_dir: &Path,
    workspace_dir: &Path,
) -> Result<Discovery, PkgError> {
    if same_location(root_dir, workspace_dir) {
        return Err(PkgError::root_not_allowed(root_dir));
    }

    for registry in RegistryName::ALL {
        let Some(root_raw) = host.read_manifest_file(root_dir, registry)? else {
            continue;
        };
        let Some(workspace_raw) = host.read_manifest_file(workspace_dir, registry)? else {
            continue;
        };

        debug!(registry = %registry, "Found manifests at root and workspace");

        let root = host.normalize_manifest(&root_raw, root_dir, true)?;
        let workspace = host.normalize_manifest(&workspace_raw, workspace_dir, false)?;
        let workspaces = host.resolve_workspaces(&root, registry)?;

        let siblings: Vec<Sibling> = workspaces
            .iter()
            .filter(|pkg| pkg.name != workspace.name)
            .map(|pkg| Sibling {
                name: pkg.name.clone(),
                version: pkg.version.clone(),
                path: pkg.path.clone(),
            })
            .collect();

        debug!(
            workspace = %workspace.name,
            members = workspaces.len(),
            siblings = siblings.len(),
            "Resolved sibling workspaces"
        );

        return Ok(Discovery {
            registry: Some(registry),
            workspace: Some(workspace),
            workspaces,
            siblings,
        });
    }

    warn!(
        root = %root_dir.display(),
        workspace = %workspace_dir.display(),
        "No registry manifest found at both the workspace root and the workspace; continuing without siblings"
    );
    Ok(Discovery::default())
}

/// Compare two locations lexically, without touching the filesystem.
fn same_location(a: &Path, b: &Path) -> bool {
    lexical_normalize(a) == lexical_normalize(b)
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;
    use tempfile::tempdir;

    fn write_pkg(dir: &Path, json: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("package.json"), json).unwrap();
    }

    fn monorepo() -> tempfile::TempDir {
        let root = tempdir().unwrap();
        write_pkg(
            root.path(),
            r#"{"private": true, "workspaces": ["packages/*"]}"#,
        );
        write_pkg(&root.path().join("packages/a"), r#"{"name": "a", "version": "1.0.0"}"#);
        write_pkg(&root.path().join("packages/b"), r#"{"name": "b", "version": "2.0.0"}"#);
        write_pkg(&root.path().join("packages/c"), r#"{"name": "c", "version": "3.0.0"}"#);
        root
    }

    /// Counts filesystem reads so tests can assert none happened.
    #[derive(Default)]
    struct CountingHost {
        reads: Cell<usize>,
    }

    impl ManifestHost for CountingHost {
        fn read_manifest_file(
            &self,
            dir: &Path,
            registry: RegistryName,
        ) -> Result<Option<Value>, PkgError> {
            self.reads.set(self.reads.get() + 1);
            FsManifestHost.read_manifest_file(dir, registry)
        }

        fn normalize_manifest(
            &self,
            raw: &Value,
            location: &Path,
            is_root: bool,
        ) -> Result<Manifest, PkgError> {
            FsManifestHost.normalize_manifest(raw, location, is_root)
        }

        fn resolve_workspaces(
            &self,
            root: &Manifest,
            registry: RegistryName,
        ) -> Result<WorkspaceSet, PkgError> {
            FsManifestHost.resolve_workspaces(root, registry)
        }
    }

    #[test]
    fn test_siblings_exclude_current_workspace() {
        let root = monorepo();
        let discovery =
            discover_siblings(&FsManifestHost, root.path(), &root.path().join("packages/b"))
                .unwrap();

        assert_eq!(discovery.registry, Some(RegistryName::Npm));
        assert_eq!(discovery.workspace.unwrap().name, "b");
        assert_eq!(discovery.workspaces.len(), 3);
        let patterns: Vec<_> = discovery.siblings.iter().map(Sibling::pattern).collect();
        assert_eq!(patterns, ["a@1.0.0", "c@3.0.0"]);
    }

    #[test]
    fn test_every_member_sees_all_others() {
        let root = monorepo();
        for name in ["a", "b", "c"] {
            let dir = root.path().join("packages").join(name);
            let discovery = discover_siblings(&FsManifestHost, root.path(), &dir).unwrap();
            assert_eq!(discovery.siblings.len(), 2);
            assert!(discovery.siblings.iter().all(|s| s.name != name));
        }
    }

    #[test]
    fn test_discovery_order_is_stable() {
        let root = monorepo();
        let dir = root.path().join("packages/a");
        let first = discover_siblings(&FsManifestHost, root.path(), &dir).unwrap();
        let second = discover_siblings(&FsManifestHost, root.path(), &dir).unwrap();
        assert_eq!(first.siblings, second.siblings);
    }

    #[test]
    fn test_root_is_rejected_before_io() {
        let root = monorepo();
        let host = CountingHost::default();

        let err = discover_siblings(&host, root.path(), &root.path().join(".")).unwrap_err();
        assert_eq!(err.code(), crate::pkg::error::codes::FOCUS_ROOT_NOT_ALLOWED);
        assert_eq!(host.reads.get(), 0);

        let roundabout = root.path().join("packages").join("..");
        assert!(discover_siblings(&host, root.path(), &roundabout).is_err());
        assert_eq!(host.reads.get(), 0);
    }

    #[test]
    fn test_missing_manifest_degrades_to_empty() {
        let root = monorepo();
        let bare = root.path().join("packages/bare");
        fs::create_dir_all(&bare).unwrap();

        let discovery = discover_siblings(&FsManifestHost, root.path(), &bare).unwrap();
        assert!(discovery.registry.is_none());
        assert!(discovery.workspace.is_none());
        assert!(discovery.siblings.is_empty());
    }

    #[test]
    fn test_malformed_workspace_manifest_propagates() {
        let root = monorepo();
        let broken = root.path().join("packages/broken");
        write_pkg(&broken, r#"{"dependencies": []}"#);

        assert!(discover_siblings(&FsManifestHost, root.path(), &broken).is_err());
    }

    #[test]
    #[serial_test::serial(cwd)]
    fn test_relative_locations_find_siblings() {
        let root = monorepo();
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(root.path()).unwrap();

        let result = discover_siblings(&FsManifestHost, Path::new(""), Path::new("packages/b"));
        std::env::set_current_dir(previous).unwrap();

        let patterns: Vec<_> = result.unwrap().siblings.iter().map(Sibling::pattern).collect();
        assert_eq!(patterns, ["a@1.0.0", "c@3.0.0"]);
    }

    #[test]
    fn test_lexical_normalize() {
        assert_eq!(
            lexical_normalize(Path::new("/repo/./packages/../")),
            PathBuf::from("/repo")
        );
        assert!(same_location(Path::new("/repo"), Path::new("/repo/")));
        assert!(!same_location(Path::new("/repo"), Path::new("/repo/packages/a")));
    }
}
