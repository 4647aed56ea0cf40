//! Package manifest and workspace handling.
//!
//! Provides utilities for:
//! - Parsing package patterns (name@range) and spotting exotic references
//! - Matching versions against semver ranges
//! - Reading and normalizing `package.json` / `bower.json` manifests
//! - Resolving workspace membership for monorepos
//! - Reading save settings from `.npmrc`
//! - Focused installs of a single workspace

pub mod error;
pub mod focus;
pub mod manifest;
pub mod npmrc;
pub mod spec;
pub mod version;
pub mod workspaces;

pub use error::{codes as pkg_codes, PkgError};
pub use focus::{FocusInstall, Stage};
pub use manifest::{
    normalize_manifest, read_manifest_file, DependencyType, Manifest, RegistryName,
};
pub use npmrc::{load_npmrc_files, NpmrcConfig};
pub use spec::{format_pattern, is_exotic, PackageSpec};
pub use version::{is_valid_version, version_satisfies};
pub use workspaces::{
    detect_workspaces, find_workspace_root, resolve_workspaces, WorkspacePackage, WorkspaceSet,
};
