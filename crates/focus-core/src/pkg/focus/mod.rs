//! Focused installs: installing one workspace in isolation from its monorepo.
//!
//! Sibling workspaces are injected into resolution as ordinary registry
//! dependencies, their version specifiers are canonicalized after resolution,
//! and (unless the install target is the root) they are folded back into the
//! target's in-memory manifest before linking.
//!
//! [`FocusInstall`] holds the per-run state and exposes one method per
//! installer hook. The installer owns the lifecycle; hooks must be called in
//! order:
//!
//! ```text
//! Uninitialized -> SiblingsDiscovered -> RequestsInjected -> Resolved
//!   -> PatternsCanonicalized -> RootKept | FoldedIntoManifest -> Linked
//! ```

pub mod discovery;
pub mod inject;
pub mod policy;
pub mod rewrite;
pub mod table;

pub use discovery::{discover_siblings, Discovery, FsManifestHost, ManifestHost, Sibling};
pub use inject::{base_requests, inject_siblings, DependencyRequest};
pub use policy::{compute_version, injected_version, SaveOptions, DEFAULT_SAVE_PREFIX};
pub use rewrite::{
    canonicalize_patterns, fold_for_linking, origin_of, origins_from_manifest,
    DependencyReference, InjectedPattern, OriginMap, PatternTable, ResolvedPackage,
};
pub use table::ResolvedPatterns;

use super::error::PkgError;
use super::manifest::Manifest;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a focused install run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Uninitialized,
    SiblingsDiscovered,
    RequestsInjected,
    Resolved,
    PatternsCanonicalized,
    RootKept,
    FoldedIntoManifest,
    Linked,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::SiblingsDiscovered => "siblings_discovered",
            Self::RequestsInjected => "requests_injected",
            Self::Resolved => "resolved",
            Self::PatternsCanonicalized => "patterns_canonicalized",
            Self::RootKept => "root_kept",
            Self::FoldedIntoManifest => "folded_into_manifest",
            Self::Linked => "linked",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Hook implementations for one focused install run.
#[derive(Debug)]
pub struct FocusInstall<H = FsManifestHost> {
    host: H,
    root: PathBuf,
    workspace: PathBuf,
    options: SaveOptions,
    stage: Stage,
    discovery: Discovery,
    injected: Vec<InjectedPattern>,
    origins: Option<OriginMap>,
}

impl<H: ManifestHost> FocusInstall<H> {
    /// Prepare a run focusing `workspace` inside the monorepo at `root`.
    pub fn new(
        host: H,
        root: impl Into<PathBuf>,
        workspace: impl Into<PathBuf>,
        options: SaveOptions,
    ) -> Self {
        Self {
            host,
            root: root.into(),
            workspace: workspace.into(),
            options,
            stage: Stage::Uninitialized,
            discovery: Discovery::default(),
            injected: Vec::new(),
            origins: None,
        }
    }

    /// Use an explicit origin map (e.g. from an upgrade) instead of the one
    /// derived from the workspace manifest.
    #[must_use]
    pub fn with_origins(mut self, origins: OriginMap) -> Self {
        self.origins = Some(origins);
        self
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn options(&self) -> &SaveOptions {
        &self.options
    }

    #[must_use]
    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    #[must_use]
    pub fn siblings(&self) -> &[Sibling] {
        &self.discovery.siblings
    }

    #[must_use]
    pub fn injected(&self) -> &[InjectedPattern] {
        &self.injected
    }

    /// Discover sibling workspaces. Runs once, before the installer starts.
    ///
    /// # Errors
    /// Fails if the workspace is the root itself, or a manifest is malformed.
    pub fn discover_siblings(&mut self) -> Result<&[Sibling], PkgError> {
        self.expect_stage(&[Stage::Uninitialized], "discover_siblings")?;

        match discover_siblings(&self.host, &self.root, &self.workspace) {
            Ok(discovery) => {
                if self.origins.is_none() {
                    self.origins = discovery.workspace.as_ref().map(origins_from_manifest);
                }
                self.discovery = discovery;
                self.stage = Stage::SiblingsDiscovered;
                Ok(&self.discovery.siblings)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Append sibling requests to the installer's base requests.
    ///
    /// # Errors
    /// Fails if siblings have not been discovered yet.
    pub fn build_requests(
        &mut self,
        base: Vec<DependencyRequest>,
    ) -> Result<Vec<DependencyRequest>, PkgError> {
        self.expect_stage(&[Stage::SiblingsDiscovered], "build_requests")?;

        self.injected = self
            .discovery
            .siblings
            .iter()
            .map(|s| InjectedPattern::provisional(&s.name, &s.version))
            .collect();

        let requests = inject_siblings(base, &self.discovery.siblings);
        debug!(
            total = requests.len(),
            injected = self.injected.len(),
            "Built install requests"
        );
        self.stage = Stage::RequestsInjected;
        Ok(requests)
    }

    /// Record that the external resolver finished.
    ///
    /// # Errors
    /// Fails if requests were not built first.
    pub fn mark_resolved(&mut self) -> Result<(), PkgError> {
        self.expect_stage(&[Stage::RequestsInjected], "mark_resolved")?;
        self.stage = Stage::Resolved;
        Ok(())
    }

    /// Rewrite injected patterns to canonical specifiers.
    ///
    /// # Errors
    /// Fails if called before resolution or an injected pattern is unresolved.
    pub fn canonicalize_patterns<T: PatternTable + ?Sized>(
        &mut self,
        table: &mut T,
        patterns: Vec<String>,
    ) -> Result<Vec<String>, PkgError> {
        self.expect_stage(
            &[Stage::Resolved, Stage::PatternsCanonicalized],
            "canonicalize_patterns",
        )?;

        match canonicalize_patterns(table, &mut self.injected, patterns, &self.options) {
            Ok(patterns) => {
                self.stage = Stage::PatternsCanonicalized;
                Ok(patterns)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Fold injected patterns into the target manifest when it isn't the root.
    ///
    /// # Errors
    /// Fails if called before canonicalization or an injected pattern is
    /// missing from `patterns`.
    pub fn fold_for_linking<T: PatternTable + ?Sized>(
        &mut self,
        table: &mut T,
        patterns: Vec<String>,
        target: &Manifest,
        is_root: bool,
    ) -> Result<Vec<String>, PkgError> {
        self.expect_stage(&[Stage::PatternsCanonicalized], "fold_for_linking")?;

        let origins = self.origins.clone().unwrap_or_default();
        let known = table.resolved(&target.package_pattern()).is_some();
        let result = fold_for_linking(
            table,
            &self.injected,
            patterns,
            target,
            is_root,
            &origins,
            self.options.default_origin,
        );

        match result {
            Ok(patterns) => {
                self.stage = if !is_root && known {
                    Stage::FoldedIntoManifest
                } else {
                    Stage::RootKept
                };
                Ok(patterns)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Record that linking finished.
    ///
    /// # Errors
    /// Fails if folding did not run first.
    pub fn mark_linked(&mut self) -> Result<(), PkgError> {
        self.expect_stage(&[Stage::RootKept, Stage::FoldedIntoManifest], "mark_linked")?;
        self.stage = Stage::Linked;
        Ok(())
    }

    fn expect_stage(&mut self, allowed: &[Stage], hook: &str) -> Result<(), PkgError> {
        if allowed.contains(&self.stage) {
            return Ok(());
        }
        let err = PkgError::invariant(format!("{hook} called in stage {}", self.stage));
        Err(self.fail(err))
    }

    fn fail(&mut self, err: PkgError) -> PkgError {
        self.stage = Stage::Failed;
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::error::codes;
    use std::fs;
    use tempfile::tempdir;

    fn write_pkg(dir: &Path, json: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("package.json"), json).unwrap();
    }

    #[test]
    fn test_hooks_reject_out_of_order_calls() {
        let root = tempdir().unwrap();
        let mut install = FocusInstall::new(
            FsManifestHost,
            root.path(),
            root.path().join("packages/a"),
            SaveOptions::default(),
        );

        let err = install.build_requests(Vec::new()).unwrap_err();
        assert!(err.is_invariant());
        assert_eq!(install.stage(), Stage::Failed);
    }

    #[test]
    fn test_root_focus_fails_fast() {
        let root = tempdir().unwrap();
        let mut install =
            FocusInstall::new(FsManifestHost, root.path(), root.path(), SaveOptions::default());

        let err = install.discover_siblings().unwrap_err();
        assert_eq!(err.code(), codes::FOCUS_ROOT_NOT_ALLOWED);
        assert_eq!(install.stage(), Stage::Failed);
    }

    #[test]
    fn test_root_target_keeps_patterns() {
        let root = tempdir().unwrap();
        write_pkg(root.path(), r#"{"name": "mono", "workspaces": ["packages/*"]}"#);
        write_pkg(&root.path().join("packages/a"), r#"{"name": "a", "version": "1.0.0"}"#);
        write_pkg(&root.path().join("packages/b"), r#"{"name": "b", "version": "2.0.0"}"#);

        let mut install = FocusInstall::new(
            FsManifestHost,
            root.path(),
            root.path().join("packages/b"),
            SaveOptions::default(),
        );
        install.discover_siblings().unwrap();
        install.build_requests(Vec::new()).unwrap();
        install.mark_resolved().unwrap();

        let mut table = ResolvedPatterns::from_workspaces(&install.discovery().workspaces);
        let patterns = install.canonicalize_patterns(&mut table, Vec::new()).unwrap();
        let target = Manifest::new("mono", "0.0.0");
        let linked = install
            .fold_for_linking(&mut table, patterns.clone(), &target, true)
            .unwrap();

        assert_eq!(linked, patterns);
        assert_eq!(install.stage(), Stage::RootKept);
        install.mark_linked().unwrap();
        assert_eq!(install.stage(), Stage::Linked);
    }

    #[test]
    fn test_focus_folds_siblings_into_workspace() {
        let root = tempdir().unwrap();
        write_pkg(root.path(), r#"{"name": "mono", "workspaces": ["packages/*"]}"#);
        write_pkg(&root.path().join("packages/a"), r#"{"name": "a", "version": "1.0.0"}"#);
        write_pkg(
            &root.path().join("packages/b"),
            r#"{"name": "b", "version": "2.0.0", "devDependencies": {"c": "^2.0.0"}}"#,
        );
        write_pkg(&root.path().join("packages/c"), r#"{"name": "c", "version": "3.0.0"}"#);

        let mut install = FocusInstall::new(
            FsManifestHost,
            root.path(),
            root.path().join("packages/b"),
            SaveOptions::default(),
        );
        install.discover_siblings().unwrap();
        let requests = install.build_requests(Vec::new()).unwrap();
        let patterns: Vec<_> = requests.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, ["a@1.0.0", "c@3.0.0"]);
        install.mark_resolved().unwrap();

        let mut table = ResolvedPatterns::from_workspaces(&install.discovery().workspaces);
        let patterns = install.canonicalize_patterns(&mut table, Vec::new()).unwrap();
        assert_eq!(patterns, ["a@^1.0.0", "c@^3.0.0"]);

        let target = install.discovery().workspace.clone().unwrap();
        let linked = install
            .fold_for_linking(&mut table, patterns, &target, false)
            .unwrap();
        assert!(linked.is_empty());
        assert_eq!(install.stage(), Stage::FoldedIntoManifest);

        let pkg = table.resolved("b@2.0.0").unwrap();
        assert_eq!(pkg.manifest.dependencies["a"], "^1.0.0");
        assert_eq!(pkg.manifest.dev_dependencies["c"], "^3.0.0");
        assert_eq!(pkg.reference.dependencies, ["a@^1.0.0", "c@^3.0.0"]);
    }

    #[test]
    fn test_fold_before_canonicalize_fails() {
        let root = tempdir().unwrap();
        write_pkg(root.path(), r#"{"name": "mono", "workspaces": ["packages/*"]}"#);
        write_pkg(&root.path().join("packages/a"), r#"{"name": "a", "version": "1.0.0"}"#);

        let mut install = FocusInstall::new(
            FsManifestHost,
            root.path(),
            root.path().join("packages/a"),
            SaveOptions::default(),
        );
        install.discover_siblings().unwrap();
        install.build_requests(Vec::new()).unwrap();
        install.mark_resolved().unwrap();

        let mut table = ResolvedPatterns::new();
        let err = install
            .fold_for_linking(&mut table, Vec::new(), &Manifest::new("a", "1.0.0"), false)
            .unwrap_err();
        assert!(err.is_invariant());
        assert!(install.mark_linked().is_err());
    }

    #[test]
    fn test_no_siblings_when_discovery_misses() {
        let root = tempdir().unwrap();
        write_pkg(root.path(), r#"{"name": "mono", "workspaces": ["packages/*"]}"#);
        fs::create_dir_all(root.path().join("packages/a")).unwrap();

        let mut install = FocusInstall::new(
            FsManifestHost,
            root.path(),
            root.path().join("packages/a"),
            SaveOptions::default(),
        );
        assert!(install.discover_siblings().unwrap().is_empty());

        let base = vec![DependencyRequest::npm("react@^18.0.0")];
        assert_eq!(install.build_requests(base.clone()).unwrap(), base);
    }
}
