//! `focus focus` command implementation.
//!
//! Runs the focused-install hooks for the workspace in the working directory
//! against the monorepo's own workspace table, and reports what would be
//! installed at the top level and what gets folded into the workspace manifest.

use super::fail;
use focus_core::pkg::focus::{
    base_requests, DependencyRequest, FocusInstall, FsManifestHost, PatternTable,
    ResolvedPatterns, Sibling,
};
use focus_core::pkg::{DependencyType, Manifest, Stage};
use focus_core::version::SCHEMA_VERSION;
use focus_core::{Config, Error};
use miette::Result;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Flags for a focus run.
#[derive(Debug, Clone, Copy)]
pub struct FocusAction {
    pub tilde: bool,
    pub exact: bool,
    pub origin: DependencyType,
    pub production: bool,
}

/// Focus result for JSON output.
#[derive(Serialize)]
struct FocusResult<'a> {
    ok: bool,
    schema_version: u32,
    root: String,
    workspace: String,
    stage: Stage,
    siblings: &'a [Sibling],
    requests: Vec<DependencyRequest>,
    /// Patterns left for top-level linking after folding.
    patterns: Vec<String>,
    /// The workspace manifest as the linker sees it.
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest: Option<&'a Manifest>,
}

pub fn run(config: &Config, action: FocusAction, json: bool) -> Result<()> {
    let root = match config.workspace_root() {
        Ok(root) => root,
        Err(e) => fail(&e, json),
    };

    let options = config
        .save_options()
        .with_tilde(action.tilde)
        .with_exact(action.exact)
        .with_default_origin(action.origin);

    let mut install = FocusInstall::new(FsManifestHost, &root, &config.cwd, options);
    let mut table = ResolvedPatterns::new();

    let outcome = plan(&mut install, &mut table, &config.cwd, action.production);
    let (requests, patterns, target) = match outcome {
        Ok(planned) => planned,
        Err(e) => fail(&e, json),
    };

    info!(
        siblings = install.siblings().len(),
        top_level = patterns.len(),
        stage = %install.stage(),
        "Focused install planned"
    );

    let manifest = table
        .resolved(&target.package_pattern())
        .map(|pkg| &pkg.manifest);

    if json {
        let result = FocusResult {
            ok: true,
            schema_version: SCHEMA_VERSION,
            root: root.to_string_lossy().into_owned(),
            workspace: config.cwd.to_string_lossy().into_owned(),
            stage: install.stage(),
            siblings: install.siblings(),
            requests,
            patterns,
            manifest,
        };
        println!("{}", serde_json::to_string_pretty(&result).unwrap());
    } else {
        println!("Workspace root: {}", root.display());
        println!("Focused: {}", target.package_pattern());
        println!();
        println!("Siblings ({}):", install.siblings().len());
        for sibling in install.siblings() {
            println!("  {} @ {}", sibling.name, sibling.version);
        }
        for entry in install.injected() {
            if let Some(version) = &entry.version {
                println!("  ~ {} -> {}", entry.name, version);
            }
        }
        println!();
        println!("Top-level patterns ({}):", patterns.len());
        for pattern in &patterns {
            println!("  + {pattern}");
        }
    }

    Ok(())
}

/// Drive every hook in order, with the monorepo's workspaces as the resolution.
fn plan(
    install: &mut FocusInstall,
    table: &mut ResolvedPatterns,
    cwd: &Path,
    production: bool,
) -> Result<(Vec<DependencyRequest>, Vec<String>, Manifest), Error> {
    install.discover_siblings()?;

    let target = install.discovery().workspace.clone().unwrap_or_else(|| {
        let name = cwd
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Manifest::new(name, "0.0.0")
    });

    let base = base_requests(&target, !production, true);
    let base_patterns: Vec<String> = base.iter().map(|r| r.pattern.clone()).collect();
    let requests = install.build_requests(base)?;

    *table = ResolvedPatterns::from_workspaces(&install.discovery().workspaces);
    install.mark_resolved()?;

    let patterns = install.canonicalize_patterns(table, base_patterns)?;
    let patterns = install.fold_for_linking(table, patterns, &target, false)?;
    install.mark_linked()?;

    Ok((requests, patterns, target))
}
