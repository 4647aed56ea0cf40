//! `focus workspaces` command implementation.
//!
//! List the workspace packages of the enclosing monorepo, in membership order.

use super::fail;
use focus_core::pkg::detect_workspaces;
use focus_core::{Config, Error};
use miette::Result;

/// Run the workspaces command.
pub fn run(config: &Config, json: bool) -> Result<()> {
    let root = config
        .workspace_root()
        .unwrap_or_else(|_| config.cwd.clone());

    let set = match detect_workspaces(&root) {
        Ok(Some(set)) => set,
        Ok(None) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "ok": true,
                        "workspaces": false,
                        "packages": []
                    })
                );
            } else {
                println!("No workspaces configured.");
                println!("hint: Add a \"workspaces\" field to package.json");
            }
            return Ok(());
        }
        Err(e) => fail(&Error::from(e), json),
    };

    if json {
        let packages: Vec<_> = set
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "version": p.version,
                    "path": p.path.to_string_lossy()
                })
            })
            .collect();

        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "workspaces": true,
                "root": root.to_string_lossy(),
                "packages": packages
            })
        );
    } else {
        println!("Workspace root: {}", root.display());
        println!();
        println!("Packages ({}):", set.len());
        for pkg in set.iter() {
            println!("  {} @ {}", pkg.name, pkg.version);
            println!("    {}", pkg.path.display());
        }
    }

    Ok(())
}
