use crate::error::Error;
use crate::pkg::focus::SaveOptions;
use crate::pkg::{find_workspace_root, load_npmrc_files};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration for the focus CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Monorepo root enclosing the working directory.
    pub fn workspace_root(&self) -> Result<PathBuf, Error> {
        find_workspace_root(&self.cwd).ok_or_else(|| Error::ProjectNotFound {
            start: self.cwd.clone(),
        })
    }

    /// Save options from `.npmrc` files and `npm_config_*` variables, no flags set.
    #[must_use]
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions::from_npmrc(&load_npmrc_files(&self.cwd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_builder() {
        let config = Config::new(PathBuf::from("/repo"))
            .with_verbosity(2)
            .with_json_logs(true);
        assert_eq!(config.cwd, PathBuf::from("/repo"));
        assert_eq!(config.verbosity, 2);
        assert!(config.json_logs);
    }

    #[test]
    fn test_workspace_root_from_member() {
        let root = tempdir().unwrap();
        fs::write(
            root.path().join("package.json"),
            r#"{"workspaces": ["packages/*"]}"#,
        )
        .unwrap();
        let member = root.path().join("packages/a");
        fs::create_dir_all(&member).unwrap();

        let found = Config::new(member).workspace_root().unwrap();
        assert_eq!(found, root.path());
    }

    #[test]
    fn test_workspace_root_missing() {
        let dir = tempdir().unwrap();
        let err = Config::new(dir.path().to_path_buf())
            .workspace_root()
            .unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound { .. }));
    }
}
