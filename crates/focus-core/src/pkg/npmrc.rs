//! `.npmrc` file parser for save configuration.
//!
//! Parses `.npmrc` files to extract the settings that decide how a dependency
//! version is recorded:
//! - `save-prefix=^` (the range operator prepended to resolved versions)
//! - `save-exact=true` (record the exact version, no operator)
//! - `${ENV_VAR}` expansion in values
//!
//! `npm_config_save_prefix` / `npm_config_save_exact` environment variables
//! override whatever the files say.

use std::path::Path;

/// Environment override for `save-prefix`.
pub const SAVE_PREFIX_ENV: &str = "npm_config_save_prefix";

/// Environment override for `save-exact`.
pub const SAVE_EXACT_ENV: &str = "npm_config_save_exact";

/// Parsed `.npmrc` configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NpmrcConfig {
    /// Configured save prefix. `Some("")` is meaningful: it means exact.
    pub save_prefix: Option<String>,
    /// Configured save-exact flag.
    pub save_exact: Option<bool>,
}

/// Parse a single `.npmrc` file's content.
///
/// Ignores comments (`#`, `;`), blank lines, and keys it doesn't know about.
#[must_use]
pub fn parse_npmrc(content: &str) -> NpmrcConfig {
    let mut config = NpmrcConfig::default();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = expand_env_vars(unquote(value.trim()));

        match key.trim() {
            "save-prefix" => config.save_prefix = Some(value),
            "save-exact" => config.save_exact = parse_bool(&value),
            _ => {}
        }
    }

    config
}

/// Load and merge `.npmrc` files from project directory up to home.
///
/// Priority order (first wins, no overwrite):
/// 1. Environment variables
/// 2. `project_dir/.npmrc`
/// 3. Parent directories up to filesystem root
/// 4. `$HOME/.npmrc`
#[must_use]
pub fn load_npmrc_files(project_dir: &Path) -> NpmrcConfig {
    let mut merged = from_env();

    let mut dir = Some(project_dir.to_path_buf());
    while let Some(d) = dir {
        merge_file(&mut merged, &d.join(".npmrc"));
        dir = d.parent().map(Path::to_path_buf);
    }

    // Handles project dirs that are not under HOME
    if let Some(home) = dirs_next::home_dir() {
        merge_file(&mut merged, &home.join(".npmrc"));
    }

    merged
}

fn from_env() -> NpmrcConfig {
    NpmrcConfig {
        save_prefix: std::env::var(SAVE_PREFIX_ENV).ok(),
        save_exact: std::env::var(SAVE_EXACT_ENV)
            .ok()
            .and_then(|v| parse_bool(&v)),
    }
}

fn merge_file(target: &mut NpmrcConfig, path: &Path) {
    if !path.is_file() {
        return;
    }
    if let Ok(content) = std::fs::read_to_string(path) {
        merge_config(target, &parse_npmrc(&content));
    }
}

/// Merge `source` into `target`, keeping existing entries (first wins).
fn merge_config(target: &mut NpmrcConfig, source: &NpmrcConfig) {
    if target.save_prefix.is_none() {
        target.save_prefix.clone_from(&source.save_prefix);
    }
    if target.save_exact.is_none() {
        target.save_exact = source.save_exact;
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
            // Missing variables expand to empty string (matches npm behavior)
            if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            }
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_save_settings() {
        let config = parse_npmrc("save-prefix=~\nsave-exact=false\n");
        assert_eq!(config.save_prefix.as_deref(), Some("~"));
        assert_eq!(config.save_exact, Some(false));
    }

    #[test]
    fn test_empty_prefix_is_kept() {
        let config = parse_npmrc("save-prefix=\n");
        assert_eq!(config.save_prefix.as_deref(), Some(""));

        let config = parse_npmrc("save-prefix=\"\"\n");
        assert_eq!(config.save_prefix.as_deref(), Some(""));
    }

    #[test]
    fn test_comments_and_unknown_keys() {
        let content = "\
# comment
; another comment
@scope:registry=https://example.com/

save-exact = true
";
        let config = parse_npmrc(content);
        assert_eq!(config.save_exact, Some(true));
        assert_eq!(config.save_prefix, None);
    }

    #[test]
    fn test_invalid_bool_ignored() {
        let config = parse_npmrc("save-exact=yes\n");
        assert_eq!(config.save_exact, None);
    }

    #[test]
    #[serial]
    fn test_env_var_expansion() {
        std::env::set_var("TEST_NPMRC_PREFIX", "~");
        let config = parse_npmrc("save-prefix=${TEST_NPMRC_PREFIX}\n");
        assert_eq!(config.save_prefix.as_deref(), Some("~"));
        std::env::remove_var("TEST_NPMRC_PREFIX");
    }

    #[test]
    fn test_env_var_missing() {
        let result = expand_env_vars("${NONEXISTENT_VAR_12345}");
        assert_eq!(result, "");
    }

    #[test]
    fn test_merge_first_wins() {
        let mut target = NpmrcConfig {
            save_prefix: Some("~".to_string()),
            save_exact: None,
        };
        let source = NpmrcConfig {
            save_prefix: Some("^".to_string()),
            save_exact: Some(true),
        };

        merge_config(&mut target, &source);
        assert_eq!(target.save_prefix.as_deref(), Some("~"));
        assert_eq!(target.save_exact, Some(true));
    }

    #[test]
    #[serial]
    fn test_load_nearest_file_wins() {
        let root = tempdir().unwrap();
        let nested = root.path().join("packages").join("app");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.path().join(".npmrc"), "save-prefix=~\nsave-exact=true\n").unwrap();
        fs::write(nested.join(".npmrc"), "save-prefix=^\n").unwrap();

        std::env::remove_var(SAVE_PREFIX_ENV);
        std::env::remove_var(SAVE_EXACT_ENV);
        let config = load_npmrc_files(&nested);
        assert_eq!(config.save_prefix.as_deref(), Some("^"));
        assert_eq!(config.save_exact, Some(true));
    }

    #[test]
    #[serial]
    fn test_env_overrides_files() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(".npmrc"), "save-prefix=~\n").unwrap();

        std::env::set_var(SAVE_PREFIX_ENV, "");
        let config = load_npmrc_files(root.path());
        std::env::remove_var(SAVE_PREFIX_ENV);

        assert_eq!(config.save_prefix.as_deref(), Some(""));
    }

    #[test]
    #[serial]
    #[cfg(unix)]
    fn test_home_npmrc_applies_outside_home() {
        let home = tempdir().unwrap();
        let project = tempdir().unwrap();
        fs::write(home.path().join(".npmrc"), "save-exact=true\n").unwrap();

        let previous = std::env::var_os("HOME");
        std::env::set_var("HOME", home.path());
        std::env::remove_var(SAVE_EXACT_ENV);
        let config = load_npmrc_files(project.path());
        match previous {
            Some(value) => std::env::set_var("HOME", value),
            None => std::env::remove_var("HOME"),
        }

        assert_eq!(config.save_exact, Some(true));
    }
}
