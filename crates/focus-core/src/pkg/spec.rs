//! Package spec and pattern parsing.
//!
//! Parses dependency patterns like:
//! - `react`
//! - `react@18.2.0`
//! - `react@^18.0.0`
//! - `@types/node@^20`
//! - `sibling@git+https://github.com/org/sibling.git`
//!
//! and classifies exotic references (paths, URLs, VCS) that are resolved by
//! something other than the registry.

use super::error::PkgError;

/// Range prefixes that are resolved outside the registry.
const EXOTIC_PREFIXES: &[&str] = &[
    "file:",
    "link:",
    "portal:",
    "workspace:",
    "git:",
    "git+",
    "github:",
    "gitlab:",
    "bitbucket:",
    "http://",
    "https://",
];

/// A parsed package specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Full package name (e.g., "@scope/name" or "name").
    pub name: String,
    /// Scope without the @ prefix, if scoped.
    pub scope: Option<String>,
    /// Version range, tag, or exotic reference (None means latest).
    pub range: Option<String>,
}

impl PackageSpec {
    /// Parse a package specification string.
    ///
    /// # Errors
    /// Returns an error if the spec is invalid.
    pub fn parse(input: &str) -> Result<Self, PkgError> {
        let input = input.trim();

        if input.is_empty() {
            return Err(PkgError::spec_invalid("Empty package spec"));
        }

        if input.starts_with('@') {
            Self::parse_scoped(input)
        } else {
            Self::parse_unscoped(input)
        }
    }

    fn parse_scoped(input: &str) -> Result<Self, PkgError> {
        let Some(slash_pos) = input.find('/') else {
            return Err(PkgError::spec_invalid(format!(
                "Invalid scoped package: missing '/' in '{input}'"
            )));
        };

        if slash_pos == 1 {
            return Err(PkgError::spec_invalid(format!(
                "Invalid scoped package: empty scope in '{input}'"
            )));
        }

        let scope = &input[1..slash_pos];
        let after_slash = &input[slash_pos + 1..];

        let (pkg_name, range) = match after_slash.find('@') {
            Some(at_pos) => (&after_slash[..at_pos], Some(&after_slash[at_pos + 1..])),
            None => (after_slash, None),
        };

        if pkg_name.is_empty() {
            return Err(PkgError::spec_invalid(format!(
                "Invalid scoped package: empty name in '{input}'"
            )));
        }

        if range.is_some_and(str::is_empty) {
            return Err(PkgError::spec_invalid(format!(
                "Invalid package spec: empty version range in '{input}'"
            )));
        }

        Self::validate_name(scope)?;
        Self::validate_name(pkg_name)?;

        Ok(Self {
            name: format!("@{scope}/{pkg_name}"),
            scope: Some(scope.to_string()),
            range: range.map(String::from),
        })
    }

    fn parse_unscoped(input: &str) -> Result<Self, PkgError> {
        let (name, range) = match input.find('@') {
            Some(at_pos) => (&input[..at_pos], Some(&input[at_pos + 1..])),
            None => (input, None),
        };

        if name.is_empty() {
            return Err(PkgError::spec_invalid(format!(
                "Invalid package spec: empty name in '{input}'"
            )));
        }

        if range.is_some_and(str::is_empty) {
            return Err(PkgError::spec_invalid(format!(
                "Invalid package spec: empty version range in '{input}'"
            )));
        }

        Self::validate_name(name)?;

        Ok(Self {
            name: name.to_string(),
            scope: None,
            range: range.map(String::from),
        })
    }

    fn validate_name(name: &str) -> Result<(), PkgError> {
        if name.is_empty() {
            return Err(PkgError::spec_invalid("Empty package name"));
        }

        // Basic validation: no spaces, no special chars except - and _
        for c in name.chars() {
            if !c.is_alphanumeric() && c != '-' && c != '_' && c != '.' {
                return Err(PkgError::spec_invalid(format!(
                    "Invalid character '{c}' in package name '{name}'"
                )));
            }
        }

        Ok(())
    }

    /// Whether the spec carries an explicit range.
    #[must_use]
    pub fn has_version(&self) -> bool {
        self.range.is_some()
    }

    /// Check if this is a scoped package.
    #[must_use]
    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }

    /// Render back into a `name@range` pattern (or just `name`).
    #[must_use]
    pub fn to_pattern(&self) -> String {
        match &self.range {
            Some(range) => format_pattern(&self.name, range),
            None => self.name.clone(),
        }
    }
}

/// Build a `name@version` pattern.
#[must_use]
pub fn format_pattern(name: &str, version: &str) -> String {
    format!("{name}@{version}")
}

/// Check whether a pattern or bare range is an exotic reference.
///
/// A bare reference (`git+https://...`, `../lib`, `org/repo`) is exotic on its
/// own; a `name@range` pattern is exotic when its range is.
#[must_use]
pub fn is_exotic(pattern: &str) -> bool {
    let pattern = pattern.trim();
    if is_exotic_reference(pattern) {
        return true;
    }

    PackageSpec::parse(pattern)
        .ok()
        .and_then(|spec| spec.range)
        .is_some_and(|range| is_exotic_reference(&range))
}

fn is_exotic_reference(reference: &str) -> bool {
    if EXOTIC_PREFIXES.iter().any(|p| reference.starts_with(p)) {
        return true;
    }

    if reference.starts_with("./")
        || reference.starts_with("../")
        || reference.starts_with('/')
        || reference.starts_with("~/")
    {
        return true;
    }

    is_github_shorthand(reference)
}

/// `org/repo` or `org/repo#ref`.
fn is_github_shorthand(reference: &str) -> bool {
    let repo = reference.split_once('#').map_or(reference, |(repo, _)| repo);
    let Some((owner, name)) = repo.split_once('/') else {
        return false;
    };

    let valid = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };

    !owner.starts_with(['.', '-', '@']) && valid(owner) && valid(name)
}
