//! Version specifier policy.
//!
//! Decides what range gets recorded for a dependency once its resolved version
//! is known, the same way `add` would record it for a user.

use crate::pkg::manifest::DependencyType;
use crate::pkg::npmrc::NpmrcConfig;
use crate::pkg::spec::{is_exotic, PackageSpec};
use crate::pkg::version::{is_valid_version, version_satisfies};

/// Prefix used when nothing else is configured.
pub const DEFAULT_SAVE_PREFIX: &str = "^";

/// Flags and configuration that shape recorded version specifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// `--tilde`: record `~version`.
    pub tilde: bool,
    /// `--exact`: record the bare version.
    pub exact: bool,
    /// Configured `save-prefix`; an empty prefix means exact.
    pub save_prefix: Option<String>,
    /// Configured `save-exact`.
    pub save_exact: bool,
    /// Section new dependencies land in when nothing says otherwise.
    pub default_origin: DependencyType,
}

impl SaveOptions {
    /// Options seeded from `.npmrc` configuration, with no flags set.
    #[must_use]
    pub fn from_npmrc(config: &NpmrcConfig) -> Self {
        Self {
            save_prefix: config.save_prefix.clone(),
            save_exact: config.save_exact.unwrap_or(false),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_tilde(mut self, tilde: bool) -> Self {
        self.tilde = tilde;
        self
    }

    #[must_use]
    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    #[must_use]
    pub fn with_save_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.save_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_default_origin(mut self, origin: DependencyType) -> Self {
        self.default_origin = origin;
        self
    }

    /// Whether versions are recorded without a range operator.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.exact || self.save_exact || self.save_prefix.as_deref() == Some("")
    }

    /// The operator prepended to a freshly resolved version.
    #[must_use]
    pub fn prefix(&self) -> &str {
        if self.tilde {
            "~"
        } else if self.is_exact() {
            ""
        } else {
            self.save_prefix.as_deref().unwrap_or(DEFAULT_SAVE_PREFIX)
        }
    }
}

/// Compute the version specifier to record for `pattern`, resolved at
/// `resolved_version`.
///
/// 1. Exotic patterns are returned unchanged.
/// 2. A range the pattern already carries is kept verbatim if the resolved
///    version satisfies it (or it is exotic).
/// 3. Otherwise the configured prefix is prepended to the resolved version. A
///    kept range that is itself a plain version forces an empty prefix.
#[must_use]
pub fn compute_version(pattern: &str, resolved_version: &str, options: &SaveOptions) -> String {
    if is_exotic(pattern) {
        return pattern.to_string();
    }

    let kept = PackageSpec::parse(pattern)
        .ok()
        .and_then(|spec| spec.range)
        .filter(|range| version_satisfies(resolved_version, range) || is_exotic(range));

    match kept {
        Some(range) if !is_valid_version(&range) => range,
        Some(_) => resolved_version.to_string(),
        None => format!("{}{resolved_version}", options.prefix()),
    }
}

/// Compute the version specifier for an injected workspace.
///
/// The version pinned into an injected pattern is not something a user asked
/// for, so only the name is considered, as if the user had added it by name.
#[must_use]
pub fn injected_version(name: &str, resolved_version: &str, options: &SaveOptions) -> String {
    compute_version(name, resolved_version, options)
}
