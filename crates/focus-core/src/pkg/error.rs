//! Package manager error types.

use std::fmt;
use std::io;

/// Package manager error codes.
pub mod codes {
    pub const PKG_SPEC_INVALID: &str = "PKG_SPEC_INVALID";
    pub const PKG_RANGE_INVALID: &str = "PKG_RANGE_INVALID";
    pub const PKG_PACKAGE_JSON_INVALID: &str = "PKG_PACKAGE_JSON_INVALID";
    pub const PKG_DEP_RANGE_INVALID: &str = "PKG_DEP_RANGE_INVALID";
    pub const PKG_IO_ERROR: &str = "PKG_IO_ERROR";

    // Focused (isolated workspace) installs
    pub const FOCUS_ROOT_NOT_ALLOWED: &str = "FOCUS_ROOT_NOT_ALLOWED";
    pub const FOCUS_NO_WORKSPACE_ROOT: &str = "FOCUS_NO_WORKSPACE_ROOT";
    pub const FOCUS_PATTERN_UNRESOLVED: &str = "FOCUS_PATTERN_UNRESOLVED";
    pub const FOCUS_INVARIANT: &str = "FOCUS_INVARIANT";
}

/// Package manager error.
#[derive(Debug)]
pub struct PkgError {
    code: &'static str,
    message: String,
}

impl PkgError {
    /// Create a new error with the given code and message.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this error signals a broken internal invariant rather than bad input.
    #[must_use]
    pub fn is_invariant(&self) -> bool {
        self.code == codes::FOCUS_INVARIANT
    }

    /// Create a spec invalid error.
    pub fn spec_invalid(msg: impl Into<String>) -> Self {
        Self::new(codes::PKG_SPEC_INVALID, msg)
    }

    /// Create a range invalid error.
    pub fn range_invalid(range: &str, msg: impl fmt::Display) -> Self {
        Self::new(
            codes::PKG_RANGE_INVALID,
            format!("Invalid version range '{range}': {msg}"),
        )
    }

    /// Create an I/O error for a file that exists but can't be read.
    #[must_use]
    pub fn io(path: &std::path::Path, err: &io::Error) -> Self {
        Self::new(
            codes::PKG_IO_ERROR,
            format!("Failed to read {}: {err}", path.display()),
        )
    }

    /// Create a package.json invalid error.
    pub fn package_json_invalid(msg: impl Into<String>) -> Self {
        Self::new(codes::PKG_PACKAGE_JSON_INVALID, msg)
    }

    /// Create a dependency range invalid error.
    #[must_use]
    pub fn dep_range_invalid(name: &str, actual_type: &str) -> Self {
        Self::new(
            codes::PKG_DEP_RANGE_INVALID,
            format!("Invalid range for '{name}': expected string, got {actual_type}"),
        )
    }

    /// Focusing the monorepo root on itself is meaningless.
    #[must_use]
    pub fn root_not_allowed(root: &std::path::Path) -> Self {
        Self::new(
            codes::FOCUS_ROOT_NOT_ALLOWED,
            format!(
                "Cannot focus the workspace root {}; run this from inside a workspace",
                root.display()
            ),
        )
    }

    /// A pattern the resolver was expected to know about has no resolution.
    #[must_use]
    pub fn pattern_unresolved(pattern: &str) -> Self {
        Self::new(
            codes::FOCUS_PATTERN_UNRESOLVED,
            format!("No resolved package for pattern '{pattern}'"),
        )
    }

    /// Create an invariant violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::new(codes::FOCUS_INVARIANT, msg)
    }
}

impl fmt::Display for PkgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PkgError {}
