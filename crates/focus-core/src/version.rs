use std::fmt::Write;

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Schema version of the JSON output.
/// Bump this when changing fields in a way that would break consumers.
pub const SCHEMA_VERSION: u32 = 1;

/// Returns a formatted version string including build metadata if available.
#[must_use]
pub fn version_string() -> String {
    let mut s = format!("focus {VERSION}");

    if let Some(hash) = option_env!("FOCUS_BUILD_GIT_HASH") {
        let _ = write!(s, " ({hash})");
    }

    s
}
