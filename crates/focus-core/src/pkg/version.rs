//! Version range matching using semver.
//!
//! npm ranges are a superset of what the `semver` crate parses, so ranges are
//! normalized first (hyphen ranges, x-ranges, space-separated comparators,
//! `||` alternatives).

use super::error::PkgError;
use semver::{Version, VersionReq};

/// Check whether `version` is a plain semver version (not a range).
#[must_use]
pub fn is_valid_version(version: &str) -> bool {
    Version::parse(version.trim().trim_start_matches(['=', 'v'])).is_ok()
}

/// Check whether `version` satisfies the npm-style `range`.
///
/// Unparseable versions or ranges never match. A bare version is an exact
/// match, as in npm (not a caret requirement as in Cargo).
#[must_use]
pub fn version_satisfies(version: &str, range: &str) -> bool {
    let Ok(version) = Version::parse(version.trim()) else {
        return false;
    };

    range
        .split("||")
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .any(|alt| alternative_matches(&version, alt))
}

fn alternative_matches(version: &Version, range: &str) -> bool {
    if let Ok(exact) = Version::parse(range.trim_start_matches(['=', 'v'])) {
        return *version == exact;
    }

    parse_range(range).is_ok_and(|req| req.matches(version))
}

/// Parse a single version range, handling npm-specific syntax.
///
/// Handles:
/// - Standard semver ranges: ^1.0.0, ~1.0.0, >=1.0.0, etc.
/// - Hyphen ranges: 1.0.0 - 2.0.0
/// - X-ranges: 1.x, 1.0.x, *
/// - Space-separated comparators: >= 2.1.2 < 3.0.0
pub fn parse_range(range: &str) -> Result<VersionReq, PkgError> {
    let range = range.trim();

    // "1.0.0 - 2.0.0" -> ">=1.0.0, <=2.0.0"
    if let Some((start, end)) = parse_hyphen_range(range) {
        let converted = format!(">={start}, <={end}");
        return VersionReq::parse(&converted).map_err(|e| PkgError::range_invalid(range, e));
    }

    // "1" / "=1.2" / "v1.2" are x-ranges in npm, not Cargo caret requirements
    if let Some(parts) = partial_version(range) {
        let converted = partial_req(&parts)
            .ok_or_else(|| PkgError::range_invalid(range, "version component out of range"))?;
        return VersionReq::parse(&converted).map_err(|e| PkgError::range_invalid(range, e));
    }

    if range.contains('x') || range.contains('X') || range == "*" || range.is_empty() {
        let converted = convert_x_range(range)
            .ok_or_else(|| PkgError::range_invalid(range, "version component out of range"))?;
        return VersionReq::parse(&converted).map_err(|e| PkgError::range_invalid(range, e));
    }

    let converted = convert_space_separated_comparators(range);
    VersionReq::parse(&converted).map_err(|e| PkgError::range_invalid(range, e))
}

/// Parse a hyphen range like "1.0.0 - 2.0.0".
fn parse_hyphen_range(range: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = range.split(" - ").collect();
    if let [start, end] = parts.as_slice() {
        let start = start.trim();
        let end = end.trim();
        if !start.is_empty() && !end.is_empty() {
            return Some((start.to_string(), end.to_string()));
        }
    }
    None
}

/// Convert space-separated comparators to comma-separated.
///
/// npm allows: ">= 2.1.2 < 3.0.0" which means ">=2.1.2 AND <3.0.0"
/// Rust semver requires: ">=2.1.2, <3.0.0"
fn convert_space_separated_comparators(range: &str) -> String {
    let mut result = String::new();
    let mut need_comma = false;

    for token in range.split_whitespace() {
        if token_has_version(token) {
            if need_comma {
                result.push_str(", ");
            }
            result.push_str(token);
            need_comma = true;
        } else {
            // Operator without version, glue to the next token
            if need_comma {
                result.push_str(", ");
                need_comma = false;
            }
            result.push_str(token);
        }
    }

    if result.is_empty() {
        return range.to_string();
    }

    result
}

fn token_has_version(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
}

/// Numeric components of a bare partial version (`X` or `X.Y`).
fn partial_version(range: &str) -> Option<Vec<u64>> {
    let bare = range.trim_start_matches(['=', 'v']);
    let parts: Option<Vec<u64>> = bare.split('.').map(|p| p.parse().ok()).collect();
    parts.filter(|p| (1..=2).contains(&p.len()))
}

/// Requirement covering every version starting with `parts`.
///
/// `None` when the upper bound would overflow.
fn partial_req(parts: &[u64]) -> Option<String> {
    match *parts {
        [major] => {
            let next = major.checked_add(1)?;
            Some(format!(">={major}.0.0, <{next}.0.0"))
        }
        [major, minor] => {
            let next = minor.checked_add(1)?;
            Some(format!(">={major}.{minor}.0, <{major}.{next}.0"))
        }
        _ => None,
    }
}

/// Convert x-range to semver range.
fn convert_x_range(range: &str) -> Option<String> {
    let range = range.trim();

    if range.is_empty() || range == "*" || range == "x" || range == "X" {
        return Some(">=0.0.0".to_string());
    }

    let parts: Vec<&str> = range.split('.').collect();

    match parts.as_slice() {
        [major, "x" | "X" | "*"] | [major, "x" | "X" | "*", "x" | "X" | "*"] => {
            // "1.x" -> ">=1.0.0, <2.0.0"
            if let Ok(m) = major.parse::<u64>() {
                return partial_req(&[m]);
            }
        }
        [major, minor, "x" | "X" | "*"] => {
            // "1.2.x" -> ">=1.2.0, <1.3.0"
            if let (Ok(m), Ok(n)) = (major.parse::<u64>(), minor.parse::<u64>()) {
                return partial_req(&[m, n]);
            }
        }
        _ => {}
    }

    Some(range.replace(['x', 'X'], "0"))
}
