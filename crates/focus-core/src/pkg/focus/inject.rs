//! Dependency request construction.

use super::discovery::Sibling;
use crate::pkg::manifest::{DependencyType, Manifest, RegistryName};
use crate::pkg::spec::format_pattern;
use serde::Serialize;

/// A dependency the resolver is asked to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRequest {
    pub pattern: String,
    pub registry: RegistryName,
    pub optional: bool,
}

impl DependencyRequest {
    /// A required request against the npm registry.
    #[must_use]
    pub fn npm(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            registry: RegistryName::Npm,
            optional: false,
        }
    }
}

/// Requests for a workspace's own declared dependencies, sorted by name.
#[must_use]
pub fn base_requests(
    manifest: &Manifest,
    include_dev: bool,
    include_optional: bool,
) -> Vec<DependencyRequest> {
    manifest
        .declared_dependencies(include_dev, include_optional)
        .into_iter()
        .map(|(name, range, kind)| DependencyRequest {
            pattern: format_pattern(&name, &range),
            registry: RegistryName::Npm,
            optional: kind == DependencyType::OptionalDependencies,
        })
        .collect()
}

/// Append one registry request per sibling after the base requests.
///
/// Sibling order is preserved so the resulting lockfile is reproducible.
#[must_use]
pub fn inject_siblings(
    mut requests: Vec<DependencyRequest>,
    siblings: &[Sibling],
) -> Vec<DependencyRequest> {
    requests.reserve(siblings.len());
    requests.extend(siblings.iter().map(|s| DependencyRequest::npm(s.pattern())));
    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sibling(name: &str, version: &str) -> Sibling {
        Sibling {
            name: name.to_string(),
            version: version.to_string(),
            path: PathBuf::from("/repo/packages").join(name),
        }
    }

    #[test]
    fn test_siblings_follow_base_requests() {
        let base = vec![
            DependencyRequest::npm("left-pad@^1.0.0"),
            DependencyRequest {
                pattern: "fsevents@^2.0.0".to_string(),
                registry: RegistryName::Npm,
                optional: true,
            },
        ];
        let requests = inject_siblings(base, &[sibling("c", "3.0.0"), sibling("a", "1.0.0")]);

        let patterns: Vec<_> = requests.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(
            patterns,
            ["left-pad@^1.0.0", "fsevents@^2.0.0", "c@3.0.0", "a@1.0.0"]
        );
        assert!(requests[2..]
            .iter()
            .all(|r| r.registry == RegistryName::Npm && !r.optional));
    }

    #[test]
    fn test_no_siblings_is_identity() {
        let base = vec![DependencyRequest::npm("react@^18.0.0")];
        assert_eq!(inject_siblings(base.clone(), &[]), base);
    }

    #[test]
    fn test_base_requests_mark_optional() {
        let mut manifest = Manifest::new("app", "1.0.0");
        manifest
            .dependencies
            .insert("react".to_string(), "^18.0.0".to_string());
        manifest
            .optional_dependencies
            .insert("fsevents".to_string(), "^2.0.0".to_string());
        manifest
            .dev_dependencies
            .insert("jest".to_string(), "^29.0.0".to_string());

        let requests = base_requests(&manifest, false, true);
        assert_eq!(
            requests,
            vec![
                DependencyRequest {
                    pattern: "fsevents@^2.0.0".to_string(),
                    registry: RegistryName::Npm,
                    optional: true,
                },
                DependencyRequest::npm("react@^18.0.0"),
            ]
        );
    }
}
