//! Registry manifest reading and normalization.
//!
//! A manifest is the parsed, validated form of a `package.json` (or another
//! registry's manifest file). Raw JSON is read with [`read_manifest_file`] and
//! turned into a [`Manifest`] with [`normalize_manifest`].

use super::error::PkgError;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Registries whose manifest files can anchor a workspace, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryName {
    Npm,
    Yarn,
    Bower,
}

impl RegistryName {
    /// All registries, in the order they are probed.
    pub const ALL: [Self; 3] = [Self::Npm, Self::Yarn, Self::Bower];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Bower => "bower",
        }
    }

    /// Manifest filename for this registry.
    #[must_use]
    pub fn filename(self) -> &'static str {
        match self {
            Self::Npm | Self::Yarn => "package.json",
            Self::Bower => "bower.json",
        }
    }
}

impl fmt::Display for RegistryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Manifest section a dependency is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyType {
    #[default]
    Dependencies,
    DevDependencies,
    OptionalDependencies,
    PeerDependencies,
}

impl DependencyType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
            Self::OptionalDependencies => "optionalDependencies",
            Self::PeerDependencies => "peerDependencies",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = PkgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dependencies" => Ok(Self::Dependencies),
            "devDependencies" => Ok(Self::DevDependencies),
            "optionalDependencies" => Ok(Self::OptionalDependencies),
            "peerDependencies" => Ok(Self::PeerDependencies),
            other => Err(PkgError::package_json_invalid(format!(
                "Unknown dependency section '{other}'"
            ))),
        }
    }
}

/// A normalized registry manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    pub version: String,
    /// Directory the manifest was read from.
    #[serde(skip)]
    pub location: PathBuf,
    /// Workspace globs, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_dependencies: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_dependencies: BTreeMap<String, String>,
}

impl Manifest {
    /// Create a manifest with just a name and version.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// The `name@version` pattern this manifest resolves under.
    #[must_use]
    pub fn package_pattern(&self) -> String {
        super::spec::format_pattern(&self.name, &self.version)
    }

    /// Whether this manifest declares workspaces.
    #[must_use]
    pub fn is_workspace_root(&self) -> bool {
        !self.workspaces.is_empty()
    }

    #[must_use]
    pub fn bucket(&self, kind: DependencyType) -> &BTreeMap<String, String> {
        match kind {
            DependencyType::Dependencies => &self.dependencies,
            DependencyType::DevDependencies => &self.dev_dependencies,
            DependencyType::OptionalDependencies => &self.optional_dependencies,
            DependencyType::PeerDependencies => &self.peer_dependencies,
        }
    }

    pub fn bucket_mut(&mut self, kind: DependencyType) -> &mut BTreeMap<String, String> {
        match kind {
            DependencyType::Dependencies => &mut self.dependencies,
            DependencyType::DevDependencies => &mut self.dev_dependencies,
            DependencyType::OptionalDependencies => &mut self.optional_dependencies,
            DependencyType::PeerDependencies => &mut self.peer_dependencies,
        }
    }

    /// Declared dependencies as (name, range, section) triples, sorted by name.
    ///
    /// `dependencies` takes precedence over `devDependencies`, which takes
    /// precedence over `optionalDependencies`.
    #[must_use]
    pub fn declared_dependencies(
        &self,
        include_dev: bool,
        include_optional: bool,
    ) -> Vec<(String, String, DependencyType)> {
        let mut deps: HashMap<&str, (&str, DependencyType)> = HashMap::new();

        let mut sections = Vec::new();
        if include_optional {
            sections.push(DependencyType::OptionalDependencies);
        }
        if include_dev {
            sections.push(DependencyType::DevDependencies);
        }
        sections.push(DependencyType::Dependencies);

        // Later sections overwrite earlier ones
        for kind in sections {
            for (name, range) in self.bucket(kind) {
                deps.insert(name.as_str(), (range.as_str(), kind));
            }
        }

        let mut deps: Vec<_> = deps
            .into_iter()
            .map(|(name, (range, kind))| (name.to_string(), range.to_string(), kind))
            .collect();
        deps.sort_by(|a, b| a.0.cmp(&b.0));
        deps
    }
}

/// Read a registry manifest file from a directory.
///
/// Returns `Ok(None)` if the file does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or is not valid JSON.
pub fn read_manifest_file(dir: &Path, registry: RegistryName) -> Result<Option<Value>, PkgError> {
    let path = dir.join(registry.filename());
    if !path.is_file() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| PkgError::io(&path, &e))?;

    let raw = serde_json::from_str(&content).map_err(|e| {
        PkgError::package_json_invalid(format!("Invalid JSON in {}: {e}", path.display()))
    })?;

    Ok(Some(raw))
}

/// Normalize a raw manifest.
///
/// Workspace manifests must have a `name`; a root manifest without one is
/// named after its directory. A missing `version` becomes `0.0.0`.
///
/// # Errors
/// Returns an error if the manifest is not an object, a required field is
/// missing, or a dependency section is malformed.
pub fn normalize_manifest(raw: &Value, location: &Path, is_root: bool) -> Result<Manifest, PkgError> {
    let root = raw
        .as_object()
        .ok_or_else(|| PkgError::package_json_invalid("package.json must be a JSON object"))?;

    let name = match root.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        Some(Value::String(_)) | None if is_root => location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        Some(other) if !other.is_string() => {
            return Err(PkgError::package_json_invalid(format!(
                "'name' must be a string in {}, got {}",
                location.display(),
                json_type_name(other)
            )))
        }
        _ => {
            return Err(PkgError::package_json_invalid(format!(
                "Missing 'name' in {}",
                location.display()
            )))
        }
    };

    let version = root
        .get("version")
        .and_then(Value::as_str)
        .map_or_else(|| "0.0.0".to_string(), |v| v.trim().to_string());

    let mut manifest = Manifest {
        name,
        version,
        location: location.to_path_buf(),
        workspaces: workspace_globs(root.get("workspaces")),
        ..Default::default()
    };

    for kind in [
        DependencyType::Dependencies,
        DependencyType::DevDependencies,
        DependencyType::OptionalDependencies,
        DependencyType::PeerDependencies,
    ] {
        *manifest.bucket_mut(kind) = extract_section(root, kind)?;
    }

    Ok(manifest)
}

/// Workspaces can be an array or an object with a `packages` field.
fn workspace_globs(value: Option<&Value>) -> Vec<String> {
    let strings = |arr: &Vec<Value>| {
        arr.iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    };

    match value {
        Some(Value::Array(arr)) => strings(arr),
        Some(Value::Object(obj)) => obj
            .get("packages")
            .and_then(Value::as_array)
            .map(strings)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn extract_section(
    root: &serde_json::Map<String, Value>,
    kind: DependencyType,
) -> Result<BTreeMap<String, String>, PkgError> {
    let section = kind.as_str();
    let Some(section_value) = root.get(section) else {
        return Ok(BTreeMap::new());
    };

    let Some(section_obj) = section_value.as_object() else {
        return Err(PkgError::package_json_invalid(format!(
            "'{section}' must be an object, got {}",
            json_type_name(section_value)
        )));
    };

    let mut deps = BTreeMap::new();
    for (name, range_value) in section_obj {
        let Some(range) = range_value.as_str() else {
            return Err(PkgError::dep_range_invalid(name, json_type_name(range_value)));
        };
        deps.insert(name.clone(), range.to_string());
    }

    Ok(deps)
}

/// Get a human-readable type name for a JSON value.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
