//! Declarative model files.
//!
//! A manifest declares typed nodes and lists references to check against
//! them. YAML (`.yaml`, `.yml`) and JSON (`.json`) are accepted:
//!
//! ```yaml
//! nodes:
//!   - { path: tasks, type: "Map<String, Task>" }
//!   - { path: tasks.compile, type: Task }
//! references:
//!   - { path: tasks.compile, type: Task }
//!   - { path: tasks, type: "Map<String, ?>" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::errors::{ModelError, Result};
use crate::reference::{ReferenceSpec, UntypedReference};
use crate::registry::ModelRegistry;
use crate::types::TypeDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(ManifestFormat::Yaml),
            Some("json") => Ok(ManifestFormat::Json),
            _ => Err(ModelError::invalid_argument(format!(
                "unsupported manifest extension for '{}' (expected .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub nodes: Vec<ReferenceSpec>,
    #[serde(default)]
    pub references: Vec<ReferenceSpec>,
}

/// How a single reference fared against a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// A node with exactly the requested type exists.
    Resolved,
    /// The node's type differs but is assignable to the requested one.
    Assignable { actual: TypeDescriptor },
    Mismatch { actual: TypeDescriptor },
    Missing,
}

impl CheckOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckOutcome::Mismatch { .. } | CheckOutcome::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub reference: UntypedReference,
    pub outcome: CheckOutcome,
}

impl Manifest {
    pub fn from_yaml_str(text: &str, name: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| ModelError::Manifest {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_json_str(text: &str, name: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ModelError::Manifest {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let format = ManifestFormat::from_path(path)?;
        let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.display().to_string();
        tracing::debug!(manifest = %name, ?format, "loading manifest");
        match format {
            ManifestFormat::Yaml => Self::from_yaml_str(&text, &name),
            ManifestFormat::Json => Self::from_json_str(&text, &name),
        }
    }

    /// The declared nodes, parents before children.
    pub fn declarations(&self) -> Result<Vec<UntypedReference>> {
        let mut declarations = convert_all(&self.nodes)?;
        declarations.sort_by_key(|r| r.path().depth());
        Ok(declarations)
    }

    pub fn references(&self) -> Result<Vec<UntypedReference>> {
        convert_all(&self.references)
    }

    /// Declares every node in a fresh registry.
    pub fn build_registry(&self) -> Result<ModelRegistry> {
        let mut registry = ModelRegistry::new();
        for declaration in self.declarations()? {
            registry.declare(&declaration)?;
        }
        tracing::debug!(nodes = registry.len(), "built registry from manifest");
        Ok(registry)
    }

    /// Checks every listed reference against `registry`.
    pub fn check(&self, registry: &ModelRegistry) -> Result<Vec<CheckReport>> {
        let reports = self
            .references()?
            .into_iter()
            .map(|reference| {
                let outcome = match registry.find(reference.path()) {
                    None => CheckOutcome::Missing,
                    Some(node) if node.descriptor() == reference.descriptor() => {
                        CheckOutcome::Resolved
                    }
                    Some(node) if reference.descriptor().is_assignable_from(node.descriptor()) => {
                        CheckOutcome::Assignable {
                            actual: node.descriptor().clone(),
                        }
                    }
                    Some(node) => CheckOutcome::Mismatch {
                        actual: node.descriptor().clone(),
                    },
                };
                tracing::trace!(reference = %reference, ?outcome, "checked reference");
                CheckReport { reference, outcome }
            })
            .collect();
        Ok(reports)
    }
}

fn convert_all(specs: &[ReferenceSpec]) -> Result<Vec<UntypedReference>> {
    specs
        .iter()
        .cloned()
        .map(UntypedReference::try_from)
        .collect()
}

/// Finds manifest files under `root`, sorted by path. A file is returned
/// as-is whatever its extension.
pub fn discover_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| ModelError::Io {
            path: root.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && ManifestFormat::from_path(entry.path()).is_ok() {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}
