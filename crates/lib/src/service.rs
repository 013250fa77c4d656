//! Serde model of the service manifest.
//!
//! Only the fields the build pipeline reads are modeled; the real document
//! carries much more (events, resources, ...), which serde ignores. The
//! pipeline never mutates a manifest while building — it produces
//! [`PackageUpdate`](crate::package::PackageUpdate) values that the
//! orchestrator applies back through [`Service::apply_update`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::GoSettings;
use crate::error::BuildError;
use crate::package::PackageUpdate;

/// A service manifest: provider defaults, declared functions, and the
/// optional `custom.go` build settings.
///
/// Uses [`BTreeMap`] for the function registry so iteration (and therefore
/// build scheduling and output) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub service: Option<String>,
  #[serde(default)]
  pub provider: Provider,
  #[serde(default)]
  pub functions: BTreeMap<String, FunctionDef>,
  #[serde(default)]
  pub custom: Custom,
}

/// Provider-level defaults that functions can override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Provider {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub runtime: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub architecture: Option<String>,
}

/// One declared function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
  /// Path to a Go source file, a module directory (monorepo), or — after a
  /// managed-runtime build — the compiled binary.
  pub handler: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub runtime: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub architecture: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub package: Option<PackageSpec>,
}

/// A function's packaging descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageSpec {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub individually: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub exclude_dev_dependencies: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub artifact: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub include: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub patterns: Vec<String>,
}

/// The service-level `custom` block; only the `go` settings are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Custom {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub go: Option<GoSettings>,
}

impl Service {
  /// Parse a manifest from YAML text.
  pub fn from_yaml(text: &str) -> Result<Self, BuildError> {
    Ok(serde_yaml::from_str(text)?)
  }

  /// Load a manifest from a YAML file.
  pub fn load(path: &Path) -> Result<Self, BuildError> {
    let text = fs::read_to_string(path)?;
    Self::from_yaml(&text)
  }

  /// Apply a build's package update to the named function.
  ///
  /// Only `handler` and `package` are ever touched. Unknown names are
  /// ignored (an update can only come from a build of a declared function).
  pub fn apply_update(&mut self, name: &str, update: &PackageUpdate) {
    let Some(function) = self.functions.get_mut(name) else {
      return;
    };
    match update {
      PackageUpdate::Custom { artifact } => {
        function.package = Some(PackageSpec {
          individually: Some(true),
          exclude_dev_dependencies: Some(false),
          artifact: Some(artifact.display().to_string()),
          include: Vec::new(),
          patterns: Vec::new(),
        });
      }
      PackageUpdate::Managed { handler, patterns } => {
        function.handler = handler.clone();
        function.package = Some(PackageSpec {
          individually: Some(true),
          exclude_dev_dependencies: Some(false),
          artifact: None,
          include: Vec::new(),
          patterns: patterns.clone(),
        });
      }
    }
  }
}
