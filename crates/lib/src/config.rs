//! Build-configuration resolution.
//!
//! The effective configuration for a function build is layered from three
//! sources, later layers winning:
//!
//! 1. built-in defaults (amd64 cross-compile, managed Go runtime)
//! 2. provider / function-level runtime and architecture
//! 3. the service-level `custom.go` override block
//!
//! Resolution fails (returns `None`) when the function's runtime is not a
//! recognized Go runtime; the caller skips the function silently.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::service::{FunctionDef, Provider};

/// Cross-compile template targeting linux/amd64, stripped of symbol tables
/// and debug info.
pub const CMD_BUILD_AMD64: &str = r#"GOOS=linux GOARCH=amd64 go build -ldflags="-s -w""#;

/// Cross-compile template targeting linux/arm64.
pub const CMD_BUILD_ARM64: &str = r#"GOOS=linux GOARCH=arm64 go build -ldflags="-s -w""#;

/// Identifier of the platform-managed Go runtime.
pub const GO_RUNTIME: &str = "go1.x";

/// Identifier of the custom runtime expecting a `bootstrap` binary.
pub const LINUX_RUNTIME: &str = "provided.al2";

/// Any runtime identifier with this prefix is treated as managed Go.
const GO_RUNTIME_PREFIX: &str = "go";

/// Default output directory for compiled binaries.
pub const DEFAULT_BIN_DIR: &str = ".bin";

/// The runtime families the packager distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFamily {
  /// Platform-provided runtime that runs the compiled binary directly.
  ManagedGo,
  /// Generic runtime expecting a `bootstrap` executable inside a zip.
  CustomLinux,
}

impl RuntimeFamily {
  /// Classify a runtime identifier, `None` for anything that is not Go.
  pub fn from_runtime(runtime: &str) -> Option<Self> {
    if runtime == LINUX_RUNTIME {
      Some(RuntimeFamily::CustomLinux)
    } else if runtime == GO_RUNTIME || runtime.starts_with(GO_RUNTIME_PREFIX) {
      Some(RuntimeFamily::ManagedGo)
    } else {
      None
    }
  }
}

/// Target CPU architecture for the cross-compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Architecture {
  #[default]
  Amd64,
  Arm64,
}

impl Architecture {
  /// Resolve from an optional architecture string; anything but `arm64`
  /// keeps the amd64 default.
  pub fn from_name(name: Option<&str>) -> Self {
    match name {
      Some("arm64") => Architecture::Arm64,
      _ => Architecture::Amd64,
    }
  }

  /// The build-command template for this architecture.
  pub fn build_cmd(&self) -> &'static str {
    match self {
      Architecture::Amd64 => CMD_BUILD_AMD64,
      Architecture::Arm64 => CMD_BUILD_ARM64,
    }
  }
}

/// Effective build configuration for one function.
///
/// Recomputed for every build call; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
  /// Root of the Go workspace.
  pub base_dir: PathBuf,
  /// Output directory for compiled binaries.
  pub bin_dir: PathBuf,
  /// Value for `CGO_ENABLED`.
  pub cgo: u8,
  /// Build command template, including its inline OS/ARCH assignments.
  pub cmd: String,
  /// Whether functions live in independent module directories.
  pub monorepo: bool,
  /// Effective runtime identifier; decides the packaging family.
  pub runtime: String,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      base_dir: PathBuf::from("."),
      bin_dir: PathBuf::from(DEFAULT_BIN_DIR),
      cgo: 0,
      cmd: CMD_BUILD_AMD64.to_string(),
      monorepo: false,
      runtime: GO_RUNTIME.to_string(),
    }
  }
}

impl BuildConfig {
  /// The packaging family for this configuration.
  ///
  /// Read from the post-merge runtime string, so a `custom.go.runtime`
  /// override can flip the family.
  pub fn family(&self) -> RuntimeFamily {
    if self.runtime == LINUX_RUNTIME {
      RuntimeFamily::CustomLinux
    } else {
      RuntimeFamily::ManagedGo
    }
  }

  /// Overlay service-level settings, field by field. `Some` wins, `None`
  /// keeps the accumulated value; there is no generic deep merge.
  pub fn merged(mut self, overrides: &GoSettings) -> Self {
    if let Some(base_dir) = &overrides.base_dir {
      self.base_dir = base_dir.clone();
    }
    if let Some(bin_dir) = &overrides.bin_dir {
      self.bin_dir = bin_dir.clone();
    }
    if let Some(cgo) = overrides.cgo {
      self.cgo = cgo;
    }
    if let Some(cmd) = &overrides.cmd {
      self.cmd = cmd.clone();
    }
    if let Some(monorepo) = overrides.monorepo {
      self.monorepo = monorepo;
    }
    if let Some(runtime) = &overrides.runtime {
      self.runtime = runtime.clone();
    }
    self
  }
}

/// The service-level `custom.go` override block. Same shape as
/// [`BuildConfig`], every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoSettings {
  pub base_dir: Option<PathBuf>,
  pub bin_dir: Option<PathBuf>,
  pub cgo: Option<u8>,
  pub cmd: Option<String>,
  pub monorepo: Option<bool>,
  pub runtime: Option<String>,
}

/// Resolve the effective build configuration for one function.
///
/// Returns `None` when the function's runtime (function-level override,
/// else the provider value) is not a recognized Go runtime — the function
/// is skipped, which is policy rather than an error.
pub fn resolve(function: &FunctionDef, provider: &Provider, custom: Option<&GoSettings>) -> Option<BuildConfig> {
  let runtime = function.runtime.as_deref().or(provider.runtime.as_deref())?;
  RuntimeFamily::from_runtime(runtime)?;

  let mut config = BuildConfig {
    runtime: runtime.to_string(),
    ..BuildConfig::default()
  };

  let architecture = function.architecture.as_deref().or(provider.architecture.as_deref());
  if Architecture::from_name(architecture) == Architecture::Arm64 {
    config.cmd = CMD_BUILD_ARM64.to_string();
  }

  if let Some(overrides) = custom {
    config = config.merged(overrides);
  }

  Some(config)
}
