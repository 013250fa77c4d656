//! Working-directory and output-path derivation for a function build.
//!
//! The compiler's `-o` argument is resolved against the compiler's own
//! working directory, not against the workspace base directory. In monorepo
//! mode the working directory moves into the function's module, so the
//! output path computed against the base directory must be re-based onto
//! the new working directory — otherwise binaries would scatter across
//! module subdirectories instead of landing in the one shared bin dir.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::error::BuildError;

/// Resolved paths for one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
  /// Directory the compiler runs in.
  pub cwd: PathBuf,
  /// Handler argument passed to the compiler: the original handler, a lone
  /// file name, or `.` for a whole module directory.
  pub handler_arg: String,
  /// Output binary path, relative to `cwd`.
  pub output_path: PathBuf,
}

/// Derive the compiler's working directory, handler argument and output
/// path for a function.
///
/// Non-monorepo mode builds from the base directory with the handler
/// unchanged. Monorepo mode builds from the handler's module directory:
/// a `.go` handler compiles that single file, anything else compiles the
/// directory as a package (`.`).
pub fn resolve_paths(config: &BuildConfig, name: &str, handler: &str) -> Result<BuildPaths, BuildError> {
  let abs_base = absolute(&config.base_dir)?;
  let abs_bin = absolute(&config.bin_dir)?;

  // Expressed via absolute-path difference so the result does not depend
  // on the process working directory.
  let output_path = relative_to(&abs_bin, &abs_base)?.join(name);

  if !config.monorepo {
    return Ok(BuildPaths {
      cwd: config.base_dir.clone(),
      handler_arg: handler.to_string(),
      output_path,
    });
  }

  let handler_path = Path::new(handler);
  let (cwd, handler_arg) = if handler.ends_with(".go") {
    let parent = match handler_path.parent() {
      Some(p) if !p.as_os_str().is_empty() => p,
      _ => Path::new("."),
    };
    let file = handler_path
      .file_name()
      .map(|f| f.to_string_lossy().into_owned())
      .unwrap_or_else(|| handler.to_string());
    (relative_to(&absolute(parent)?, &abs_base)?, file)
  } else {
    (relative_to(&absolute(handler_path)?, &abs_base)?, ".".to_string())
  };

  let cwd = if cwd.as_os_str().is_empty() {
    PathBuf::from(".")
  } else {
    cwd
  };
  let output_path = relative_to(&output_path, &cwd)?;

  Ok(BuildPaths {
    cwd,
    handler_arg,
    output_path,
  })
}

/// Resolve a possibly-relative path against the process working directory.
fn absolute(path: &Path) -> Result<PathBuf, BuildError> {
  if path.is_absolute() {
    Ok(path.to_path_buf())
  } else {
    Ok(env::current_dir()?.join(path))
  }
}

/// Express `path` relative to `base`.
fn relative_to(path: &Path, base: &Path) -> Result<PathBuf, BuildError> {
  pathdiff::diff_paths(path, base).ok_or_else(|| BuildError::PathResolution {
    path: path.display().to_string(),
    base: base.display().to_string(),
  })
}
