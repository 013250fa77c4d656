//! Error types for the build pipeline.

use thiserror::Error;

/// Errors that can occur while building and packaging functions.
///
/// Every variant is fatal for the whole run: nothing is retried and no
/// partial artifact set is considered valid. The distinction between
/// compile and packaging failures exists for precise messages, not for
/// differing policy.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The external compiler exited non-zero or could not be spawned.
  #[error("error compiling \"{function}\" (cwd: {cwd}): {message}")]
  Compile {
    function: String,
    cwd: String,
    message: String,
  },

  /// Filesystem failure while packaging a compiled binary.
  #[error("error packaging \"{function}\": {source}")]
  Package {
    function: String,
    #[source]
    source: std::io::Error,
  },

  /// Archive writer failure while producing a bootstrap zip.
  #[error("error archiving \"{function}\": {source}")]
  Zip {
    function: String,
    #[source]
    source: zip::result::ZipError,
  },

  /// A path could not be expressed relative to another.
  #[error("cannot express {path} relative to {base}")]
  PathResolution { path: String, base: String },

  /// The requested function is not declared in the service manifest.
  #[error("function not found in service: {0}")]
  UnknownFunction(String),

  /// The service manifest could not be parsed.
  #[error("invalid service manifest: {0}")]
  Manifest(#[from] serde_yaml::Error),

  /// I/O error outside the compile/package steps (manifest loading, cwd).
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A build task panicked or was cancelled.
  #[error("build task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}
