//! Packaging of compiled binaries, branched by runtime family.
//!
//! Custom-runtime functions deploy as a zip whose single entry is the
//! binary renamed to `bootstrap`. Managed-runtime functions deploy the
//! bare binary, with packaging patterns rewritten to ship exactly that
//! file plus whatever the user declared.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::config::{BuildConfig, RuntimeFamily};
use crate::error::BuildError;
use crate::service::PackageSpec;

/// In-archive name the custom runtime expects for the executable.
pub const BOOTSTRAP_NAME: &str = "bootstrap";

/// The packaging result for one function, applied to the manifest by the
/// orchestrator (the pipeline itself never mutates the registry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageUpdate {
  /// Custom-runtime deployment: a finished zip archive.
  Custom { artifact: PathBuf },
  /// Managed-runtime deployment: new handler plus packaging patterns.
  Managed { handler: String, patterns: Vec<String> },
}

/// Package a compiled binary according to the configuration's runtime
/// family, merging in any user-declared package entries.
pub fn package_function(
  name: &str,
  config: &BuildConfig,
  original: Option<&PackageSpec>,
) -> Result<PackageUpdate, BuildError> {
  let bin_path = config.bin_dir.join(name);

  match config.family() {
    RuntimeFamily::CustomLinux => {
      let artifact = write_bootstrap_zip(name, &bin_path)?;
      debug!(function = name, artifact = %artifact.display(), "wrote bootstrap archive");
      Ok(PackageUpdate::Custom { artifact })
    }
    RuntimeFamily::ManagedGo => {
      let mut handler = bin_path.display().to_string();
      if cfg!(windows) {
        handler = handler.replace('\\', "/");
      }

      // Exclude everything, then ship exactly the binary, then whatever
      // the user declared, in their original order.
      let mut patterns = vec!["!./**".to_string(), handler.clone()];
      if let Some(spec) = original {
        patterns.extend(spec.include.iter().cloned());
        patterns.extend(spec.patterns.iter().cloned());
      }
      Ok(PackageUpdate::Managed { handler, patterns })
    }
  }
}

/// Write `<bin_path>.zip` containing the binary as its single `bootstrap`
/// entry, deflated at maximum compression, executable mode. The stream is
/// finished and flushed before returning.
fn write_bootstrap_zip(function: &str, bin_path: &Path) -> Result<PathBuf, BuildError> {
  let zip_path = PathBuf::from(format!("{}.zip", bin_path.display()));

  let io_err = |source: io::Error| BuildError::Package {
    function: function.to_string(),
    source,
  };
  let zip_err = |source: zip::result::ZipError| BuildError::Zip {
    function: function.to_string(),
    source,
  };

  let file = File::create(&zip_path).map_err(io_err)?;
  let mut writer = ZipWriter::new(BufWriter::new(file));

  let options = SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .compression_level(Some(9))
    .unix_permissions(0o755);
  writer.start_file(BOOTSTRAP_NAME, options).map_err(zip_err)?;

  let mut binary = File::open(bin_path).map_err(io_err)?;
  io::copy(&mut binary, &mut writer).map_err(io_err)?;

  let mut inner = writer.finish().map_err(zip_err)?;
  inner.flush().map_err(io_err)?;

  Ok(zip_path)
}
