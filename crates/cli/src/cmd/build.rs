//! Implementation of the `gopack build` command.
//!
//! Builds either a single named function or every function in the service.
//! Any compile or packaging failure terminates the process with exit code
//! 1 immediately — a partial artifact set is never packaged.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;

use gopack_lib::build::{self, BuildOptions, FunctionBuild};
use gopack_lib::error::BuildError;
use gopack_lib::package::PackageUpdate;
use gopack_lib::service::Service;

/// Execute the build command.
pub fn cmd_build(config: &Path, function: Option<&str>) -> Result<()> {
  if !config.exists() {
    eprintln!("error: service manifest not found: {}", config.display());
    std::process::exit(1);
  }

  let mut service = match Service::load(config) {
    Ok(service) => service,
    Err(e) => {
      eprintln!("error: failed to load {}: {}", config.display(), e);
      std::process::exit(1);
    }
  };

  debug!(functions = service.functions.len(), "loaded service manifest");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

  match function {
    Some(name) => {
      let start = Instant::now();
      let built = rt.block_on(build::compile_function(&service, name)).unwrap_or_else(fatal);
      match built {
        Some(build) => {
          service.apply_update(name, &build.update);
          print_artifact(name, &build);
          println!("Compilation time ({}): {}", name, format_elapsed(start.elapsed()));
        }
        None => {
          println!("Skipped {} (runtime is not a Go runtime)", name);
        }
      }
    }
    None => {
      let start = Instant::now();
      let options = BuildOptions::default();
      let built = rt.block_on(build::compile_service(&service, &options)).unwrap_or_else(fatal);

      for (name, build) in &built {
        service.apply_update(name, &build.update);
      }

      println!();
      println!("Build complete!");
      println!("  Functions built: {}", built.len());
      for (name, build) in &built {
        print_artifact(name, build);
      }
      println!("  Compilation time: {}", format_elapsed(start.elapsed()));
    }
  }

  Ok(())
}

/// A failed build aborts the whole run: log and terminate.
fn fatal<T>(err: BuildError) -> T {
  eprintln!("error: {}", err);
  std::process::exit(1);
}

fn print_artifact(name: &str, build: &FunctionBuild) {
  match &build.update {
    PackageUpdate::Custom { artifact } => println!("  {}: {}", name, artifact.display()),
    PackageUpdate::Managed { handler, .. } => println!("  {}: {}", name, handler),
  }
}

/// Millisecond-granularity duration for human eyes.
fn format_elapsed(elapsed: Duration) -> String {
  humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64)).to_string()
}
