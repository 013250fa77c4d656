//! Build orchestration: the per-function pipeline and the whole-service
//! fan-out.
//!
//! One function's build is config resolution, path derivation, compiler
//! invocation and packaging, in that order. A whole-service build runs
//! every function through that pipeline concurrently, bounded by a worker
//! pool sized to leave one execution unit free for the host. The first
//! failure aborts the run; still-queued siblings are abandoned and nothing
//! is retried.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::compile;
use crate::config;
use crate::error::BuildError;
use crate::package::{self, PackageUpdate};
use crate::paths;
use crate::service::Service;

/// Result of building one function: the binary it produced and the package
/// update to apply to the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBuild {
  pub binary: std::path::PathBuf,
  pub update: PackageUpdate,
}

/// Options for a whole-service build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
  /// Maximum number of concurrent compiler processes.
  pub parallelism: usize,

  /// Makes the whole-service pass a no-op. Set by an entry point that has
  /// already compiled its target function for local invocation and only
  /// needs the subsequent batch pass suppressed.
  pub skip_batch: bool,
}

impl Default for BuildOptions {
  fn default() -> Self {
    Self {
      parallelism: default_parallelism(),
      skip_batch: false,
    }
  }
}

/// One less than the available execution units, minimum one, so a batch of
/// compiler child processes does not oversubscribe the host.
fn default_parallelism() -> usize {
  let cpus = std::thread::available_parallelism().map(|p| p.get()).unwrap_or(2);
  cpus.saturating_sub(1).max(1)
}

/// Build a single function end to end.
///
/// Returns `Ok(None)` when the function's runtime is not a recognized Go
/// runtime — a silent skip, not an error. Any compile or packaging failure
/// is fatal for the caller's whole run.
pub async fn compile_function(service: &Service, name: &str) -> Result<Option<FunctionBuild>, BuildError> {
  let function = service
    .functions
    .get(name)
    .ok_or_else(|| BuildError::UnknownFunction(name.to_string()))?;

  let Some(config) = config::resolve(function, &service.provider, service.custom.go.as_ref()) else {
    debug!(function = name, "runtime is not a Go runtime, skipping");
    return Ok(None);
  };

  let build_paths = paths::resolve_paths(&config, name, &function.handler)?;
  compile::invoke(&config, name, &build_paths).await?;
  let update = package::package_function(name, &config, function.package.as_ref())?;

  Ok(Some(FunctionBuild {
    binary: config.bin_dir.join(name),
    update,
  }))
}

/// Build every function in the service with bounded parallelism.
///
/// Returns the builds that produced artifacts, sorted by function name;
/// skipped functions are simply absent. The first failed build aborts the
/// run — dropping the join set abandons still-queued siblings.
pub async fn compile_service(
  service: &Service,
  options: &BuildOptions,
) -> Result<Vec<(String, FunctionBuild)>, BuildError> {
  if options.skip_batch {
    debug!("batch build suppressed by caller");
    return Ok(Vec::new());
  }

  let semaphore = Arc::new(Semaphore::new(options.parallelism.max(1)));
  let mut join_set: JoinSet<Result<(String, Option<FunctionBuild>), BuildError>> = JoinSet::new();

  for name in service.functions.keys() {
    let name = name.clone();
    let service = service.clone();
    let semaphore = semaphore.clone();

    join_set.spawn(async move {
      let _permit = semaphore.acquire().await.unwrap();
      info!(function = %name, "compile");
      let built = compile_function(&service, &name).await?;
      Ok((name, built))
    });
  }

  let mut built = Vec::new();
  while let Some(joined) = join_set.join_next().await {
    match joined? {
      Ok((name, Some(build))) => built.push((name, build)),
      Ok((_, None)) => {}
      Err(e) => return Err(e),
    }
  }

  built.sort_by(|a, b| a.0.cmp(&b.0));
  Ok(built)
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;
  use std::path::Path;

  use super::*;
  use crate::config::GoSettings;
  use crate::service::{Custom, FunctionDef, Provider};

  /// Stub compiler: writes a marker to whatever path follows `-o`.
  #[cfg(unix)]
  const STUB_COMPILER: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
mkdir -p "$(dirname "$out")"
echo compiled > "$out"
"#;

  #[cfg(unix)]
  fn stub_service(root: &Path, provider_runtime: &str) -> Service {
    std::fs::write(root.join("gostub.sh"), STUB_COMPILER).unwrap();

    let mut functions = BTreeMap::new();
    functions.insert(
      "hello".to_string(),
      FunctionDef {
        handler: "main.go".to_string(),
        runtime: None,
        architecture: None,
        package: None,
      },
    );
    functions.insert(
      "web".to_string(),
      FunctionDef {
        handler: "handler.main".to_string(),
        runtime: Some("nodejs18.x".to_string()),
        architecture: None,
        package: None,
      },
    );

    Service {
      service: Some("demo".to_string()),
      provider: Provider {
        name: Some("aws".to_string()),
        runtime: Some(provider_runtime.to_string()),
        architecture: None,
      },
      functions,
      custom: Custom {
        go: Some(GoSettings {
          base_dir: Some(root.to_path_buf()),
          bin_dir: Some(root.join(".bin")),
          cmd: Some("sh gostub.sh".to_string()),
          ..GoSettings::default()
        }),
      },
    }
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn single_function_builds_and_packages() {
    let temp = tempfile::TempDir::new().unwrap();
    let service = stub_service(temp.path(), "go1.x");

    let build = compile_function(&service, "hello").await.unwrap().unwrap();
    assert!(build.binary.exists());
    assert!(matches!(build.update, PackageUpdate::Managed { .. }));
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn non_go_function_is_skipped_silently() {
    let temp = tempfile::TempDir::new().unwrap();
    let service = stub_service(temp.path(), "go1.x");

    let built = compile_function(&service, "web").await.unwrap();
    assert!(built.is_none());
  }

  #[tokio::test]
  async fn unknown_function_is_an_error() {
    let service = Service::default();
    let err = compile_function(&service, "missing").await.unwrap_err();
    assert!(matches!(err, BuildError::UnknownFunction(_)));
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn whole_service_builds_go_functions_only() {
    let temp = tempfile::TempDir::new().unwrap();
    let service = stub_service(temp.path(), "go1.x");

    let built = compile_service(&service, &BuildOptions::default()).await.unwrap();
    assert_eq!(built.len(), 1);
    assert_eq!(built[0].0, "hello");
    assert!(temp.path().join(".bin/hello").exists());
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn whole_service_custom_runtime_produces_archives() {
    let temp = tempfile::TempDir::new().unwrap();
    let service = stub_service(temp.path(), "provided.al2");

    let built = compile_service(&service, &BuildOptions::default()).await.unwrap();
    assert_eq!(built.len(), 1);
    assert!(matches!(built[0].1.update, PackageUpdate::Custom { .. }));
    assert!(temp.path().join(".bin/hello.zip").exists());
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn compile_failure_aborts_the_batch() {
    let temp = tempfile::TempDir::new().unwrap();
    let mut service = stub_service(temp.path(), "go1.x");
    if let Some(go) = service.custom.go.as_mut() {
      go.cmd = Some("false".to_string());
    }

    let err = compile_service(&service, &BuildOptions::default()).await.unwrap_err();
    assert!(matches!(err, BuildError::Compile { .. }));
  }

  #[tokio::test]
  async fn skip_batch_makes_the_pass_a_no_op() {
    // No stub compiler on disk: if anything ran, it would fail loudly.
    let temp = tempfile::TempDir::new().unwrap();
    let mut service = Service::default();
    service.provider.runtime = Some("go1.x".to_string());
    service.functions.insert(
      "hello".to_string(),
      FunctionDef {
        handler: "main.go".to_string(),
        runtime: None,
        architecture: None,
        package: None,
      },
    );
    service.custom.go = Some(GoSettings {
      base_dir: Some(temp.path().to_path_buf()),
      ..GoSettings::default()
    });

    let options = BuildOptions {
      skip_batch: true,
      ..BuildOptions::default()
    };
    let built = compile_service(&service, &options).await.unwrap();
    assert!(built.is_empty());
  }

  #[test]
  fn parallelism_is_at_least_one() {
    assert!(default_parallelism() >= 1);
  }
}
