//! Compiler invocation.
//!
//! The resolved build command is run through the platform shell with the
//! process environment overlaid by `CGO_ENABLED` and by any assignments
//! embedded in the command template — embedded assignments win over the
//! CGO flag, which wins over the inherited environment.

use tokio::process::Command;
use tracing::debug;

use crate::command;
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::paths::BuildPaths;

/// Compile one function.
///
/// Builds `<cmd> -o <output_path> <handler_arg>`, splits off the inline
/// environment assignments, and executes the rest in `paths.cwd`. Non-zero
/// exit or a spawn failure surfaces as [`BuildError::Compile`] carrying the
/// tool's stderr; there is no retry and no timeout.
pub async fn invoke(config: &BuildConfig, function: &str, paths: &BuildPaths) -> Result<(), BuildError> {
  let full = format!(
    "{} -o {} {}",
    config.cmd,
    paths.output_path.display(),
    paths.handler_arg
  );
  let parsed = command::parse(&full);

  debug!(
    function,
    cmd = %parsed.command,
    cwd = %paths.cwd.display(),
    cgo = config.cgo,
    "invoking compiler"
  );

  let (shell, flag) = shell();
  let output = Command::new(shell)
    .arg(flag)
    .arg(&parsed.command)
    .current_dir(&paths.cwd)
    .env("CGO_ENABLED", config.cgo.to_string())
    .envs(&parsed.env)
    .output()
    .await
    .map_err(|e| BuildError::Compile {
      function: function.to_string(),
      cwd: paths.cwd.display().to_string(),
      message: e.to_string(),
    })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = if stderr.trim().is_empty() {
      output.status.to_string()
    } else {
      stderr.trim().to_string()
    };
    return Err(BuildError::Compile {
      function: function.to_string(),
      cwd: paths.cwd.display().to_string(),
      message,
    });
  }

  Ok(())
}

#[cfg(unix)]
fn shell() -> (&'static str, &'static str) {
  ("/bin/sh", "-c")
}

#[cfg(windows)]
fn shell() -> (&'static str, &'static str) {
  ("cmd.exe", "/C")
}
