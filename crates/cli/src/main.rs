//! gopack - compile and package serverless Go functions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "gopack")]
#[command(author, version, about = "Compile and package Go functions for serverless deployment", long_about = None)]
struct Cli {
  /// Path to the service manifest
  #[arg(short, long, global = true, default_value = "serverless.yml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build Go functions
  Build {
    /// Build a single function instead of the whole service
    #[arg(short, long)]
    function: Option<String>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Build { function } => cmd::build::cmd_build(&cli.config, function.as_deref()),
  }
}
