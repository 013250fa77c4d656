//! gopack-lib: compile-and-package pipeline for serverless Go functions.
//!
//! This crate turns the functions declared in a service manifest into
//! deployable artifacts:
//! - `service`: serde model of the service manifest and the package updates
//!   applied back to it
//! - `config`: layered build configuration (defaults < provider < custom)
//! - `paths`: working-directory / output-path derivation, monorepo aware
//! - `command`: splits `ENV=VAL ... cmd args` strings
//! - `compile`: runs the cross-compiler with an overlaid environment
//! - `package`: bootstrap zips and managed-runtime packaging patterns
//! - `build`: per-function pipeline and bounded whole-service fan-out

pub mod build;
pub mod command;
pub mod compile;
pub mod config;
pub mod error;
pub mod package;
pub mod paths;
pub mod service;
