//! CLI module for jsp2spring
//!
//! Each command lives in its own module with an `Args` struct and a `run`
//! function. Every command supports `--json` for machine-readable output.

pub mod error;
pub mod output;

pub mod analyze;
pub mod config;
pub mod convert;
pub mod tool;
