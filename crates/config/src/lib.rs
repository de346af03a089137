//! Configuration for conformer
//!
//! [`RunnerConfig`] is the immutable set of settings the runner is set up
//! with. [`ConfigLoader`] layers defaults, an optional JSON file and
//! `CONFORMER_*` environment variables, in that order.

pub mod config;
pub mod loader;

#[cfg(test)]
mod config_tests;

pub use config::{CommandSpec, RunnerConfig, RunnerConfigBuilder};
pub use loader::ConfigLoader;
