//! Shared utilities and pure functions for conformer
//!
//! This crate provides common utility functions that are used throughout
//! the conformer workspace. Everything here except [`tracing::init`] is
//! side-effect free.

pub mod comments;
pub mod deadline;
pub mod tracing;

pub use comments::strip_comments;
pub use deadline::{race, Raced};
