//! Error handling for the cache system
//!
//! Every error carries a [`RecoveryHint`] describing what an operator can do
//! about it.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;
