//! Core domain types, errors, and constants for `conformer`.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias for failures that abort
//!   an invocation. Test failures are not errors; they are [`Outcome`]s.
//! - **`test`**: the [`TestDescriptor`] supplied by test discovery.
//! - **`outcome`**: the four classified outcomes and the [`CacheRecord`] kept
//!   for them.
//! - **`digest`**: [`CacheKey`] and [`ContentHash`] newtypes.
//! - **`constants`**: shared defaults such as the test deadline and the
//!   side-effect token list.

pub mod constants;
pub mod digest;
pub mod errors;
pub mod outcome;

pub use self::{
    constants::*,
    digest::{CacheKey, ContentHash},
    errors::{Error, Result},
    outcome::{CacheRecord, Outcome, OutcomeKind},
    test::{NegativeExpectation, TestAttributes, TestDescriptor, TestFlags},
};
