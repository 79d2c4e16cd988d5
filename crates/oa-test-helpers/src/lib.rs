//! Shared test utilities for the OA decoder crates.
//!
//! - [`mod@must`] - Option unwrapping with good error messages and `#[track_caller]`
//! - [`reports`] - Build raw reports field by field for a format
//! - [`stream`] - Build framed and raw counter stream bytes
//! - [`prelude`] - Convenience re-exports
//!
//! ```rust,ignore
//! use oa_test_helpers::prelude::*;
//! ```

#![allow(clippy::panic)]

pub mod must;
pub mod prelude;

#[cfg(feature = "reports")]
pub mod reports;

#[cfg(feature = "stream")]
pub mod stream;

pub use must::must_some;
