//! Error types for the OA decoder workspace.
//!
//! Every crate in the workspace reports failures through the types defined
//! here so that callers can classify and route errors without depending on
//! the crate that produced them.
//!
//! - [`common`]: the top-level [`OaError`] and its category/severity
//! - [`stream`]: the closed error taxonomy of counter stream sessions
//! - [`format`]: report layout lookup and validation errors
//! - [`exponent`]: sampling-period conversion errors
//! - [`config`]: session configuration parsing errors
//!
//! # Example
//!
//! ```
//! use oa_errors::prelude::*;
//!
//! fn check_exponent(exponent: u32) -> Result<u32> {
//!     if exponent > 31 {
//!         return Err(StreamError::invalid_config(format!("exponent {exponent} exceeds 31")).into());
//!     }
//!     Ok(exponent)
//! }
//!
//! assert!(matches!(check_exponent(40), Err(OaError::Stream(StreamError::InvalidConfig { .. }))));
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod config;
pub mod exponent;
pub mod format;
pub mod prelude;
pub mod stream;

pub use common::{ErrorCategory, ErrorSeverity, OaError};
pub use config::ConfigError;
pub use exponent::ExponentError;
pub use format::FormatError;
pub use stream::{Operation, StreamError};

/// A specialized `Result` type for OA operations.
pub type Result<T> = std::result::Result<T, OaError>;

/// A specialized `Result` type for stream session operations.
pub type StreamResult<T = ()> = std::result::Result<T, StreamError>;
