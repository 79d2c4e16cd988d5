//! Prelude module for convenient error handling imports.
//!
//! ```
//! use oa_errors::prelude::*;
//!
//! fn open() -> StreamResult<()> {
//!     Err(StreamError::Busy)
//! }
//!
//! assert!(matches!(open(), Err(StreamError::Busy)));
//! ```

pub use crate::{
    Result, StreamResult,
    common::{ErrorCategory, ErrorSeverity, OaError},
    config::ConfigError,
    exponent::ExponentError,
    format::FormatError,
    stream::{Operation, StreamError},
};
