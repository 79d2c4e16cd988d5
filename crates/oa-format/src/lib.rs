//! OA report layouts and per-generation format catalogs.
//!
//! This crate is I/O-free: it describes where fields live inside a raw
//! report and hands out bounds-checked views over report bytes. Decoding
//! (timestamps, reasons, deltas) lives in `oa-decode`.
//!
//! ```
//! use oa_format::{FormatCatalog, Generation, Interface};
//!
//! # fn main() -> Result<(), oa_errors::FormatError> {
//! let catalog = FormatCatalog::builtin(Interface::Legacy)?;
//! let format = catalog.lookup(Generation::Gen9, 10)?;
//! assert_eq!(format.size(), 256);
//! assert_eq!(format.counter_count(), 2 + 32 + 4 + 8 + 8);
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod catalog;
pub mod descriptor;
pub mod generation;
pub mod header;
pub mod report;

pub use catalog::FormatCatalog;
pub use descriptor::{
    Capabilities, CounterGroup, FormatDescriptor, FormatDescriptorBuilder, GroupKind,
    SplitCounterGroup, UnitKind,
};
pub use generation::{Generation, Interface, ReasonStrategy};
pub use header::{HeaderWidth, ReasonBits};
pub use report::{Report, ReportView};
