//! Decoding of OA performance-counter reports.
//!
//! - [`classifier`]: timestamps, trigger reasons, context ids and clock
//!   ratios read from the report header
//! - [`accumulator`]: width-correct per-counter deltas between two reports
//!
//! ```
//! use oa_decode::{accumulate, CounterId};
//! use oa_format::{FormatCatalog, Generation, Interface};
//!
//! # fn main() -> Result<(), oa_errors::FormatError> {
//! let catalog = FormatCatalog::builtin(Interface::Legacy)?;
//! let format = catalog.lookup(Generation::Gen9, 7)?;
//!
//! let start = vec![0u8; format.size()];
//! let mut end = start.clone();
//! end[4] = 100;
//!
//! let deltas = accumulate(format, &start, &end)?;
//! assert_eq!(deltas.get(CounterId::Timestamp), Some(100));
//! assert_eq!(deltas.len(), format.counter_count());
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod accumulator;
pub mod classifier;

pub use accumulator::{CounterDeltas, CounterId, accumulate};
pub use classifier::{
    ClockRatios, ExplicitReason, HeuristicReason, ReasonClassifier, ReportSummary, classifier_for,
    classify, clock_ratios, clock_ticks, context_id, heuristic_is_periodic, is_periodic, reason,
    tick_delta, timestamp, timestamp_delta, timestamp_width,
};
