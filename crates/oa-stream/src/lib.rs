//! OA counter stream sessions.
//!
//! - [`config`]: [`SessionConfig`], loaded from YAML/JSON and validated
//!   against a format catalog
//! - [`device`]: the [`CounterUnit`] / [`StreamDevice`] seams
//! - [`session`]: the [`StreamSession`] state machine and its lazy
//!   [`Records`] sequence
//! - [`record`]: record framing and the [`RecordParser`]
//! - [`status`]: [`StatusBits`] returned by the status query
//! - [`window`]: loss tracking across samples
//! - [`sim`] / [`io`]: an in-memory counter unit and a `Read`-backed device
//!
//! ```
//! use oa_format::{FormatCatalog, Generation, Interface};
//! use oa_stream::{Platform, Record, SessionConfig, SimulatedUnit, StreamSession};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = FormatCatalog::builtin(Interface::Legacy)?;
//! let unit = SimulatedUnit::new(Platform::new(Generation::Gen9, Interface::Legacy));
//! let mut session = StreamSession::open(&unit, &catalog, SessionConfig::new(10, 1, 12))?;
//!
//! unit.push_report(&vec![0u8; session.format().size()]);
//! unit.push_report_lost();
//!
//! let mut scratch = vec![0u8; 4096];
//! let mut records = session.read_records(&mut scratch)?;
//! assert!(matches!(records.next(), Some(Ok(Record::Sample(_)))));
//! assert!(matches!(records.next(), Some(Ok(Record::ReportLost))));
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod device;
pub mod io;
pub mod record;
pub mod session;
pub mod sim;
pub mod status;
pub mod window;

pub use config::{EngineClass, EngineSelector, SessionConfig};
pub use device::{CounterUnit, Platform, StreamDevice};
pub use io::IoDevice;
pub use record::{RECORD_HEADER_LEN, Record, RecordHeader, RecordParser, RecordType};
pub use session::{Records, SessionState, StreamSession};
pub use sim::{SimulatedDevice, SimulatedUnit};
pub use status::StatusBits;
pub use window::{GapTracker, PeriodicPairs, Stamp};
