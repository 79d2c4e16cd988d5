//! Convenience re-exports for common test utilities.

pub use crate::must::must_some;

#[cfg(feature = "reports")]
pub use crate::reports::ReportWriter;

#[cfg(feature = "stream")]
pub use crate::stream::StreamWriter;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
