//! Sampling exponent conversion errors.

/// Sampling exponent conversion errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExponentError {
    /// The timestamp tick frequency was zero
    #[error("Timestamp tick frequency must be non-zero")]
    ZeroTickFrequency,

    /// The requested sampling frequency was zero
    #[error("Sampling frequency must be non-zero")]
    ZeroFrequency,

    /// The requested frequency has a period below one nanosecond
    #[error("Sampling frequency {frequency_hz}Hz exceeds 1GHz")]
    FrequencyTooHigh {
        /// Requested frequency in Hz
        frequency_hz: u64,
    },

    /// Even the smallest exponent samples slower than requested
    #[error("Period {period_ns}ns is shorter than the minimum {minimum_ns}ns")]
    PeriodTooShort {
        /// Requested period
        period_ns: u64,
        /// Period of exponent 0
        minimum_ns: u64,
    },
}
