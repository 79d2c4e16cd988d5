//! Stream status bits.

use bitflags::bitflags;

bitflags! {
    /// Conditions reported by the session status query.
    ///
    /// Query the status after a generic I/O failure from a read to find out
    /// what the device was signalling.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusBits: u32 {
        /// Reports were dropped before they reached the buffer
        const REPORT_LOST        = 1 << 0;
        /// The report buffer wrapped before it was drained
        const BUFFER_OVERFLOW    = 1 << 1;
        /// A hardware counter overflowed
        const COUNTER_OVERFLOW   = 1 << 2;
        /// The trigger queue filled up
        const TRIGGER_QUEUE_FULL = 1 << 3;
    }
}

impl StatusBits {
    /// Decode a raw status word, ignoring unknown bits.
    pub const fn from_raw(raw: u32) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// Whether any data-loss condition is flagged.
    pub const fn has_loss(self) -> bool {
        self.intersects(Self::REPORT_LOST.union(Self::BUFFER_OVERFLOW))
    }
}
