//! Report header layout.
//!
//! dword0 of every report carries the trigger reason (bits 19..25) and, on
//! generations that tag contexts, a context-valid flag. The remaining
//! header fields move depending on whether the format uses 32-bit or
//! 64-bit leading fields:
//!
//! | Field       | 32-bit header      | 64-bit header      |
//! |-------------|--------------------|--------------------|
//! | timestamp   | u32 @ 4            | u64 @ 8            |
//! | context id  | u32 @ 8            | u32 @ 4            |
//! | clock ticks | u32 @ 12           | u64 @ 24           |

use bitflags::bitflags;

/// Bit position of the reason field within dword0.
pub const REASON_SHIFT: u32 = 19;
/// Mask of the reason field after shifting.
pub const REASON_MASK: u32 = 0x3f;

/// Width of the leading header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderWidth {
    /// 32-bit timestamp and clock ticks
    Bits32,
    /// 64-bit timestamp and clock ticks
    Bits64,
}

impl HeaderWidth {
    /// Byte offset of the timestamp.
    pub const fn timestamp_offset(self) -> usize {
        match self {
            HeaderWidth::Bits32 => 4,
            HeaderWidth::Bits64 => 8,
        }
    }

    /// Byte offset of the context id.
    pub const fn context_id_offset(self) -> usize {
        match self {
            HeaderWidth::Bits32 => 8,
            HeaderWidth::Bits64 => 4,
        }
    }

    /// Byte offset of the clock-ticks field.
    pub const fn clock_ticks_offset(self) -> usize {
        match self {
            HeaderWidth::Bits32 => 12,
            HeaderWidth::Bits64 => 24,
        }
    }

    /// Byte width of the timestamp and clock-ticks fields.
    pub const fn field_bytes(self) -> usize {
        match self {
            HeaderWidth::Bits32 => 4,
            HeaderWidth::Bits64 => 8,
        }
    }

    /// Wraparound width of the clock-ticks counter.
    pub const fn tick_width(self) -> u32 {
        match self {
            HeaderWidth::Bits32 => 32,
            HeaderWidth::Bits64 => 64,
        }
    }

    /// Header length when a layout does not declare one.
    pub const fn default_len(self) -> usize {
        match self {
            HeaderWidth::Bits32 => 16,
            HeaderWidth::Bits64 => 32,
        }
    }
}

bitflags! {
    /// Trigger reason bits from report dword0.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReasonBits: u32 {
        /// Periodic timer expiry
        const TIMER              = 1 << 0;
        /// Internal trigger 1
        const INTERNAL_TRIGGER_1 = 1 << 1;
        /// Internal trigger 2
        const INTERNAL_TRIGGER_2 = 1 << 2;
        /// Render context switch
        const CONTEXT_SWITCH     = 1 << 3;
        /// GO transition
        const GO_TRANSITION      = 1 << 4;
        /// Slice/unslice clock ratio change
        const CLOCK_RATIO_CHANGE = 1 << 5;
    }
}

impl ReasonBits {
    /// Extract the reason field from header dword0.
    pub const fn from_dword0(dword0: u32) -> Self {
        Self::from_bits_truncate((dword0 >> REASON_SHIFT) & REASON_MASK)
    }

    /// Position the reason bits for header dword0.
    pub const fn to_dword0(self) -> u32 {
        (self.bits() & REASON_MASK) << REASON_SHIFT
    }

    /// Human-readable name of the highest-priority reason present.
    pub fn label(self) -> &'static str {
        const ORDER: [(ReasonBits, &str); 6] = [
            (ReasonBits::TIMER, "timer"),
            (ReasonBits::INTERNAL_TRIGGER_1, "internal trigger 1"),
            (ReasonBits::INTERNAL_TRIGGER_2, "internal trigger 2"),
            (ReasonBits::CONTEXT_SWITCH, "context switch"),
            (ReasonBits::GO_TRANSITION, "GO transition"),
            (ReasonBits::CLOCK_RATIO_CHANGE, "clock ratio change"),
        ];
        ORDER
            .iter()
            .find(|(bit, _)| self.contains(*bit))
            .map_or("unknown", |(_, label)| *label)
    }
}
