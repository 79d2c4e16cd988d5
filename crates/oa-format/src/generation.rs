//! Hardware generations and kernel stream interfaces.

use core::fmt;

use serde::{Deserialize, Serialize};

/// GPU hardware generation a report layout belongs to.
///
/// Format ids are only meaningful together with a generation: the same id
/// names different layouts on different generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// Haswell
    Haswell,
    /// Broadwell and Cherryview
    Gen8,
    /// Skylake through Coffee Lake
    Gen9,
    /// Icelake
    Gen11,
    /// Tigerlake and Alder Lake
    Gen12,
    /// DG2 discrete parts
    Dg2,
    /// Meteor Lake
    Meteorlake,
    /// Lunar Lake and later
    Xe2,
}

/// How the trigger reason of a report is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonStrategy {
    /// The header carries a reason bitfield.
    Explicit,
    /// No reason field; periodicity is inferred from the low timestamp
    /// bits selected by the sampling exponent.
    Heuristic,
}

impl Generation {
    /// Every supported generation, oldest first.
    pub const ALL: [Generation; 8] = [
        Generation::Haswell,
        Generation::Gen8,
        Generation::Gen9,
        Generation::Gen11,
        Generation::Gen12,
        Generation::Dg2,
        Generation::Meteorlake,
        Generation::Xe2,
    ];

    /// Stable lowercase name, matching the catalog file keys.
    pub const fn name(self) -> &'static str {
        match self {
            Generation::Haswell => "haswell",
            Generation::Gen8 => "gen8",
            Generation::Gen9 => "gen9",
            Generation::Gen11 => "gen11",
            Generation::Gen12 => "gen12",
            Generation::Dg2 => "dg2",
            Generation::Meteorlake => "meteorlake",
            Generation::Xe2 => "xe2",
        }
    }

    /// Bit width of the report timestamp counter.
    pub const fn timestamp_width(self) -> u32 {
        match self {
            Generation::Dg2 | Generation::Meteorlake | Generation::Xe2 => 56,
            _ => 32,
        }
    }

    /// Reason classification strategy for reports of this generation.
    pub const fn reason_strategy(self) -> ReasonStrategy {
        match self {
            Generation::Haswell => ReasonStrategy::Heuristic,
            _ => ReasonStrategy::Explicit,
        }
    }

    /// Header dword0 bit flagging a valid context id, if the generation
    /// tags reports with one.
    pub const fn context_valid_bit(self) -> Option<u32> {
        match self {
            Generation::Haswell => None,
            Generation::Gen8 => Some(25),
            _ => Some(16),
        }
    }

    /// Whether reports carry a GPU clock-ticks field in the header.
    pub const fn has_clock_ticks(self) -> bool {
        !matches!(self, Generation::Haswell)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kernel interface exposing the counter stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interface {
    /// Record-framed stream: every report is preceded by a
    /// `{type, size, reserved}` header and losses arrive as records.
    /// Reading a disabled stream fails with a generic I/O error.
    Legacy,
    /// Raw report stream without record headers. Losses surface as an I/O
    /// failure resolved through the status query, and reading a disabled
    /// stream fails with an invalid-state error.
    Observation,
}

impl Interface {
    /// Whether reports on this interface are wrapped in record headers.
    pub const fn has_record_headers(self) -> bool {
        matches!(self, Interface::Legacy)
    }

    /// Stable lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Interface::Legacy => "legacy",
            Interface::Observation => "observation",
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
