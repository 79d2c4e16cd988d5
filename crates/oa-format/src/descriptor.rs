//! Report format descriptors.
//!
//! A [`FormatDescriptor`] records where every counter group lives inside a
//! report of one format. Descriptors are immutable once built; the
//! [`FormatDescriptorBuilder`] rejects layouts whose regions fall outside
//! the report or share bytes.

use core::ops::Range;

use oa_errors::FormatError;
use serde::{Deserialize, Serialize};

use crate::generation::{Generation, ReasonStrategy};
use crate::header::HeaderWidth;

/// Hardware sub-unit that produces reports of a format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// General OA unit (OAG)
    #[default]
    General,
    /// Render-restricted unit sampling a single context (OAR)
    RenderRestricted,
    /// Media unit (OAM)
    Media,
    /// Compute unit (OAC)
    Compute,
    /// Packed event counters (PEC)
    Packed,
}

impl UnitKind {
    /// Whether formats of this unit are sampled from video engines.
    pub const fn is_media(self) -> bool {
        matches!(self, UnitKind::Media)
    }
}

/// A run of equally sized counters at a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterGroup {
    /// Byte offset of the first element
    pub offset: usize,
    /// Number of elements
    pub count: usize,
    /// Logical counter index of the first element
    pub first_index: u32,
}

impl CounterGroup {
    /// Create a group starting at logical index 0.
    pub const fn new(offset: usize, count: usize) -> Self {
        Self {
            offset,
            count,
            first_index: 0,
        }
    }

    /// Set the logical index of the first element.
    pub const fn starting_at(mut self, first_index: u32) -> Self {
        self.first_index = first_index;
        self
    }
}

/// 40-bit counters stored as a low dword array plus a high byte array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SplitCounterGroup {
    /// Byte offset of the low 32-bit words
    pub low_offset: usize,
    /// Byte offset of the high bytes
    pub high_offset: usize,
    /// Number of counters
    pub count: usize,
    /// Logical counter index of the first counter
    pub first_index: u32,
}

/// Counter groups in canonical delta order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// 40-bit split-encoded A counters
    A40,
    /// 64-bit A counters
    A64,
    /// 32-bit A counters
    A32,
    /// 32-bit B counters
    B,
    /// 32-bit C counters
    C,
}

impl GroupKind {
    /// Groups in the order deltas are emitted.
    pub const CANONICAL: [GroupKind; 5] = [
        GroupKind::A40,
        GroupKind::A64,
        GroupKind::A32,
        GroupKind::B,
        GroupKind::C,
    ];

    /// Wraparound width of counters in this group.
    pub const fn width_bits(self) -> u32 {
        match self {
            GroupKind::A40 => 40,
            GroupKind::A64 => 64,
            GroupKind::A32 | GroupKind::B | GroupKind::C => 32,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            GroupKind::A40 => "a40",
            GroupKind::A64 => "a64",
            GroupKind::A32 => "a32",
            GroupKind::B => "b",
            GroupKind::C => "c",
        }
    }
}

/// Per-generation decode capabilities, fixed when a descriptor is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// Wraparound width of the timestamp
    pub timestamp_width: u32,
    /// Reason classification strategy
    pub reason: ReasonStrategy,
    /// dword0 bit flagging a valid context id
    pub context_valid_bit: Option<u32>,
    /// Whether the header carries clock ticks
    pub clock_ticks: bool,
}

impl Capabilities {
    /// Capabilities of a hardware generation.
    pub const fn of(generation: Generation) -> Self {
        Self {
            timestamp_width: generation.timestamp_width(),
            reason: generation.reason_strategy(),
            context_valid_bit: generation.context_valid_bit(),
            clock_ticks: generation.has_clock_ticks(),
        }
    }
}

/// Layout of one report format on one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    id: u32,
    name: String,
    generation: Generation,
    size: usize,
    header: HeaderWidth,
    header_len: usize,
    unit: UnitKind,
    caps: Capabilities,
    a40: Option<SplitCounterGroup>,
    a64: Option<CounterGroup>,
    a32: Option<CounterGroup>,
    b: Option<CounterGroup>,
    c: Option<CounterGroup>,
}

impl FormatDescriptor {
    /// Start building a descriptor.
    pub fn builder(
        generation: Generation,
        id: u32,
        name: impl Into<String>,
        size: usize,
    ) -> FormatDescriptorBuilder {
        FormatDescriptorBuilder::new(generation, id, name, size)
    }

    /// Format id within its generation.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Format name, e.g. `A32u40_A4u32_B8_C8`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generation the layout belongs to.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Report size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Width of the leading header fields.
    pub fn header(&self) -> HeaderWidth {
        self.header
    }

    /// Bytes reserved for the header before the first counter.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Producing hardware unit.
    pub fn unit(&self) -> UnitKind {
        self.unit
    }

    /// Decode capabilities of the generation.
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// 40-bit split A counters.
    pub fn a40(&self) -> Option<SplitCounterGroup> {
        self.a40
    }

    /// 64-bit A counters.
    pub fn a64(&self) -> Option<CounterGroup> {
        self.a64
    }

    /// 32-bit A counters.
    pub fn a32(&self) -> Option<CounterGroup> {
        self.a32
    }

    /// B counters.
    pub fn b(&self) -> Option<CounterGroup> {
        self.b
    }

    /// C counters.
    pub fn c(&self) -> Option<CounterGroup> {
        self.c
    }

    /// Number of counters of a group kind (zero if absent).
    pub fn group_len(&self, kind: GroupKind) -> usize {
        match kind {
            GroupKind::A40 => self.a40.map_or(0, |g| g.count),
            GroupKind::A64 => self.a64.map_or(0, |g| g.count),
            GroupKind::A32 => self.a32.map_or(0, |g| g.count),
            GroupKind::B => self.b.map_or(0, |g| g.count),
            GroupKind::C => self.c.map_or(0, |g| g.count),
        }
    }

    /// Number of entries `accumulate` produces: the timestamp, the clock
    /// ticks when the generation has them, then every counter.
    pub fn counter_count(&self) -> usize {
        let header = if self.caps.clock_ticks { 2 } else { 1 };
        GroupKind::CANONICAL
            .iter()
            .fold(header, |acc, kind| acc.saturating_add(self.group_len(*kind)))
    }

    /// Whether the header and counter groups cover the report exactly,
    /// with no reserved bytes.
    pub fn is_dense(&self) -> bool {
        let covered = self
            .regions()
            .iter()
            .fold(0usize, |acc, (_, range)| acc.saturating_add(range.len()));
        covered == self.size
    }

    fn regions(&self) -> Vec<(String, Range<usize>)> {
        let mut regions = vec![("header".to_string(), 0..self.header_len)];
        if let Some(g) = self.a40 {
            regions.push(("a40 low".to_string(), span(g.low_offset, g.count, 4)));
            regions.push(("a40 high".to_string(), span(g.high_offset, g.count, 1)));
        }
        for (kind, group, width) in [
            (GroupKind::A64, self.a64, 8),
            (GroupKind::A32, self.a32, 4),
            (GroupKind::B, self.b, 4),
            (GroupKind::C, self.c, 4),
        ] {
            if let Some(g) = group {
                regions.push((kind.name().to_string(), span(g.offset, g.count, width)));
            }
        }
        regions
    }
}

fn span(offset: usize, count: usize, width: usize) -> Range<usize> {
    offset..offset.saturating_add(count.saturating_mul(width))
}

/// Builder for [`FormatDescriptor`].
#[derive(Debug, Clone)]
pub struct FormatDescriptorBuilder {
    descriptor: FormatDescriptor,
    header_len: Option<usize>,
}

impl FormatDescriptorBuilder {
    fn new(generation: Generation, id: u32, name: impl Into<String>, size: usize) -> Self {
        Self {
            descriptor: FormatDescriptor {
                id,
                name: name.into(),
                generation,
                size,
                header: HeaderWidth::Bits32,
                header_len: HeaderWidth::Bits32.default_len(),
                unit: UnitKind::General,
                caps: Capabilities::of(generation),
                a40: None,
                a64: None,
                a32: None,
                b: None,
                c: None,
            },
            header_len: None,
        }
    }

    /// Use 32-bit or 64-bit header fields.
    pub fn header(mut self, header: HeaderWidth) -> Self {
        self.descriptor.header = header;
        self
    }

    /// Override the header length for layouts whose counters start inside
    /// the nominal header.
    pub fn header_len(mut self, len: usize) -> Self {
        self.header_len = Some(len);
        self
    }

    /// Set the producing unit.
    pub fn unit(mut self, unit: UnitKind) -> Self {
        self.descriptor.unit = unit;
        self
    }

    /// Add 40-bit split A counters.
    pub fn a40(
        mut self,
        low_offset: usize,
        high_offset: usize,
        count: usize,
        first_index: u32,
    ) -> Self {
        self.descriptor.a40 = (count > 0).then_some(SplitCounterGroup {
            low_offset,
            high_offset,
            count,
            first_index,
        });
        self
    }

    /// Add 64-bit A counters.
    pub fn a64(mut self, group: CounterGroup) -> Self {
        self.descriptor.a64 = (group.count > 0).then_some(group);
        self
    }

    /// Add 32-bit A counters.
    pub fn a32(mut self, group: CounterGroup) -> Self {
        self.descriptor.a32 = (group.count > 0).then_some(group);
        self
    }

    /// Add B counters.
    pub fn b(mut self, offset: usize, count: usize) -> Self {
        self.descriptor.b = (count > 0).then_some(CounterGroup::new(offset, count));
        self
    }

    /// Add C counters.
    pub fn c(mut self, offset: usize, count: usize) -> Self {
        self.descriptor.c = (count > 0).then_some(CounterGroup::new(offset, count));
        self
    }

    /// Validate and build the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidDescriptor`] for a zero id or size, or
    /// a header too short to hold the timestamp;
    /// [`FormatError::OutOfBounds`] when a region or header field extends
    /// past the report; [`FormatError::Overlap`] when two regions share bytes.
    pub fn build(self) -> Result<FormatDescriptor, FormatError> {
        let mut d = self.descriptor;
        d.header_len = self.header_len.unwrap_or(d.header.default_len());

        if d.id == 0 {
            return Err(FormatError::invalid_descriptor(&d.name, "format id 0 is reserved"));
        }
        if d.size == 0 {
            return Err(FormatError::invalid_descriptor(&d.name, "size must be non-zero"));
        }

        let ts_end = d
            .header
            .timestamp_offset()
            .saturating_add(d.header.field_bytes());
        if d.header_len < ts_end {
            return Err(FormatError::invalid_descriptor(
                &d.name,
                format!("header length {} cannot hold the timestamp", d.header_len),
            ));
        }
        if d.caps.clock_ticks {
            check_bounds(d.header.clock_ticks_offset(), d.header.field_bytes(), d.size)?;
        }

        let regions = d.regions();
        for (_, range) in &regions {
            check_bounds(range.start, range.len(), d.size)?;
        }
        for (i, (first, a)) in regions.iter().enumerate() {
            for (second, b) in regions.iter().skip(i.saturating_add(1)) {
                if !a.is_empty() && !b.is_empty() && a.start < b.end && b.start < a.end {
                    return Err(FormatError::Overlap {
                        format: d.name.clone(),
                        first: first.clone(),
                        second: second.clone(),
                    });
                }
            }
        }
        Ok(d)
    }
}

fn check_bounds(offset: usize, width: usize, size: usize) -> Result<(), FormatError> {
    match offset.checked_add(width) {
        Some(end) if end <= size => Ok(()),
        _ => Err(FormatError::OutOfBounds {
            offset,
            width,
            size,
        }),
    }
}
