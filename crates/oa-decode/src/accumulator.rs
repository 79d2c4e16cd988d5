//! Per-counter deltas between two reports.

use core::fmt;

use oa_errors::FormatError;
use oa_format::{CounterGroup, FormatDescriptor, Generation, ReportView, SplitCounterGroup};

use crate::classifier::{clock_ticks, tick_delta, timestamp, timestamp_delta, timestamp_width};

/// Stable label of one delta entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CounterId {
    /// Report timestamp
    Timestamp,
    /// GPU clock ticks
    ClockTicks,
    /// A counter with its logical index
    A(u32),
    /// B counter
    B(u32),
    /// C counter
    C(u32),
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterId::Timestamp => f.write_str("TIMESTAMP"),
            CounterId::ClockTicks => f.write_str("CLOCK_TICKS"),
            CounterId::A(n) => write!(f, "A{n}"),
            CounterId::B(n) => write!(f, "B{n}"),
            CounterId::C(n) => write!(f, "C{n}"),
        }
    }
}

/// Ordered counter deltas of one format.
///
/// Entries follow the canonical order: timestamp, clock ticks, 40-bit A,
/// 64-bit A, 32-bit A, B, then C counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDeltas {
    generation: Generation,
    format_id: u32,
    format_name: String,
    ids: Vec<CounterId>,
    values: Vec<u64>,
}

impl CounterDeltas {
    fn with_capacity(format: &FormatDescriptor) -> Self {
        let capacity = format.counter_count();
        Self {
            generation: format.generation(),
            format_id: format.id(),
            format_name: format.name().to_string(),
            ids: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, id: CounterId, value: u64) {
        self.ids.push(id);
        self.values.push(value);
    }

    /// Name of the format the deltas were computed for.
    pub fn format_name(&self) -> &str {
        &self.format_name
    }

    /// Entry labels in order.
    pub fn ids(&self) -> &[CounterId] {
        &self.ids
    }

    /// Delta values in order.
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Delta of one counter.
    pub fn get(&self, id: CounterId) -> Option<u64> {
        self.ids
            .iter()
            .position(|candidate| *candidate == id)
            .and_then(|index| self.values.get(index).copied())
    }

    /// `(label, delta)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (CounterId, u64)> + '_ {
        self.ids.iter().copied().zip(self.values.iter().copied())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add two delta sequences of the same layout entry by entry.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::LayoutMismatch`] if the sequences come from
    /// different formats.
    pub fn sum(&self, other: &CounterDeltas) -> Result<CounterDeltas, FormatError> {
        if self.generation != other.generation
            || self.format_id != other.format_id
            || self.ids != other.ids
        {
            return Err(FormatError::LayoutMismatch {
                left: format!("{}/{}", self.generation, self.format_name),
                right: format!("{}/{}", other.generation, other.format_name),
            });
        }
        Ok(CounterDeltas {
            generation: self.generation,
            format_id: self.format_id,
            format_name: self.format_name.clone(),
            ids: self.ids.clone(),
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| a.wrapping_add(*b))
                .collect(),
        })
    }
}

/// Delta of a 32-bit counter.
pub const fn delta_u32(end: u32, start: u32) -> u64 {
    end.wrapping_sub(start) as u64
}

/// Delta of a 40-bit counter.
pub const fn delta_u40(end: u64, start: u64) -> u64 {
    if start > end {
        (1u64 << 40).wrapping_add(end).wrapping_sub(start)
    } else {
        end.wrapping_sub(start)
    }
}

/// Delta of a 64-bit counter.
pub const fn delta_u64(end: u64, start: u64) -> u64 {
    end.wrapping_sub(start)
}

/// Reassemble a split 40-bit counter.
///
/// # Errors
///
/// Returns [`FormatError::OutOfBounds`] if either half lies outside the
/// report.
pub fn read_u40(
    view: &ReportView<'_>,
    group: SplitCounterGroup,
    index: usize,
) -> Result<u64, FormatError> {
    let low = view.u32_at(element_offset(group.low_offset, index, 4, view)?)?;
    let high = view.u8_at(element_offset(group.high_offset, index, 1, view)?)?;
    Ok((u64::from(high) << 32) | u64::from(low))
}

fn element_offset(
    base: usize,
    index: usize,
    width: usize,
    view: &ReportView<'_>,
) -> Result<usize, FormatError> {
    index
        .checked_mul(width)
        .and_then(|rel| base.checked_add(rel))
        .ok_or(FormatError::OutOfBounds {
            offset: base,
            width,
            size: view.bytes().len(),
        })
}

fn logical(first: u32, index: usize) -> u32 {
    u32::try_from(index).map_or(u32::MAX, |i| first.saturating_add(i))
}

/// Compute per-counter deltas from `start` to `end`.
///
/// Both reports must be of `format`; `start` must precede `end` in
/// hardware time. Each counter wraps at its own width.
///
/// # Errors
///
/// Returns [`FormatError::LengthMismatch`] if either report length differs
/// from the descriptor size.
pub fn accumulate(
    format: &FormatDescriptor,
    start: &[u8],
    end: &[u8],
) -> Result<CounterDeltas, FormatError> {
    let start = ReportView::new(format, start)?;
    let end = ReportView::new(format, end)?;
    let mut deltas = CounterDeltas::with_capacity(format);

    deltas.push(
        CounterId::Timestamp,
        timestamp_delta(timestamp(&end)?, timestamp(&start)?, timestamp_width(format)),
    );
    if let (Some(t1), Some(t0)) = (clock_ticks(&end)?, clock_ticks(&start)?) {
        deltas.push(CounterId::ClockTicks, tick_delta(format, t1, t0));
    }

    if let Some(g) = format.a40() {
        for i in 0..g.count {
            let delta = delta_u40(read_u40(&end, g, i)?, read_u40(&start, g, i)?);
            deltas.push(CounterId::A(logical(g.first_index, i)), delta);
        }
    }
    if let Some(g) = format.a64() {
        for i in 0..g.count {
            let offset = element_offset(g.offset, i, 8, &end)?;
            let delta = delta_u64(end.u64_at(offset)?, start.u64_at(offset)?);
            deltas.push(CounterId::A(logical(g.first_index, i)), delta);
        }
    }
    let dword_groups: [(Option<CounterGroup>, fn(u32) -> CounterId); 3] = [
        (format.a32(), CounterId::A),
        (format.b(), CounterId::B),
        (format.c(), CounterId::C),
    ];
    for (group, label) in dword_groups {
        let Some(g) = group else { continue };
        for i in 0..g.count {
            let offset = element_offset(g.offset, i, 4, &end)?;
            let delta = delta_u32(end.u32_at(offset)?, start.u32_at(offset)?);
            deltas.push(label(logical(g.first_index, i)), delta);
        }
    }
    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_labels() {
        assert_eq!(CounterId::Timestamp.to_string(), "TIMESTAMP");
        assert_eq!(CounterId::ClockTicks.to_string(), "CLOCK_TICKS");
        assert_eq!(CounterId::A(12).to_string(), "A12");
        assert_eq!(CounterId::C(7).to_string(), "C7");
    }

    #[test]
    fn test_delta_widths() {
        assert_eq!(delta_u32(3, u32::MAX), 4);
        assert_eq!(delta_u40(3, (1 << 40) - 1), 4);
        assert_eq!(delta_u40(10, 3), 7);
        assert_eq!(delta_u64(3, u64::MAX), 4);
    }

    #[test]
    fn test_sum_rejects_other_layouts() -> Result<(), FormatError> {
        let a = FormatDescriptor::builder(Generation::Gen9, 7, "C4_B8", 64)
            .c(16, 4)
            .b(32, 8)
            .build()?;
        let b = FormatDescriptor::builder(Generation::Gen9, 8, "A12", 64)
            .header_len(12)
            .a32(CounterGroup::new(12, 12).starting_at(7))
            .build()?;
        let zero = [0u8; 64];
        let left = accumulate(&a, &zero, &zero)?;
        let right = accumulate(&b, &zero, &zero)?;
        assert!(matches!(
            left.sum(&right),
            Err(FormatError::LayoutMismatch { .. })
        ));
        assert_eq!(left.sum(&left)?.values(), left.values());
        Ok(())
    }

    #[test]
    fn test_wrong_length_is_rejected() -> Result<(), FormatError> {
        let format = FormatDescriptor::builder(Generation::Gen9, 7, "C4_B8", 64)
            .c(16, 4)
            .b(32, 8)
            .build()?;
        assert!(matches!(
            accumulate(&format, &[0u8; 64], &[0u8; 32]),
            Err(FormatError::LengthMismatch { actual: 32, .. })
        ));
        Ok(())
    }
}
