//! Fuzzes report decoding with arbitrary report pairs.
//!
//! The input is split in two and both halves are padded or cut to the
//! format size, so every layout is exercised with full-length reports.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_accumulate

#![deny(static_mut_refs)]
#![no_main]

use libfuzzer_sys::fuzz_target;
use oa_format::{FormatCatalog, Interface, ReportView};

fuzz_target!(|data: &[u8]| {
    let (left, right) = data.split_at(data.len() / 2);
    for interface in [Interface::Legacy, Interface::Observation] {
        let Ok(catalog) = FormatCatalog::builtin(interface) else {
            return;
        };
        for generation in catalog.generations() {
            for format in catalog.formats(generation) {
                let mut start = left.to_vec();
                let mut end = right.to_vec();
                start.resize(format.size(), 0);
                end.resize(format.size(), 0);

                if let Ok(deltas) = oa_decode::accumulate(format, &start, &end) {
                    assert_eq!(deltas.len(), deltas.ids().len());
                }
                if let Ok(view) = ReportView::new(format, &end) {
                    let exponent = u32::from(data.first().copied().unwrap_or(0));
                    let _summary = oa_decode::classify(&view, exponent);
                }
            }
        }
    }
});
