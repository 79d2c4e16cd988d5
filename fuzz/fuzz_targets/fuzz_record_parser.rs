//! Fuzzes record framing on both stream interfaces.
//!
//! The parser must either yield records of the session format or stop with
//! a single error; it must never panic or read past the input.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_record_parser

#![deny(static_mut_refs)]
#![no_main]

use libfuzzer_sys::fuzz_target;
use oa_format::{FormatCatalog, Generation, Interface};
use oa_stream::{Record, RecordParser};

fuzz_target!(|data: &[u8]| {
    for (interface, generation, format_id) in [
        (Interface::Legacy, Generation::Gen9, 7),
        (Interface::Legacy, Generation::Gen12, 10),
        (Interface::Observation, Generation::Xe2, 12),
    ] {
        let Ok(catalog) = FormatCatalog::builtin(interface) else {
            return;
        };
        let Ok(format) = catalog.lookup(generation, format_id) else {
            return;
        };
        for record in RecordParser::new(interface, format, data) {
            if let Ok(Record::Sample(report)) = record {
                assert_eq!(report.len(), format.size());
            }
        }
    }
});
