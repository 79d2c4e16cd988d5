//! Fuzzes session configuration parsing and validation.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_session_config

#![deny(static_mut_refs)]
#![no_main]

use libfuzzer_sys::fuzz_target;
use oa_format::{FormatCatalog, Generation, Interface};
use oa_stream::SessionConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(catalog) = FormatCatalog::builtin(Interface::Legacy) else {
        return;
    };
    for config in [SessionConfig::from_yaml_str(text), SessionConfig::from_json_str(text)]
        .into_iter()
        .flatten()
    {
        for generation in Generation::ALL {
            if let Ok(format) = config.validate(&catalog, generation) {
                assert_eq!(format.id(), config.format_id);
            }
        }
    }
});
