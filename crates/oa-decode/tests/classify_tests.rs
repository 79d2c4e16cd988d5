//! Header classification across generations.

use oa_decode::{classify, clock_ratios, context_id, is_periodic, reason};
use oa_format::{FormatCatalog, Generation, Interface, ReasonBits, ReportView};
use oa_test_helpers::prelude::*;

#[test]
fn test_periodic_and_triggered_reports() -> TestResult {
    let catalog = FormatCatalog::builtin(Interface::Legacy)?;
    let format = catalog.lookup(Generation::Gen11, 10)?;

    let timer = ReportWriter::new(format).reason(ReasonBits::TIMER).into_bytes();
    let switch = ReportWriter::new(format)
        .reason(ReasonBits::CONTEXT_SWITCH)
        .context_id(0x1234)
        .into_bytes();

    let timer = ReportView::new(format, &timer)?;
    let switch = ReportView::new(format, &switch)?;
    assert!(is_periodic(&timer, 10)?);
    assert!(!is_periodic(&switch, 10)?);
    assert_eq!(reason(&switch)?, Some(ReasonBits::CONTEXT_SWITCH));
    assert_eq!(context_id(&switch)?, Some(0x1234));
    assert_eq!(context_id(&timer)?, None);
    Ok(())
}

#[test]
fn test_context_id_zero_is_distinct_from_absent() -> TestResult {
    let catalog = FormatCatalog::builtin(Interface::Legacy)?;
    let format = catalog.lookup(Generation::Gen8, 7)?;
    let tagged = ReportWriter::new(format).context_id(0).into_bytes();
    let untagged = ReportWriter::new(format).into_bytes();

    assert_eq!(context_id(&ReportView::new(format, &tagged)?)?, Some(0));
    assert_eq!(context_id(&ReportView::new(format, &untagged)?)?, None);
    Ok(())
}

#[test]
fn test_gen8_valid_bit_is_25() -> TestResult {
    let catalog = FormatCatalog::builtin(Interface::Legacy)?;
    let format = catalog.lookup(Generation::Gen8, 7)?;
    let bytes = ReportWriter::new(format).context_id(9).into_bytes();
    let view = ReportView::new(format, &bytes)?;
    assert_eq!(view.dword0()? & (1 << 25), 1 << 25);
    assert_eq!(view.dword0()? & (1 << 16), 0);
    Ok(())
}

#[test]
fn test_haswell_timer_inferred_from_timestamp() -> TestResult {
    let catalog = FormatCatalog::builtin(Interface::Legacy)?;
    let format = catalog.lookup(Generation::Haswell, 5)?;
    let exponent = 4;

    let on_period = ReportWriter::new(format).timestamp(0x30).into_bytes();
    let off_period = ReportWriter::new(format).timestamp(0x31).into_bytes();
    let on = classify(&ReportView::new(format, &on_period)?, exponent)?;
    let off = classify(&ReportView::new(format, &off_period)?, exponent)?;

    assert!(on.periodic);
    assert!(!off.periodic);
    assert_eq!(on.reason, None);
    assert_eq!(on.clock_ticks, None);
    Ok(())
}

#[test]
fn test_wide_header_fields() -> TestResult {
    let catalog = FormatCatalog::builtin(Interface::Observation)?;
    let format = catalog.lookup(Generation::Meteorlake, 9)?;
    let bytes = ReportWriter::new(format)
        .reason(ReasonBits::TIMER)
        .timestamp(1 << 50)
        .clock_ticks(1 << 40)
        .context_id(77)
        .into_bytes();
    let view = ReportView::new(format, &bytes)?;
    let summary = classify(&view, 0)?;

    assert_eq!(summary.timestamp, 1 << 50);
    assert_eq!(summary.clock_ticks, Some(1 << 40));
    assert_eq!(summary.context_id, Some(77));
    assert!(summary.periodic);
    assert_eq!(clock_ratios(&view)?, None);
    Ok(())
}

#[test]
fn test_clock_ratios_on_narrow_headers() -> TestResult {
    let catalog = FormatCatalog::builtin(Interface::Legacy)?;
    let format = catalog.lookup(Generation::Gen9, 7)?;
    let bytes = ReportWriter::new(format)
        .with_dword0(72 | (36 << 25))
        .reason(ReasonBits::CLOCK_RATIO_CHANGE)
        .into_bytes();
    let view = ReportView::new(format, &bytes)?;
    let ratios = must_some(clock_ratios(&view)?, "gen9 reports carry clock ratios");

    assert_eq!(ratios.unslice_mhz, 72 * 16_666 / 1000);
    assert_eq!(ratios.slice_mhz, 36 * 16_666 / 1000);
    assert_eq!(reason(&view)?.map(ReasonBits::label), Some("clock ratio change"));
    Ok(())
}
