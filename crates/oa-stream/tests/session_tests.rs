//! Session lifecycle against the simulated counter unit.

use insta::assert_snapshot;
use oa_errors::{FormatError, StreamError};
use oa_format::{FormatCatalog, Generation, Interface};
use oa_stream::{
    EngineClass, Platform, Record, SessionConfig, SessionState, SimulatedUnit, StreamSession,
};
use oa_test_helpers::prelude::*;

const LEGACY_A40: u32 = 10;
const OBSERVATION_A40: u32 = 4;

fn init_tracing() {
    // Another test in this binary may have installed it.
    let _installed = tracing_subscriber::fmt().with_test_writer().try_init().is_ok();
}

fn gen12(
    interface: Interface,
) -> Result<(SimulatedUnit, FormatCatalog), Box<dyn std::error::Error>> {
    init_tracing();
    let unit = SimulatedUnit::new(Platform::new(Generation::Gen12, interface));
    Ok((unit, FormatCatalog::builtin(interface)?))
}

#[test]
fn test_second_open_is_busy() -> TestResult {
    let (unit, catalog) = gen12(Interface::Legacy)?;
    let first = StreamSession::open(&unit, &catalog, SessionConfig::new(LEGACY_A40, 1, 12))?;
    assert_eq!(first.state(), SessionState::Enabled);

    let second = StreamSession::open(&unit, &catalog, SessionConfig::new(LEGACY_A40, 2, 12));
    assert!(matches!(second, Err(StreamError::Busy)));

    drop(first);
    let third = StreamSession::open(&unit, &catalog, SessionConfig::new(LEGACY_A40, 2, 12))?;
    assert_eq!(third.config().metric_set_id, 2);
    Ok(())
}

#[test]
fn test_close_releases_unit() -> TestResult {
    let (unit, catalog) = gen12(Interface::Legacy)?;
    let mut session = StreamSession::open(&unit, &catalog, SessionConfig::new(LEGACY_A40, 1, 12))?;
    session.close();
    session.close();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!unit.is_claimed());

    assert_eq!(session.enable(), Err(StreamError::InvalidState { state: "closed" }));
    assert_eq!(session.disable(), Err(StreamError::InvalidState { state: "closed" }));
    assert!(matches!(session.status(), Err(StreamError::InvalidState { .. })));
    let mut buf = vec![0u8; 4096];
    assert!(matches!(
        session.read_raw(&mut buf, 4096),
        Err(StreamError::InvalidState { state: "closed" })
    ));
    Ok(())
}

#[test]
fn test_permission_denied() -> TestResult {
    let (unit, catalog) = gen12(Interface::Observation)?;
    unit.set_permitted(false);
    let denied = StreamSession::open(&unit, &catalog, SessionConfig::new(OBSERVATION_A40, 1, 12));
    assert!(matches!(denied, Err(StreamError::PermissionDenied)));
    assert!(!unit.is_claimed());

    unit.set_permitted(true);
    let session = StreamSession::open(&unit, &catalog, SessionConfig::new(OBSERVATION_A40, 1, 12))?;
    assert_eq!(session.interface(), Interface::Observation);
    Ok(())
}

#[test]
fn test_configuration_is_checked_before_claiming() -> TestResult {
    let (unit, catalog) = gen12(Interface::Legacy)?;

    let unknown = StreamSession::open(&unit, &catalog, SessionConfig::new(99, 1, 12));
    assert!(matches!(
        unknown,
        Err(StreamError::InvalidFormat(FormatError::InvalidFormat { format_id: 99, .. }))
    ));

    let video = SessionConfig::new(LEGACY_A40, 1, 12).with_engine(EngineClass::VideoDecode, 0);
    assert!(matches!(
        StreamSession::open(&unit, &catalog, video),
        Err(StreamError::InvalidConfig { .. })
    ));

    let wrong_catalog = FormatCatalog::builtin(Interface::Observation)?;
    assert!(matches!(
        StreamSession::open(&unit, &wrong_catalog, SessionConfig::new(OBSERVATION_A40, 1, 12)),
        Err(StreamError::InvalidConfig { .. })
    ));
    assert!(!unit.is_claimed());
    Ok(())
}

#[test]
fn test_enable_disable_are_idempotent() -> TestResult {
    let (unit, catalog) = gen12(Interface::Legacy)?;
    let config = SessionConfig::new(LEGACY_A40, 1, 12).disabled();
    let mut session = StreamSession::open(&unit, &catalog, config)?;
    assert_eq!(session.state(), SessionState::Disabled);

    session.disable()?;
    assert_eq!(session.state(), SessionState::Disabled);
    session.enable()?;
    session.enable()?;
    assert_eq!(session.state(), SessionState::Enabled);
    session.disable()?;
    assert_eq!(session.state(), SessionState::Disabled);
    Ok(())
}

#[test]
fn test_disabled_read_on_legacy_is_bare_eio() -> TestResult {
    let (unit, catalog) = gen12(Interface::Legacy)?;
    let config = SessionConfig::new(LEGACY_A40, 1, 12).disabled();
    let mut session = StreamSession::open(&unit, &catalog, config)?;

    let mut buf = vec![0u8; 4096];
    assert_eq!(session.read_raw(&mut buf, 4096), Err(StreamError::Io { errno: libc::EIO }));

    let mut records = session.read_records(&mut buf)?;
    assert_eq!(records.next(), Some(Err(StreamError::Io { errno: libc::EIO })));
    assert_eq!(records.next(), None);
    Ok(())
}

#[test]
fn test_disabled_read_on_observation_is_invalid_state() -> TestResult {
    let (unit, catalog) = gen12(Interface::Observation)?;
    let config = SessionConfig::new(OBSERVATION_A40, 1, 12).disabled();
    let mut session = StreamSession::open(&unit, &catalog, config)?;

    let mut buf = vec![0u8; 4096];
    assert_eq!(
        session.read_raw(&mut buf, 4096),
        Err(StreamError::InvalidState { state: "disabled" })
    );
    Ok(())
}

#[test]
fn test_non_sampling_session_cannot_be_read() -> TestResult {
    let (unit, catalog) = gen12(Interface::Observation)?;
    let config = SessionConfig::new(OBSERVATION_A40, 1, 12).without_sampling();
    let mut session = StreamSession::open(&unit, &catalog, config)?;
    assert_eq!(session.state(), SessionState::Enabled);
    assert!(!unit.push_report(&vec![0u8; session.format().size()]));

    let mut buf = vec![0u8; 4096];
    assert_eq!(
        session.read_raw(&mut buf, 4096),
        Err(StreamError::InvalidState { state: "not sampling" })
    );
    Ok(())
}

#[test]
fn test_read_records_needs_room_for_one_record() -> TestResult {
    let (unit, catalog) = gen12(Interface::Legacy)?;
    let mut session = StreamSession::open(&unit, &catalog, SessionConfig::new(LEGACY_A40, 1, 12))?;
    assert_eq!(session.record_len(), 268);

    let mut small = vec![0u8; 200];
    assert!(matches!(
        session.read_records(&mut small),
        Err(StreamError::NoSpace { required: 268, available: 200 })
    ));
    Ok(())
}

#[test]
fn test_read_raw_buffer_checks() -> TestResult {
    let (unit, catalog) = gen12(Interface::Observation)?;
    let config = SessionConfig::new(OBSERVATION_A40, 1, 12).non_blocking();
    let mut session = StreamSession::open(&unit, &catalog, config)?;
    let size = session.format().size();

    let mut dest = vec![0u8; 1024];
    assert_eq!(
        session.read_raw(&mut dest, 100),
        Err(StreamError::NoSpace { required: size, available: 100 })
    );

    let mut short = vec![0u8; 128];
    assert_eq!(
        session.read_raw(&mut short, 4096),
        Err(StreamError::Fault { requested: 4096, available: 128 })
    );

    for _ in 0..3 {
        assert!(unit.push_report(&vec![0u8; size]));
    }
    // Claim exceeds the buffer: served as a short read of whole reports.
    let mut dest = vec![0u8; size * 2 + 10];
    assert_eq!(session.read_raw(&mut dest, 1 << 20)?, size * 2);
    assert_eq!(session.read_raw(&mut dest, 1 << 20)?, size);
    assert_eq!(session.read_raw(&mut dest, 1 << 20), Err(StreamError::WouldBlock));
    Ok(())
}

#[test]
fn test_would_block_does_not_end_records() -> TestResult {
    let (unit, catalog) = gen12(Interface::Legacy)?;
    let config = SessionConfig::new(LEGACY_A40, 1, 12).non_blocking();
    let mut session = StreamSession::open(&unit, &catalog, config)?;
    let report = vec![0u8; session.format().size()];

    let mut scratch = vec![0u8; 4096];
    let mut records = session.read_records(&mut scratch)?;
    assert_eq!(records.next(), Some(Err(StreamError::WouldBlock)));
    assert!(unit.push_report(&report));
    assert!(matches!(records.next(), Some(Ok(Record::Sample(_)))));
    assert_eq!(records.next(), Some(Err(StreamError::WouldBlock)));
    Ok(())
}

#[test]
fn test_blocking_read_waits_for_reports() -> TestResult {
    let (unit, catalog) = gen12(Interface::Observation)?;
    let mut session =
        StreamSession::open(&unit, &catalog, SessionConfig::new(OBSERVATION_A40, 1, 12))?;
    let size = session.format().size();
    let producer = unit.clone();

    let mut scratch = vec![0u8; 4096];
    let record = std::thread::scope(|s| {
        let pusher = s.spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            producer.push_report(&vec![0xAB; size])
        });
        let record = session.read_records(&mut scratch).map(|mut records| records.next());
        (pusher.join().is_ok_and(|pushed| pushed), record)
    });

    let (pushed, record) = record;
    assert!(pushed);
    let record = must_some(record?, "a report was pushed");
    let report = must_some(record?.as_sample().cloned(), "observation records are samples");
    assert!(report.as_bytes().iter().all(|&b| b == 0xAB));
    Ok(())
}

#[test]
fn test_enable_discards_stale_reports() -> TestResult {
    let (unit, catalog) = gen12(Interface::Legacy)?;
    let config = SessionConfig::new(LEGACY_A40, 1, 12).non_blocking();
    let mut session = StreamSession::open(&unit, &catalog, config)?;
    let report = vec![0u8; session.format().size()];
    assert!(unit.push_report(&report));

    session.disable()?;
    assert!(!unit.push_report(&report));
    session.enable()?;

    let mut buf = vec![0u8; 4096];
    assert_eq!(session.read_raw(&mut buf, 4096), Err(StreamError::WouldBlock));
    Ok(())
}

#[test]
fn test_error_messages() {
    let messages = [
        StreamError::Busy,
        StreamError::PermissionDenied,
        StreamError::NoSpace { required: 268, available: 200 },
        StreamError::Fault { requested: 4096, available: 128 },
        StreamError::InvalidState { state: "disabled" },
        StreamError::Io { errno: 5 },
        StreamError::from(FormatError::invalid_format("gen12", 99)),
    ]
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>();

    assert_snapshot!(messages.join("\n"), @r"
    Counter unit is busy
    Permission denied opening counter stream
    Buffer of 200 bytes cannot hold a 268 byte record
    Read of 4096 bytes would overrun a 128 byte buffer
    Invalid stream state: disabled
    Stream I/O failure (errno 5)
    Format 99 is not defined for gen12
    ");
}
