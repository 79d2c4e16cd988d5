//! Unit tests for all error variants.

use oa_errors::{
    ConfigError, ErrorCategory, ErrorSeverity, ExponentError, FormatError, OaError, Operation,
    StreamError,
};

fn all_stream_errors() -> Vec<StreamError> {
    vec![
        StreamError::PermissionDenied,
        StreamError::invalid_config("metric set 0"),
        StreamError::Busy,
        StreamError::WouldBlock,
        StreamError::ReportLost,
        StreamError::BufferOverflow,
        StreamError::Fault {
            requested: 4096,
            available: 128,
        },
        StreamError::NoSpace {
            required: 268,
            available: 64,
        },
        StreamError::InvalidState { state: "disabled" },
        StreamError::InvalidFormat(FormatError::invalid_format("gen12", 3)),
        StreamError::Io { errno: 5 },
        StreamError::malformed("unknown record type 9"),
    ]
}

mod stream_error_tests {
    use super::*;

    #[test]
    fn test_all_variants_display() {
        for variant in all_stream_errors() {
            assert!(
                !variant.to_string().is_empty(),
                "{variant:?} should have a display message"
            );
        }
    }

    #[test]
    fn test_exactly_two_recoverable_variants() {
        let recoverable: Vec<_> = all_stream_errors()
            .into_iter()
            .filter(StreamError::is_recoverable)
            .collect();
        assert_eq!(
            recoverable,
            vec![StreamError::WouldBlock, StreamError::ReportLost]
        );
    }

    #[test]
    fn test_format_error_converts_into_stream_error() {
        let err: StreamError = FormatError::invalid_format("xe2", 8).into();
        assert!(matches!(err, StreamError::InvalidFormat(_)));
        assert!(err.to_string().contains("xe2"));
    }

    #[test]
    fn test_unknown_errno_is_generic_io() {
        const ENODEV: i32 = 19;
        assert_eq!(
            StreamError::from_errno(Operation::Control, ENODEV),
            StreamError::Io { errno: ENODEV }
        );
    }
}

mod oa_error_tests {
    use super::*;

    #[test]
    fn test_categories() {
        let cases: Vec<(OaError, ErrorCategory)> = vec![
            (FormatError::Catalog("bad".into()).into(), ErrorCategory::Format),
            (ExponentError::ZeroFrequency.into(), ErrorCategory::Exponent),
            (StreamError::Busy.into(), ErrorCategory::Stream),
            (ConfigError::yaml("bad indent").into(), ErrorCategory::Config),
            (
                std::io::Error::other("disk").into(),
                ErrorCategory::Io,
            ),
        ];
        for (err, category) in cases {
            assert_eq!(err.category(), category, "{err}");
        }
    }

    #[test]
    fn test_severity_delegates_to_inner() {
        let err: OaError = StreamError::malformed("truncated").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);

        let err: OaError = StreamError::WouldBlock.into();
        assert_eq!(err.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn test_question_mark_conversion() -> Result<(), Box<dyn std::error::Error>> {
        fn inner() -> oa_errors::Result<()> {
            Err(StreamError::ReportLost)?;
            Ok(())
        }
        let err = match inner() {
            Ok(()) => return Err("expected an error".into()),
            Err(e) => e,
        };
        assert!(err.is_recoverable());
        Ok(())
    }
}
