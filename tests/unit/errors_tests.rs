/*!
 * Tests for error types and conversions
 */

use skelweave::errors::{AppError, ConversionError, FormatTableError, InterchangeError, TraceError};

#[test]
fn test_traceError_nonMonotonic_shouldDisplayNumbers() {
    let error = TraceError::NonMonotonicSequence {
        line_no: 4,
        previous: 9,
        found: 7,
    };
    let display = format!("{}", error);
    assert!(display.contains("line 4"));
    assert!(display.contains('9'));
    assert!(display.contains('7'));
}

#[test]
fn test_interchangeError_missingAttribute_shouldNameElementAndAttribute() {
    let error = InterchangeError::MissingAttribute {
        element: "file".to_string(),
        attribute: "source-language".to_string(),
    };
    assert_eq!(error.to_string(), "<file> is missing required attribute 'source-language'");
}

#[test]
fn test_conversionError_fromParserErrors_shouldWrap() {
    let trace: ConversionError = TraceError::RepeatedSequence { line_no: 2, seq: 1 }.into();
    assert!(matches!(trace, ConversionError::Trace(TraceError::RepeatedSequence { .. })));

    let table: ConversionError = FormatTableError::MissingRoot.into();
    assert!(table.to_string().contains("<formatting>"));

    let interchange: ConversionError = InterchangeError::MissingFile.into();
    assert!(matches!(interchange, ConversionError::Interchange(_)));
}

#[test]
fn test_conversionError_fromIo_shouldKeepMessage() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: ConversionError = io_error.into();
    match error {
        ConversionError::Io { message, .. } => assert_eq!(message, "gone"),
        other => panic!("Expected Io, got {:?}", other),
    }
}

#[test]
fn test_conversionError_strictMode_shouldDisplayCount() {
    let error = ConversionError::StrictMode { warnings: 3 };
    assert_eq!(error.to_string(), "Strict mode: merge produced 3 warning(s)");
}

#[test]
fn test_appError_fromConversion_shouldWrap() {
    let error: AppError = ConversionError::UnsupportedEncoding("latin1".to_string()).into();
    let display = format!("{}", error);
    assert!(display.contains("Conversion error"));
    assert!(display.contains("latin1"));
}

#[test]
fn test_appError_fromAnyhowAndIo_shouldSelectVariant() {
    let from_anyhow: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(from_anyhow, AppError::Unknown(ref message) if message == "boom"));

    let from_io: AppError = std::io::Error::other("disk").into();
    assert!(matches!(from_io, AppError::File(_)));
}
