/*!
 * Error types for skelweave.
 *
 * Parsers of the three on-disk artefacts (structural trace, format table,
 * interchange document) report typed errors; orchestration code wraps them
 * in `ConversionError`. Non-fatal conditions (tag not found, unmatched
 * exclude markers, unresolved ids) are not errors and never appear here.
 */

use thiserror::Error;

/// Errors raised while reading a structural trace
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TraceError {
    /// A line that is neither a tag line nor a TU line
    #[error("Malformed trace line {line_no}: {line}")]
    MalformedLine {
        /// 1-based line number
        line_no: usize,
        /// Offending line content
        line: String,
    },

    /// Opening sequence numbers must strictly increase
    #[error("Sequence number {found} on trace line {line_no} does not follow {previous}")]
    NonMonotonicSequence {
        /// 1-based line number
        line_no: usize,
        /// Last accepted sequence number
        previous: u64,
        /// Sequence number found on this line
        found: u64,
    },

    /// A closing sequence number was used twice
    #[error("Sequence number {seq} on trace line {line_no} closes an element twice")]
    RepeatedSequence {
        /// 1-based line number
        line_no: usize,
        /// Repeated sequence number
        seq: u64,
    },
}

/// Errors raised while reading a format table
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormatTableError {
    /// No `<formatting>` root element
    #[error("Format table has no <formatting> root element")]
    MissingRoot,

    /// An entry could not be read
    #[error("Malformed format entry: {0}")]
    MalformedEntry(String),

    /// An entry id is not a positive integer
    #[error("Invalid format id: {0}")]
    InvalidId(String),
}

/// Errors raised while reading an interchange document
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InterchangeError {
    /// The document has no `<file>` element
    #[error("Interchange document has no <file> element")]
    MissingFile,

    /// A required attribute is absent
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Element name
        element: String,
        /// Attribute name
        attribute: String,
    },

    /// Structure that cannot be read
    #[error("Malformed interchange document: {0}")]
    Malformed(String),
}

/// Errors that abort a conversion job
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Structural trace could not be read
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    /// Format table could not be read
    #[error("Format table error: {0}")]
    FormatTable(#[from] FormatTableError),

    /// Interchange document could not be read
    #[error("Interchange error: {0}")]
    Interchange(#[from] InterchangeError),

    /// Only UTF-8 output is produced by this crate
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Reading or writing an artefact failed
    #[error("I/O error on {path}: {message}")]
    Io {
        /// Path or stream name
        path: String,
        /// Underlying error message
        message: String,
    },

    /// Strict mode escalates merge warnings to a failure
    #[error("Strict mode: merge produced {warnings} warning(s)")]
    StrictMode {
        /// Number of warnings recorded
        warnings: usize,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a conversion job
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            path: "<stream>".to_string(),
            message: error.to_string(),
        }
    }
}
