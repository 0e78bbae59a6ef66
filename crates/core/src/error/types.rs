use crate::token::Location;
use std::fmt;

/// Programmatic discriminator for an [`Error`], independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidOption,
    ParseError,
    BufferOverflow,
    FieldCountExceeded,
    ColumnCountMismatch,
    BinarySizeExceeded,
    UnexpectedEofInQuotedField,
    UnexpectedCharacterAfterQuote,
    DuplicateHeader,
    Cancelled,
}

/// The two sub-kinds a [`Error::Cancelled`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelKind {
    Abort,
    Timeout,
}

/// The full error taxonomy for option validation, lexing, and assembly.
///
/// Every fatal condition in the crate surfaces as one of these variants. None
/// is recovered locally: the lexer does not resynchronize and the assembler
/// does not skip bad records, so a caller sees exactly one error per failed
/// parse, carrying a [`Location`] when the failure is localizable and the
/// configured `source` label when one was set.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    InvalidOption {
        message: String,
    },

    ParseError {
        message: String,
        location: Location,
        source: Option<String>,
    },

    BufferOverflow {
        limit: usize,
        row_number: usize,
        source: Option<String>,
    },

    FieldCountExceeded {
        limit: usize,
        row_number: usize,
        source: Option<String>,
    },

    ColumnCountMismatch {
        expected: usize,
        actual: usize,
        row_number: usize,
        source: Option<String>,
    },

    BinarySizeExceeded {
        limit: usize,
        actual: usize,
        source: Option<String>,
    },

    UnexpectedEofInQuotedField {
        row_number: usize,
        location: Location,
        source: Option<String>,
    },

    UnexpectedCharacterAfterQuote {
        found: char,
        location: Location,
        source: Option<String>,
    },

    DuplicateHeader {
        name: String,
        index: usize,
        row_number: usize,
        source: Option<String>,
    },

    Cancelled {
        sub_kind: CancelKind,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidOption { message } => write!(f, "invalid option: {message}"),
            Error::ParseError {
                message, location, ..
            } => write!(
                f,
                "parse error at row {}: {message}",
                location.row_number
            ),
            Error::BufferOverflow {
                limit, row_number, ..
            } => write!(
                f,
                "buffered input exceeded the configured limit of {limit} characters near row {row_number}"
            ),
            Error::FieldCountExceeded {
                limit, row_number, ..
            } => write!(
                f,
                "record at row {row_number} exceeded the configured field limit of {limit}"
            ),
            Error::ColumnCountMismatch {
                expected,
                actual,
                row_number,
                ..
            } => write!(
                f,
                "record at row {row_number} has {actual} fields, expected {expected}"
            ),
            Error::BinarySizeExceeded { limit, actual, .. } => write!(
                f,
                "binary input of {actual} bytes exceeded the configured limit of {limit} bytes"
            ),
            Error::UnexpectedEofInQuotedField { row_number, .. } => write!(
                f,
                "unexpected end of input inside a quoted field starting at row {row_number}"
            ),
            Error::UnexpectedCharacterAfterQuote {
                found, location, ..
            } => write!(
                f,
                "unexpected character {found:?} after closing quote at row {}",
                location.row_number
            ),
            Error::DuplicateHeader {
                name,
                index,
                ..
            } => write!(f, "duplicate header name {name:?} at column {index}"),
            Error::Cancelled { .. } => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// The programmatic kind of this error, independent of its message.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidOption { .. } => ErrorKind::InvalidOption,
            Error::ParseError { .. } => ErrorKind::ParseError,
            Error::BufferOverflow { .. } => ErrorKind::BufferOverflow,
            Error::FieldCountExceeded { .. } => ErrorKind::FieldCountExceeded,
            Error::ColumnCountMismatch { .. } => ErrorKind::ColumnCountMismatch,
            Error::BinarySizeExceeded { .. } => ErrorKind::BinarySizeExceeded,
            Error::UnexpectedEofInQuotedField { .. } => ErrorKind::UnexpectedEofInQuotedField,
            Error::UnexpectedCharacterAfterQuote { .. } => {
                ErrorKind::UnexpectedCharacterAfterQuote
            }
            Error::DuplicateHeader { .. } => ErrorKind::DuplicateHeader,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// The location of the earliest offending code point, when localizable.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::ParseError { location, .. }
            | Error::UnexpectedEofInQuotedField { location, .. }
            | Error::UnexpectedCharacterAfterQuote { location, .. } => Some(*location),
            _ => None,
        }
    }

    /// The diagnostic `source` label configured on the options, if any.
    pub fn source_label(&self) -> Option<&str> {
        match self {
            Error::InvalidOption { .. } | Error::Cancelled { .. } => None,
            Error::ParseError { source, .. }
            | Error::BufferOverflow { source, .. }
            | Error::FieldCountExceeded { source, .. }
            | Error::ColumnCountMismatch { source, .. }
            | Error::BinarySizeExceeded { source, .. }
            | Error::UnexpectedEofInQuotedField { source, .. }
            | Error::UnexpectedCharacterAfterQuote { source, .. }
            | Error::DuplicateHeader { source, .. } => source.as_deref(),
        }
    }

    pub(crate) fn with_source(mut self, label: &str) -> Self {
        if label.is_empty() {
            return self;
        }
        let slot = match &mut self {
            Error::ParseError { source, .. }
            | Error::BufferOverflow { source, .. }
            | Error::FieldCountExceeded { source, .. }
            | Error::ColumnCountMismatch { source, .. }
            | Error::BinarySizeExceeded { source, .. }
            | Error::UnexpectedEofInQuotedField { source, .. }
            | Error::UnexpectedCharacterAfterQuote { source, .. }
            | Error::DuplicateHeader { source, .. } => source,
            Error::InvalidOption { .. } | Error::Cancelled { .. } => return self,
        };
        *slot = Some(label.to_string());
        self
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
