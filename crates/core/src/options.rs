//! Configuration shared by the lexer, assembler, and pipeline.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The shape records are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputFormat {
    /// A mapping from header name to field value.
    Object,
    /// An ordered sequence of field values.
    Array,
}

/// How the assembler reconciles a record's arity against the header arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColumnCountStrategy {
    /// Emit each record with its own arity; no padding, no truncation.
    Keep,
    /// Pad short records to header arity; long records are an error.
    Pad,
    /// Any record whose arity differs from the header arity is an error.
    Strict,
    /// Drop fields past header arity; pad short records to header arity.
    Truncate,
}

/// How the header is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HeaderSpec {
    /// Take the first record of the input as the header.
    AutoDetect,
    /// Use these column names; the first input row is data.
    Fixed(Vec<String>),
    /// Explicit headerless mode; only `OutputFormat::Array` is permitted.
    None,
}

/// Configuration for the lexer, assembler, and pipeline.
///
/// Validated once at construction via [`CsvOptions::validate`]; an
/// [`Error::InvalidOption`] is never deferred to parse time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CsvOptions {
    /// Field separator. Must not equal `\r`, `\n`, or `quotation`.
    pub delimiter: char,
    /// Quote character. Same exclusions as `delimiter`.
    pub quotation: char,
    /// Header resolution strategy.
    pub header: HeaderSpec,
    /// Record shape.
    pub output_format: OutputFormat,
    /// Arity reconciliation policy.
    pub column_count_strategy: ColumnCountStrategy,
    /// Drop a record that is exactly one empty field.
    pub skip_empty_lines: bool,
    /// Hard cap on fields per record. `None` means unbounded.
    pub max_field_count: Option<usize>,
    /// Hard cap, in characters, on unterminated buffered text.
    pub max_buffer_size: usize,
    /// Hard cap, in bytes, on total binary input for one-shot APIs. `None` means unbounded.
    pub max_binary_size: Option<usize>,
    /// Diagnostic label included in errors.
    pub source: String,
    /// If false (the default), a leading BOM on the first chunk is stripped.
    pub ignore_bom: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: ',',
            quotation: '"',
            header: HeaderSpec::AutoDetect,
            output_format: OutputFormat::Object,
            column_count_strategy: ColumnCountStrategy::Keep,
            skip_empty_lines: false,
            max_field_count: Some(100_000),
            max_buffer_size: 10 * (1 << 20),
            max_binary_size: Some(100 * (1 << 20)),
            source: String::new(),
            ignore_bom: false,
        }
    }
}

impl CsvOptions {
    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::InvalidOption {
            message: message.into(),
        }
    }

    /// Validates delimiter/quotation exclusivity and the header/output-format
    /// pairing. Called once at [`crate::lexer::Lexer`] / assembler construction.
    pub fn validate(&self) -> Result<()> {
        if self.delimiter == '\r' || self.delimiter == '\n' {
            return Err(self.invalid("delimiter must not be a carriage return or line feed"));
        }
        if self.quotation == '\r' || self.quotation == '\n' {
            return Err(self.invalid("quotation must not be a carriage return or line feed"));
        }
        if self.delimiter == self.quotation {
            return Err(self.invalid("delimiter and quotation must not be the same character"));
        }

        if matches!(self.header, HeaderSpec::None)
            && !matches!(self.output_format, OutputFormat::Array)
        {
            return Err(self.invalid(
                "headerless mode (header: []) requires OutputFormat::Array",
            ));
        }

        if matches!(self.header, HeaderSpec::None)
            && !matches!(self.column_count_strategy, ColumnCountStrategy::Keep)
        {
            return Err(self.invalid(
                "headerless mode (header: []) only supports ColumnCountStrategy::Keep",
            ));
        }

        if let HeaderSpec::Fixed(names) = &self.header {
            validate_header_names(names).map_err(|e| {
                self.invalid(match e {
                    HeaderNameError::Empty => "header names must not be empty".to_string(),
                    HeaderNameError::Duplicate { name, .. } => {
                        format!("duplicate header name {name:?}")
                    }
                })
            })?;
        }

        if let Some(max) = self.max_field_count {
            if max == 0 {
                return Err(self.invalid("maxFieldCount must be a positive integer"));
            }
            if let HeaderSpec::Fixed(names) = &self.header {
                if names.len() > max {
                    return Err(self.invalid(format!(
                        "configured header has {} fields, exceeding maxFieldCount of {max}",
                        names.len()
                    )));
                }
            }
        }
        if self.max_buffer_size == 0 {
            return Err(self.invalid("maxBufferSize must be a positive integer"));
        }
        if let Some(max) = self.max_binary_size {
            if max == 0 {
                return Err(self.invalid("maxBinarySize must be a positive integer"));
            }
        }

        Ok(())
    }
}

/// Shared header-validity check: non-empty, pairwise-unique entries.
///
/// Used both for a configured `header` (at option-validation time) and for a
/// header resolved from the first record of the input (at parse time, where
/// the caller turns this into [`Error::DuplicateHeader`] instead).
pub(crate) enum HeaderNameError {
    Empty,
    Duplicate { name: String, index: usize },
}

pub(crate) fn validate_header_names(names: &[String]) -> std::result::Result<(), HeaderNameError> {
    let mut seen = rustc_hash::FxHashSet::default();
    for (index, name) in names.iter().enumerate() {
        if name.is_empty() {
            return Err(HeaderNameError::Empty);
        }
        if !seen.insert(name.as_str()) {
            return Err(HeaderNameError::Duplicate {
                name: name.clone(),
                index,
            });
        }
    }
    Ok(())
}
