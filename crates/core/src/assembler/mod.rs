//! Turns a [`Token`] stream into [`Record`]s: resolves the header, applies
//! the configured arity policy, and honors `skipEmptyLines`.

use crate::error::{Error, Result};
use crate::options::{validate_header_names, ColumnCountStrategy, CsvOptions, HeaderNameError, HeaderSpec, OutputFormat};
use crate::record::{Header, Record};
use crate::token::{SpannedToken, Token};
use std::sync::Arc;

/// Counters a caller can inspect after assembling, mirroring [`crate::lexer::LexerStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerStats {
    pub records_emitted: usize,
    pub rows_seen: usize,
}

/// Resolved column names once the header row (if any) has been seen.
#[derive(Debug, Clone)]
enum HeaderState {
    /// Still waiting for the first record to use as a header.
    AwaitingAutoDetect,
    /// Resolved (either auto-detected, fixed at construction, or not applicable).
    Resolved(Option<Header>),
}

/// Consumes [`SpannedToken`]s in order and emits [`Record`]s.
///
/// A record is emitted as soon as the `RecordDelimiter` that closes it is
/// seen; [`RecordAssembler::flush`] emits one more record for a final row
/// that had no trailing `RecordDelimiter`. Call order mirrors
/// [`crate::lexer::Lexer::feed`]: repeated [`RecordAssembler::assemble`]
/// calls, then exactly one [`RecordAssembler::flush`].
#[derive(Debug)]
pub struct RecordAssembler {
    output_format: OutputFormat,
    column_count_strategy: ColumnCountStrategy,
    skip_empty_lines: bool,
    max_field_count: Option<usize>,
    source: String,

    header_state: HeaderState,
    current_row: Vec<String>,
    current_field: Option<String>,
    row_number: usize,
    stats: AssemblerStats,
}

impl RecordAssembler {
    pub fn new(options: &CsvOptions) -> Self {
        let header_state = match &options.header {
            HeaderSpec::AutoDetect => HeaderState::AwaitingAutoDetect,
            HeaderSpec::Fixed(names) => {
                let header: Header = Arc::from(names.clone());
                HeaderState::Resolved(Some(header))
            }
            HeaderSpec::None => HeaderState::Resolved(None),
        };
        RecordAssembler {
            output_format: options.output_format,
            column_count_strategy: options.column_count_strategy,
            skip_empty_lines: options.skip_empty_lines,
            max_field_count: options.max_field_count,
            source: options.source.clone(),
            header_state,
            current_row: Vec::new(),
            current_field: None,
            row_number: 1,
            stats: AssemblerStats::default(),
        }
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// The header resolved so far: `Some(names)` once auto-detection or a
    /// fixed header has resolved, `None` for headerless mode or before the
    /// first row has been seen.
    pub fn resolved_header(&self) -> Option<Header> {
        match &self.header_state {
            HeaderState::Resolved(header) => header.clone(),
            HeaderState::AwaitingAutoDetect => None,
        }
    }

    /// Feeds a batch of tokens (typically one [`crate::lexer::Lexer::feed`]
    /// call's output) and returns every record it completed.
    pub fn assemble(&mut self, tokens: &[SpannedToken]) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for spanned in tokens {
            self.row_number = spanned.location.row_number;
            match &spanned.token {
                Token::Field(value) => {
                    self.current_field = Some(value.clone());
                    self.push_pending_field()?;
                }
                Token::FieldDelimiter => {
                    self.push_pending_field()?;
                }
                Token::RecordDelimiter(_) => {
                    self.push_pending_field()?;
                    if let Some(record) = self.close_row()? {
                        records.push(record);
                    }
                }
            }
        }
        self.stats.records_emitted += records.len();
        Ok(records)
    }

    /// Emits a final record for a trailing row with no terminating
    /// `RecordDelimiter`. Idempotent: calling it with nothing pending is a no-op.
    pub fn flush(&mut self) -> Result<Option<Record>> {
        if self.current_row.is_empty() && self.current_field.is_none() {
            return Ok(None);
        }
        self.push_pending_field()?;
        let record = self.close_row()?;
        if record.is_some() {
            self.stats.records_emitted += 1;
        }
        Ok(record)
    }

    fn push_pending_field(&mut self) -> Result<()> {
        if let Some(value) = self.current_field.take() {
            if let Some(max) = self.max_field_count {
                if self.current_row.len() >= max {
                    return Err(self.err(Error::FieldCountExceeded {
                        limit: max,
                        row_number: self.row_number,
                        source: None,
                    }));
                }
            }
            self.current_row.push(value);
        }
        Ok(())
    }

    fn close_row(&mut self) -> Result<Option<Record>> {
        self.stats.rows_seen += 1;
        let row = std::mem::take(&mut self.current_row);

        if self.skip_empty_lines && row.len() == 1 && row[0].is_empty() {
            return Ok(None);
        }

        if let HeaderState::AwaitingAutoDetect = self.header_state {
            validate_header_names(&row).map_err(|e| {
                self.err(match e {
                    HeaderNameError::Empty => Error::ParseError {
                        message: "header names must not be empty".to_string(),
                        location: crate::token::Location::default(),
                        source: None,
                    },
                    HeaderNameError::Duplicate { name, index } => Error::DuplicateHeader {
                        name,
                        index,
                        row_number: self.row_number,
                        source: None,
                    },
                })
            })?;
            let header: Header = Arc::from(row);
            self.header_state = HeaderState::Resolved(Some(header));
            return Ok(None);
        }

        let header = match &self.header_state {
            HeaderState::Resolved(header) => header.clone(),
            HeaderState::AwaitingAutoDetect => unreachable!("resolved above"),
        };

        let row = self.reconcile_arity(row, header.as_deref())?;
        Ok(Some(self.build_record(row, header)))
    }

    fn reconcile_arity(&self, row: Vec<String>, header: Option<&[String]>) -> Result<Vec<String>> {
        let header = match header {
            Some(header) => header,
            None => return Ok(row),
        };
        let expected = header.len();
        let actual = row.len();
        match self.column_count_strategy {
            ColumnCountStrategy::Keep => Ok(row),
            ColumnCountStrategy::Strict => {
                if actual != expected {
                    Err(self.err(Error::ColumnCountMismatch {
                        expected,
                        actual,
                        row_number: self.row_number,
                        source: None,
                    }))
                } else {
                    Ok(row)
                }
            }
            ColumnCountStrategy::Pad => {
                if actual > expected {
                    Err(self.err(Error::ColumnCountMismatch {
                        expected,
                        actual,
                        row_number: self.row_number,
                        source: None,
                    }))
                } else {
                    Ok(pad(row, expected))
                }
            }
            ColumnCountStrategy::Truncate => {
                let mut row = row;
                row.truncate(expected);
                Ok(pad(row, expected))
            }
        }
    }

    fn build_record(&self, values: Vec<String>, header: Option<Header>) -> Record {
        match (self.output_format, header) {
            (OutputFormat::Object, Some(header)) => Record::Object { header, values },
            _ => Record::Array(values),
        }
    }

    fn err(&self, error: Error) -> Error {
        if self.source.is_empty() {
            error
        } else {
            error.with_source(&self.source)
        }
    }
}

fn pad(mut row: Vec<String>, expected: usize) -> Vec<String> {
    while row.len() < expected {
        row.push(String::new());
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn assemble_all(options: &CsvOptions, input: &str) -> Vec<Record> {
        let mut lexer = Lexer::new(options);
        let mut assembler = RecordAssembler::new(options);
        let tokens = lexer.feed(Some(input), false).unwrap();
        let mut records = assembler.assemble(&tokens).unwrap();
        records.extend(assembler.flush().unwrap());
        records
    }

    #[test]
    fn auto_detects_header_and_builds_object_records() {
        let opts = CsvOptions::default();
        let records = assemble_all(&opts, "a,b\n1,2\n3,4\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("a"), Some("1"));
        assert_eq!(records[1].get("b"), Some("4"));
    }

    #[test]
    fn headerless_array_mode() {
        let mut opts = CsvOptions::default();
        opts.header = HeaderSpec::None;
        opts.output_format = OutputFormat::Array;
        let records = assemble_all(&opts, "1,2\n3,4\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].values(), &["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn skip_empty_lines_drops_single_empty_field_rows() {
        let mut opts = CsvOptions::default();
        opts.skip_empty_lines = true;
        let records = assemble_all(&opts, "a,b\n1,2\n\n3,4\n");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn strict_strategy_errors_on_arity_mismatch() {
        let mut opts = CsvOptions::default();
        opts.column_count_strategy = ColumnCountStrategy::Strict;
        let mut lexer = Lexer::new(&opts);
        let mut assembler = RecordAssembler::new(&opts);
        let tokens = lexer.feed(Some("a,b\n1,2,3\n"), false).unwrap();
        let err = assembler.assemble(&tokens).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ColumnCountMismatch);
    }

    #[test]
    fn pad_strategy_fills_short_rows() {
        let mut opts = CsvOptions::default();
        opts.column_count_strategy = ColumnCountStrategy::Pad;
        let records = assemble_all(&opts, "a,b,c\n1\n");
        assert_eq!(records[0].values(), &["1".to_string(), "".to_string(), "".to_string()]);
    }

    #[test]
    fn truncate_strategy_drops_surplus_and_pads_short() {
        let mut opts = CsvOptions::default();
        opts.column_count_strategy = ColumnCountStrategy::Truncate;
        let records = assemble_all(&opts, "a,b\n1,2,3\n4\n");
        assert_eq!(records[0].values(), &["1".to_string(), "2".to_string()]);
        assert_eq!(records[1].values(), &["4".to_string(), "".to_string()]);
    }

    #[test]
    fn keep_strategy_never_pads_or_truncates() {
        let opts = CsvOptions::default();
        let records = assemble_all(&opts, "a,b\n1,2,3\n4\n");
        assert_eq!(records[0].arity(), 3);
        assert_eq!(records[1].arity(), 1);
    }

    #[test]
    fn trailing_row_with_no_record_delimiter_is_flushed() {
        let opts = CsvOptions::default();
        let records = assemble_all(&opts, "a,b\n1,2");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("a"), Some("1"));
    }

    #[test]
    fn fixed_header_does_not_consume_the_first_data_row() {
        let mut opts = CsvOptions::default();
        opts.header = HeaderSpec::Fixed(vec!["x".to_string(), "y".to_string()]);
        let records = assemble_all(&opts, "1,2\n3,4\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("x"), Some("1"));
    }
}
