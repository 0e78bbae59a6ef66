//! A byte-oriented lexer that drives the same four-state grammar as
//! [`super::state_machine::Lexer`] but advances by consulting a
//! [`SeparatorIndexer`] for the next byte of interest instead of branching on
//! every input byte.
//!
//! Field bytes accumulate in a `Vec<u8>` and are only validated as UTF-8 once
//! a field is complete, so a multi-byte character split across a chunk
//! boundary is never a concern here: no byte this lexer treats specially
//! (delimiter, quote, CR, LF) can appear as a continuation byte of another
//! UTF-8 code point, so the indexer never misreads one.

use crate::error::{Error, Result};
use crate::lexer::indexer::{ScalarIndexer, SeparatorIndexer, SeparatorKind};
use crate::lexer::state_machine::State;
use crate::lexer::LexerStats;
use crate::options::CsvOptions;
use crate::token::{Cursor, Eol, Location, Position, SpannedToken, Token};

/// Same contract as [`super::state_machine::Lexer`], over `&[u8]` chunks and
/// backed by a pluggable [`SeparatorIndexer`] (defaulting to [`ScalarIndexer`]).
#[derive(Debug, Clone)]
pub struct ByteLexer<I: SeparatorIndexer = ScalarIndexer> {
    indexer: I,
    delimiter: u8,
    quotation: u8,
    max_buffer_size: usize,
    source: String,

    state: State,
    cursor: Cursor,
    field_buf: Vec<u8>,
    field_start: Position,
    awaiting_field: bool,
    pending_cr: bool,
    pending_cr_start: Position,
    started: bool,
    ignore_bom: bool,
    drained: bool,

    stats: LexerStats,
}

impl ByteLexer<ScalarIndexer> {
    /// Builds a byte lexer backed by the scalar indexer. Requires ASCII
    /// single-byte `delimiter`/`quotation`; anything else is an
    /// [`Error::InvalidOption`], since the byte backend cannot represent a
    /// multi-byte separator.
    pub fn new(options: &CsvOptions) -> Result<Self> {
        Self::with_indexer(options, ScalarIndexer)
    }
}

impl<I: SeparatorIndexer> ByteLexer<I> {
    pub fn with_indexer(options: &CsvOptions, indexer: I) -> Result<Self> {
        let delimiter = ascii_byte(options.delimiter, "delimiter")?;
        let quotation = ascii_byte(options.quotation, "quotation")?;
        Ok(ByteLexer {
            indexer,
            delimiter,
            quotation,
            max_buffer_size: options.max_buffer_size,
            source: options.source.clone(),
            state: State::FieldStart,
            cursor: Cursor::new(),
            field_buf: Vec::new(),
            field_start: Position::start(),
            awaiting_field: false,
            pending_cr: false,
            pending_cr_start: Position::start(),
            started: false,
            ignore_bom: options.ignore_bom,
            drained: false,
            stats: LexerStats::default(),
        })
    }

    pub fn stats(&self) -> LexerStats {
        self.stats
    }

    pub fn feed(&mut self, chunk: Option<&[u8]>, stream: bool) -> Result<Vec<SpannedToken>> {
        if self.drained {
            return Err(self.err(Error::ParseError {
                message: "lexer fed after it was already drained".to_string(),
                location: Location {
                    start: self.cursor.position,
                    end: self.cursor.position,
                    row_number: self.cursor.row_number,
                },
                source: None,
            }));
        }

        let mut tokens = Vec::new();

        if let Some(chunk) = chunk {
            let mut chunk = self.strip_bom(chunk);

            if self.pending_cr && !chunk.is_empty() {
                self.pending_cr = false;
                if chunk[0] == b'\n' {
                    self.consume(b'\n');
                    self.finish_record(&mut tokens, Eol::CrLf, self.pending_cr_start)?;
                    chunk = &chunk[1..];
                } else {
                    self.dispatch(b'\r', self.pending_cr_start, &mut tokens)?;
                }
            }

            if !chunk.is_empty() || !self.pending_cr {
                self.run(chunk, stream, &mut tokens)?;
            }
        }

        if !stream {
            if self.pending_cr {
                self.pending_cr = false;
                self.dispatch(b'\r', self.pending_cr_start, &mut tokens)?;
            }
            self.finish(&mut tokens)?;
            self.drained = true;
        }

        self.stats.tokens_emitted += tokens.len();
        Ok(tokens)
    }

    pub fn finish_stream(&mut self) -> Result<Vec<SpannedToken>> {
        self.feed(None, false)
    }

    fn run(&mut self, chunk: &[u8], stream: bool, tokens: &mut Vec<SpannedToken>) -> Result<()> {
        let prior_in_quote = self.state == State::InQuoted;
        let result = self.indexer.index(chunk, prior_in_quote, self.delimiter, self.quotation);

        let mut pos = 0usize;
        let mut seps = result.separators.into_iter().peekable();

        while pos < chunk.len() {
            let next_special = seps.peek().copied().filter(|s| s.offset >= pos);
            let boundary = next_special.map(|s| s.offset).unwrap_or(chunk.len());

            if boundary > pos {
                self.bulk_push(&chunk[pos..boundary])?;
                pos = boundary;
            }

            let sep = match next_special {
                Some(sep) => sep,
                None => break,
            };
            seps.next();
            let byte = chunk[sep.offset];

            if self.state == State::InQuoted && sep.kind != SeparatorKind::Quote {
                self.consume(byte);
                self.push_content_byte(byte);
                pos = sep.offset + 1;
                self.check_buffer_budget()?;
                continue;
            }

            match sep.kind {
                SeparatorKind::Cr => {
                    let start = self.consume(b'\r');
                    match chunk.get(sep.offset + 1) {
                        Some(b'\n') => {
                            self.consume(b'\n');
                            self.finish_record(tokens, Eol::CrLf, start)?;
                            if matches!(seps.peek(), Some(s) if s.offset == sep.offset + 1) {
                                seps.next();
                            }
                            pos = sep.offset + 2;
                        }
                        Some(_) => {
                            self.dispatch(b'\r', start, tokens)?;
                            pos = sep.offset + 1;
                        }
                        None if stream => {
                            self.pending_cr = true;
                            self.pending_cr_start = start;
                            pos = sep.offset + 1;
                        }
                        None => {
                            self.dispatch(b'\r', start, tokens)?;
                            pos = sep.offset + 1;
                        }
                    }
                }
                _ => {
                    let start = self.consume(byte);
                    self.dispatch(byte, start, tokens)?;
                    pos = sep.offset + 1;
                }
            }
            self.check_buffer_budget()?;
        }
        Ok(())
    }

    fn bulk_push(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        if self.state == State::QuoteSeen {
            let found = bytes[0] as char;
            let start = self.consume(bytes[0]);
            return Err(self.err(Error::UnexpectedCharacterAfterQuote {
                found,
                location: Location {
                    start,
                    end: self.cursor.position,
                    row_number: self.cursor.row_number,
                },
                source: None,
            }));
        }
        for &byte in bytes {
            self.consume(byte);
            self.push_content_byte(byte);
        }
        self.check_buffer_budget()
    }

    fn push_content_byte(&mut self, byte: u8) {
        self.field_buf.push(byte);
        if self.state == State::FieldStart {
            self.state = State::InUnquoted;
        }
    }

    fn strip_bom<'a>(&mut self, chunk: &'a [u8]) -> &'a [u8] {
        if !self.started {
            self.started = true;
            if !self.ignore_bom && chunk.starts_with(&[0xEF, 0xBB, 0xBF]) {
                for &b in &chunk[..3] {
                    self.cursor.consume(b as char);
                }
                self.field_start = self.cursor.position;
                return &chunk[3..];
            }
        }
        chunk
    }

    fn consume(&mut self, byte: u8) -> Position {
        let before = self.cursor.position;
        self.cursor.consume(byte as char);
        self.stats.units_consumed += 1;
        before
    }

    fn err(&self, error: Error) -> Error {
        if self.source.is_empty() {
            error
        } else {
            error.with_source(&self.source)
        }
    }

    fn dispatch(&mut self, byte: u8, pos_before: Position, tokens: &mut Vec<SpannedToken>) -> Result<()> {
        let pos_after = self.cursor.position;
        match self.state {
            State::FieldStart => {
                if byte == self.quotation {
                    self.state = State::InQuoted;
                } else if byte == self.delimiter {
                    self.emit_field(tokens, pos_before);
                    self.emit_field_delimiter(tokens, pos_before, pos_after);
                } else if byte == b'\n' {
                    self.emit_field(tokens, pos_before);
                    self.emit_record_delimiter(tokens, Eol::Lf, pos_before, pos_after);
                } else {
                    self.push_content_byte(byte);
                }
            }
            State::InUnquoted => {
                if byte == self.delimiter {
                    self.emit_field(tokens, pos_before);
                    self.emit_field_delimiter(tokens, pos_before, pos_after);
                } else if byte == b'\n' {
                    self.emit_field(tokens, pos_before);
                    self.emit_record_delimiter(tokens, Eol::Lf, pos_before, pos_after);
                } else {
                    self.push_content_byte(byte);
                }
            }
            State::InQuoted => {
                if byte == self.quotation {
                    self.state = State::QuoteSeen;
                } else {
                    self.push_content_byte(byte);
                }
            }
            State::QuoteSeen => {
                if byte == self.quotation {
                    self.push_content_byte(byte);
                    self.state = State::InQuoted;
                } else if byte == self.delimiter {
                    self.emit_field(tokens, pos_before);
                    self.emit_field_delimiter(tokens, pos_before, pos_after);
                } else if byte == b'\n' {
                    self.emit_field(tokens, pos_before);
                    self.emit_record_delimiter(tokens, Eol::Lf, pos_before, pos_after);
                } else {
                    return Err(self.err(Error::UnexpectedCharacterAfterQuote {
                        found: byte as char,
                        location: Location {
                            start: pos_before,
                            end: pos_after,
                            row_number: self.cursor.row_number,
                        },
                        source: None,
                    }));
                }
            }
        }
        Ok(())
    }

    fn emit_field(&mut self, tokens: &mut Vec<SpannedToken>, end: Position) {
        let bytes = std::mem::take(&mut self.field_buf);
        let value = String::from_utf8_lossy(&bytes).into_owned();
        let start = self.field_start;
        tokens.push(SpannedToken {
            token: Token::Field(value),
            location: Location {
                start,
                end,
                row_number: self.cursor.row_number,
            },
        });
    }

    fn emit_field_delimiter(&mut self, tokens: &mut Vec<SpannedToken>, start: Position, end: Position) {
        tokens.push(SpannedToken {
            token: Token::FieldDelimiter,
            location: Location {
                start,
                end,
                row_number: self.cursor.row_number,
            },
        });
        self.state = State::FieldStart;
        self.awaiting_field = true;
        self.field_start = end;
    }

    fn emit_record_delimiter(&mut self, tokens: &mut Vec<SpannedToken>, eol: Eol, start: Position, end: Position) {
        let row_number = self.cursor.row_number;
        tokens.push(SpannedToken {
            token: Token::RecordDelimiter(eol),
            location: Location { start, end, row_number },
        });
        self.cursor.next_row();
        self.state = State::FieldStart;
        self.awaiting_field = false;
        self.field_start = end;
    }

    fn finish_record(&mut self, tokens: &mut Vec<SpannedToken>, eol: Eol, cr_start: Position) -> Result<()> {
        let end = self.cursor.position;
        self.emit_field(tokens, cr_start);
        self.emit_record_delimiter(tokens, eol, cr_start, end);
        Ok(())
    }

    fn check_buffer_budget(&self) -> Result<()> {
        let held = self.field_buf.len() + usize::from(self.pending_cr);
        if held > self.max_buffer_size {
            return Err(self.err(Error::BufferOverflow {
                limit: self.max_buffer_size,
                row_number: self.cursor.row_number,
                source: None,
            }));
        }
        Ok(())
    }

    fn finish(&mut self, tokens: &mut Vec<SpannedToken>) -> Result<()> {
        match self.state {
            State::FieldStart => {
                if self.awaiting_field {
                    self.emit_field(tokens, self.cursor.position);
                }
            }
            State::InUnquoted | State::QuoteSeen => {
                self.emit_field(tokens, self.cursor.position);
            }
            State::InQuoted => {
                return Err(self.err(Error::UnexpectedEofInQuotedField {
                    row_number: self.cursor.row_number,
                    location: Location {
                        start: self.field_start,
                        end: self.cursor.position,
                        row_number: self.cursor.row_number,
                    },
                    source: None,
                }));
            }
        }
        Ok(())
    }
}

fn ascii_byte(ch: char, label: &str) -> Result<u8> {
    if ch.is_ascii() {
        Ok(ch as u8)
    } else {
        Err(Error::InvalidOption {
            message: format!("{label} must be an ASCII character to use the byte-oriented lexer"),
        })
    }
}
