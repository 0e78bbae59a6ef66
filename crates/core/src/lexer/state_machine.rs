//! The primary, character-oriented resumable lexer.
//!
//! Implements the four-state table directly: `FieldStart`, `InUnquoted`,
//! `InQuoted`, `QuoteSeen`. A caller drives it by repeatedly calling
//! [`Lexer::feed`] with `stream: true` for every chunk but the last, then once
//! more with `stream: false` (or [`Lexer::finish_stream`]) to drain the
//! trailing field/record and catch an unterminated quoted field.

use crate::error::{Error, Result};
use crate::lexer::LexerStats;
use crate::options::CsvOptions;
use crate::token::{Cursor, Eol, Location, Position, SpannedToken, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    FieldStart,
    InUnquoted,
    InQuoted,
    QuoteSeen,
}

/// A resumable, chunk-independent CSV lexer over `&str` input.
///
/// `\r` immediately followed by `\n` is always one `RecordDelimiter(Eol::CrLf)`
/// token; a `\r` not followed by `\n` is ordinary data everywhere except right
/// after a closing quote, where it is malformed input. When a chunk ends on an
/// unresolved `\r`, the decision is deferred to the next [`Lexer::feed`] call
/// rather than guessed.
#[derive(Debug, Clone)]
pub struct Lexer {
    delimiter: char,
    quotation: char,
    max_buffer_size: usize,
    source: String,

    state: State,
    cursor: Cursor,
    field_buf: String,
    buffered_units: usize,
    field_start: Position,
    awaiting_field: bool,
    pending_cr: bool,
    pending_cr_start: Position,
    started: bool,
    ignore_bom: bool,
    drained: bool,

    stats: LexerStats,
}

impl Lexer {
    /// Builds a lexer from already-validated options.
    ///
    /// Call [`CsvOptions::validate`] first; this constructor trusts its caller
    /// and never itself returns [`Error::InvalidOption`].
    pub fn new(options: &CsvOptions) -> Self {
        Lexer {
            delimiter: options.delimiter,
            quotation: options.quotation,
            max_buffer_size: options.max_buffer_size,
            source: options.source.clone(),
            state: State::FieldStart,
            cursor: Cursor::new(),
            field_buf: String::new(),
            buffered_units: 0,
            field_start: Position::start(),
            awaiting_field: false,
            pending_cr: false,
            pending_cr_start: Position::start(),
            started: false,
            ignore_bom: options.ignore_bom,
            drained: false,
            stats: LexerStats::default(),
        }
    }

    /// Counters accumulated since construction or the last [`Lexer::reset`].
    pub fn stats(&self) -> LexerStats {
        self.stats
    }

    /// Clears buffered state and counters back to construction-time defaults.
    /// Configuration (delimiter, quotation, limits, source label) is kept.
    pub fn reset(&mut self) {
        self.state = State::FieldStart;
        self.cursor = Cursor::new();
        self.field_buf.clear();
        self.buffered_units = 0;
        self.field_start = Position::start();
        self.awaiting_field = false;
        self.pending_cr = false;
        self.pending_cr_start = Position::start();
        self.started = false;
        self.drained = false;
        self.stats = LexerStats::default();
    }

    /// Feeds one chunk (or, with `chunk: None`, nothing) and lexes as much of
    /// it as is unambiguous. `stream: false` drains the trailing field/record
    /// and marks the lexer drained; a further call then errors.
    pub fn feed(&mut self, chunk: Option<&str>, stream: bool) -> Result<Vec<SpannedToken>> {
        if self.drained {
            return Err(self.err(Error::ParseError {
                message: "lexer fed after it was already drained".to_string(),
                location: self.here(),
                source: None,
            }));
        }

        let mut tokens = Vec::new();

        if let Some(chunk) = chunk {
            let chunk = self.strip_bom(chunk);
            let mut chars = chunk.chars().peekable();

            if self.pending_cr {
                self.pending_cr = false;
                match chars.peek().copied() {
                    Some('\n') => {
                        chars.next();
                        self.consume('\n');
                        self.finish_record(&mut tokens, Eol::CrLf, self.pending_cr_start)?;
                    }
                    Some(_) => self.dispatch('\r', self.pending_cr_start, &mut tokens)?,
                    None => self.pending_cr = true,
                }
                self.check_buffer_budget()?;
            }

            while let Some(ch) = chars.next() {
                if ch == '\r' && self.state != State::InQuoted {
                    let start = self.consume('\r');
                    match chars.peek().copied() {
                        Some('\n') => {
                            chars.next();
                            self.consume('\n');
                            self.finish_record(&mut tokens, Eol::CrLf, start)?;
                        }
                        Some(_) => self.dispatch('\r', start, &mut tokens)?,
                        None if stream => {
                            self.pending_cr = true;
                            self.pending_cr_start = start;
                        }
                        None => self.dispatch('\r', start, &mut tokens)?,
                    }
                } else {
                    let start = self.consume(ch);
                    self.dispatch(ch, start, &mut tokens)?;
                }
                self.check_buffer_budget()?;
            }
        }

        if !stream {
            if self.pending_cr {
                self.pending_cr = false;
                self.dispatch('\r', self.pending_cr_start, &mut tokens)?;
            }
            self.finish(&mut tokens)?;
            self.drained = true;
        }

        self.stats.tokens_emitted += tokens.len();
        Ok(tokens)
    }

    /// Equivalent to `feed(None, false)`: drains without supplying more input.
    pub fn finish_stream(&mut self) -> Result<Vec<SpannedToken>> {
        self.feed(None, false)
    }

    fn strip_bom<'a>(&mut self, chunk: &'a str) -> &'a str {
        if !self.started {
            self.started = true;
            if !self.ignore_bom {
                if let Some(rest) = chunk.strip_prefix('\u{FEFF}') {
                    self.cursor.consume('\u{FEFF}');
                    self.field_start = self.cursor.position;
                    return rest;
                }
            }
        }
        chunk
    }

    /// Advances the cursor past `ch` and returns the position it was at
    /// beforehand, i.e. the position `ch` itself occupies.
    fn consume(&mut self, ch: char) -> Position {
        let before = self.cursor.position;
        self.cursor.consume(ch);
        self.stats.units_consumed += 1;
        before
    }

    fn here(&self) -> Location {
        Location {
            start: self.cursor.position,
            end: self.cursor.position,
            row_number: self.cursor.row_number,
        }
    }

    fn err(&self, error: Error) -> Error {
        if self.source.is_empty() {
            error
        } else {
            error.with_source(&self.source)
        }
    }

    fn dispatch(&mut self, ch: char, pos_before: Position, tokens: &mut Vec<SpannedToken>) -> Result<()> {
        let pos_after = self.cursor.position;

        match self.state {
            State::FieldStart => {
                if ch == self.quotation {
                    self.state = State::InQuoted;
                } else if ch == self.delimiter {
                    self.emit_field(tokens, pos_before);
                    self.emit_field_delimiter(tokens, pos_before, pos_after);
                } else if ch == '\n' {
                    self.emit_field(tokens, pos_before);
                    self.emit_record_delimiter(tokens, Eol::Lf, pos_before, pos_after);
                } else {
                    self.push(ch);
                    self.state = State::InUnquoted;
                }
            }
            State::InUnquoted => {
                if ch == self.delimiter {
                    self.emit_field(tokens, pos_before);
                    self.emit_field_delimiter(tokens, pos_before, pos_after);
                } else if ch == '\n' {
                    self.emit_field(tokens, pos_before);
                    self.emit_record_delimiter(tokens, Eol::Lf, pos_before, pos_after);
                } else {
                    self.push(ch);
                }
            }
            State::InQuoted => {
                if ch == self.quotation {
                    self.state = State::QuoteSeen;
                } else {
                    self.push(ch);
                }
            }
            State::QuoteSeen => {
                if ch == self.quotation {
                    self.push(ch);
                    self.state = State::InQuoted;
                } else if ch == self.delimiter {
                    self.emit_field(tokens, pos_before);
                    self.emit_field_delimiter(tokens, pos_before, pos_after);
                } else if ch == '\n' {
                    self.emit_field(tokens, pos_before);
                    self.emit_record_delimiter(tokens, Eol::Lf, pos_before, pos_after);
                } else {
                    return Err(self.err(Error::UnexpectedCharacterAfterQuote {
                        found: ch,
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

    fn push(&mut self, ch: char) {
        self.field_buf.push(ch);
        self.buffered_units += 1;
    }

    fn emit_field(&mut self, tokens: &mut Vec<SpannedToken>, end: Position) {
        let value = std::mem::take(&mut self.field_buf);
        self.buffered_units = 0;
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
            location: Location {
                start,
                end,
                row_number,
            },
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
        let held = self.buffered_units + usize::from(self.pending_cr);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token::*;

    fn lex_all(options: &CsvOptions, input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(options);
        let mut tokens = lexer.feed(Some(input), false).unwrap();
        tokens.drain(..).map(|t| t.token).collect()
    }

    fn lex_chunks(options: &CsvOptions, chunks: &[&str]) -> Vec<Token> {
        let mut lexer = Lexer::new(options);
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(lexer.feed(Some(chunk), true).unwrap().into_iter().map(|t| t.token));
        }
        out.extend(lexer.feed(None, false).unwrap().into_iter().map(|t| t.token));
        out
    }

    #[test]
    fn simple_unquoted_record() {
        let opts = CsvOptions::default();
        let tokens = lex_all(&opts, "a,b,c\n");
        assert_eq!(
            tokens,
            vec![
                Field("a".into()),
                FieldDelimiter,
                Field("b".into()),
                FieldDelimiter,
                Field("c".into()),
                RecordDelimiter(Eol::Lf),
            ]
        );
    }

    #[test]
    fn trailing_eol_does_not_emit_extra_empty_record() {
        let opts = CsvOptions::default();
        let tokens = lex_all(&opts, "a,b\n");
        assert_eq!(tokens.iter().filter(|t| matches!(t, RecordDelimiter(_))).count(), 1);
        assert!(!matches!(tokens.last(), Some(Field(f)) if f.is_empty()));
    }

    #[test]
    fn no_trailing_eol_still_closes_last_field() {
        let opts = CsvOptions::default();
        let tokens = lex_all(&opts, "abc");
        assert_eq!(tokens, vec![Field("abc".into())]);
    }

    #[test]
    fn trailing_delimiter_emits_empty_last_field() {
        let opts = CsvOptions::default();
        let tokens = lex_all(&opts, "a,b,");
        assert_eq!(
            tokens,
            vec![
                Field("a".into()),
                FieldDelimiter,
                Field("b".into()),
                FieldDelimiter,
                Field("".into()),
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        let opts = CsvOptions::default();
        assert_eq!(lex_all(&opts, ""), Vec::<Token>::new());
    }

    #[test]
    fn quoted_field_with_escaped_quote_and_embedded_delimiter() {
        let opts = CsvOptions::default();
        let tokens = lex_all(&opts, "\"a,\"\"b\"\"\",c\n");
        assert_eq!(
            tokens,
            vec![
                Field("a,\"b\"".into()),
                FieldDelimiter,
                Field("c".into()),
                RecordDelimiter(Eol::Lf),
            ]
        );
    }

    #[test]
    fn crlf_is_a_single_record_delimiter() {
        let opts = CsvOptions::default();
        let tokens = lex_all(&opts, "a,b\r\nc,d\r\n");
        assert_eq!(
            tokens,
            vec![
                Field("a".into()),
                FieldDelimiter,
                Field("b".into()),
                RecordDelimiter(Eol::CrLf),
                Field("c".into()),
                FieldDelimiter,
                Field("d".into()),
                RecordDelimiter(Eol::CrLf),
            ]
        );
    }

    #[test]
    fn crlf_split_exactly_at_chunk_boundary() {
        let opts = CsvOptions::default();
        let tokens = lex_chunks(&opts, &["a,b\r", "\nc"]);
        assert_eq!(
            tokens,
            vec![
                Field("a".into()),
                FieldDelimiter,
                Field("b".into()),
                RecordDelimiter(Eol::CrLf),
                Field("c".into()),
            ]
        );
    }

    #[test]
    fn bare_cr_not_followed_by_lf_is_field_content() {
        let opts = CsvOptions::default();
        let tokens = lex_all(&opts, "a\rb,c\n");
        assert_eq!(
            tokens,
            vec![
                Field("a\rb".into()),
                FieldDelimiter,
                Field("c".into()),
                RecordDelimiter(Eol::Lf),
            ]
        );
    }

    #[test]
    fn bare_cr_at_true_end_of_stream_is_field_content() {
        let opts = CsvOptions::default();
        let tokens = lex_chunks(&opts, &["a,b\r"]);
        assert_eq!(
            tokens,
            vec![Field("a".into()), FieldDelimiter, Field("b\r".into())]
        );
    }

    #[test]
    fn bare_cr_right_after_closing_quote_is_an_error() {
        let opts = CsvOptions::default();
        let mut lexer = Lexer::new(&opts);
        let err = lexer.feed(Some("\"a\"\rb\n"), false).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnexpectedCharacterAfterQuote);
    }

    #[test]
    fn character_after_closing_quote_other_than_delimiter_or_eol_is_an_error() {
        let opts = CsvOptions::default();
        let mut lexer = Lexer::new(&opts);
        let err = lexer.feed(Some("\"a\"b,c\n"), false).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnexpectedCharacterAfterQuote);
    }

    #[test]
    fn unterminated_quoted_field_errors_on_drain() {
        let opts = CsvOptions::default();
        let mut lexer = Lexer::new(&opts);
        lexer.feed(Some("\"abc"), true).unwrap();
        let err = lexer.feed(None, false).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnexpectedEofInQuotedField);
    }

    #[test]
    fn field_split_across_many_chunks_is_one_token() {
        let opts = CsvOptions::default();
        let tokens = lex_chunks(&opts, &["a", "b", "c", ",", "d"]);
        assert_eq!(
            tokens,
            vec![Field("abc".into()), FieldDelimiter, Field("d".into())]
        );
    }

    #[test]
    fn quoted_field_split_across_chunks_with_doubled_quote_straddling() {
        let opts = CsvOptions::default();
        let tokens = lex_chunks(&opts, &["\"a\"", "\"b\""]);
        assert_eq!(tokens, vec![Field("a\"b".into())]);
    }

    #[test]
    fn leading_bom_is_stripped_by_default() {
        let opts = CsvOptions::default();
        let tokens = lex_all(&opts, "\u{FEFF}a,b\n");
        assert_eq!(
            tokens,
            vec![
                Field("a".into()),
                FieldDelimiter,
                Field("b".into()),
                RecordDelimiter(Eol::Lf),
            ]
        );
    }

    #[test]
    fn leading_bom_is_kept_as_data_when_ignore_bom_is_set() {
        let mut opts = CsvOptions::default();
        opts.ignore_bom = true;
        let tokens = lex_all(&opts, "\u{FEFF}a\n");
        assert_eq!(tokens, vec![Field("\u{FEFF}a".into()), RecordDelimiter(Eol::Lf)]);
    }

    #[test]
    fn buffer_overflow_is_fatal() {
        let mut opts = CsvOptions::default();
        opts.max_buffer_size = 4;
        let mut lexer = Lexer::new(&opts);
        let err = lexer.feed(Some("abcdefgh"), false).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BufferOverflow);
    }

    #[test]
    fn reset_returns_lexer_to_construction_defaults() {
        let opts = CsvOptions::default();
        let mut lexer = Lexer::new(&opts);
        lexer.feed(Some("a,b\n"), false).unwrap();
        lexer.reset();
        let tokens = lexer.feed(Some("c,d\n"), false).unwrap();
        assert_eq!(
            tokens.into_iter().map(|t| t.token).collect::<Vec<_>>(),
            vec![
                Field("c".into()),
                FieldDelimiter,
                Field("d".into()),
                RecordDelimiter(Eol::Lf),
            ]
        );
    }
}
