//! Token and location types produced by the lexer and consumed by the assembler.

/// A single point in the input stream.
///
/// `offset` is in input units consumed up to that point: characters for the
/// character-oriented lexer, bytes for the byte-oriented one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number, reset to 1 immediately after every `\n`.
    pub column: usize,
    /// Input units consumed up to (and not including) this position.
    pub offset: usize,
}

impl Position {
    /// The position at the very start of a fresh stream.
    pub fn start() -> Self {
        Position {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    fn advance(&mut self, ch: char) {
        self.offset += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

/// The span a token occupies, plus the 1-based row it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub start: Position,
    pub end: Position,
    pub row_number: usize,
}

/// Which end-of-line sequence terminated a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eol {
    Lf,
    CrLf,
}

/// A single lexical unit produced by the lexer, in input order.
///
/// The lexer never emits two consecutive `Field` tokens: a field that spans
/// several `lex` calls is held in the internal buffer and surfaces as one
/// `Field` token covering the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Field(String),
    FieldDelimiter,
    RecordDelimiter(Eol),
}

/// A token paired with the location it was produced at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub location: Location,
}

/// Tracks line/column/offset/row as code points are consumed, independent of
/// which lexer backend is doing the consuming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub position: Position,
    pub row_number: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Cursor {
            position: Position::start(),
            row_number: 1,
        }
    }

    pub fn consume(&mut self, ch: char) {
        self.position.advance(ch);
    }

    pub fn next_row(&mut self) {
        self.row_number += 1;
    }
}
