//! Chunk-independent, resumable CSV lexing, record assembly, and a streaming
//! pipeline that ties the two together with backpressure and cancellation.
//!
//! The crate is organized the way it is driven:
//! - [`token`] — the token/location vocabulary shared by every stage.
//! - [`options`] — [`options::CsvOptions`], validated once up front.
//! - [`lexer`] — turns chunks into tokens; two interchangeable backends.
//! - [`assembler`] — turns tokens into [`record::Record`]s.
//! - [`pipeline`] — wires a lexer and assembler into a single push/pull
//!   transform with backpressure and cooperative cancellation.
//! - [`binary`] — a one-shot entry point for a fully-buffered byte input,
//!   enforcing `maxBinarySize` before lexing starts.
//! - [`error`] — the fatal error taxonomy shared by all of the above.

pub mod assembler;
pub mod binary;
pub mod error;
pub mod lexer;
pub mod options;
pub mod pipeline;
pub mod record;
pub mod token;

pub use assembler::{AssemblerStats, RecordAssembler};
pub use binary::parse_binary;
pub use error::{CancelKind, Error, ErrorKind, Result};
pub use lexer::{ByteLexer, Lexer, LexerStats};
pub use options::{ColumnCountStrategy, CsvOptions, HeaderSpec, OutputFormat};
pub use pipeline::{CancellationToken, Pipeline, PipelineOptions};
pub use record::{Header, Record};
pub use token::{Eol, Location, Position, SpannedToken, Token};

#[cfg(feature = "rayon")]
pub mod parallel;

#[cfg(feature = "async")]
pub mod r#async;
