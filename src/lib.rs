//! # csvstream
//!
//! A streaming RFC 4180 CSV lexer, record assembler, and backpressure-aware
//! pipeline.
//!
//! ```rust
//! use csvstream::{CsvOptions, Pipeline};
//!
//! let opts = CsvOptions::default();
//! let mut pipeline = Pipeline::new(&opts);
//! let mut records = pipeline.transform("a,b\n1,2\n").unwrap();
//! records.extend(pipeline.flush().unwrap());
//! assert_eq!(records[0].get("a"), Some("1"));
//! ```

// Re-export the core lexer/assembler/pipeline types.
pub use csvstream_core::{
    parse_binary, AssemblerStats, ByteLexer, CancelKind, CancellationToken, ColumnCountStrategy,
    CsvOptions, Eol, Error, ErrorKind, Header, HeaderSpec, Lexer, LexerStats, Location,
    OutputFormat, Pipeline, PipelineOptions, Position, Record, RecordAssembler, Result,
    SpannedToken, Token,
};

/// The `rayon`-backed buffered backend, for input that is already fully in memory.
#[cfg(feature = "rayon")]
pub use csvstream_core::parallel;

/// The `tokio`-backed async adapter.
#[cfg(feature = "async")]
pub use csvstream_core::r#async;

/// JSON interop for [`Record`] and [`CsvOptions`].
#[cfg(feature = "serde")]
pub use csvstream_serde::*;
