//! Tokenizers that turn a chunked character or byte stream into [`Token`](crate::token::Token)s.
//!
//! Two backends share the same contract (feed chunks, flush once, never reuse
//! after flush) and MUST produce the same token sequence for the same input:
//! - [`state_machine::Lexer`], the primary character-oriented resumable state
//!   machine described by the four-state table in the design.
//! - [`indexer`] + [`byte_lexer::ByteLexer`], a byte-oriented backend that
//!   substitutes a separator-offset scan for the per-character dispatch,
//!   suitable for a SIMD-accelerated or worker-parallel indexer.

pub mod byte_lexer;
pub mod indexer;
pub mod state_machine;

pub use byte_lexer::ByteLexer;
pub use state_machine::Lexer;

/// Counters a caller can log or export after a parse, mirroring what a
/// production lexer tracks about its own throughput and error rate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LexerStats {
    /// Tokens emitted so far.
    pub tokens_emitted: usize,
    /// Input units (chars for the text lexer, bytes for the byte lexer) consumed so far.
    pub units_consumed: usize,
    /// Records terminated so far (count of `RecordDelimiter` tokens emitted).
    pub records_terminated: usize,
}
