//! The Separator Indexer contract: a byte-offset scanner that a lexer backend
//! consumes instead of dispatching one input unit at a time.
//!
//! An indexer never interprets CSV structure (it does not resolve doubled
//! quotes or decide whether a `\r` belongs to a `\r\n` pair) — it only reports
//! where the bytes a lexer cares about occur, so that a lexer can bulk-copy
//! the runs of plain content between them. This is the seam a
//! SIMD-accelerated or otherwise vectorized scanner would be dropped into
//! without touching [`super::byte_lexer::ByteLexer`]'s state machine.

/// A byte this crate's grammar ever treats specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorKind {
    Delimiter,
    Quote,
    Lf,
    Cr,
}

/// One occurrence of a [`SeparatorKind`] byte, at its offset within the slice
/// passed to [`SeparatorIndexer::index`] (not an absolute stream offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separator {
    pub offset: usize,
    pub kind: SeparatorKind,
}

/// The result of indexing one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexResult {
    /// Every special-byte occurrence in the chunk, in ascending offset order.
    pub separators: Vec<Separator>,
    /// How many bytes of the chunk were scanned. Always `bytes.len()` for the
    /// scalar backend; a vectorized backend that scans in fixed-width lanes
    /// may stop short of the end and report the aligned prefix it covered.
    pub processed_bytes: usize,
    /// Whether an odd number of quote bytes had been seen, counting `prior`,
    /// by the time scanning stopped. A hint only: resolving doubled quotes
    /// and deciding field boundaries is still the lexer's job.
    pub end_in_quote: bool,
}

/// A backend that locates delimiter/quote/CR/LF bytes in a chunk.
///
/// Implementations must require single-byte ASCII `delimiter` and
/// `quotation`; anything wider cannot be scanned without re-deriving the
/// character-level state machine, which defeats the point of this backend.
pub trait SeparatorIndexer {
    fn index(&self, bytes: &[u8], prior_in_quote: bool, delimiter: u8, quotation: u8) -> IndexResult;
}

/// A plain scalar loop over the bytes. Functionally complete; a vectorized
/// implementation (e.g. one built on `memchr` or explicit SIMD lanes) is a
/// drop-in replacement behind the same trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarIndexer;

impl SeparatorIndexer for ScalarIndexer {
    fn index(&self, bytes: &[u8], prior_in_quote: bool, delimiter: u8, quotation: u8) -> IndexResult {
        let mut separators = Vec::new();
        let mut in_quote = prior_in_quote;
        for (offset, &byte) in bytes.iter().enumerate() {
            let kind = if byte == quotation {
                in_quote = !in_quote;
                Some(SeparatorKind::Quote)
            } else if byte == delimiter {
                Some(SeparatorKind::Delimiter)
            } else if byte == b'\n' {
                Some(SeparatorKind::Lf)
            } else if byte == b'\r' {
                Some(SeparatorKind::Cr)
            } else {
                None
            };
            if let Some(kind) = kind {
                separators.push(Separator { offset, kind });
            }
        }
        IndexResult {
            separators,
            processed_bytes: bytes.len(),
            end_in_quote: in_quote,
        }
    }
}
