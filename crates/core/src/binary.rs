//! A one-shot entry point for a fully-buffered binary (byte) input.
//!
//! Mirrors the teacher's top-level `parse`/`parse_with_options` free
//! functions: validate, construct, run once, return — no resumable state to
//! manage across calls the way [`crate::pipeline::Pipeline`] has to. The one
//! thing this adds over wiring [`ByteLexer`] and [`RecordAssembler`] together
//! by hand is enforcing `maxBinarySize` up front, before a single byte is
//! lexed.

use crate::assembler::RecordAssembler;
use crate::error::{Error, Result};
use crate::lexer::ByteLexer;
use crate::options::CsvOptions;
use crate::record::Record;

/// Parses a complete, already-buffered byte slice in one call.
///
/// Raises [`Error::BinarySizeExceeded`] before any lexing begins if `input`
/// is longer than `options.max_binary_size`.
pub fn parse_binary(options: &CsvOptions, input: &[u8]) -> Result<Vec<Record>> {
    options.validate()?;

    if let Some(limit) = options.max_binary_size {
        if input.len() > limit {
            return Err(binary_size_error(options, limit, input.len()));
        }
    }

    let mut lexer = ByteLexer::new(options)?;
    let mut assembler = RecordAssembler::new(options);

    let tokens = lexer.feed(Some(input), false)?;
    let mut records = assembler.assemble(&tokens)?;
    records.extend(assembler.flush()?);
    Ok(records)
}

fn binary_size_error(options: &CsvOptions, limit: usize, actual: usize) -> Error {
    let error = Error::BinarySizeExceeded {
        limit,
        actual,
        source: None,
    };
    if options.source.is_empty() {
        error
    } else {
        error.with_source(&options.source)
    }
}
