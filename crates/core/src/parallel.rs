//! A `rayon`-backed accelerated backend for fully-buffered input.
//!
//! Unlike [`crate::pipeline::Pipeline`], which is strictly sequential because
//! it must support a live, unbounded stream, this module only accepts input
//! that is already entirely in memory. That lets it split the input into
//! independent chunks on safe record boundaries and lex/assemble each chunk
//! on a separate `rayon` worker with no shared state between them, then
//! concatenate the per-chunk records back together in order.
//!
//! This is an acceleration strategy for one large buffered document, not a
//! replacement for running several independent [`Pipeline`](crate::pipeline::Pipeline)s
//! in parallel over several documents (which needs nothing from this module).

use crate::assembler::RecordAssembler;
use crate::error::Result;
use crate::lexer::Lexer;
use crate::options::{CsvOptions, HeaderSpec};
use crate::record::Record;
use rayon::prelude::*;

/// Splits `input` into chunks whose boundaries are never inside a quoted
/// field, and never split a `\r\n` pair, aiming for `target_chunk_bytes` each.
fn split_on_safe_boundaries(input: &str, quotation: char, target_chunk_bytes: usize) -> Vec<&str> {
    if input.len() <= target_chunk_bytes || target_chunk_bytes == 0 {
        return vec![input];
    }

    let bytes = input.as_bytes();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < bytes.len() {
        let mut end = (start + target_chunk_bytes).min(bytes.len());
        if end < bytes.len() {
            let mut in_quote = false;
            let mut scan = start;
            let mut last_safe_newline = None;
            while scan < bytes.len() {
                let b = bytes[scan];
                if b as char == quotation {
                    in_quote = !in_quote;
                } else if b == b'\n' && !in_quote {
                    if scan >= end {
                        last_safe_newline = Some(scan);
                        break;
                    }
                    last_safe_newline = Some(scan);
                }
                scan += 1;
            }
            end = match last_safe_newline {
                Some(newline) if newline + 1 > start => newline + 1,
                _ => bytes.len(),
            };
        }
        chunks.push(&input[start..end]);
        start = end;
    }
    chunks
}

/// Lexes and assembles `input` (already fully buffered) across a `rayon`
/// thread pool, splitting it into independent chunks of roughly
/// `target_chunk_bytes` each.
///
/// Every chunk gets its own fresh [`Lexer`] and [`RecordAssembler`]. When
/// `options.header` is [`HeaderSpec::AutoDetect`] and the input splits into
/// more than one chunk, only the first chunk auto-detects; its resolved
/// header is reused as a [`HeaderSpec::Fixed`] header for every later chunk,
/// so a header row never reappears as data and never gets rediscovered once
/// per chunk.
pub fn parse_buffered(options: &CsvOptions, input: &str, target_chunk_bytes: usize) -> Result<Vec<Record>> {
    options.validate()?;
    let chunks = split_on_safe_boundaries(input, options.quotation, target_chunk_bytes);

    let rest_options = if chunks.len() > 1 && matches!(options.header, HeaderSpec::AutoDetect) {
        let mut probe_lexer = Lexer::new(options);
        let mut probe_assembler = RecordAssembler::new(options);
        let tokens = probe_lexer.feed(Some(chunks[0]), true)?;
        probe_assembler.assemble(&tokens)?;
        probe_assembler.resolved_header().map(|header| {
            let mut rest = options.clone();
            rest.header = HeaderSpec::Fixed(header.to_vec());
            rest
        })
    } else {
        None
    };

    let per_chunk: Result<Vec<Vec<Record>>> = chunks
        .into_par_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let chunk_options = if index == 0 {
                options
            } else {
                rest_options.as_ref().unwrap_or(options)
            };
            let mut lexer = Lexer::new(chunk_options);
            let mut assembler = RecordAssembler::new(chunk_options);
            let tokens = lexer.feed(Some(chunk), false)?;
            let mut records = assembler.assemble(&tokens)?;
            records.extend(assembler.flush()?);
            Ok(records)
        })
        .collect();

    Ok(per_chunk?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::HeaderSpec;

    #[test]
    fn splits_preserve_every_record_when_headerless() {
        let mut opts = CsvOptions::default();
        opts.header = HeaderSpec::None;
        opts.output_format = crate::options::OutputFormat::Array;
        let input: String = (0..500).map(|i| format!("{i},{i}\n")).collect();
        let records = parse_buffered(&opts, &input, 256).unwrap();
        assert_eq!(records.len(), 500);
    }

    #[test]
    fn never_splits_inside_a_quoted_field() {
        let quoted = format!("\"{}\"", "x".repeat(300));
        let input = format!("{quoted},a\nb,c\n");
        let chunks = split_on_safe_boundaries(&input, '"', 100);
        for chunk in &chunks {
            assert_eq!(chunk.matches('"').count() % 2, 0);
        }
    }
}
