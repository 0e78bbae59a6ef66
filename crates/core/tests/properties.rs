//! Property-based tests: chunk independence, location monotonicity, and
//! header-arity invariants, run over randomly generated CSV-shaped input.

use csvstream_core::{ColumnCountStrategy, CsvOptions, HeaderSpec, OutputFormat, Pipeline, Token};
use proptest::prelude::*;

/// Builds a plausible (not necessarily RFC-clean) CSV document out of a grid
/// of plain alphanumeric field values, each row terminated by `\n`.
fn build_csv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn arb_field() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{0,6}"
}

fn arb_rows() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(arb_field(), 1..5), 1..12)
}

/// Splits `input` at `n` arbitrary byte offsets, respecting UTF-8 boundaries.
fn split_at_offsets(input: &str, offsets: &[usize]) -> Vec<String> {
    let mut cuts: Vec<usize> = offsets
        .iter()
        .map(|&o| {
            let o = o % (input.len() + 1);
            (0..=o).rev().find(|&i| input.is_char_boundary(i)).unwrap_or(0)
        })
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    cuts.retain(|&c| c != 0 && c != input.len());

    let mut pieces = Vec::new();
    let mut start = 0;
    for cut in cuts {
        pieces.push(input[start..cut].to_string());
        start = cut;
    }
    pieces.push(input[start..].to_string());
    pieces
}

fn parse_whole(opts: &CsvOptions, input: &str) -> Vec<csvstream_core::Record> {
    let mut pipeline = Pipeline::new(opts);
    let mut records = pipeline.transform(input).unwrap();
    records.extend(pipeline.flush().unwrap());
    records
}

fn parse_in_pieces(opts: &CsvOptions, pieces: &[String]) -> Vec<csvstream_core::Record> {
    let mut pipeline = Pipeline::new(opts);
    let mut records = Vec::new();
    for piece in pieces {
        records.extend(pipeline.transform(piece).unwrap());
    }
    records.extend(pipeline.flush().unwrap());
    records
}

proptest! {
    /// Any partition of the same input into chunks yields the same records
    /// as parsing it whole (`§8` chunk-independence law).
    #[test]
    fn chunk_independence_holds(rows in arb_rows(), offsets in prop::collection::vec(any::<usize>(), 0..6)) {
        let mut opts = CsvOptions::default();
        opts.header = HeaderSpec::None;
        opts.output_format = OutputFormat::Array;
        let input = build_csv(&rows);

        let whole = parse_whole(&opts, &input);
        let pieces = split_at_offsets(&input, &offsets);
        let chunked = parse_in_pieces(&opts, &pieces);

        prop_assert_eq!(whole, chunked);
    }

    /// Token offsets never decrease, row numbers increase by exactly one per
    /// `RecordDelimiter`, and column resets to 1 right after every `\n`.
    #[test]
    fn location_monotonicity_holds(rows in arb_rows()) {
        let mut opts = CsvOptions::default();
        opts.header = HeaderSpec::None;
        let input = build_csv(&rows);

        let mut lexer = csvstream_core::Lexer::new(&opts);
        let tokens = lexer.feed(Some(&input), false).unwrap();

        let mut last_offset = 0usize;
        let mut last_row = 1usize;
        for spanned in &tokens {
            prop_assert!(spanned.location.start.offset >= last_offset);
            prop_assert!(spanned.location.end.offset >= spanned.location.start.offset);
            last_offset = spanned.location.end.offset;

            prop_assert!(spanned.location.row_number >= last_row);
            if let Token::RecordDelimiter(_) = spanned.token {
                prop_assert_eq!(spanned.location.row_number, last_row);
                last_row += 1;
            }
        }
    }

    /// Under `strict`/`pad`/`truncate`, every object record has exactly
    /// `|header|` keys; under `keep`, arity is never inflated beyond the row.
    #[test]
    fn header_arity_invariant_holds(rows in arb_rows()) {
        let header_len = rows[0].len();
        for strategy in [ColumnCountStrategy::Pad, ColumnCountStrategy::Strict, ColumnCountStrategy::Truncate] {
            // Build a document where every row matches the first row's arity,
            // so pad/strict/truncate never trip a fatal mismatch.
            let uniform: Vec<Vec<String>> = rows.iter().map(|r| {
                let mut r = r.clone();
                r.resize(header_len, "x".to_string());
                r
            }).collect();
            let input = build_csv(&uniform);

            let mut opts = CsvOptions::default();
            opts.column_count_strategy = strategy;
            let records = parse_whole(&opts, &input);

            for record in &records {
                prop_assert_eq!(record.arity(), header_len);
            }
        }
    }
}

#[cfg(test)]
mod quickcheck_tests {
    use super::*;
    use quickcheck::{Gen, QuickCheck};

    #[derive(Clone, Debug)]
    struct PlainField(String);

    impl quickcheck::Arbitrary for PlainField {
        fn arbitrary(g: &mut Gen) -> Self {
            let len = <usize as quickcheck::Arbitrary>::arbitrary(g) % 6;
            let alphabet: Vec<char> = "abcdefghij0123456789".chars().collect();
            let s: String = (0..len)
                .map(|_| *g.choose(&alphabet).unwrap())
                .collect();
            PlainField(s)
        }
    }

    /// Headerless `keep`-mode round trip: every emitted array record's values
    /// equal the original row's fields, in order.
    fn keep_mode_preserves_field_values(rows: Vec<Vec<PlainField>>) -> bool {
        if rows.is_empty() || rows.iter().any(|r| r.is_empty()) {
            return true;
        }
        let grid: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|f| f.0.clone()).collect())
            .collect();
        let input = build_csv(&grid);

        let mut opts = CsvOptions::default();
        opts.header = HeaderSpec::None;
        opts.output_format = OutputFormat::Array;
        let records = parse_whole(&opts, &input);

        records.len() == grid.len()
            && records
                .iter()
                .zip(grid.iter())
                .all(|(record, row)| record.values() == row.as_slice())
    }

    #[test]
    fn keep_mode_round_trips_via_quickcheck() {
        QuickCheck::new()
            .tests(200)
            .quickcheck(keep_mode_preserves_field_values as fn(Vec<Vec<PlainField>>) -> bool);
    }
}
