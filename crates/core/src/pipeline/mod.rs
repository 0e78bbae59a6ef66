//! A push/pull streaming transform wiring a [`Lexer`] and a
//! [`RecordAssembler`] together with backpressure and cancellation.
//!
//! A single [`Pipeline`] is strictly sequential: `transform` calls must come
//! from one caller in order, and `flush` is called exactly once at the end.
//! Running several independent `Pipeline`s concurrently (one per input) is
//! fine — nothing here is shared across instances.

mod cancellation;

pub use cancellation::CancellationToken;

use crate::assembler::RecordAssembler;
use crate::error::Result;
use crate::lexer::Lexer;
use crate::options::CsvOptions;
use crate::record::Record;
use crate::token::SpannedToken;

/// Tunables for how often a [`Pipeline`] checks for cancellation and consumer
/// backpressure while draining one batch of tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Tokens assembled between backpressure/cancellation checks.
    pub emission_budget: usize,
    /// Emission-budget slices between a cooperative yield, independent of
    /// whether the consumer is saturated.
    pub yield_interval: usize,
    /// Upper bound a caller-supplied queue should enforce on buffered input
    /// bytes before it is considered saturated. Informational: the pipeline
    /// itself does not buffer input.
    pub max_queued_bytes: usize,
    /// Same, for buffered lexer tokens awaiting assembly.
    pub max_queued_lexer_tokens: usize,
    /// Same, for tokens buffered downstream of the lexer by a consumer.
    pub max_queued_pending_tokens: usize,
    /// Same, for assembled records awaiting consumption.
    pub max_queued_records: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            emission_budget: 100,
            yield_interval: 10,
            max_queued_bytes: 64 * 1024,
            max_queued_lexer_tokens: 1024,
            max_queued_pending_tokens: 1024,
            max_queued_records: 256,
        }
    }
}

/// A streaming CSV transform: feed it chunks via [`Pipeline::transform`], then
/// call [`Pipeline::flush`] exactly once.
///
/// The consumer-saturation check (set via
/// [`Pipeline::set_consumer_saturation_check`]) lets a caller plug in real
/// queue-depth backpressure; without one, the pipeline still yields
/// cooperatively on [`PipelineOptions::yield_interval`] and still honors
/// cancellation, it just never blocks waiting on a consumer.
pub struct Pipeline {
    lexer: Lexer,
    assembler: RecordAssembler,
    cancellation: CancellationToken,
    options: PipelineOptions,
    consumer_saturated: Option<Box<dyn FnMut() -> bool + Send>>,
    slices_since_yield: usize,
}

impl Pipeline {
    /// Builds a pipeline from already-validated options. Call
    /// [`CsvOptions::validate`] first.
    pub fn new(options: &CsvOptions) -> Self {
        Pipeline {
            lexer: Lexer::new(options),
            assembler: RecordAssembler::new(options),
            cancellation: CancellationToken::new(),
            options: PipelineOptions::default(),
            consumer_saturated: None,
            slices_since_yield: 0,
        }
    }

    pub fn with_pipeline_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Registers a callback the pipeline polls between emission-budget
    /// slices; while it returns `true` the pipeline cooperatively yields
    /// instead of assembling more tokens.
    pub fn set_consumer_saturation_check(&mut self, check: impl FnMut() -> bool + Send + 'static) {
        self.consumer_saturated = Some(Box::new(check));
    }

    pub fn lexer_stats(&self) -> crate::lexer::LexerStats {
        self.lexer.stats()
    }

    pub fn assembler_stats(&self) -> crate::assembler::AssemblerStats {
        self.assembler.stats()
    }

    /// Lexes and assembles one chunk. Output for a given total input does not
    /// depend on how it was split into chunks.
    pub fn transform(&mut self, chunk: &str) -> Result<Vec<Record>> {
        self.cancellation.check()?;
        let tokens = self.lexer.feed(Some(chunk), true)?;
        self.drain(&tokens)
    }

    /// Drains the lexer's trailing field/record and the assembler's trailing
    /// row. Call exactly once, after the last [`Pipeline::transform`] call.
    pub fn flush(&mut self) -> Result<Vec<Record>> {
        self.cancellation.check()?;
        let tokens = self.lexer.feed(None, false)?;
        let mut records = self.drain(&tokens)?;
        records.extend(self.assembler.flush()?);
        Ok(records)
    }

    fn drain(&mut self, tokens: &[SpannedToken]) -> Result<Vec<Record>> {
        let budget = self.options.emission_budget.max(1);
        let mut records = Vec::new();
        for slice in tokens.chunks(budget) {
            records.extend(self.assembler.assemble(slice)?);

            if let Some(check) = self.consumer_saturated.as_mut() {
                while check() {
                    std::thread::yield_now();
                }
            }

            self.slices_since_yield += 1;
            if self.slices_since_yield >= self.options.yield_interval {
                self.slices_since_yield = 0;
                std::thread::yield_now();
            }

            self.cancellation.check()?;
        }
        Ok(records)
    }
}
