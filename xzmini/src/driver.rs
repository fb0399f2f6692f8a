//! The streaming driver.
//!
//! [`StreamDriver`] moves bytes from a [`ByteSource`] through a
//! [`DecoderEngine`] into a [`ByteSink`] using two fixed-capacity staging
//! buffers. Each iteration:
//!
//! 1. refills the input stage from the source once it is drained,
//! 2. steps the engine,
//! 3. flushes the output stage to the sink once it is full,
//! 4. classifies the engine status and continues, warns, finishes or fails.
//!
//! On every way out of the loop the remaining output is flushed first, then
//! the engine is dropped, then the result is reported.

use crate::config::{CheckPolicy, DecoderConfig};
use crate::outcome::{Outcome, classify};
use crate::stage::{InputStage, OutputStage, step_engine};
use log::{debug, warn};
use xzmini_core::error::{Result, XzError};
use xzmini_core::traits::{DecodeWarning, DecoderEngine};
use xzmini_core::transfer::{ByteSink, ByteSource};

/// Consecutive idle `Progress` steps on exhausted input before the engine is
/// considered broken.
pub const STALL_LIMIT: u32 = 4;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decompressed {
    /// Bytes written to the sink.
    pub written: usize,
    /// Warnings reported while decoding.
    pub warnings: Vec<DecodeWarning>,
}

/// Drives one engine over one source and one sink.
#[derive(Debug)]
pub struct StreamDriver<E: DecoderEngine> {
    engine: E,
    input: InputStage,
    output: OutputStage,
    check_policy: CheckPolicy,
}

impl<E: DecoderEngine> StreamDriver<E> {
    /// Create a driver with the staging capacities and check policy of
    /// `config`.
    pub fn new(engine: E, config: &DecoderConfig) -> Self {
        Self {
            engine,
            input: InputStage::with_capacity(config.input_capacity()),
            output: OutputStage::with_capacity(config.output_capacity()),
            check_policy: config.check_policy,
        }
    }

    /// Decode everything `source` holds into `sink`.
    pub fn run<S, K>(self, source: &S, sink: &mut K) -> Result<Decompressed>
    where
        S: ByteSource + ?Sized,
        K: ByteSink + ?Sized,
    {
        self.run_observed(source, sink, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_warning` as each warning is
    /// reported.
    pub fn run_observed<S, K, F>(
        self,
        source: &S,
        sink: &mut K,
        mut on_warning: F,
    ) -> Result<Decompressed>
    where
        S: ByteSource + ?Sized,
        K: ByteSink + ?Sized,
        F: FnMut(&DecodeWarning),
    {
        let Self {
            mut engine,
            mut input,
            mut output,
            check_policy,
        } = self;

        let source_len = source.total_len();
        let mut source_offset = 0;
        let mut sink_offset = 0;
        let mut warnings = Vec::new();
        let mut idle_steps = 0;

        let terminal = loop {
            if input.is_drained() {
                source_offset += input.refill(source, source_offset);
            }

            let pending = input.pending().len();
            let filled = output.filled().len();
            let status = step_engine(&mut engine, &mut input, &mut output);
            let moved = input.pending().len() != pending || output.filled().len() != filled;

            if output.is_full() {
                match output.flush(sink, sink_offset) {
                    Ok(n) => sink_offset += n,
                    Err(err) => break Err(err),
                }
            }

            match classify(status, check_policy) {
                Outcome::Continue => {
                    let exhausted = input.is_drained() && source_offset >= source_len;
                    idle_steps = if moved || !exhausted { 0 } else { idle_steps + 1 };
                    if idle_steps >= STALL_LIMIT {
                        break Err(XzError::Internal);
                    }
                }
                Outcome::Warn(warning) => {
                    warn!("{}", warning);
                    on_warning(&warning);
                    warnings.push(warning);
                    idle_steps = 0;
                }
                Outcome::Done => break Ok(()),
                Outcome::Fail(err) => break Err(err),
            }
        };

        let flushed = output.flush(sink, sink_offset);
        drop(engine);

        let written = sink_offset + flushed?;
        match terminal {
            Ok(()) => {
                debug!("stream end: {} bytes from {} input bytes", written, source_offset);
                Ok(Decompressed { written, warnings })
            }
            Err(err) => {
                debug!("decoding failed after {} bytes: {}", written, err);
                Err(err)
            }
        }
    }
}
