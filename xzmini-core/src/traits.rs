//! The decoding engine contract.
//!
//! A streaming driver owns two staging buffers and an engine. On every step
//! it lends the engine an [`IoView`] over both buffers; the engine consumes
//! some staged input, produces some decoded output, advances the cursors and
//! reports a [`DecodeStatus`]. Creating the engine is its constructor and
//! releasing it is `Drop`, so release happens exactly once on every path out
//! of the driver.

use crate::check::CheckType;
use thiserror::Error;

/// Benign condition reported by an engine step. Decoding continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeWarning {
    /// The stream declares an integrity check the engine cannot verify.
    /// Check fields are skipped.
    #[error("unsupported check; not verifying file integrity")]
    UnsupportedCheck(CheckType),
}

/// Fatal condition reported by an engine step.
///
/// Once a step returns a fault the engine is not stepped again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeFault {
    /// Allocation of decoder memory failed.
    #[error("memory allocation failed")]
    Mem,
    /// Declared dictionary size exceeds the configured limit.
    #[error("dictionary of {needed} bytes exceeds the limit of {limit}")]
    MemLimit {
        /// Declared dictionary size.
        needed: u64,
        /// Configured limit.
        limit: u64,
    },
    /// Stream header magic does not match.
    #[error("not an xz stream")]
    Format,
    /// Valid container using options the engine does not support.
    #[error("unsupported options")]
    Options,
    /// Corrupt container or compressed data.
    #[error("corrupt data")]
    Data,
    /// No progress was possible twice in a row; the input is truncated.
    #[error("no progress possible")]
    Buf,
}

/// Result of one engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Work was done (or more input/output is needed); step again.
    Progress,
    /// Step again, after surfacing the warning.
    Warning(DecodeWarning),
    /// The end of the stream was reached and everything verified.
    StreamEnd,
    /// Decoding cannot continue.
    Fatal(DecodeFault),
}

impl DecodeStatus {
    /// Whether the driver must stop stepping the engine.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::StreamEnd | Self::Fatal(_))
    }
}

/// A resumable decoder driven one step at a time.
///
/// A step must either move at least one cursor of the [`IoView`] or return
/// a status that lets the driver make progress; an engine that cannot
/// advance because input is exhausted reports [`DecodeFault::Buf`] rather
/// than spinning.
pub trait DecoderEngine {
    /// Consume from `io`'s input and produce into its output.
    fn step(&mut self, io: &mut IoView<'_>) -> DecodeStatus;
}

impl<E: DecoderEngine + ?Sized> DecoderEngine for Box<E> {
    fn step(&mut self, io: &mut IoView<'_>) -> DecodeStatus {
        (**self).step(io)
    }
}

/// Cursor pair over a staged input slice and a staged output slice.
///
/// `in_pos <= input.len()` and `out_pos <= output.len()` hold for the life of
/// the view; every accessor clamps rather than panicking.
#[derive(Debug)]
pub struct IoView<'a> {
    input: &'a [u8],
    in_pos: usize,
    output: &'a mut [u8],
    out_pos: usize,
}

impl<'a> IoView<'a> {
    /// Create a view with the given starting cursors.
    pub fn new(input: &'a [u8], in_pos: usize, output: &'a mut [u8], out_pos: usize) -> Self {
        let in_pos = in_pos.min(input.len());
        let out_pos = out_pos.min(output.len());
        Self {
            input,
            in_pos,
            output,
            out_pos,
        }
    }

    /// Input cursor.
    #[inline]
    pub fn in_pos(&self) -> usize {
        self.in_pos
    }

    /// Output cursor.
    #[inline]
    pub fn out_pos(&self) -> usize {
        self.out_pos
    }

    /// Unconsumed input.
    #[inline]
    pub fn input(&self) -> &'a [u8] {
        let input: &'a [u8] = self.input;
        &input[self.in_pos..]
    }

    /// Whether any input is left.
    #[inline]
    pub fn has_input(&self) -> bool {
        self.in_pos < self.input.len()
    }

    /// Next input byte without consuming it.
    #[inline]
    pub fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.in_pos).copied()
    }

    /// Consume one input byte.
    #[inline]
    pub fn read_byte(&mut self) -> Option<u8> {
        let byte = self.peek_byte()?;
        self.in_pos += 1;
        Some(byte)
    }

    /// Consume up to `max` input bytes and return them.
    pub fn take_input(&mut self, max: usize) -> &'a [u8] {
        let input: &'a [u8] = self.input;
        let end = self.in_pos + max.min(input.len() - self.in_pos);
        let taken = &input[self.in_pos..end];
        self.in_pos = end;
        taken
    }

    /// Free space left in the output.
    #[inline]
    pub fn output_space(&self) -> usize {
        self.output.len() - self.out_pos
    }

    /// Append as much of `data` as fits; returns the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.output_space());
        self.output[self.out_pos..self.out_pos + n].copy_from_slice(&data[..n]);
        self.out_pos += n;
        n
    }

    /// Output produced since cursor position `start`.
    pub fn produced_since(&self, start: usize) -> &[u8] {
        self.output.get(start..self.out_pos).unwrap_or(&[])
    }
}
