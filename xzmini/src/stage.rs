//! Fixed-capacity staging buffers between the external sequences and the
//! engine.

use xzmini_core::error::{Result, XzError};
use xzmini_core::traits::{DecodeStatus, DecoderEngine, IoView};
use xzmini_core::transfer::{ByteSink, ByteSource};

/// Input staging buffer.
///
/// `position <= filled <= capacity`; refilled only once drained.
#[derive(Debug)]
pub struct InputStage {
    buf: Box<[u8]>,
    position: usize,
    filled: usize,
}

impl InputStage {
    /// Create an empty stage.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            position: 0,
            filled: 0,
        }
    }

    /// Whether every staged byte has been consumed.
    pub fn is_drained(&self) -> bool {
        self.position == self.filled
    }

    /// Staged bytes not consumed yet.
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.position..self.filled]
    }

    /// Restage from `source` at `offset`. Returns the bytes copied; 0 at the
    /// end of the source.
    pub fn refill<S: ByteSource + ?Sized>(&mut self, source: &S, offset: usize) -> usize {
        let n = source.read_at(offset, &mut self.buf);
        self.position = 0;
        self.filled = n;
        n
    }
}

/// Output staging buffer.
///
/// `filled <= capacity`; flushed when full and at termination.
#[derive(Debug)]
pub struct OutputStage {
    buf: Box<[u8]>,
    filled: usize,
}

impl OutputStage {
    /// Create an empty stage.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            filled: 0,
        }
    }

    /// Bytes waiting to be flushed.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// Whether the stage has no room left.
    pub fn is_full(&self) -> bool {
        self.filled == self.buf.len()
    }

    /// Copy the staged bytes to `sink` at `offset` and empty the stage.
    ///
    /// A sink that takes fewer bytes than staged is a write error.
    pub fn flush<K: ByteSink + ?Sized>(&mut self, sink: &mut K, offset: usize) -> Result<usize> {
        let wanted = self.filled;
        let written = sink.write_at(offset, &self.buf[..wanted]);
        self.filled = 0;

        if written < wanted {
            return Err(XzError::write(written, wanted));
        }
        Ok(written)
    }
}

/// Run one engine step over the two stages and commit the cursors it moved.
pub fn step_engine<E: DecoderEngine + ?Sized>(
    engine: &mut E,
    input: &mut InputStage,
    output: &mut OutputStage,
) -> DecodeStatus {
    let mut io = IoView::new(
        &input.buf[..input.filled],
        input.position,
        &mut output.buf,
        output.filled,
    );
    let status = engine.step(&mut io);
    input.position = io.in_pos();
    output.filled = io.out_pos();
    status
}
