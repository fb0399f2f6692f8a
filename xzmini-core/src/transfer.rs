//! Bounded transfer primitives.
//!
//! [`stage_in`] and [`stage_out`] move bytes between an externally owned
//! byte sequence and a fixed-capacity staging buffer. Both clamp the copy to
//! whatever both sides can hold and return the number of bytes moved; a
//! short count is the only exhaustion signal.
//!
//! [`ByteSource`] and [`ByteSink`] describe the external side: a finite,
//! addressable sequence with a known total length, accessed only at an
//! offset the caller tracks.

/// Copy from `src[src_offset..]` into `dst`, as much as both sides allow.
///
/// Returns the number of bytes copied. An offset at or past the end of
/// `src` copies nothing.
///
/// # Example
///
/// ```
/// use xzmini_core::transfer::stage_in;
///
/// let mut stage = [0u8; 4];
/// assert_eq!(stage_in(&mut stage, b"abcdef", 3), 3);
/// assert_eq!(&stage[..3], b"def");
/// assert_eq!(stage_in(&mut stage, b"abcdef", 6), 0);
/// ```
#[inline]
pub fn stage_in(dst: &mut [u8], src: &[u8], src_offset: usize) -> usize {
    let available = src.get(src_offset..).unwrap_or(&[]);
    let n = dst.len().min(available.len());
    dst[..n].copy_from_slice(&available[..n]);
    n
}

/// Copy `src` into `dst[dst_offset..]`, as much as `dst` can hold.
///
/// Returns the number of bytes copied; less than `src.len()` means the
/// destination is full.
#[inline]
pub fn stage_out(src: &[u8], dst: &mut [u8], dst_offset: usize) -> usize {
    let space = dst.get_mut(dst_offset..).unwrap_or(&mut []);
    let n = src.len().min(space.len());
    space[..n].copy_from_slice(&src[..n]);
    n
}

/// A finite, addressable input byte sequence.
pub trait ByteSource {
    /// Total number of bytes in the source.
    fn total_len(&self) -> usize;

    /// Copy bytes starting at `offset` into `dst`; returns the count copied.
    fn read_at(&self, offset: usize, dst: &mut [u8]) -> usize;
}

/// A finite, addressable output byte sequence of fixed capacity.
pub trait ByteSink {
    /// Total number of bytes the sink can hold.
    fn capacity(&self) -> usize;

    /// Copy `src` into the sink at `offset`; returns the count copied.
    fn write_at(&mut self, offset: usize, src: &[u8]) -> usize;
}

impl ByteSource for [u8] {
    fn total_len(&self) -> usize {
        self.len()
    }

    fn read_at(&self, offset: usize, dst: &mut [u8]) -> usize {
        stage_in(dst, self, offset)
    }
}

impl ByteSource for Vec<u8> {
    fn total_len(&self) -> usize {
        self.len()
    }

    fn read_at(&self, offset: usize, dst: &mut [u8]) -> usize {
        stage_in(dst, self, offset)
    }
}

impl<const N: usize> ByteSource for [u8; N] {
    fn total_len(&self) -> usize {
        N
    }

    fn read_at(&self, offset: usize, dst: &mut [u8]) -> usize {
        stage_in(dst, self, offset)
    }
}

impl ByteSink for [u8] {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn write_at(&mut self, offset: usize, src: &[u8]) -> usize {
        stage_out(src, self, offset)
    }
}

/// A vector sink has the capacity of its current length; it is never grown.
impl ByteSink for Vec<u8> {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn write_at(&mut self, offset: usize, src: &[u8]) -> usize {
        stage_out(src, self, offset)
    }
}

impl<const N: usize> ByteSink for [u8; N] {
    fn capacity(&self) -> usize {
        N
    }

    fn write_at(&mut self, offset: usize, src: &[u8]) -> usize {
        stage_out(src, self, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_in_clamps_to_destination() {
        let src = [1u8, 2, 3, 4, 5, 6];
        let mut dst = [0u8; 4];
        assert_eq!(stage_in(&mut dst, &src, 0), 4);
        assert_eq!(dst, [1, 2, 3, 4]);
    }

    #[test]
    fn test_stage_in_clamps_to_source() {
        let src = [1u8, 2, 3];
        let mut dst = [0u8; 8];
        assert_eq!(stage_in(&mut dst, &src, 1), 2);
        assert_eq!(&dst[..2], &[2, 3]);
        assert_eq!(dst[2], 0);
    }

    #[test]
    fn test_stage_in_past_end() {
        let mut dst = [7u8; 2];
        assert_eq!(stage_in(&mut dst, &[1, 2], 2), 0);
        assert_eq!(stage_in(&mut dst, &[1, 2], usize::MAX), 0);
        assert_eq!(stage_in(&mut [], &[1, 2], 0), 0);
        assert_eq!(dst, [7, 7]);
    }

    #[test]
    fn test_stage_out_short_write() {
        let mut sink = [0u8; 5];
        assert_eq!(stage_out(b"abc", &mut sink, 0), 3);
        assert_eq!(stage_out(b"defg", &mut sink, 3), 2);
        assert_eq!(&sink, b"abcde");
        assert_eq!(stage_out(b"x", &mut sink, 5), 0);
        assert_eq!(stage_out(b"x", &mut sink, 99), 0);
    }

    #[test]
    fn test_slice_source_and_sink() {
        let source: &[u8] = b"streaming";
        let mut staged = [0u8; 4];
        assert_eq!(source.total_len(), 9);
        assert_eq!(source.read_at(5, &mut staged), 4);
        assert_eq!(&staged, b"ming");

        let mut sink = vec![0u8; 6];
        assert_eq!(ByteSink::capacity(&sink), 6);
        assert_eq!(sink.write_at(4, b"xyz"), 2);
        assert_eq!(&sink[4..], b"xy");
        assert_eq!(sink.len(), 6);
    }
}
