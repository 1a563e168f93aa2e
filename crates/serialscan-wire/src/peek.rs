use std::io::Read;

use crate::error::WireError;

/// Byte source with single-byte lookahead.
///
/// Wraps any [`Read`] implementation and adds [`peek`](Self::peek): observe
/// the next byte without consuming it. A single byte of lookahead is all the
/// record grammar needs; every dispatch decision is made on one tag byte.
///
/// The reader also tracks how many bytes the caller has consumed, which is
/// threaded into [`WireError::UnexpectedEof`] so truncation reports carry a
/// position.
pub struct PeekReader<R> {
    inner: R,
    peeked: Option<u8>,
    offset: u64,
}

impl<R: Read> PeekReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
            offset: 0,
        }
    }

    /// Observe the next byte without consuming it, or `None` at end of
    /// stream. Idempotent: repeated peeks return the same byte, and the
    /// next [`read_byte`](Self::read_byte) returns it too.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] if the underlying source fails.
    pub fn peek(&mut self) -> Result<Option<u8>, WireError> {
        if self.peeked.is_none() {
            let mut one = [0u8; 1];
            if self.read_inner(&mut one)? == 1 {
                self.peeked = Some(one[0]);
            }
        }
        Ok(self.peeked)
    }

    /// Consume and return the next byte, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] if the underlying source fails.
    pub fn read_byte(&mut self) -> Result<Option<u8>, WireError> {
        if let Some(b) = self.peeked.take() {
            self.offset += 1;
            return Ok(Some(b));
        }
        let mut one = [0u8; 1];
        if self.read_inner(&mut one)? == 1 {
            self.offset += 1;
            Ok(Some(one[0]))
        } else {
            Ok(None)
        }
    }

    /// Read up to `buf.len()` bytes with a single read of the underlying
    /// source. Returns the number of bytes read; zero means end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] if the underlying source fails.
    pub fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, WireError> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(b) = self.peeked.take() {
            buf[0] = b;
            let n = 1 + self.read_inner(&mut buf[1..])?;
            self.offset += n as u64;
            return Ok(n);
        }
        let n = self.read_inner(buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    /// Fill `buf` completely.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if the stream ends first.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), WireError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_some(&mut buf[filled..])?;
            if n == 0 {
                return Err(WireError::UnexpectedEof {
                    offset: self.offset,
                });
            }
            filled += n;
        }
        Ok(())
    }

    /// Consume up to `n` bytes; returns the count actually skipped, which is
    /// smaller than `n` only when the stream ends first.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] if the underlying source fails.
    pub fn skip(&mut self, n: u64) -> Result<u64, WireError> {
        let mut scratch = [0u8; 256];
        let mut remain = n;
        while remain > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let want = remain.min(scratch.len() as u64) as usize;
            let got = self.read_some(&mut scratch[..want])?;
            if got == 0 {
                break;
            }
            remain -= got as u64;
        }
        Ok(n - remain)
    }

    /// Lower bound on the bytes readable without touching the underlying
    /// source. Zero does not mean end of stream, only that nothing is
    /// buffered.
    #[must_use]
    pub fn available_hint(&self) -> usize {
        usize::from(self.peeked.is_some())
    }

    /// Bytes consumed by the caller so far. A peeked-but-unread byte is not
    /// counted.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Release the underlying source.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_inner(&mut self, buf: &mut [u8]) -> Result<usize, WireError> {
        loop {
            match self.inner.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(WireError::Io(e)),
            }
        }
    }
}
