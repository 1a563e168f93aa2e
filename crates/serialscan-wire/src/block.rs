use std::io::Read;

use crate::constants::{
    MAX_BLOCK_SIZE, MAX_HEADER_SIZE, TC_BASE, TC_BLOCKDATA, TC_BLOCKDATALONG, TC_MAX, TC_RESET,
};
use crate::error::WireError;
use crate::peek::PeekReader;
use crate::utf;

/// Framing mode of a [`BlockDataReader`].
///
/// Raw mode reads primitives straight off the byte source. Block mode reads
/// them from inside length-prefixed block-data frames, refilling across
/// frame boundaries transparently.
#[derive(Clone, Copy, Debug)]
enum Mode {
    Raw,
    Block(BlockState),
}

/// Cursor state of the framed region. Meaningful only in block mode.
#[derive(Clone, Copy, Debug)]
struct BlockState {
    /// Read position within the buffered block data.
    pos: usize,
    /// End of valid buffered data, or `None` once the framed region is
    /// exhausted (no further block header follows).
    end: Option<usize>,
    /// Bytes of the current block still unread from the source.
    unread: usize,
}

impl BlockState {
    const EXHAUSTED: Self = Self {
        pos: 0,
        end: None,
        unread: 0,
    };
}

/// Dual-mode primitive reader over the serialized-object wire format.
///
/// In raw mode this is a big-endian typed-data reader. In block mode the
/// same primitive reads transparently unwrap block-data framing: frames are
/// introduced by `TC_BLOCKDATA` (1-byte length) or `TC_BLOCKDATALONG`
/// (4-byte length), `TC_RESET` tags between frames are swallowed, and a
/// primitive that straddles a frame boundary is reassembled byte by byte
/// across refills.
///
/// ```text
///   raw:    ... [i32] [u16] [utf] ...
///   block:  ... 77 ll <data> 79 77 ll <da│ta> ...   (reads cross the │)
/// ```
///
/// Mode switching is explicit. Leaving block mode while buffered block
/// bytes are unconsumed is a caller bug and fails with
/// [`WireError::UnreadBlockData`].
pub struct BlockDataReader<R> {
    src: PeekReader<R>,
    buf: [u8; MAX_BLOCK_SIZE],
    mode: Mode,
}

impl<R: Read> BlockDataReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            src: PeekReader::new(inner),
            buf: [0; MAX_BLOCK_SIZE],
            mode: Mode::Raw,
        }
    }

    #[must_use]
    pub fn in_block_mode(&self) -> bool {
        matches!(self.mode, Mode::Block(_))
    }

    /// Bytes consumed from the underlying source so far.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.src.offset()
    }

    /// Switch to block mode. No-op if already in block mode; otherwise the
    /// framed cursor is reset and the next read scans for a block header.
    pub fn set_block_mode(&mut self) {
        if matches!(self.mode, Mode::Raw) {
            self.mode = Mode::Block(BlockState {
                pos: 0,
                end: Some(0),
                unread: 0,
            });
        }
    }

    /// Switch to raw mode. No-op if already in raw mode.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnreadBlockData`] if buffered block bytes are
    /// still unconsumed; switching modes mid-block is a caller bug.
    pub fn set_raw_mode(&mut self) -> Result<(), WireError> {
        if let Mode::Block(st) = self.mode {
            if let Some(end) = st.end
                && st.pos < end
            {
                return Err(WireError::UnreadBlockData);
            }
            self.mode = Mode::Raw;
        }
        Ok(())
    }

    /// Scan for the next block-data framing header at the raw source
    /// position. Returns the declared block length, or `None` when the next
    /// tag does not introduce a block (or the stream has ended there).
    ///
    /// `TC_RESET` tags may occur between data blocks and must be handled at
    /// this level, since primitive reads may span blocks separated by one;
    /// they are consumed and the scan continues.
    ///
    /// # Errors
    ///
    /// - [`WireError::BadBlockLength`] for a negative long-form length.
    /// - [`WireError::InvalidTypeCode`] for a tag outside the assigned range.
    /// - [`WireError::UnexpectedEof`] if the stream ends inside a header.
    pub fn read_block_header(&mut self) -> Result<Option<usize>, WireError> {
        let mut hbuf = [0u8; MAX_HEADER_SIZE];
        loop {
            let Some(tc) = self.src.peek()? else {
                return Ok(None);
            };
            match tc {
                TC_BLOCKDATA => {
                    self.src.read_exact(&mut hbuf[..2])?;
                    return Ok(Some(usize::from(hbuf[1])));
                }
                TC_BLOCKDATALONG => {
                    self.src.read_exact(&mut hbuf[..5])?;
                    let len = i32::from_be_bytes([hbuf[1], hbuf[2], hbuf[3], hbuf[4]]);
                    let Ok(len) = usize::try_from(len) else {
                        return Err(WireError::BadBlockLength { len });
                    };
                    return Ok(Some(len));
                }
                TC_RESET => {
                    self.src.read_byte()?;
                }
                other => {
                    if !(TC_BASE..=TC_MAX).contains(&other) {
                        return Err(WireError::InvalidTypeCode { code: other });
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// Peek at the next byte without consuming it. In block mode the byte
    /// comes from inside the framed region; `None` means the framing (or
    /// the stream) is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates refill and I/O failures.
    pub fn peek(&mut self) -> Result<Option<u8>, WireError> {
        match self.mode {
            Mode::Raw => self.src.peek(),
            Mode::Block(st) => {
                if st.end == Some(st.pos) {
                    self.refill()?;
                }
                let Mode::Block(st) = self.mode else {
                    return Err(WireError::NotInBlockMode);
                };
                Ok(st.end.map(|_| self.buf[st.pos]))
            }
        }
    }

    /// Like [`peek`](Self::peek), but end of data is an error.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] at end of data.
    pub fn peek_byte(&mut self) -> Result<u8, WireError> {
        match self.peek()? {
            Some(b) => Ok(b),
            None => Err(self.eof()),
        }
    }

    /// Consume and return the next byte, or `None` at end of data.
    ///
    /// # Errors
    ///
    /// Propagates refill and I/O failures.
    pub fn read_byte(&mut self) -> Result<Option<u8>, WireError> {
        match self.mode {
            Mode::Raw => self.src.read_byte(),
            Mode::Block(st) => {
                if st.end == Some(st.pos) {
                    self.refill()?;
                }
                let Mode::Block(st) = &mut self.mode else {
                    return Err(WireError::NotInBlockMode);
                };
                if st.end.is_none() {
                    return Ok(None);
                }
                let b = self.buf[st.pos];
                st.pos += 1;
                Ok(Some(b))
            }
        }
    }

    /// Read exactly `out.len()` bytes, straddling block boundaries as
    /// needed in block mode.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if the data ends first.
    pub fn read_fully(&mut self, out: &mut [u8]) -> Result<(), WireError> {
        let mut filled = 0;
        while filled < out.len() {
            let n = self.read_chunk(&mut out[filled..])?;
            if n == 0 {
                return Err(self.eof());
            }
            filled += n;
        }
        Ok(())
    }

    /// Consume up to `len` bytes; returns the count actually skipped. In
    /// block mode the skip stops at the end of the framed region; in raw
    /// mode it stops at end of stream.
    ///
    /// # Errors
    ///
    /// Propagates refill and I/O failures.
    pub fn skip(&mut self, len: u64) -> Result<u64, WireError> {
        let mut remain = len;
        while remain > 0 {
            match self.mode {
                Mode::Block(st) => {
                    if st.end == Some(st.pos) {
                        self.refill()?;
                    }
                    let Mode::Block(st) = &mut self.mode else {
                        return Err(WireError::NotInBlockMode);
                    };
                    let Some(end) = st.end else { break };
                    #[allow(clippy::cast_possible_truncation)]
                    let n = remain.min((end - st.pos) as u64) as usize;
                    st.pos += n;
                    remain -= n as u64;
                }
                Mode::Raw => {
                    #[allow(clippy::cast_possible_truncation)]
                    let want = remain.min(MAX_BLOCK_SIZE as u64) as usize;
                    let n = self.src.read_some(&mut self.buf[..want])?;
                    if n == 0 {
                        break;
                    }
                    remain -= n as u64;
                }
            }
        }
        Ok(len - remain)
    }

    /// Consume and discard everything up to the end of the current group of
    /// data blocks. The mode itself is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::NotInBlockMode`] in raw mode; propagates refill
    /// failures.
    pub fn skip_to_block_end(&mut self) -> Result<(), WireError> {
        loop {
            match self.mode {
                Mode::Raw => return Err(WireError::NotInBlockMode),
                Mode::Block(st) => {
                    if st.end.is_none() {
                        return Ok(());
                    }
                    self.refill()?;
                }
            }
        }
    }

    /// Unconsumed bytes remaining in the current group of data blocks:
    /// buffered bytes plus bytes of the current block still on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::NotInBlockMode`] in raw mode.
    pub fn current_block_remaining(&self) -> Result<usize, WireError> {
        match self.mode {
            Mode::Block(st) => Ok(st.end.map_or(0, |end| end - st.pos) + st.unread),
            Mode::Raw => Err(WireError::NotInBlockMode),
        }
    }

    // ── Primitive reads ──────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] at end of data.
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        match self.read_byte()? {
            Some(b) => Ok(b),
            None => Err(self.eof()),
        }
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] at end of data.
    pub fn read_i8(&mut self) -> Result<i8, WireError> {
        #[allow(clippy::cast_possible_wrap)]
        let v = self.read_u8()? as i8;
        Ok(v)
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if the value is truncated.
    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        Ok(u16::from_be_bytes(self.read_fixed::<2>()?))
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if the value is truncated.
    pub fn read_i16(&mut self) -> Result<i16, WireError> {
        Ok(i16::from_be_bytes(self.read_fixed::<2>()?))
    }

    /// Read a UTF-16 code unit (the format's `char`). Same wire shape as
    /// [`read_u16`](Self::read_u16).
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if the value is truncated.
    pub fn read_char(&mut self) -> Result<u16, WireError> {
        self.read_u16()
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if the value is truncated.
    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok(i32::from_be_bytes(self.read_fixed::<4>()?))
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if the value is truncated.
    pub fn read_i64(&mut self) -> Result<i64, WireError> {
        Ok(i64::from_be_bytes(self.read_fixed::<8>()?))
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if the value is truncated.
    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        Ok(f32::from_bits(u32::from_be_bytes(self.read_fixed::<4>()?)))
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if the value is truncated.
    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.read_fixed::<8>()?)))
    }

    /// Read a modified-UTF-8 string with an unsigned 16-bit length prefix.
    ///
    /// The declared body is consumed in full before decoding, so on
    /// malformed input the cursor still lands exactly past the body and
    /// surrounding parsers observe a deterministic position.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if the prefix or body is truncated.
    /// - [`WireError::MalformedUtf`] if the body fails decoding.
    pub fn read_utf(&mut self) -> Result<String, WireError> {
        let len = usize::from(self.read_u16()?);
        let mut body = vec![0u8; len];
        self.read_fully(&mut body)?;
        utf::decode_modified_utf8(&body).map_err(|offset| WireError::MalformedUtf { offset })
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn eof(&self) -> WireError {
        WireError::UnexpectedEof {
            offset: self.src.offset(),
        }
    }

    /// Read a fixed-width big-endian value. In block mode the fast path
    /// copies from the buffered block; a value straddling a block boundary
    /// falls back to the byte-at-a-time path, which refills across frames.
    fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        match self.mode {
            Mode::Raw => self.src.read_exact(&mut out)?,
            Mode::Block(st) => {
                if let Some(end) = st.end
                    && end - st.pos >= N
                {
                    out.copy_from_slice(&self.buf[st.pos..st.pos + N]);
                    let Mode::Block(st) = &mut self.mode else {
                        return Err(WireError::NotInBlockMode);
                    };
                    st.pos += N;
                } else {
                    self.read_fully(&mut out)?;
                }
            }
        }
        Ok(out)
    }

    /// Read up to `out.len()` bytes, honoring block boundaries in block
    /// mode. Returns the count read; zero means end of data.
    fn read_chunk(&mut self, out: &mut [u8]) -> Result<usize, WireError> {
        if out.is_empty() {
            return Ok(0);
        }
        match self.mode {
            Mode::Raw => self.src.read_some(out),
            Mode::Block(st) => {
                if st.end == Some(st.pos) {
                    self.refill()?;
                }
                let Mode::Block(st) = &mut self.mode else {
                    return Err(WireError::NotInBlockMode);
                };
                let Some(end) = st.end else { return Ok(0) };
                let n = out.len().min(end - st.pos);
                out[..n].copy_from_slice(&self.buf[st.pos..st.pos + n]);
                st.pos += n;
                Ok(n)
            }
        }
    }

    /// Refill the block buffer. Anything buffered at the time of the call
    /// is considered consumed. On error the framing state is left exhausted
    /// so subsequent reads observe a consistent end-of-blocks position.
    fn refill(&mut self) -> Result<(), WireError> {
        let result = self.refill_inner();
        if result.is_err()
            && let Mode::Block(st) = &mut self.mode
        {
            *st = BlockState::EXHAUSTED;
        }
        result
    }

    fn refill_inner(&mut self) -> Result<(), WireError> {
        loop {
            let unread = match self.mode {
                Mode::Block(st) => st.unread,
                Mode::Raw => return Err(WireError::NotInBlockMode),
            };
            if unread > 0 {
                let want = unread.min(MAX_BLOCK_SIZE);
                let n = self.src.read_some(&mut self.buf[..want])?;
                if n == 0 {
                    return Err(self.eof());
                }
                if let Mode::Block(st) = &mut self.mode {
                    *st = BlockState {
                        pos: 0,
                        end: Some(n),
                        unread: unread - n,
                    };
                }
                return Ok(());
            }
            match self.read_block_header()? {
                Some(len) => {
                    if let Mode::Block(st) = &mut self.mode {
                        *st = BlockState {
                            pos: 0,
                            end: Some(0),
                            unread: len,
                        };
                    }
                    // A zero-length block loops back for the next header.
                }
                None => {
                    if let Mode::Block(st) = &mut self.mode {
                        *st = BlockState::EXHAUSTED;
                    }
                    return Ok(());
                }
            }
        }
    }
}
