//! # Overview
//!
//! Gzip framing over a raw DEFLATE stream. [`GzipEncoder`] writes the minimal
//! RFC 1952 member header, compresses input chunk by chunk with
//! [`FlushCompress::Full`] so every chunk boundary is byte aligned, and
//! closes the member with the CRC-32 and length trailer.
//!
//! The CRC runs over the raw chunk bytes before they reach the engine, and
//! the drain loop calls [`OutputBuffer::make_room`] before every engine call
//! so output reaches the sink as it accumulates.
//!
//! # Examples
//!
//! ```
//! use compress::gzip::{DeflateLevel, compress_to_vec, decompress_to_vec};
//!
//! let data = b"highly compressible payload".repeat(16);
//! let compressed = compress_to_vec(&data, DeflateLevel::FAST).unwrap();
//! assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
//! assert_eq!(decompress_to_vec(&compressed).unwrap(), data);
//! ```

use std::io::{self, Read, Write};

use flate2::{Compress, Compression, Crc, FlushCompress, Status, read::MultiGzDecoder};

use crate::buffer::OutputBuffer;
use crate::codec::ChunkEncoder;
use crate::config::GZIP_CHUNK_SIZE;
use crate::error::{CompressError, CompressResult};
use crate::format::Format;

/// Minimal gzip member header: magic, DEFLATE method, no flags, zero mtime,
/// no extra flags, unknown OS.
pub const GZIP_HEADER: [u8; 10] = [0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF];

/// Length of the CRC-32 and ISIZE trailer.
pub const GZIP_TRAILER_LEN: usize = 8;

/// DEFLATE effort from `1` (fastest) to `9` (smallest output).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DeflateLevel(u8);

impl DeflateLevel {
    /// Level 1, the fastest setting.
    pub const FAST: Self = Self(1);

    /// Level 9, the strongest setting.
    pub const BEST: Self = Self(9);

    /// Validates `level` against the DEFLATE range.
    ///
    /// # Errors
    ///
    /// Returns [`CompressError::InvalidLevel`] outside `1..=9`.
    pub fn new(level: i32) -> CompressResult<Self> {
        u8::try_from(level)
            .ok()
            .filter(|value| (Self::FAST.0..=Self::BEST.0).contains(value))
            .map(Self)
            .ok_or(CompressError::InvalidLevel {
                format: Format::Gzip,
                level,
            })
    }

    /// Numeric level.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0 as u32
    }
}

impl From<DeflateLevel> for Compression {
    fn from(level: DeflateLevel) -> Self {
        Self::new(level.get())
    }
}

/// Streaming gzip member encoder.
pub struct GzipEncoder {
    deflate: Compress,
    crc: Crc,
    finished: bool,
}

impl GzipEncoder {
    /// Creates an encoder producing a raw DEFLATE body at `level`.
    #[must_use]
    pub fn new(level: DeflateLevel) -> Self {
        Self {
            deflate: Compress::new(level.into(), false),
            crc: Crc::new(),
            finished: false,
        }
    }

    /// CRC-32 of the raw bytes fed so far.
    #[must_use]
    pub fn crc(&self) -> u32 {
        self.crc.sum()
    }

    /// Raw bytes fed so far, modulo 2^32.
    #[must_use]
    pub fn isize(&self) -> u32 {
        self.crc.amount()
    }

    /// Builds the member trailer from the current CRC and length.
    #[must_use]
    pub fn trailer(&self) -> [u8; GZIP_TRAILER_LEN] {
        let mut trailer = [0_u8; GZIP_TRAILER_LEN];
        trailer[..4].copy_from_slice(&self.crc().to_le_bytes());
        trailer[4..].copy_from_slice(&self.isize().to_le_bytes());
        trailer
    }
}

impl ChunkEncoder for GzipEncoder {
    fn format(&self) -> Format {
        Format::Gzip
    }

    fn chunk_size(&self) -> usize {
        GZIP_CHUNK_SIZE
    }

    fn output_bound(&self) -> usize {
        // deflateBound for a stored-block worst case plus the sync marker
        GZIP_CHUNK_SIZE + (GZIP_CHUNK_SIZE >> 12) + (GZIP_CHUNK_SIZE >> 14) + 64
    }

    fn begin<W: Write>(&mut self, out: &mut OutputBuffer<W>) -> CompressResult<()> {
        out.extend(&GZIP_HEADER)?;
        Ok(())
    }

    fn feed<W: Write>(
        &mut self,
        chunk: &[u8],
        is_last: bool,
        out: &mut OutputBuffer<W>,
    ) -> CompressResult<()> {
        if self.finished {
            return Err(CompressError::StreamFinalized);
        }
        self.crc.update(chunk);

        let flush = if is_last {
            FlushCompress::Finish
        } else {
            FlushCompress::Full
        };
        let mut consumed = 0;
        loop {
            out.make_room()?;
            let before_in = self.deflate.total_in();
            let before_out = self.deflate.total_out();
            let status = self
                .deflate
                .compress_vec(&chunk[consumed..], out.buffer_mut(), flush)?;
            consumed += (self.deflate.total_in() - before_in) as usize;
            let produced = self.deflate.total_out() - before_out;

            if status == Status::StreamEnd {
                break;
            }
            if !is_last && consumed == chunk.len() && out.spare() > 0 {
                break;
            }
            if produced == 0 && consumed == chunk.len() && out.spare() > 0 {
                return Err(CompressError::Io(io::Error::other(
                    "deflate engine stalled before end of stream",
                )));
            }
        }
        tracing::trace!(len = chunk.len(), is_last, "deflated chunk");

        if is_last {
            out.extend(&self.trailer())?;
            self.finished = true;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Compresses `input` into a complete gzip member held in memory.
pub fn compress_to_vec(input: &[u8], level: DeflateLevel) -> CompressResult<Vec<u8>> {
    let mut encoder = GzipEncoder::new(level);
    let mut out = OutputBuffer::new(Vec::new(), GZIP_CHUNK_SIZE, encoder.output_bound(), false);
    encoder.begin(&mut out)?;
    let mut chunks = input.chunks(GZIP_CHUNK_SIZE).peekable();
    if chunks.peek().is_none() {
        encoder.feed(&[], true, &mut out)?;
    }
    while let Some(chunk) = chunks.next() {
        encoder.feed(chunk, chunks.peek().is_none(), &mut out)?;
    }
    let (sink, _) = out.into_parts()?;
    Ok(sink)
}

/// Decompresses every gzip member in `input` into a new [`Vec`].
pub fn decompress_to_vec(input: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(input);
    let mut output = Vec::new();
    decoder.read_to_end(&mut output)?;
    Ok(output)
}
