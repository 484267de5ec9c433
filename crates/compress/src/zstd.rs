#![allow(clippy::module_name_repetitions)]

//! Streaming Zstandard helpers.
//!
//! [`ZstdEncoder`] drives a raw compression context chunk by chunk so the
//! compressor controls exactly when output is flushed to the sink.
//! [`ZstdChunkDecoder`] is the matching decompression adapter used by the
//! transcoders; it reports whether the last frame it saw was complete so a
//! truncated source can be told apart from a finished one.

use std::io::{self, Write};

use zstd::stream::raw::{Decoder, Encoder, InBuffer, Operation, OutBuffer};
use zstd::zstd_safe::{CCtx, CParameter, DCtx};

use crate::buffer::OutputBuffer;
use crate::codec::ChunkEncoder;
use crate::error::{CompressError, CompressResult};
use crate::format::Format;

/// Streaming zstd frame encoder with the content checksum enabled.
pub struct ZstdEncoder {
    inner: Encoder<'static>,
    level: i32,
    finished: bool,
}

impl ZstdEncoder {
    /// Creates an encoder compressing at `level`.
    pub fn new(level: i32) -> CompressResult<Self> {
        let mut inner = Encoder::new(level).map_err(CompressError::Zstd)?;
        inner
            .set_parameter(CParameter::ChecksumFlag(true))
            .map_err(CompressError::Zstd)?;
        Ok(Self {
            inner,
            level,
            finished: false,
        })
    }

    /// Returns the configured compression level.
    #[must_use]
    pub const fn level(&self) -> i32 {
        self.level
    }

    fn run<W: Write>(&mut self, chunk: &[u8], out: &mut OutputBuffer<W>) -> CompressResult<()> {
        let mut input = InBuffer::around(chunk);
        while input.pos() < chunk.len() {
            out.make_room()?;
            let pos = out.pending();
            let mut output = OutBuffer::around_pos(out.buffer_mut(), pos);
            self.inner
                .run(&mut input, &mut output)
                .map_err(CompressError::Zstd)?;
        }
        Ok(())
    }

    fn end_frame<W: Write>(&mut self, out: &mut OutputBuffer<W>) -> CompressResult<()> {
        loop {
            out.make_room()?;
            let pos = out.pending();
            let mut output = OutBuffer::around_pos(out.buffer_mut(), pos);
            let remaining = self
                .inner
                .finish(&mut output, true)
                .map_err(CompressError::Zstd)?;
            if remaining == 0 {
                return Ok(());
            }
        }
    }
}

impl ChunkEncoder for ZstdEncoder {
    fn format(&self) -> Format {
        Format::Zstd
    }

    fn chunk_size(&self) -> usize {
        CCtx::in_size()
    }

    fn output_bound(&self) -> usize {
        CCtx::out_size()
    }

    fn begin<W: Write>(&mut self, _out: &mut OutputBuffer<W>) -> CompressResult<()> {
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
        self.run(chunk, out)?;
        if is_last {
            self.end_frame(out)?;
            self.finished = true;
        }
        tracing::trace!(len = chunk.len(), is_last, "zstd chunk compressed");
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Chunk-oriented zstd decompressor.
pub struct ZstdChunkDecoder {
    inner: Decoder<'static>,
    frame_complete: bool,
}

impl ZstdChunkDecoder {
    /// Creates a decoder ready for the first frame.
    pub fn new() -> CompressResult<Self> {
        let inner = Decoder::new().map_err(CompressError::Zstd)?;
        Ok(Self {
            inner,
            frame_complete: true,
        })
    }

    /// Preferred compressed read size.
    #[must_use]
    pub fn input_size() -> usize {
        DCtx::in_size()
    }

    /// Output block size that holds at least one full decoded block.
    #[must_use]
    pub fn output_size() -> usize {
        DCtx::out_size()
    }

    /// Decodes from `src` into the spare capacity of `dst`.
    ///
    /// Returns the number of bytes of `src` consumed. Decoding stops when
    /// either `src` is exhausted or `dst` reaches its capacity.
    pub fn decode(&mut self, src: &[u8], dst: &mut Vec<u8>) -> CompressResult<usize> {
        let mut input = InBuffer::around(src);
        let pos = dst.len();
        let mut output = OutBuffer::around_pos(dst, pos);
        let hint = self
            .inner
            .run(&mut input, &mut output)
            .map_err(CompressError::Zstd)?;
        // An idle call between frames reports the next header size as its hint.
        if input.pos() > 0 || output.pos() > pos {
            self.frame_complete = hint == 0;
        }
        Ok(input.pos())
    }

    /// Reports whether the most recent frame was fully decoded.
    #[must_use]
    pub const fn frame_complete(&self) -> bool {
        self.frame_complete
    }
}

/// Compresses `input` into a single zstd frame held in memory.
pub fn compress_to_vec(input: &[u8], level: i32) -> io::Result<Vec<u8>> {
    let mut encoder = zstd::stream::write::Encoder::new(Vec::new(), level)?;
    encoder.include_checksum(true)?;
    encoder.write_all(input)?;
    encoder.finish()
}

/// Decompresses every frame in `input` into a new [`Vec`].
pub fn decompress_to_vec(input: &[u8]) -> io::Result<Vec<u8>> {
    zstd::stream::decode_all(input)
}
