//! Chunk-level codec abstraction driven by the compressor.

use std::io::Write;

use crate::buffer::OutputBuffer;
use crate::config::CompressorOptions;
use crate::error::CompressResult;
use crate::format::Format;
use crate::gzip::GzipEncoder;
use crate::zstd::ZstdEncoder;

/// Compresses input one chunk at a time into an [`OutputBuffer`].
///
/// Implementations must drain all output produced for a chunk before
/// returning, flushing the buffer through [`OutputBuffer::make_room`] as it
/// fills. After a chunk fed with `is_last == true` the container is complete
/// and [`ChunkEncoder::is_finished`] reports `true`.
pub trait ChunkEncoder {
    /// Container produced by this encoder.
    fn format(&self) -> Format;

    /// Preferred number of raw bytes per [`ChunkEncoder::feed`] call.
    fn chunk_size(&self) -> usize;

    /// Worst-case output of a single codec call, reserved as buffer headroom.
    fn output_bound(&self) -> usize;

    /// Emits any container preamble.
    fn begin<W: Write>(&mut self, out: &mut OutputBuffer<W>) -> CompressResult<()>;

    /// Compresses `chunk`, closing the container when `is_last` is set.
    fn feed<W: Write>(
        &mut self,
        chunk: &[u8],
        is_last: bool,
        out: &mut OutputBuffer<W>,
    ) -> CompressResult<()>;

    /// Reports whether the final chunk has been fed.
    fn is_finished(&self) -> bool;
}

/// Encoder selected by [`Format`].
pub enum Codec {
    /// Gzip member over raw DEFLATE.
    Gzip(GzipEncoder),
    /// Zstandard frame.
    Zstd(ZstdEncoder),
}

impl Codec {
    /// Builds the encoder described by `options`.
    pub fn new(options: &CompressorOptions) -> CompressResult<Self> {
        Ok(match options.format() {
            Format::Gzip => Self::Gzip(GzipEncoder::new(options.gzip_level())),
            Format::Zstd => Self::Zstd(ZstdEncoder::new(options.zstd_level())?),
        })
    }
}

impl ChunkEncoder for Codec {
    fn format(&self) -> Format {
        match self {
            Self::Gzip(encoder) => encoder.format(),
            Self::Zstd(encoder) => encoder.format(),
        }
    }

    fn chunk_size(&self) -> usize {
        match self {
            Self::Gzip(encoder) => encoder.chunk_size(),
            Self::Zstd(encoder) => encoder.chunk_size(),
        }
    }

    fn output_bound(&self) -> usize {
        match self {
            Self::Gzip(encoder) => encoder.output_bound(),
            Self::Zstd(encoder) => encoder.output_bound(),
        }
    }

    fn begin<W: Write>(&mut self, out: &mut OutputBuffer<W>) -> CompressResult<()> {
        match self {
            Self::Gzip(encoder) => encoder.begin(out),
            Self::Zstd(encoder) => encoder.begin(out),
        }
    }

    fn feed<W: Write>(
        &mut self,
        chunk: &[u8],
        is_last: bool,
        out: &mut OutputBuffer<W>,
    ) -> CompressResult<()> {
        match self {
            Self::Gzip(encoder) => encoder.feed(chunk, is_last, out),
            Self::Zstd(encoder) => encoder.feed(chunk, is_last, out),
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            Self::Gzip(encoder) => encoder.is_finished(),
            Self::Zstd(encoder) => encoder.is_finished(),
        }
    }
}
