//! One-shot converters from a zstd file to gzip or to raw bytes.
//!
//! Both converters read the source in the decoder's preferred input size and
//! decode into a block of the decoder's preferred output size, so memory use
//! stays bounded regardless of file size. Concatenated zstd frames are
//! decoded in order.

use std::fs::File;
use std::io::{self, Read};
use std::mem;
use std::path::Path;

use crate::buffer::OutputBuffer;
use crate::codec::ChunkEncoder;
use crate::config::{DEFAULT_GZIP_LEVEL, FLUSH_THRESHOLD};
use crate::error::{CompressError, CompressResult};
use crate::format::OutputMode;
use crate::gzip::GzipEncoder;
use crate::sink::FileSink;
use crate::zstd::ZstdChunkDecoder;

/// Byte counts reported by a completed transcode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TranscodeStats {
    /// Compressed bytes read from the source.
    pub compressed_in: u64,
    /// Bytes produced by the zstd decoder.
    pub decompressed: u64,
    /// Bytes written to the target.
    pub written: u64,
}

/// Re-encodes the zstd file at `source` as a single gzip member at `target`.
///
/// The target is truncated. Decoded blocks are deflated with a full flush;
/// the last block closes the member so the trailer covers every decoded
/// byte.
///
/// # Errors
///
/// Fails when either file cannot be opened, on I/O or codec errors, and
/// with [`CompressError::TruncatedFrame`] when the source ends mid-frame.
/// The target is removed on any failure after it was created.
pub fn zstd_to_gzip(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
) -> CompressResult<TranscodeStats> {
    let (source, target) = (source.as_ref(), target.as_ref());
    let mut input = open_source(source)?;
    let sink = FileSink::open(target, OutputMode::Write)?;
    let stats = discard_on_error(target, reencode_as_gzip(&mut input, sink))?;
    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        compressed_in = stats.compressed_in,
        decompressed = stats.decompressed,
        written = stats.written,
        "zstd to gzip complete"
    );
    Ok(stats)
}

fn reencode_as_gzip(input: &mut File, sink: FileSink) -> CompressResult<TranscodeStats> {
    let mut encoder = GzipEncoder::new(DEFAULT_GZIP_LEVEL);
    let mut out = OutputBuffer::new(sink, FLUSH_THRESHOLD, encoder.output_bound(), false);
    encoder.begin(&mut out)?;

    let mut decoder = ZstdChunkDecoder::new()?;
    let mut read_buf = vec![0_u8; ZstdChunkDecoder::input_size()];
    let mut block = Vec::with_capacity(ZstdChunkDecoder::output_size());
    let mut pending = Vec::with_capacity(ZstdChunkDecoder::output_size());
    let mut stats = TranscodeStats::default();

    loop {
        let n = read_chunk(input, &mut read_buf)?;
        if n == 0 {
            break;
        }
        stats.compressed_in += n as u64;

        let mut consumed = 0;
        loop {
            block.clear();
            consumed += decoder.decode(&read_buf[consumed..n], &mut block)?;
            let block_full = block.len() == block.capacity();
            if !block.is_empty() {
                stats.decompressed += block.len() as u64;
                // The previous block is known not to be last once another arrives.
                if !pending.is_empty() {
                    encoder.feed(&pending, false, &mut out)?;
                }
                mem::swap(&mut pending, &mut block);
            }
            if consumed >= n && !block_full {
                break;
            }
        }
    }
    if stats.compressed_in > 0 && !decoder.frame_complete() {
        return Err(CompressError::TruncatedFrame);
    }

    encoder.feed(&pending, true, &mut out)?;
    let (sink, _) = out.into_parts()?;
    stats.written = sink.close()?;
    Ok(stats)
}

/// Decompresses the zstd file at `source` into `target`.
///
/// Each decoded range is written as soon as it is produced.
///
/// # Errors
///
/// Fails when either file cannot be opened, on I/O or codec errors, and
/// with [`CompressError::TruncatedFrame`] when the source ends mid-frame.
/// The target is removed on any failure after it was created.
pub fn zstd_to_raw(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
) -> CompressResult<TranscodeStats> {
    let (source, target) = (source.as_ref(), target.as_ref());
    let mut input = open_source(source)?;
    let sink = FileSink::open(target, OutputMode::Write)?;
    let stats = discard_on_error(target, decode_to_raw(&mut input, sink))?;
    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        compressed_in = stats.compressed_in,
        decompressed = stats.decompressed,
        "zstd to raw complete"
    );
    Ok(stats)
}

fn decode_to_raw(input: &mut File, mut sink: FileSink) -> CompressResult<TranscodeStats> {
    let mut decoder = ZstdChunkDecoder::new()?;
    let mut read_buf = vec![0_u8; ZstdChunkDecoder::input_size()];
    let mut block = Vec::with_capacity(ZstdChunkDecoder::output_size());
    let mut stats = TranscodeStats::default();

    loop {
        let n = read_chunk(input, &mut read_buf)?;
        if n == 0 {
            break;
        }
        stats.compressed_in += n as u64;

        let mut consumed = 0;
        loop {
            block.clear();
            consumed += decoder.decode(&read_buf[consumed..n], &mut block)?;
            sink.append(&block)?;
            stats.decompressed += block.len() as u64;
            if consumed >= n && block.len() < block.capacity() {
                break;
            }
        }
    }
    if stats.compressed_in > 0 && !decoder.frame_complete() {
        return Err(CompressError::TruncatedFrame);
    }

    stats.written = sink.close()?;
    Ok(stats)
}

/// Removes `target` when `result` is an error. The sink has already been
/// dropped by then.
fn discard_on_error<T>(target: &Path, result: CompressResult<T>) -> CompressResult<T> {
    if let Err(error) = &result {
        match FileSink::delete(target) {
            Ok(()) => tracing::debug!(target = %target.display(), %error, "removed partial output"),
            Err(err) => {
                tracing::warn!(target = %target.display(), error = %err, "failed to remove partial output");
            }
        }
    }
    result
}

fn open_source(path: &Path) -> CompressResult<File> {
    File::open(path).map_err(|err| CompressError::open(path, err))
}

/// Fills `buf` from `reader`, stopping early only at end of input.
fn read_chunk(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
