//! Streaming compressor bound to a single output file.
//!
//! A [`Compressor`] accepts raw input through [`Compressor::put`], splits it
//! into codec-sized chunks, and writes the compressed container to its
//! target file. When fingerprinting is enabled it maintains an MD5 over the
//! compressed bytes exactly as they are persisted.
//!
//! # Lifecycle
//!
//! An instance is created unbound ([`Compressor::unbound`]) or bound
//! ([`Compressor::create`]). Binding opens the file and emits any container
//! preamble. The stream is finalised at most once, either by a `put` with
//! `is_last` set or by [`Compressor::close`]. Closing is idempotent and is
//! also performed on drop.
//!
//! Input is buffered until a full chunk is held *and* more input arrives, so
//! the compressed bytes depend only on the concatenated input and never on
//! how it was split across `put` calls.
//!
//! # Examples
//!
//! ```
//! use compress::{Compressor, CompressorOptions, Format};
//!
//! # fn main() -> Result<(), compress::CompressError> {
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("greeting.gz");
//!
//! let options = CompressorOptions::new(Format::Gzip).with_digest(true);
//! let mut compressor = Compressor::create(&path, options)?;
//! compressor.put(b"hello ", false)?;
//! compressor.put(b"world", true)?;
//! compressor.close()?;
//!
//! assert_eq!(compressor.input_size(), 11);
//! assert_eq!(compressor.hash_string(false, "").len(), 32);
//! assert!(compressor.hash_string(true, "  ").ends_with("  greeting.gz"));
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use checksums::strong::{DIGEST_LEN, to_hex};

use crate::buffer::OutputBuffer;
use crate::codec::{ChunkEncoder, Codec};
use crate::config::CompressorOptions;
use crate::error::{CompressError, CompressResult};
use crate::format::{Format, OutputMode};
use crate::sink::FileSink;

/// Codec, output buffer, and held input for an open stream.
struct Stream {
    codec: Codec,
    out: OutputBuffer<FileSink>,
    chunk: Vec<u8>,
    chunk_size: usize,
}

impl Stream {
    fn open(path: &Path, options: &CompressorOptions) -> CompressResult<Self> {
        let mut codec = Codec::new(options)?;
        let sink = FileSink::open(path, options.mode())?;
        let mut out = OutputBuffer::new(
            sink,
            options.flush_threshold(),
            codec.output_bound(),
            options.digest(),
        );
        codec.begin(&mut out)?;
        out.flush_buffer()?;
        let chunk_size = codec.chunk_size();
        Ok(Self {
            codec,
            out,
            chunk: Vec::with_capacity(chunk_size),
            chunk_size,
        })
    }

    fn absorb(&mut self, data: &[u8]) -> CompressResult<()> {
        let mut rest = data;
        while !rest.is_empty() {
            if self.chunk.len() == self.chunk_size {
                self.codec.feed(&self.chunk, false, &mut self.out)?;
                self.chunk.clear();
            }
            // A held chunk never precedes a direct slice, so order is kept.
            if self.chunk.is_empty() && rest.len() > self.chunk_size {
                let (head, tail) = rest.split_at(self.chunk_size);
                self.codec.feed(head, false, &mut self.out)?;
                rest = tail;
                continue;
            }
            let take = (self.chunk_size - self.chunk.len()).min(rest.len());
            self.chunk.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
        }
        Ok(())
    }

    fn finish(&mut self) -> CompressResult<()> {
        self.codec.feed(&self.chunk, true, &mut self.out)?;
        self.chunk.clear();
        self.out.flush_buffer()?;
        Ok(())
    }
}

/// Streaming gzip or zstd compressor writing to one file.
pub struct Compressor {
    options: CompressorOptions,
    path: Option<PathBuf>,
    stream: Option<Stream>,
    total_input: u64,
    file_size: u64,
    digest: Option<[u8; DIGEST_LEN]>,
    finalized: bool,
    closed: bool,
}

impl Compressor {
    /// Creates an unbound compressor for `format` with default options.
    #[must_use]
    pub fn unbound(format: Format) -> Self {
        Self::with_options(CompressorOptions::new(format))
    }

    /// Creates an unbound compressor carrying `options`.
    #[must_use]
    pub const fn with_options(options: CompressorOptions) -> Self {
        Self {
            options,
            path: None,
            stream: None,
            total_input: 0,
            file_size: 0,
            digest: None,
            finalized: false,
            closed: false,
        }
    }

    /// Creates a compressor bound to `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened or the codec cannot be set up.
    pub fn create(path: impl AsRef<Path>, options: CompressorOptions) -> CompressResult<Self> {
        let mut compressor = Self::with_options(options);
        compressor.bind(path.as_ref())?;
        Ok(compressor)
    }

    /// Binds an unbound compressor to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CompressError::AlreadyConfigured`] if a target is already
    /// bound, [`CompressError::Closed`] after [`Compressor::close`], or an
    /// open error from the file system.
    pub fn configure(
        &mut self,
        path: impl AsRef<Path>,
        mode: OutputMode,
        digest: bool,
    ) -> CompressResult<()> {
        if self.path.is_some() {
            return Err(CompressError::AlreadyConfigured);
        }
        if self.closed {
            return Err(CompressError::Closed);
        }
        self.options = self.options.clone().with_mode(mode).with_digest(digest);
        self.bind(path.as_ref())
    }

    fn bind(&mut self, path: &Path) -> CompressResult<()> {
        let stream = Stream::open(path, &self.options)?;
        tracing::debug!(
            path = %path.display(),
            format = %self.options.format(),
            mode = %self.options.mode(),
            digest = self.options.digest(),
            "compressor bound"
        );
        self.stream = Some(stream);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Feeds raw input, finalising the stream when `is_last` is set.
    ///
    /// Empty input after finalisation is accepted and ignored.
    ///
    /// # Errors
    ///
    /// - [`CompressError::StreamFinalized`] for non-empty input after the
    ///   stream has been finalised.
    /// - [`CompressError::Closed`] for non-empty input after closing.
    /// - [`CompressError::SinkNotOpen`] when no target is bound.
    /// - I/O or codec errors raised while compressing or flushing.
    pub fn put(&mut self, data: &[u8], is_last: bool) -> CompressResult<()> {
        if self.finalized {
            return if data.is_empty() {
                Ok(())
            } else {
                Err(CompressError::StreamFinalized)
            };
        }
        if self.closed {
            return if data.is_empty() {
                Ok(())
            } else {
                Err(CompressError::Closed)
            };
        }
        if data.is_empty() && !is_last {
            return Ok(());
        }
        let stream = self.stream.as_mut().ok_or(CompressError::SinkNotOpen)?;
        self.total_input = self.total_input.saturating_add(data.len() as u64);
        stream.absorb(data)?;
        if is_last {
            self.finalize()?;
        }
        Ok(())
    }

    /// Writes staged compressed bytes to the target without finalising.
    ///
    /// Input held for the next chunk stays buffered.
    ///
    /// # Errors
    ///
    /// Returns [`CompressError::SinkNotOpen`] when no target is bound.
    pub fn flush(&mut self) -> CompressResult<()> {
        let stream = self.stream.as_mut().ok_or(CompressError::SinkNotOpen)?;
        stream.out.flush_buffer()?;
        Ok(())
    }

    fn finalize(&mut self) -> CompressResult<()> {
        if self.finalized {
            return Ok(());
        }
        let stream = self.stream.as_mut().ok_or(CompressError::SinkNotOpen)?;
        // Latched before finishing: a failed finish must not feed the held
        // chunk to the codec a second time.
        self.finalized = true;
        stream.finish()?;
        tracing::debug!(
            input = self.total_input,
            written = stream.out.written(),
            "stream finalized"
        );
        Ok(())
    }

    /// Finalises the stream if needed and releases the target file.
    ///
    /// Closing an empty stream removes its output: in write mode the file is
    /// deleted, in append mode the appended bytes are truncated away and the
    /// file is deleted only if it was empty before. Resources are released
    /// even when finalisation fails; the first error is returned.
    pub fn close(&mut self) -> CompressResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let finished = if self.stream.is_some() {
            self.finalize()
        } else {
            Ok(())
        };
        let released = match self.stream.take() {
            Some(stream) => self.release(stream),
            None => Ok(()),
        };
        finished.and(released)
    }

    fn release(&mut self, stream: Stream) -> CompressResult<()> {
        let (mut sink, digest) = stream.out.into_parts()?;
        self.digest = digest;

        if self.total_input > 0 {
            self.file_size = sink.close()?;
            tracing::debug!(size = self.file_size, "compressor closed");
            return Ok(());
        }

        self.file_size = 0;
        let initial = sink.initial_size();
        if sink.mode() == OutputMode::Append && initial > 0 {
            sink.truncate_to(initial)?;
            sink.close()?;
            tracing::debug!(path = %sink_path(self.path.as_deref()), initial, "rolled back empty append");
        } else {
            drop(sink);
            if let Some(path) = self.path.as_deref() {
                FileSink::delete(path)?;
                tracing::debug!(path = %path.display(), "removed empty output");
            }
        }
        Ok(())
    }

    /// Total raw bytes accepted so far.
    #[must_use]
    pub const fn input_size(&self) -> u64 {
        self.total_input
    }

    /// Bytes persisted in the target file.
    ///
    /// With `flushed` set, a stream that never received input reports zero
    /// because it will be removed on close.
    #[must_use]
    pub fn file_size(&self, flushed: bool) -> u64 {
        if flushed && self.total_input == 0 {
            return 0;
        }
        self.stream
            .as_ref()
            .map_or(self.file_size, |stream| stream.out.get_ref().current_size())
    }

    /// Renders the MD5 of the persisted bytes as lowercase hex.
    ///
    /// Returns an empty string when fingerprinting is disabled or no target
    /// was ever bound. With `with_filename`, `delim` and the target's base
    /// name are appended. Before close the digest covers only the bytes
    /// flushed so far.
    #[must_use]
    pub fn hash_string(&self, with_filename: bool, delim: &str) -> String {
        if !self.options.digest() {
            return String::new();
        }
        let Some(path) = self.path.as_deref() else {
            return String::new();
        };
        let digest = match self.stream.as_ref() {
            Some(stream) => stream.out.digest_snapshot(),
            None => self.digest,
        };
        let Some(digest) = digest else {
            return String::new();
        };

        let mut rendered = to_hex(&digest, false);
        if with_filename {
            rendered.push_str(delim);
            if let Some(name) = path.file_name() {
                rendered.push_str(&name.to_string_lossy());
            }
        }
        rendered
    }

    /// Container format produced by this compressor.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.options.format()
    }

    /// Options the compressor was built with.
    #[must_use]
    pub const fn options(&self) -> &CompressorOptions {
        &self.options
    }

    /// Bound target path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reports whether the container has been completed.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Reports whether [`Compressor::close`] has run.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Compressor {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(path = %sink_path(self.path.as_deref()), error = %err, "failed to close compressor");
        }
    }
}

fn sink_path(path: Option<&Path>) -> String {
    path.map_or_else(String::new, |path| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use crate::config::GZIP_CHUNK_SIZE;

    fn gzip_options() -> CompressorOptions {
        CompressorOptions::new(Format::Gzip)
    }

    #[test]
    fn unbound_put_reports_missing_sink() {
        let mut compressor = Compressor::unbound(Format::Gzip);
        let err = compressor.put(b"data", false).expect_err("unbound");
        assert!(matches!(err, CompressError::SinkNotOpen));
        assert_eq!(compressor.input_size(), 0);
    }

    #[test]
    fn unbound_empty_put_is_a_no_op() {
        let mut compressor = Compressor::unbound(Format::Zstd);
        compressor.put(&[], false).expect("no-op");
        assert_eq!(compressor.hash_string(true, " "), "");
    }

    #[test]
    fn configure_twice_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut compressor = Compressor::unbound(Format::Gzip);
        compressor
            .configure(dir.path().join("a.gz"), OutputMode::Write, false)
            .expect("configure");
        let err = compressor
            .configure(dir.path().join("b.gz"), OutputMode::Write, false)
            .expect_err("second configure");
        assert!(matches!(err, CompressError::AlreadyConfigured));
        assert!(!dir.path().join("b.gz").exists());
    }

    #[test]
    fn header_is_on_disk_after_binding() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.gz");
        let compressor = Compressor::create(&path, gzip_options()).expect("create");
        assert_eq!(compressor.file_size(false), 10);
        assert_eq!(compressor.file_size(true), 0);
        assert_eq!(fs::read(&path).expect("read").len(), 10);
    }

    #[test]
    fn full_chunk_is_held_until_more_input_arrives() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.gz");
        let mut compressor = Compressor::create(&path, gzip_options()).expect("create");
        compressor
            .put(&vec![b'x'; GZIP_CHUNK_SIZE], false)
            .expect("put");
        let stream = compressor.stream.as_ref().expect("stream");
        assert_eq!(stream.chunk.len(), GZIP_CHUNK_SIZE);

        compressor.put(b"y", false).expect("put");
        let stream = compressor.stream.as_ref().expect("stream");
        assert_eq!(stream.chunk, b"y");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_finish_is_not_retried_on_close() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.gz");
        let mut compressor = Compressor::create(&path, gzip_options()).expect("create");
        compressor.put(b"held", false).expect("put");

        let stream = compressor.stream.as_mut().expect("stream");
        let full = FileSink::open("/dev/full", OutputMode::Append).expect("open /dev/full");
        stream.out = OutputBuffer::new(full, 1, stream.codec.output_bound(), false);

        let err = compressor.put(&[], true).expect_err("device is full");
        assert!(matches!(err, CompressError::Io(_)));
        assert!(compressor.is_finalized());

        compressor.finalize().expect("second finalize is a no-op");
        let Some(Stream {
            codec: Codec::Gzip(encoder),
            ..
        }) = compressor.stream.as_ref()
        else {
            panic!("gzip stream expected");
        };
        assert_eq!(encoder.isize(), 4);
        let mut expected = flate2::Crc::new();
        expected.update(b"held");
        assert_eq!(encoder.crc(), expected.sum());

        let err = compressor.put(b"more", false).expect_err("latched");
        assert!(matches!(err, CompressError::StreamFinalized));
        assert!(compressor.close().is_err());
        assert!(compressor.is_closed());
    }

    #[test]
    fn put_after_finalize_leaves_file_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.gz");
        let mut compressor = Compressor::create(&path, gzip_options()).expect("create");
        compressor.put(b"payload", true).expect("put");
        let before = fs::read(&path).expect("read");

        let err = compressor.put(b"more", false).expect_err("finalized");
        assert!(matches!(err, CompressError::StreamFinalized));
        compressor.put(&[], true).expect("empty put is ignored");
        assert_eq!(fs::read(&path).expect("read"), before);
        assert_eq!(compressor.input_size(), 7);
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.zst");
        let mut compressor =
            Compressor::create(&path, CompressorOptions::new(Format::Zstd)).expect("create");
        compressor.put(b"payload", false).expect("put");
        compressor.close().expect("first close");
        let size = compressor.file_size(true);
        compressor.close().expect("second close");
        assert_eq!(compressor.file_size(true), size);
        assert!(compressor.is_finalized());
        assert!(compressor.is_closed());
        assert_eq!(fs::metadata(&path).expect("metadata").len(), size);
    }

    #[test]
    fn put_after_close_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut compressor = Compressor::unbound(Format::Gzip);
        compressor.close().expect("close unbound");
        let err = compressor.put(b"late", false).expect_err("closed");
        assert!(matches!(err, CompressError::Closed));
        let err = compressor
            .configure(dir.path().join("late.gz"), OutputMode::Write, false)
            .expect_err("closed");
        assert!(matches!(err, CompressError::Closed));
    }

    #[test]
    fn flush_requires_bound_sink() {
        let mut compressor = Compressor::unbound(Format::Gzip);
        assert!(matches!(
            compressor.flush().expect_err("unbound"),
            CompressError::SinkNotOpen
        ));
    }
}
