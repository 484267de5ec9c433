//! Staging buffer between a codec and its output sink.
//!
//! Codecs write compressed bytes into the buffer's spare capacity. Once the
//! filled length reaches the flush threshold the whole buffer is written to
//! the sink in one call and, when fingerprinting is enabled, the exact bytes
//! handed to the sink are folded into the running MD5.

use std::io::{self, Write};

use checksums::Md5;
use checksums::strong::DIGEST_LEN;

/// Output buffer with a flush threshold and optional MD5 of flushed bytes.
pub struct OutputBuffer<W: Write> {
    buf: Vec<u8>,
    threshold: usize,
    sink: W,
    digest: Option<Md5>,
    written: u64,
}

impl<W: Write> OutputBuffer<W> {
    /// Creates a buffer that flushes to `sink` at `threshold` bytes.
    ///
    /// `headroom` is the largest amount of output a single codec call may
    /// produce; it is reserved on top of the threshold.
    pub fn new(sink: W, threshold: usize, headroom: usize, digest: bool) -> Self {
        let threshold = threshold.max(1);
        Self {
            buf: Vec::with_capacity(threshold.saturating_add(headroom)),
            threshold,
            sink,
            digest: digest.then(Md5::new),
            written: 0,
        }
    }

    /// Appends bytes produced outside a codec call, such as a container header.
    pub fn extend(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(bytes);
        self.make_room()
    }

    /// Flushes when the buffer has reached the threshold.
    pub fn make_room(&mut self) -> io::Result<()> {
        if self.buf.len() >= self.threshold {
            self.flush_buffer()?;
        }
        Ok(())
    }

    /// Writes all buffered bytes to the sink, updating the digest.
    pub fn flush_buffer(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.sink.write_all(&self.buf)?;
        if let Some(digest) = self.digest.as_mut() {
            digest.update(&self.buf);
        }
        self.written = self.written.saturating_add(self.buf.len() as u64);
        tracing::trace!(bytes = self.buf.len(), total = self.written, "flushed output buffer");
        self.buf.clear();
        Ok(())
    }

    /// Exposes the underlying vector so codecs can append into spare capacity.
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    /// Number of bytes that fit before the vector would reallocate.
    #[must_use]
    pub fn spare(&self) -> usize {
        self.buf.capacity() - self.buf.len()
    }

    /// Number of bytes currently staged.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Total bytes handed to the sink so far.
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Returns the digest of the bytes written so far without disturbing the
    /// running state, or `None` when fingerprinting is disabled.
    #[must_use]
    pub fn digest_snapshot(&self) -> Option<[u8; DIGEST_LEN]> {
        self.digest.clone().map(|mut digest| digest.finalize())
    }

    /// Returns the sink.
    pub const fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Flushes outstanding bytes and returns the sink and the final digest.
    pub fn into_parts(mut self) -> io::Result<(W, Option<[u8; DIGEST_LEN]>)> {
        self.flush_buffer()?;
        let digest = self.digest.as_mut().map(Md5::finalize);
        Ok((self.sink, digest))
    }
}
