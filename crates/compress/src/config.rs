//! Buffer sizing constants and compressor options.
//!
//! Two thresholds govern the byte flow and must not be conflated:
//!
//! - the *input chunk size* is how many raw bytes are handed to the codec in
//!   one call ([`GZIP_CHUNK_SIZE`] for gzip, `ZSTD_CStreamInSize()` for zstd);
//! - the *flush threshold* is the output-buffer fill level that triggers a
//!   write to the target file ([`FLUSH_THRESHOLD`]).
//!
//! The output buffer is allocated with `flush_threshold + output_bound`
//! bytes of capacity so a codec call made just below the threshold always
//! has room for at least one full output chunk.

use crate::format::{Format, OutputMode};
use crate::error::{CompressError, CompressResult};
use crate::gzip::DeflateLevel;

/// Raw input handed to the DEFLATE engine per call (8 KiB).
pub const GZIP_CHUNK_SIZE: usize = 8 * 1024;

/// Output-buffer fill level that triggers a write to the sink (1 MiB).
pub const FLUSH_THRESHOLD: usize = 1 << 20;

/// zstd compression level used unless overridden.
pub const DEFAULT_ZSTD_LEVEL: i32 = 1;

/// DEFLATE level used unless overridden.
pub const DEFAULT_GZIP_LEVEL: DeflateLevel = DeflateLevel::FAST;

/// Options applied when a [`crate::Compressor`] binds to its output file.
///
/// # Examples
///
/// ```
/// use compress::{CompressorOptions, Format, OutputMode};
///
/// let options = CompressorOptions::new(Format::Zstd)
///     .with_mode(OutputMode::Append)
///     .with_digest(true);
/// assert_eq!(options.format(), Format::Zstd);
/// assert!(options.digest());
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompressorOptions {
    format: Format,
    mode: OutputMode,
    digest: bool,
    gzip_level: DeflateLevel,
    zstd_level: i32,
    flush_threshold: usize,
}

impl CompressorOptions {
    /// Creates options for `format` with every other setting at its default.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self {
            format,
            mode: OutputMode::Write,
            digest: false,
            gzip_level: DEFAULT_GZIP_LEVEL,
            zstd_level: DEFAULT_ZSTD_LEVEL,
            flush_threshold: FLUSH_THRESHOLD,
        }
    }

    /// Selects the container format.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Selects whether the target is truncated or appended to.
    #[must_use]
    pub const fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enables or disables MD5 fingerprinting of the written bytes.
    #[must_use]
    pub const fn with_digest(mut self, digest: bool) -> Self {
        self.digest = digest;
        self
    }

    /// Overrides the DEFLATE level used for gzip output.
    #[must_use]
    pub const fn with_gzip_level(mut self, level: DeflateLevel) -> Self {
        self.gzip_level = level;
        self
    }

    /// Overrides the zstd level used for zstd output.
    #[must_use]
    pub const fn with_zstd_level(mut self, level: i32) -> Self {
        self.zstd_level = level;
        self
    }

    /// Applies a numeric `level` to whichever codec [`Self::format`] selects.
    ///
    /// # Errors
    ///
    /// Returns [`CompressError::InvalidLevel`] when `level` is outside
    /// `1..=9` for gzip or outside the range the linked zstd library
    /// supports.
    pub fn with_level(self, level: i32) -> CompressResult<Self> {
        match self.format {
            Format::Gzip => Ok(self.with_gzip_level(DeflateLevel::new(level)?)),
            Format::Zstd if ::zstd::compression_level_range().contains(&level) => {
                Ok(self.with_zstd_level(level))
            }
            Format::Zstd => Err(CompressError::InvalidLevel {
                format: Format::Zstd,
                level,
            }),
        }
    }

    /// Overrides the output flush threshold. Values below one byte are clamped.
    #[must_use]
    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold.max(1);
        self
    }

    /// Returns the container format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Returns the file mode.
    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Reports whether MD5 fingerprinting is enabled.
    #[must_use]
    pub const fn digest(&self) -> bool {
        self.digest
    }

    /// Returns the DEFLATE level.
    #[must_use]
    pub const fn gzip_level(&self) -> DeflateLevel {
        self.gzip_level
    }

    /// Returns the zstd level.
    #[must_use]
    pub const fn zstd_level(&self) -> i32 {
        self.zstd_level
    }

    /// Returns the output flush threshold in bytes.
    #[must_use]
    pub const fn flush_threshold(&self) -> usize {
        self.flush_threshold
    }
}

impl Default for CompressorOptions {
    fn default() -> Self {
        Self::new(Format::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let options = CompressorOptions::default();
        assert_eq!(options.format(), Format::Gzip);
        assert_eq!(options.mode(), OutputMode::Write);
        assert!(!options.digest());
        assert_eq!(options.zstd_level(), DEFAULT_ZSTD_LEVEL);
        assert_eq!(options.gzip_level(), DeflateLevel::FAST);
        assert_eq!(options.flush_threshold(), FLUSH_THRESHOLD);
    }

    #[test]
    fn numeric_level_targets_the_selected_format() {
        let gzip = CompressorOptions::new(Format::Gzip).with_level(6).expect("gzip level");
        assert_eq!(gzip.gzip_level().get(), 6);
        assert_eq!(gzip.zstd_level(), DEFAULT_ZSTD_LEVEL);

        let zstd = CompressorOptions::new(Format::Zstd).with_level(19).expect("zstd level");
        assert_eq!(zstd.zstd_level(), 19);
        assert_eq!(zstd.gzip_level(), DEFAULT_GZIP_LEVEL);

        assert!(matches!(
            CompressorOptions::new(Format::Gzip).with_level(12),
            Err(CompressError::InvalidLevel { format: Format::Gzip, level: 12 })
        ));
        assert!(matches!(
            CompressorOptions::new(Format::Zstd).with_level(1000),
            Err(CompressError::InvalidLevel { format: Format::Zstd, level: 1000 })
        ));
    }

    #[test]
    fn flush_threshold_is_clamped() {
        let options = CompressorOptions::default().with_flush_threshold(0);
        assert_eq!(options.flush_threshold(), 1);
    }
}
