#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `compress` streams raw bytes into gzip or zstd files while optionally
//! fingerprinting the compressed output with MD5, and converts existing
//! zstd files to gzip or back to raw bytes.
//!
//! # Design
//!
//! - [`Compressor`] owns an input chunk buffer, a codec, and an
//!   [`buffer::OutputBuffer`] in front of a [`sink::FileSink`]. Raw input is
//!   split into codec-sized chunks, compressed, staged, and written to the
//!   file once the staging buffer reaches the flush threshold.
//! - Codecs implement [`codec::ChunkEncoder`]; [`codec::Codec`] selects the
//!   [`gzip`] or [`zstd`] implementation from a [`Format`].
//! - [`transcode`] converts zstd files without going through a
//!   [`Compressor`], and [`profile`] times whole-file compression.
//!
//! # Invariants
//!
//! - The compressed bytes depend only on the concatenated input, never on
//!   how it was split across [`Compressor::put`] calls.
//! - The digest covers exactly the bytes written to the file, in order.
//! - A stream is finalised at most once; later non-empty input is rejected
//!   with [`CompressError::StreamFinalized`].
//!
//! # Errors
//!
//! Fallible operations return [`CompressResult`]. [`CompressError::kind`]
//! separates call-ordering mistakes from file-system and codec failures.
//!
//! # Examples
//!
//! ```
//! use compress::{Compressor, CompressorOptions, Format, gzip};
//!
//! # fn main() -> Result<(), compress::CompressError> {
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("log.gz");
//!
//! let mut compressor = Compressor::create(&path, CompressorOptions::new(Format::Gzip))?;
//! compressor.put(b"line one\n", false)?;
//! compressor.put(b"line two\n", true)?;
//! compressor.close()?;
//!
//! let decoded = gzip::decompress_to_vec(&std::fs::read(&path)?)?;
//! assert_eq!(decoded, b"line one\nline two\n");
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod codec;
pub mod compressor;
pub mod config;
pub mod error;
pub mod format;
pub mod gzip;
pub mod profile;
pub mod sink;
pub mod transcode;
pub mod zstd;

pub use compressor::Compressor;
pub use config::{
    CompressorOptions, DEFAULT_GZIP_LEVEL, DEFAULT_ZSTD_LEVEL, FLUSH_THRESHOLD, GZIP_CHUNK_SIZE,
};
pub use error::{CompressError, CompressErrorKind, CompressResult};
pub use format::{Format, FormatParseError, OutputMode};
pub use gzip::{DeflateLevel, GZIP_HEADER};
pub use transcode::{TranscodeStats, zstd_to_gzip, zstd_to_raw};
