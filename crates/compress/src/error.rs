//! Error types shared by the compressor, codec adapters, and transcoders.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::format::Format;

/// Result type for compression operations.
pub type CompressResult<T> = Result<T, CompressError>;

/// Broad classification of a [`CompressError`].
///
/// Usage errors indicate a call-ordering bug in the caller and should not be
/// retried. Resource errors come from the file system. Codec errors are
/// reported by the underlying DEFLATE or zstd implementation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressErrorKind {
    /// The API was driven in an order it does not support.
    Usage,
    /// Opening, writing, or removing a file failed.
    Resource,
    /// The DEFLATE or zstd codec reported a failure.
    Codec,
}

/// Errors raised by the streaming compressor and transcoders.
#[derive(Debug, Error)]
pub enum CompressError {
    /// [`crate::Compressor::configure`] was called on an instance that is already bound.
    #[error("compressor is already bound to an output file")]
    AlreadyConfigured,
    /// Non-empty input arrived after the stream was finalised.
    #[error("stream already finalized")]
    StreamFinalized,
    /// An operation required an output sink but none is bound.
    #[error("no output file is open")]
    SinkNotOpen,
    /// The compressor was closed before the stream could be finalised.
    #[error("compressor is closed")]
    Closed,
    /// A numeric compression level is outside the codec's range.
    #[error("{format} does not support compression level {level}")]
    InvalidLevel {
        /// Codec the level was meant for.
        format: Format,
        /// Rejected level.
        level: i32,
    },
    /// An output or input file could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Reading from or writing to an open file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The DEFLATE engine rejected the stream state.
    #[error("deflate stream failed: {0}")]
    Deflate(#[from] flate2::CompressError),
    /// The zstd codec reported an error.
    #[error("zstd stream failed: {0}")]
    Zstd(#[source] io::Error),
    /// The zstd source ended in the middle of a frame.
    #[error("zstd input ended before the frame was complete")]
    TruncatedFrame,
}

impl CompressError {
    /// Builds an [`CompressError::Open`] for `path`.
    pub(crate) fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Returns the broad classification of this error.
    #[must_use]
    pub const fn kind(&self) -> CompressErrorKind {
        match self {
            Self::AlreadyConfigured
            | Self::StreamFinalized
            | Self::SinkNotOpen
            | Self::Closed
            | Self::InvalidLevel { .. } => {
                CompressErrorKind::Usage
            }
            Self::Open { .. } | Self::Io(_) => CompressErrorKind::Resource,
            Self::Deflate(_) | Self::Zstd(_) | Self::TruncatedFrame => CompressErrorKind::Codec,
        }
    }

    /// Reports whether this error is a call-ordering violation.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self.kind(), CompressErrorKind::Usage)
    }
}

impl From<CompressError> for io::Error {
    fn from(err: CompressError) -> Self {
        match err {
            CompressError::Io(source) | CompressError::Open { source, .. } => source,
            CompressError::TruncatedFrame => Self::new(
                io::ErrorKind::UnexpectedEof,
                "zstd input ended before the frame was complete",
            ),
            other if other.is_usage() => Self::new(io::ErrorKind::InvalidInput, other),
            other => Self::other(other),
        }
    }
}
