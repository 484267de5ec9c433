//! Timed whole-file compression used by the benchmarking CLI.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::compressor::Compressor;
use crate::config::CompressorOptions;
use crate::error::{CompressError, CompressResult};

/// Size of each read from the source file.
pub const READ_SIZE: usize = 1 << 20;

/// Outcome of [`compress_file`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompressionProfile {
    /// Raw bytes read from the source.
    pub input_bytes: u64,
    /// Bytes persisted in the target.
    pub output_bytes: u64,
    /// Wall time spent reading and compressing.
    pub elapsed: Duration,
    /// Hex MD5 of the target, empty when fingerprinting was disabled.
    pub digest: String,
}

impl CompressionProfile {
    /// Input bytes processed per millisecond.
    #[must_use]
    pub fn throughput_bytes_per_ms(&self) -> f64 {
        let millis = self.elapsed.as_secs_f64() * 1000.0;
        if millis <= 0.0 {
            return 0.0;
        }
        self.input_bytes as f64 / millis
    }

    /// Output size divided by input size; zero for empty input.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        self.output_bytes as f64 / self.input_bytes as f64
    }
}

/// Compresses `source` into `target` and measures the run.
///
/// # Errors
///
/// Fails when the source cannot be opened or read, or when compression
/// fails.
pub fn compress_file(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
    options: CompressorOptions,
) -> CompressResult<CompressionProfile> {
    let source = source.as_ref();
    let mut input = File::open(source).map_err(|err| CompressError::open(source, err))?;
    let mut compressor = Compressor::create(target, options)?;
    let mut buf = vec![0_u8; READ_SIZE];

    let start = Instant::now();
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        compressor.put(&buf[..n], false)?;
    }
    compressor.put(&[], true)?;
    compressor.close()?;
    let elapsed = start.elapsed();

    let profile = CompressionProfile {
        input_bytes: compressor.input_size(),
        output_bytes: compressor.file_size(true),
        elapsed,
        digest: compressor.hash_string(false, ""),
    };
    tracing::debug!(
        source = %source.display(),
        input = profile.input_bytes,
        output = profile.output_bytes,
        elapsed_ms = profile.elapsed.as_millis() as u64,
        "compression profile"
    );
    Ok(profile)
}
