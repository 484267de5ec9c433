//! Output file handle used by the compressor and transcoders.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{CompressError, CompressResult};
use crate::format::OutputMode;

/// Binary output file opened in [`OutputMode::Write`] or [`OutputMode::Append`].
///
/// The sink remembers the file's length at open time so an empty append can
/// be rolled back and so [`FileSink::current_size`] reports the whole file.
#[derive(Debug)]
pub struct FileSink {
    file: File,
    path: PathBuf,
    mode: OutputMode,
    initial_size: u64,
    appended: u64,
}

impl FileSink {
    /// Opens `path` according to `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`CompressError::Open`] when the file cannot be created or
    /// opened.
    pub fn open(path: impl AsRef<Path>, mode: OutputMode) -> CompressResult<Self> {
        let path = path.as_ref();
        let opened = match mode {
            OutputMode::Write => File::create(path),
            OutputMode::Append => OpenOptions::new().create(true).append(true).open(path),
        };
        let file = opened.map_err(|err| CompressError::open(path, err))?;
        let initial_size = match mode {
            OutputMode::Write => 0,
            OutputMode::Append => file
                .metadata()
                .map_err(|err| CompressError::open(path, err))?
                .len(),
        };
        tracing::debug!(path = %path.display(), %mode, initial_size, "opened output file");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            mode,
            initial_size,
            appended: 0,
        })
    }

    /// Writes every byte of `bytes` to the file.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.appended = self.appended.saturating_add(bytes.len() as u64);
        Ok(())
    }

    /// Returns the file length including content present before opening.
    #[must_use]
    pub const fn current_size(&self) -> u64 {
        self.initial_size.saturating_add(self.appended)
    }

    /// Returns the file length observed when the sink was opened.
    #[must_use]
    pub const fn initial_size(&self) -> u64 {
        self.initial_size
    }

    /// Returns the number of bytes written through this sink.
    #[must_use]
    pub const fn appended(&self) -> u64 {
        self.appended
    }

    /// Returns the path the sink was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the mode the sink was opened with.
    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Forces written data to stable storage.
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()
    }

    /// Shrinks the file back to `len` bytes.
    pub fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.file.set_len(len)?;
        self.appended = len.saturating_sub(self.initial_size);
        Ok(())
    }

    /// Syncs and releases the file handle, returning the final length.
    pub fn close(mut self) -> io::Result<u64> {
        self.sync()?;
        Ok(self.current_size())
    }

    /// Removes `path`, treating a missing file as already removed.
    pub fn delete(path: impl AsRef<Path>) -> io::Result<()> {
        match fs::remove_file(path.as_ref()) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.appended = self.appended.saturating_add(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
