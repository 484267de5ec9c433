//! Output container formats and file modes recognised by the compressor.

use core::fmt;
use core::str::FromStr;

/// Compressed container produced by a [`crate::Compressor`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Format {
    /// RFC 1952 gzip member wrapping a raw DEFLATE stream.
    #[default]
    Gzip,
    /// Zstandard frame with content checksum.
    Zstd,
}

impl Format {
    /// Every supported format, ordered by numeric index.
    pub const ALL: [Self; 2] = [Self::Gzip, Self::Zstd];

    /// Returns the canonical display name used for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }

    /// Returns the conventional file extension for the format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zstd => "zst",
        }
    }

    /// Returns the numeric index of the format (`0` gzip, `1` zstd).
    #[must_use]
    pub const fn index(self) -> i32 {
        match self {
            Self::Gzip => 0,
            Self::Zstd => 1,
        }
    }

    /// Maps a numeric index to a format, falling back to the default for
    /// values outside the known range.
    #[must_use]
    pub const fn from_index(index: i32) -> Self {
        match index {
            1 => Self::Zstd,
            _ => Self::Gzip,
        }
    }

    /// Parses a format name or numeric index without failing.
    ///
    /// Names are matched case-insensitively. A string made only of ASCII
    /// digits is treated as an index. Anything else, including the empty
    /// string, yields the default format.
    #[must_use]
    pub fn parse_lenient(input: &str) -> Self {
        if let Ok(format) = input.parse::<Self>() {
            return format;
        }
        let trimmed = input.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return trimmed.parse::<i32>().map_or(Self::default(), Self::from_index);
        }
        Self::default()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when attempting to parse an unsupported format name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormatParseError {
    input: String,
}

impl FormatParseError {
    /// Creates a parse error capturing the rejected input.
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the invalid input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for FormatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported compression format: {}", self.input)
    }
}

impl std::error::Error for FormatParseError {}

impl FromStr for Format {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Ok(Self::Gzip),
            "zstd" | "zst" => Ok(Self::Zstd),
            other => Err(FormatParseError::new(other.to_string())),
        }
    }
}

/// How the compressor treats an existing target file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum OutputMode {
    /// Create the file, truncating any previous content.
    #[default]
    Write,
    /// Create the file if missing and append after existing content.
    ///
    /// Appending a gzip stream yields a multi-member gzip file and appending
    /// a zstd stream yields concatenated frames; standard decoders read both.
    Append,
}

impl OutputMode {
    /// Returns a short name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Append => "append",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_accepts_known_formats() {
        assert_eq!("gzip".parse::<Format>().unwrap(), Format::Gzip);
        assert_eq!("ZStd".parse::<Format>().unwrap(), Format::Zstd);
        assert_eq!(" gz ".parse::<Format>().unwrap(), Format::Gzip);
    }

    #[test]
    fn parsing_rejects_unknown_formats() {
        let err = "brotli".parse::<Format>().expect_err("brotli unsupported");
        assert_eq!(err.input(), "brotli");
    }

    #[test]
    fn lenient_parsing_falls_back_to_default() {
        assert_eq!(Format::parse_lenient(""), Format::Gzip);
        assert_eq!(Format::parse_lenient("lz4"), Format::Gzip);
        assert_eq!(Format::parse_lenient("1x"), Format::Gzip);
        assert_eq!(Format::parse_lenient("ZSTD"), Format::Zstd);
    }

    #[test]
    fn lenient_parsing_maps_digits_through_index() {
        assert_eq!(Format::parse_lenient("0"), Format::Gzip);
        assert_eq!(Format::parse_lenient("1"), Format::Zstd);
        assert_eq!(Format::parse_lenient("7"), Format::Gzip);
        assert_eq!(Format::parse_lenient("99999999999"), Format::Gzip);
    }

    #[test]
    fn index_round_trips() {
        for format in Format::ALL {
            assert_eq!(Format::from_index(format.index()), format);
        }
        assert_eq!(Format::from_index(-1), Format::Gzip);
    }

    #[test]
    fn display_uses_canonical_names() {
        assert_eq!(Format::Gzip.to_string(), "gzip");
        assert_eq!(Format::Zstd.to_string(), "zstd");
        assert_eq!(OutputMode::Append.to_string(), "append");
    }
}
