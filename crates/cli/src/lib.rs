#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the thin command-line front-end shared by the three
//! `zpack` executables:
//!
//! - `zpack-gzip SOURCE TARGET` re-encodes a zstd file as gzip;
//! - `zpack-unzstd SOURCE TARGET` decompresses a zstd file;
//! - `zpack-compress SOURCE TARGET [--format gzip|zstd] [--level N] [--md5]` compresses a
//!   file through [`compress::Compressor`] and reports throughput and ratio.
//!
//! # Design
//!
//! [`run`] accepts the selected [`Tool`], an iterator of arguments, and
//! handles for standard output and error. A [`clap`](https://docs.rs/clap/)
//! builder performs the parse with the automatic help and version flags
//! disabled; this crate renders both itself.
//!
//! # Invariants
//!
//! - `run` never panics.
//! - Fewer than two operands yields `-1`, which [`exit_code_from`] maps to
//!   `255`.
//! - Once two operands are present the status is `0` even when the
//!   conversion fails or an option is rejected; failures are reported
//!   through `tracing` only. Operands may start with `-`.
//!
//! # Examples
//!
//! ```
//! use cli::{Tool, run};
//!
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = run(Tool::Gzip, ["zpack-gzip", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("zpack-gzip "));
//! ```

use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Arg, ArgAction, Command, builder::OsStringValueParser};
use compress::profile::{CompressionProfile, compress_file};
use compress::{CompressorOptions, Format, zstd_to_gzip, zstd_to_raw};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the `tracing` filter directives.
pub const LOG_ENV: &str = "ZPACK_LOG";

/// Filter applied when [`LOG_ENV`] is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Status returned when the operands are missing or unparsable.
const USAGE_STATUS: i32 = -1;

/// Options of `zpack-compress` that consume the following argument.
const VALUED_OPTIONS: [&[u8]; 4] = [b"-f", b"--format", b"-l", b"--level"];

/// Bytes-per-millisecond to MiB-per-second.
const MIB_PER_SEC: f64 = 1000.0 / (1 << 20) as f64;

/// Executable selected by the binary entry point.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tool {
    /// zstd to gzip transcoder.
    Gzip,
    /// zstd to raw decompressor.
    Unzstd,
    /// Profiling file compressor.
    Compress,
}

impl Tool {
    /// Name the binary is installed under.
    #[must_use]
    pub const fn program_name(self) -> &'static str {
        match self {
            Self::Gzip => "zpack-gzip",
            Self::Unzstd => "zpack-unzstd",
            Self::Compress => "zpack-compress",
        }
    }

    const fn help_text(self) -> &'static str {
        match self {
            Self::Gzip => concat!(
                "Usage: zpack-gzip [-h] [-V] SOURCE TARGET\n",
                "\n",
                "Re-encode the zstd file SOURCE as a gzip file at TARGET.\n",
                "  -h, --help       Show this help message and exit.\n",
                "  -V, --version    Output version information and exit.\n",
            ),
            Self::Unzstd => concat!(
                "Usage: zpack-unzstd [-h] [-V] SOURCE TARGET\n",
                "\n",
                "Decompress the zstd file SOURCE into TARGET.\n",
                "  -h, --help       Show this help message and exit.\n",
                "  -V, --version    Output version information and exit.\n",
            ),
            Self::Compress => concat!(
                "Usage: zpack-compress [-h] [-V] [-f FORMAT] [-l N] [--md5] SOURCE TARGET\n",
                "\n",
                "Compress SOURCE into TARGET and report speed and ratio.\n",
                "  -h, --help           Show this help message and exit.\n",
                "  -V, --version        Output version information and exit.\n",
                "  -f, --format FORMAT  Container format: gzip (default) or zstd.\n",
                "  -l, --level N        Compression level: 1-9 for gzip, zstd's own range.\n",
                "      --md5            Print the MD5 of TARGET after compressing.\n",
            ),
        }
    }
}

/// Parsed command produced by [`parse_args`].
#[derive(Debug, Default)]
struct ParsedArgs {
    show_help: bool,
    show_version: bool,
    format: Format,
    level: Option<i32>,
    md5: bool,
    operands: Vec<OsString>,
}

/// Builds the `clap` command used for parsing.
fn clap_command(tool: Tool) -> Command {
    let command = Command::new(tool.program_name())
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .help("Show this help message and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .help("Output version information and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("operands")
                .action(ArgAction::Append)
                .num_args(0..)
                .allow_hyphen_values(true)
                .value_parser(OsStringValueParser::new()),
        );

    if tool != Tool::Compress {
        return command;
    }
    command
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .value_name("FORMAT")
                .help("Container format: gzip (default) or zstd.")
                .value_parser(|value: &str| value.parse::<Format>()),
        )
        .arg(
            Arg::new("level")
                .long("level")
                .short('l')
                .value_name("N")
                .help("Compression level for the selected format.")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new("md5")
                .long("md5")
                .help("Print the MD5 of TARGET after compressing.")
                .action(ArgAction::SetTrue),
        )
}

fn parse_args<I, S>(tool: Tool, arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from(tool.program_name()));
    }

    let mut matches = clap_command(tool).try_get_matches_from(args)?;
    let operands: Vec<OsString> = matches
        .remove_many::<OsString>("operands")
        .map(Iterator::collect)
        .unwrap_or_default();
    let (format, level, md5) = if tool == Tool::Compress {
        (
            matches.get_one::<Format>("format").copied().unwrap_or_default(),
            matches.get_one::<i32>("level").copied(),
            matches.get_flag("md5"),
        )
    } else {
        (Format::default(), None, false)
    };

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        format,
        level,
        md5,
        operands,
    })
}

/// Runs `tool` with `arguments`, writing user-facing output to `stdout` and
/// diagnostics to `stderr`. Returns the process status.
pub fn run<I, S, Out, Err>(tool: Tool, arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let arguments: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    let operand_count = positional_count(tool, &arguments);
    match parse_args(tool, arguments) {
        Ok(parsed) => execute(tool, parsed, stdout, stderr),
        Err(error) => {
            let _ = writeln!(stderr, "{}", error.to_string().trim_end());
            if operand_count < 2 {
                USAGE_STATUS
            } else {
                tracing::error!(%error, "arguments rejected; nothing converted");
                0
            }
        }
    }
}

/// Counts arguments after the program name that are neither options nor
/// the values of `tool`'s valued options.
fn positional_count(tool: Tool, arguments: &[OsString]) -> usize {
    let mut count = 0;
    let mut rest = arguments.iter().skip(1);
    while let Some(arg) = rest.next() {
        let bytes = arg.as_encoded_bytes();
        if tool == Tool::Compress && VALUED_OPTIONS.iter().any(|option| *option == bytes) {
            rest.next();
        } else if bytes == b"-" || !bytes.starts_with(b"-") {
            count += 1;
        }
    }
    count
}

fn execute<Out, Err>(tool: Tool, parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    if parsed.show_help {
        if stdout.write_all(tool.help_text().as_bytes()).is_err() {
            let _ = write!(stderr, "{}", tool.help_text());
        }
        return 0;
    }
    if parsed.show_version {
        let _ = writeln!(stdout, "{} {}", tool.program_name(), env!("CARGO_PKG_VERSION"));
        return 0;
    }

    let [source, target, ..] = parsed.operands.as_slice() else {
        let _ = write!(stderr, "{}", tool.help_text());
        return USAGE_STATUS;
    };
    let source = unquote(source);
    let target = unquote(target);

    match tool {
        Tool::Gzip => report_transcode("zstd to gzip", zstd_to_gzip(&source, &target), &source),
        Tool::Unzstd => report_transcode("zstd to raw", zstd_to_raw(&source, &target), &source),
        Tool::Compress => {
            let options = CompressorOptions::new(parsed.format).with_digest(parsed.md5);
            let options = match parsed.level {
                Some(level) => options.with_level(level),
                None => Ok(options),
            };
            match options.and_then(|options| compress_file(&source, &target, options)) {
                Ok(profile) => {
                    if write_profile(stdout, &profile, &target, parsed.md5).is_err() {
                        tracing::warn!("failed to write compression report");
                    }
                }
                Err(error) => {
                    tracing::error!(source = %source.display(), %error, "compression failed");
                }
            }
        }
    }
    0
}

fn report_transcode(
    label: &str,
    outcome: compress::CompressResult<compress::TranscodeStats>,
    source: &Path,
) {
    match outcome {
        Ok(stats) => tracing::info!(
            source = %source.display(),
            compressed_in = stats.compressed_in,
            written = stats.written,
            "{label} finished"
        ),
        Err(error) => tracing::error!(source = %source.display(), %error, "{label} failed"),
    }
}

fn write_profile<Out: Write>(
    stdout: &mut Out,
    profile: &CompressionProfile,
    target: &Path,
    md5: bool,
) -> io::Result<()> {
    writeln!(
        stdout,
        "speed:{:.3}MB/s, ratio:{:.3}",
        profile.throughput_bytes_per_ms() * MIB_PER_SEC,
        profile.ratio()
    )?;
    if md5 && !profile.digest.is_empty() {
        let name = target
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned());
        writeln!(stdout, "{}  {name}", profile.digest)?;
    }
    Ok(())
}

/// Strips one pair of surrounding double quotes left by some launchers.
fn unquote(operand: &OsStr) -> PathBuf {
    match operand.to_str() {
        Some(text) if text.starts_with('"') => {
            let inner = &text[1..];
            PathBuf::from(inner.strip_suffix('"').unwrap_or(inner))
        }
        _ => PathBuf::from(operand),
    }
}

/// Converts a numeric status into an [`ExitCode`], wrapping negative values
/// the way a POSIX shell reports them.
#[must_use]
pub fn exit_code_from(status: i32) -> ExitCode {
    ExitCode::from(status.rem_euclid(256) as u8)
}

/// Installs a `tracing` subscriber writing to standard error.
///
/// Filter directives are read from [`LOG_ENV`]; when unset, only warnings
/// and errors are shown. Repeated calls are ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
