#![deny(unsafe_code)]

//! `zpack-unzstd`: zstd decompressor.

use mimalloc::MiMalloc;

/// High-performance memory allocator for improved allocation throughput.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::{env, io, process::ExitCode};

fn main() -> ExitCode {
    cli::init_tracing();

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let status = cli::run(cli::Tool::Unzstd, env::args_os(), &mut stdout, &mut stderr);
    cli::exit_code_from(status)
}
