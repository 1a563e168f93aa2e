/// serialscan: judge whether a serialized-object file would trigger a
/// denial of service when deserialized by a naive consumer.
///
/// ```text
/// serialscan <FILE> [OPTIONS]
///
/// Options:
///   -q, --quiet      Suppress informational events
///       --no-color   Disable coloured output
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                          |
/// |------|--------------------------------------------------|
/// | 0    | Stream judged safe                               |
/// | 1    | Stream judged unsafe (likely DoS payload)        |
/// | 2    | Error (I/O failure, corrupted stream, bad flags) |
///
/// Diagnostic events stream to stdout as the scan progresses; error
/// details go to stderr.
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use serialscan_scanner::Verdict;

mod console;

use console::ConsoleSink;

/// Deserialization DoS scanner for serialized-object streams.
#[derive(Parser)]
#[command(
    name = "serialscan",
    version,
    about = "Scan a serialized-object file for deserialization DoS payloads"
)]
struct Cli {
    /// Path to the serialized-object file to scan.
    file: PathBuf,

    /// Suppress informational events; warnings and the verdict still print.
    #[arg(short, long)]
    quiet: bool,

    /// Disable coloured output (ANSI escape codes are suppressed).
    #[arg(long)]
    no_color: bool,
}

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(verdict) => process::exit(i32::from(!verdict.is_safe())),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(2);
        }
    }
}

fn run(cli: &Cli) -> Result<Verdict> {
    let file = File::open(&cli.file)
        .with_context(|| format!("cannot open {}", cli.file.display()))?;
    let mut sink = ConsoleSink::new(!cli.no_color, cli.quiet);
    serialscan_scanner::check(BufReader::new(file), &mut sink)
        .with_context(|| format!("scan of {} failed", cli.file.display()))
}
