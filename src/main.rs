use anyhow::{Context, Result};
use cavern::caves::pattern::parse_auto_radix;
use cavern::caves::{scan_file, CavePattern, ScanConfig, ScanSummary, DEFAULT_MIN_CAVE_LENGTH};
use cavern::io::{ReaderLimits, DEFAULT_MAX_FILE_SIZE};
use cavern::logging::{init_tracing, LogFormat};
use cavern::report::{JsonReporter, Reporter, TracingReporter};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(name = "cavern", version)]
#[command(about = "Find code caves in PE executables")]
struct Args {
    /// PE file to scan
    #[arg(short, long)]
    file: PathBuf,

    /// Minimum cave size in bytes; shorter runs are ignored
    #[arg(short, long, default_value_t = DEFAULT_MIN_CAVE_LENGTH)]
    size: usize,

    /// Image base added to every address (hex with 0x prefix, or decimal)
    #[arg(short, long, default_value = "0x00400000", value_parser = parse_image_base)]
    base: u32,

    /// Byte pattern to look for: null, nop, or a byte value such as 0xCC
    #[arg(short, long = "pattern", default_values = ["null", "nop"])]
    patterns: Vec<CavePattern>,

    /// Write caves as JSON lines to stdout
    #[arg(long)]
    json: bool,

    /// Scan sections in parallel
    #[arg(long)]
    parallel: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Refuse files larger than this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,
}

fn parse_image_base(s: &str) -> std::result::Result<u32, String> {
    let value = parse_auto_radix(s).map_err(|e| format!("invalid image base '{}': {}", s, e))?;
    u32::try_from(value).map_err(|_| format!("image base '{}' does not fit in 32 bits", s))
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_format);
    debug!(?args, "Parsed arguments");

    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ScanSummary> {
    let config = ScanConfig::default()
        .with_min_cave_length(args.size)
        .with_image_base(args.base)
        .with_patterns(args.patterns.clone())
        .with_parallel(args.parallel);
    let limits = ReaderLimits {
        max_file_size: args.max_file_size,
    };

    let mut reporter: Box<dyn Reporter> = if args.json {
        Box::new(JsonReporter::new(std::io::stdout().lock()))
    } else {
        Box::new(TracingReporter)
    };

    scan_file(&args.file, &config, &limits, reporter.as_mut())
        .with_context(|| format!("Failed to scan {}", args.file.display()))
}
