//! ftdc-reader command line tool
//!
//! Decodes an FTDC file and writes one record per metric to stdout.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::LevelFilter;

use ftdc_reader::{dump, FtdcConfig, FtdcError, OutputFormat};

/// Decode a MongoDB FTDC diagnostic data file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the FTDC file
    path: PathBuf,

    /// Output format (JSON or BSON); overrides the config file
    #[arg(short = 'o', long = "outputFormat")]
    output_format: Option<String>,

    /// JSON file with decoder settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log decode progress at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Append log output to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logger(args: &Args) -> Result<(), FtdcError> {
    let mut builder = env_logger::Builder::new();

    builder.filter_level(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    builder.parse_default_env();

    // Custom formatter: just print the level and message
    builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));

    if let Some(path) = &args.log_file {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| FtdcError::FileOpen {
                path: path.display().to_string(),
                source,
            })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else {
        builder.target(env_logger::Target::Stderr);
    }

    let _ = builder.try_init();
    Ok(())
}

fn run(args: &Args) -> Result<(), FtdcError> {
    let mut config = match &args.config {
        Some(path) => FtdcConfig::from_json_file(path)?,
        None => FtdcConfig::default(),
    };
    if let Some(name) = &args.output_format {
        config.output_format = name.parse::<OutputFormat>()?;
    }
    let format = config.output_format;

    let file = File::open(&args.path).map_err(|source| FtdcError::FileOpen {
        path: args.path.display().to_string(),
        source,
    })?;

    let stdout = io::stdout();
    let sink = BufWriter::new(stdout.lock());
    let summary = dump(BufReader::new(file), sink, format, Arc::new(config))?;

    log::info!(
        "decoded {} chunks ({} records, {} bytes) from {}",
        summary.chunks,
        summary.records,
        summary.stats.bytes,
        args.path.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logger(&args) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
