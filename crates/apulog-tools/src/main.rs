use std::path::PathBuf;

use anyhow::Result;
use apulog::FrameRate;
use clap::{Parser, Subcommand};

mod vgm;
use vgm::{DumpFormat, Through, cycle_files, dump, info, read_vgm_as_vec, shorten, simplify};

/// apulog command line tools
#[derive(Parser)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header and event summary for NES APU traces (.vgm or .vgz; '-' for stdin)
    Info {
        /// Input files to read (use '-' for stdin)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the event log of a trace, one event per line
    Dump {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Representation to print
        #[arg(long, value_enum, default_value_t = DumpFormat::Functional)]
        format: DumpFormat,
    },
    /// Strip loop data, expansion-chip writes and dropped channels from a raw dump
    Simplify {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
        /// Keep DMC register writes
        #[arg(long)]
        keep_dmc: bool,
        #[arg(long)]
        drop_pulse1: bool,
        #[arg(long)]
        drop_pulse2: bool,
        #[arg(long)]
        drop_triangle: bool,
        #[arg(long)]
        drop_noise: bool,
    },
    /// Cut a trace down to its first events
    Shorten {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
        /// Number of events to keep after the clock
        #[arg(long, short = 'n')]
        max_events: usize,
        /// Events to skip before counting
        #[arg(long)]
        start: Option<usize>,
    },
    /// Run traces through a representation and back, reporting the result
    Cycle {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        /// Representation to pass through
        #[arg(long, value_enum, default_value_t = Through::Functional)]
        through: Through,
        /// Frame rate for score representations: a number in Hz or 'auto'
        #[arg(long, value_parser = parse_rate)]
        rate: Option<FrameRate>,
        /// Directory to write cycled traces into
        #[arg(long, short = 'o')]
        out_dir: Option<PathBuf>,
    },
}

fn parse_rate(s: &str) -> Result<FrameRate, String> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(FrameRate::Estimated);
    }
    match s.parse::<f64>() {
        Ok(hz) if hz > 0.0 => Ok(FrameRate::Fixed(hz)),
        _ => Err(format!("expected a positive rate in Hz or 'auto', got '{}'", s)),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { files } => {
            for file in files {
                let bytes = read_vgm_as_vec(&file)?;
                info(&file, bytes)?;
            }
        }
        Commands::Dump { file, format } => {
            let bytes = read_vgm_as_vec(&file)?;
            dump(&file, bytes, format)?;
        }
        Commands::Simplify {
            input,
            output,
            keep_dmc,
            drop_pulse1,
            drop_pulse2,
            drop_triangle,
            drop_noise,
        } => {
            let options = apulog::vgm::SimplifyOptions {
                drop_pulse1,
                drop_pulse2,
                drop_triangle,
                drop_noise,
                drop_dmc: !keep_dmc,
            };
            let bytes = read_vgm_as_vec(&input)?;
            simplify(&input, &output, bytes, &options)?;
        }
        Commands::Shorten {
            input,
            output,
            max_events,
            start,
        } => {
            let bytes = read_vgm_as_vec(&input)?;
            shorten(&input, &output, bytes, max_events, start)?;
        }
        Commands::Cycle {
            files,
            through,
            rate,
            out_dir,
        } => {
            let repr = through.representation(rate.unwrap_or_default());
            cycle_files(&files, repr, out_dir.as_deref())?;
        }
    }

    Ok(())
}
