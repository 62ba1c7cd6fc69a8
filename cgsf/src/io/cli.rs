use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    #[arg(
        short,
        long,
        value_name = "[off, error, warn, info, debug, trace]",
        default_value = "info"
    )]
    pub log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Solve an instance file with a soft-fixing variant
    Solve {
        #[arg(short, long, value_name = "FILE")]
        input_file: PathBuf,
        /// Soft-fixing strategy code, 0 (baseline) through 9
        #[arg(short = 't', long, default_value_t = 0)]
        soft_type: u8,
        #[arg(short, long, value_name = "FOLDER", default_value = "output")]
        solution_folder: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        config_file: Option<PathBuf>,
    },
    /// Generate a grid of random benchmark instances
    Generate {
        #[arg(short, long, value_name = "FOLDER")]
        output_folder: PathBuf,
        /// Roll capacity shared by all generated instances
        #[arg(long, default_value_t = 10_000)]
        capacity: u64,
        #[arg(long, default_value_t = 123)]
        seed: u64,
    },
}
