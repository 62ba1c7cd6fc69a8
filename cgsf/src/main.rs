use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use cgsf::config::CgsfConfig;
use cgsf::io::cli::{Cli, Command};
use cgsf::io::output::{ReportWriter, SolveOutput};
use cgsf::{gen, io};
use clap::Parser as ClapParser;
use cutstock::pipeline;
use cutstock::softfix::SoftFixVariant;
use cutstock::solver::SimplexOracle;
use log::{info, warn};

fn main() -> Result<()> {
    let args = Cli::parse();
    io::init_logger(args.log_level)?;

    match args.command {
        Command::Solve {
            input_file,
            soft_type,
            solution_folder,
            config_file,
        } => solve(input_file, soft_type, solution_folder, config_file),
        Command::Generate {
            output_folder,
            capacity,
            seed,
        } => gen::generate(&output_folder, capacity, seed),
    }
}

fn solve(
    input_file: PathBuf,
    soft_type: u8,
    solution_folder: PathBuf,
    config_file: Option<PathBuf>,
) -> Result<()> {
    let config: CgsfConfig = match config_file {
        None => {
            warn!("[MAIN] No config file provided, use --config-file to provide a custom config");
            CgsfConfig::default()
        }
        Some(config_file) => {
            let file = File::open(config_file)?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader).context("incorrect config file format")?
        }
    };
    info!("Successfully parsed CgsfConfig: {config:?}");

    let Some(variant) = SoftFixVariant::from_code(soft_type) else {
        bail!("soft fixing code must be an integer between 0 and 9, got {soft_type}");
    };
    if !input_file.is_file() {
        bail!("instance file not found: {}", input_file.display());
    }
    let instance = io::read_instance(&input_file)?;
    info!(
        "[MAIN] loaded '{}': capacity {}, {} item types",
        instance.name,
        instance.capacity,
        instance.n_items()
    );

    if !solution_folder.exists() {
        fs::create_dir_all(&solution_folder).with_context(|| {
            format!("could not create solution folder: {}", solution_folder.display())
        })?;
    }

    let report_path = solution_folder.join(format!("Report_{}.txt", instance.name));
    let mut sink = ReportWriter::create(&report_path, &instance.name)?;
    let mut oracle = SimplexOracle::default();
    let outcome = pipeline::solve(
        &instance,
        variant,
        &config.cg,
        &config.softfix,
        &mut oracle,
        &mut sink,
    )?;

    for (p, pattern) in outcome.pool.iter() {
        let rolls = outcome.best.usage_of(p).round() as u64;
        if rolls == 0 {
            continue;
        }
        info!("{rolls:>3} rolls of pattern {p}");
        for (i, &count) in pattern.counts.iter().enumerate() {
            if count > 0 {
                info!("\t {count} pieces of size {}", instance.items[i].width);
            }
        }
    }
    info!(
        "[MAIN] best integer solution: {} rolls (LP bound {:.4})",
        outcome.best.objective, outcome.relaxation.objective
    );

    let solution_path = solution_folder.join(format!("solution_{}.json", instance.name));
    let output = SolveOutput::new(&instance, &outcome, &config);
    io::write_json(&output, &solution_path)?;
    Ok(())
}
