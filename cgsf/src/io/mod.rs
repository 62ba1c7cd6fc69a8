use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use cutstock::entities::{Instance, Item};
use log::{info, log, Level, LevelFilter};
use serde::Serialize;

use crate::EPOCH;

pub mod cli;
pub mod output;

/// Reads a plain-text instance: the first line is the roll capacity, every
/// following non-empty line is a `width demand` pair.
pub fn read_instance(path: &Path) -> Result<Instance> {
    let file = File::open(path)
        .with_context(|| format!("could not open instance file: {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let capacity: f64 = lines
        .next()
        .ok_or_else(|| anyhow!("instance file is empty: {}", path.display()))??
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow!("missing capacity on the first line"))?
        .parse()
        .context("could not parse the capacity")?;

    let mut items = Vec::new();
    for line in lines {
        let line = line?;
        let mut fields = line.split_whitespace();
        let (Some(width), Some(demand)) = (fields.next(), fields.next()) else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(anyhow!("malformed item line: {line:?}"));
        };
        items.push(Item {
            width: width.parse().context("could not parse an item width")?,
            // demands are written as floats by some generators
            demand: demand.parse::<f64>().context("could not parse an item demand")?.round()
                as u64,
        });
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("instance");
    Ok(Instance::new(name, capacity, items)?)
}

pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not create solution file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("could not write solution file: {}", path.display()))?;
    info!("solution written to {:?}", fs::canonicalize(path)?);
    Ok(())
}

pub fn init_logger(level_filter: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        // Perform allocation-free log formatting
        .format(|out, message, record| {
            let handle = std::thread::current();
            let thread_name = handle.name().unwrap_or("-");

            let duration = EPOCH.elapsed();
            let sec = duration.as_secs() % 60;
            let min = (duration.as_secs() / 60) % 60;
            let hours = (duration.as_secs() / 60) / 60;

            let prefix = format!(
                "[{}] [{:0>2}:{:0>2}:{:0>2}] <{}>",
                record.level(),
                hours,
                min,
                sec,
                thread_name,
            );

            out.finish(format_args!("{prefix:<27}{message}"))
        })
        .level(level_filter)
        .chain(std::io::stdout())
        .apply()?;
    log!(
        Level::Info,
        "time: {}",
        humantime::format_rfc3339_seconds(std::time::SystemTime::now())
    );
    Ok(())
}
