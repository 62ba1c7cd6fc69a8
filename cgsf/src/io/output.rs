use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use cutstock::entities::Instance;
use cutstock::pipeline::RunOutcome;
use cutstock::report::{CgIterationRecord, FinalRecord, ReportSink, SoftFixRecord};
use serde::Serialize;

use crate::config::CgsfConfig;

/// JSON record of one finished run.
#[derive(Debug, Clone, Serialize)]
pub struct SolveOutput {
    pub instance: String,
    pub variant: String,
    pub best_objective: f64,
    pub lp_bound: f64,
    pub rounded: u64,
    pub cg_iterations: usize,
    pub columns_added: usize,
    pub softfix_passes: usize,
    pub total_patterns: usize,
    pub cg_time_sec: f64,
    pub softfix_time_sec: f64,
    pub total_time_sec: f64,
    pub patterns: Vec<UsedPattern>,
    pub config: CgsfConfig,
}

/// One pattern with positive usage in the best solution.
#[derive(Debug, Clone, Serialize)]
pub struct UsedPattern {
    pub counts: Vec<u64>,
    pub rolls: u64,
}

impl SolveOutput {
    pub fn new(instance: &Instance, outcome: &RunOutcome, config: &CgsfConfig) -> Self {
        let patterns = outcome
            .pool
            .iter()
            .filter(|&(p, _)| outcome.best.usage_of(p) > 0.5)
            .map(|(p, pattern)| UsedPattern {
                counts: pattern.counts.clone(),
                rolls: outcome.best.usage_of(p).round() as u64,
            })
            .collect();
        Self {
            instance: instance.name.clone(),
            variant: outcome.variant.to_string(),
            best_objective: outcome.best.objective,
            lp_bound: outcome.relaxation.objective,
            rounded: outcome.rounded,
            cg_iterations: outcome.cg_iterations,
            columns_added: outcome.columns_added,
            softfix_passes: outcome.softfix_passes,
            total_patterns: outcome.pool.len(),
            cg_time_sec: outcome.cg_elapsed.as_secs_f64(),
            softfix_time_sec: outcome.softfix_elapsed.as_secs_f64(),
            total_time_sec: outcome.total_elapsed.as_secs_f64(),
            patterns,
            config: *config,
        }
    }
}

/// Sink that appends the run's statistics to a per-instance report file.
pub struct ReportWriter {
    writer: BufWriter<File>,
}

impl ReportWriter {
    pub fn create(path: &Path, instance_name: &str) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("could not create report file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "Instance: {instance_name}")?;
        Ok(Self { writer })
    }

    fn line(&mut self, args: fmt::Arguments) {
        if let Err(e) = writeln!(self.writer, "{args}") {
            log::error!("[REPORT] write failed: {e}");
        }
    }
}

impl ReportSink for ReportWriter {
    fn cg_iteration(&mut self, record: &CgIterationRecord) {
        self.line(format_args!(
            "Iteration {}: relaxation Z = {:.6}, {} columns, {:.4} s",
            record.iteration,
            record.objective,
            record.pool_size,
            record.elapsed.as_secs_f64()
        ));
    }

    fn softfix_pass(&mut self, record: &SoftFixRecord) {
        let objective = record
            .objective
            .map_or_else(|| "skipped".into(), |o| format!("{o:.6}"));
        self.line(format_args!(
            "Soft fixing ({}) pass {}: Z = {objective}, added {} columns, {:.4} s",
            record.variant,
            record.pass,
            record.columns_added,
            record.elapsed.as_secs_f64()
        ));
    }

    fn finished(&mut self, record: &FinalRecord) {
        self.line(format_args!("{}", "=".repeat(50)));
        self.line(format_args!(
            "Relaxation objective function: {:.6}",
            record.lp_bound
        ));
        self.line(format_args!(
            "Integer Solution: Z = {}",
            record.best_integer_objective
        ));
        self.line(format_args!(
            "Total columns = {}",
            record.total_patterns_generated
        ));
        self.line(format_args!(
            "Column Generation time: {:.4} seconds.",
            record.cg_elapsed.as_secs_f64()
        ));
        self.line(format_args!(
            "Column Generation with Soft Fixing time: {:.4} seconds.",
            record.softfix_elapsed.as_secs_f64()
        ));
        self.line(format_args!(
            "Total time: {:.4} seconds.",
            record.total_elapsed.as_secs_f64()
        ));
        if let Err(e) = self.writer.flush() {
            log::error!("[REPORT] flush failed: {e}");
        }
    }
}
