//! Report records emitted by the core and the sink that consumes them.

use std::time::Duration;

use log::info;
use serde::Serialize;
use thousands::Separable;

use crate::softfix::SoftFixVariant;

/// One row per master LP / pricing round.
#[derive(Debug, Clone, Serialize)]
pub struct CgIterationRecord {
    pub iteration: usize,
    pub objective: f64,
    pub pool_size: usize,
    pub elapsed: Duration,
}

/// Outcome class of one soft-fixing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassStatus {
    Improved,
    NoImprovement,
    /// The restricted solve was infeasible; the incumbent was retained.
    Skipped,
}

/// One row per soft-fixing pass.
#[derive(Debug, Clone, Serialize)]
pub struct SoftFixRecord {
    pub variant: SoftFixVariant,
    pub pass: usize,
    /// Objective of the restricted solve, absent when the pass was skipped.
    pub objective: Option<f64>,
    pub columns_added: usize,
    pub elapsed: Duration,
    pub status: PassStatus,
}

/// Emitted once at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct FinalRecord {
    pub variant: SoftFixVariant,
    pub best_integer_objective: f64,
    pub lp_bound: f64,
    pub total_patterns_generated: usize,
    pub cg_elapsed: Duration,
    pub softfix_elapsed: Duration,
    pub total_elapsed: Duration,
}

/// Consumer of iteration and final statistics.
///
/// All methods default to no-ops so sinks implement only what they need.
pub trait ReportSink {
    fn cg_iteration(&mut self, _record: &CgIterationRecord) {}
    fn softfix_pass(&mut self, _record: &SoftFixRecord) {}
    fn finished(&mut self, _record: &FinalRecord) {}
}

/// Sink that drops every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSink;

impl ReportSink for NoSink {}

/// Sink that forwards every record to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn cg_iteration(&mut self, record: &CgIterationRecord) {
        info!(
            "[CG] iter {:>4} | objective {:>12.4} | {} patterns | {:.1?}",
            record.iteration,
            record.objective,
            record.pool_size.separate_with_commas(),
            record.elapsed
        );
    }

    fn softfix_pass(&mut self, record: &SoftFixRecord) {
        info!(
            "[SF] {} pass {:>3} | objective {} | +{} columns | {:?} | {:.1?}",
            record.variant,
            record.pass,
            record
                .objective
                .map_or_else(|| "-".into(), |o| format!("{o:.4}")),
            record.columns_added,
            record.status,
            record.elapsed
        );
    }

    fn finished(&mut self, record: &FinalRecord) {
        info!(
            "[RUN] {} finished: best {:.4}, LP bound {:.4}, {} patterns, {:.1?}",
            record.variant,
            record.best_integer_objective,
            record.lp_bound,
            record.total_patterns_generated.separate_with_commas(),
            record.total_elapsed
        );
    }
}
