//! The column generation loop.
//!
//! Alternates master relaxation solves with pricing rounds, growing the
//! pattern pool until the knapsack optimum drops to `1 + eps`, the iteration
//! cap is hit or the time budget runs out. The pool only ever grows, so the
//! relaxation objective is non-increasing across iterations.

use std::time::Instant;

use log::{debug, info, warn};

use crate::config::CgConfig;
use crate::entities::{Instance, PatternPool};
use crate::error::Result;
use crate::master::{self, Relaxation};
use crate::pricing::{Priced, Pricing};
use crate::report::{CgIterationRecord, ReportSink};
use crate::solver::SolverOracle;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgStatus {
    /// No column prices above `1 + eps`; the relaxation is optimal.
    Converged,
    /// `max_iterations` master solves were performed.
    IterationCap,
    /// The configured time budget elapsed.
    TimeBudget,
}

#[derive(Debug, Clone)]
pub struct CgOutcome {
    /// The relaxation over the final pool.
    pub relaxation: Relaxation,
    pub status: CgStatus,
    pub iterations: usize,
    pub columns_added: usize,
}

pub struct ColGen<'a> {
    instance: &'a Instance,
    config: &'a CgConfig,
}

impl<'a> ColGen<'a> {
    pub fn new(instance: &'a Instance, config: &'a CgConfig) -> Self {
        Self { instance, config }
    }

    /// Runs column generation on a seeded pool.
    ///
    /// At least one master solve happens even with a zero iteration cap, so
    /// the outcome always carries a valid relaxation.
    pub fn run(
        &self,
        pool: &mut PatternPool,
        oracle: &mut impl SolverOracle,
        sink: &mut dyn ReportSink,
    ) -> Result<CgOutcome> {
        let start = Instant::now();
        let pricing = Pricing::new(self.instance, self.config.eps);
        let mut iterations = 0;
        let mut columns_added = 0;
        let mut prev_objective = f64::INFINITY;

        loop {
            let relaxation = master::solve_relaxation(self.instance, pool, oracle)?;
            iterations += 1;
            debug_assert!(
                relaxation.objective <= prev_objective + 1e-6,
                "relaxation objective rose from {prev_objective} to {}",
                relaxation.objective
            );
            prev_objective = relaxation.objective;
            sink.cg_iteration(&CgIterationRecord {
                iteration: iterations,
                objective: relaxation.objective,
                pool_size: pool.len(),
                elapsed: start.elapsed(),
            });

            match pricing.price(&relaxation.duals)? {
                Priced::Converged { value } => {
                    debug!("[CG] converged at iteration {iterations} (knapsack optimum {value:.6})");
                    return Ok(CgOutcome {
                        relaxation,
                        status: CgStatus::Converged,
                        iterations,
                        columns_added,
                    });
                }
                Priced::Column(pattern) => {
                    let (_, fresh) = pool.insert(pattern);
                    if !fresh {
                        // an improving column already in the pool means the
                        // relaxation solve left residual slack; stop here
                        warn!("[CG] pricing returned a known pattern, stopping");
                        return Ok(CgOutcome {
                            relaxation,
                            status: CgStatus::Converged,
                            iterations,
                            columns_added,
                        });
                    }
                    columns_added += 1;
                }
            }

            if iterations >= self.config.max_iterations {
                info!("[CG] iteration cap of {} reached", self.config.max_iterations);
                let relaxation = master::solve_relaxation(self.instance, pool, oracle)?;
                return Ok(CgOutcome {
                    relaxation,
                    status: CgStatus::IterationCap,
                    iterations,
                    columns_added,
                });
            }
            if let Some(budget) = self.config.time_budget {
                if start.elapsed() >= budget {
                    info!("[CG] time budget of {budget:?} exhausted");
                    let relaxation = master::solve_relaxation(self.instance, pool, oracle)?;
                    return Ok(CgOutcome {
                        relaxation,
                        status: CgStatus::TimeBudget,
                        iterations,
                        columns_added,
                    });
                }
            }
        }
    }
}
