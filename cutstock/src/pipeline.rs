//! End-to-end solve: seed, column generation, baseline integer solve,
//! soft fixing, final bounds.

use std::time::{Duration, Instant};

use log::info;

use crate::cg::{CgStatus, ColGen};
use crate::config::{CgConfig, SoftFixConfig};
use crate::entities::{Instance, IntegerSolution, PatternPool, RelaxedSolution};
use crate::error::Result;
use crate::master;
use crate::report::{FinalRecord, ReportSink};
use crate::softfix::{SoftFixController, SoftFixVariant};
use crate::solver::SolverOracle;

/// Everything a run produces, timing split included.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub variant: SoftFixVariant,
    /// Best integer solution over the final pool.
    pub best: IntegerSolution,
    /// Relaxation over the final pool, the strongest lower bound available.
    pub relaxation: RelaxedSolution,
    /// Roll count obtained by rounding the converged relaxation up.
    pub rounded: u64,
    pub cg_status: CgStatus,
    pub cg_iterations: usize,
    pub columns_added: usize,
    pub softfix_passes: usize,
    /// The pool the run grew; pattern indices in the solutions refer to it.
    pub pool: PatternPool,
    pub cg_elapsed: Duration,
    pub softfix_elapsed: Duration,
    pub total_elapsed: Duration,
}

/// Solves `instance` with the given soft-fixing variant.
///
/// Stage one seeds the pool and runs column generation to a converged (or
/// early-stopped) relaxation, then solves the baseline integer master warm
/// started from the rounded relaxation. Stage two runs the soft-fixing
/// schedule. A final relaxation and integer solve over the full pool close
/// the bounds; the strictly better integer solution wins.
pub fn solve(
    instance: &Instance,
    variant: SoftFixVariant,
    cg_cfg: &CgConfig,
    sf_cfg: &SoftFixConfig,
    oracle: &mut impl SolverOracle,
    sink: &mut dyn ReportSink,
) -> Result<RunOutcome> {
    let start = Instant::now();
    let mut pool = PatternPool::seeded(instance);
    info!(
        "[RUN] solving '{}' with variant {variant}: {} items, {} seed patterns",
        instance.name,
        instance.n_items(),
        pool.len()
    );

    let cg_out = ColGen::new(instance, cg_cfg).run(&mut pool, oracle, sink)?;
    let converged = RelaxedSolution {
        objective: cg_out.relaxation.objective,
        usage: cg_out.relaxation.usage.clone(),
    };
    let rounded = converged.rounded_value();

    let controller = SoftFixController::new(instance, cg_cfg, sf_cfg);
    let rounded_hint = round_up(&converged);
    let baseline = controller.solve_baseline(&pool, Some(&rounded_hint), oracle)?;
    let cg_elapsed = start.elapsed();
    info!(
        "[RUN] relaxation {:.4}, rounded {rounded}, baseline integer {:.0}",
        converged.objective, baseline.objective
    );

    let sf_start = Instant::now();
    let sf_out = controller.run(variant, &cg_out.relaxation, &mut pool, &baseline, oracle, sink)?;
    let softfix_elapsed = sf_start.elapsed();

    // final bounds over the full pool
    let final_rel = master::solve_relaxation(instance, &pool, oracle)?;
    let final_ip = controller.solve_baseline(&pool, Some(&sf_out.best), oracle)?;
    let mut best = sf_out.best;
    if final_ip.improves_on(&best) {
        best = final_ip;
    }
    debug_assert!(best.covers_demand(instance, &pool));

    let relaxation = RelaxedSolution {
        objective: final_rel.objective,
        usage: final_rel.usage,
    };
    let total_elapsed = start.elapsed();
    sink.finished(&FinalRecord {
        variant,
        best_integer_objective: best.objective,
        lp_bound: relaxation.objective,
        total_patterns_generated: pool.len(),
        cg_elapsed,
        softfix_elapsed,
        total_elapsed,
    });

    Ok(RunOutcome {
        variant,
        best,
        relaxation,
        rounded,
        cg_status: cg_out.status,
        cg_iterations: cg_out.iterations,
        columns_added: cg_out.columns_added + sf_out.columns_added,
        softfix_passes: sf_out.passes,
        pool,
        cg_elapsed,
        softfix_elapsed,
        total_elapsed,
    })
}

// ceiling each fractional usage yields a feasible integer warm start
fn round_up(relaxation: &RelaxedSolution) -> IntegerSolution {
    let usage: Vec<f64> = relaxation
        .usage
        .iter()
        .map(|&u| if u > 1e-9 { u.ceil() } else { 0.0 })
        .collect();
    let objective = usage.iter().sum();
    IntegerSolution { objective, usage }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Item;
    use crate::report::NoSink;
    use crate::solver::SimplexOracle;
    use float_cmp::approx_eq;

    #[test]
    fn single_item_instance_uses_one_roll() {
        let instance = Instance::new(
            "a",
            10_000.0,
            vec![Item {
                width: 250.0,
                demand: 10,
            }],
        )
        .unwrap();
        let out = solve(
            &instance,
            SoftFixVariant::None,
            &CgConfig::default(),
            &SoftFixConfig::default(),
            &mut SimplexOracle::default(),
            &mut NoSink,
        )
        .unwrap();
        assert!(approx_eq!(f64, out.best.objective, 1.0, epsilon = 1e-7));
        assert!(approx_eq!(f64, out.relaxation.objective, 0.25, epsilon = 1e-7));
        assert_eq!(out.rounded, 1);
    }

    #[test]
    fn incompatible_items_need_two_rolls() {
        let instance = Instance::new(
            "b",
            100.0,
            vec![
                Item {
                    width: 60.0,
                    demand: 1,
                },
                Item {
                    width: 50.0,
                    demand: 1,
                },
            ],
        )
        .unwrap();
        let out = solve(
            &instance,
            SoftFixVariant::GlobalThreshold,
            &CgConfig::default(),
            &SoftFixConfig::default(),
            &mut SimplexOracle::default(),
            &mut NoSink,
        )
        .unwrap();
        assert!(approx_eq!(f64, out.best.objective, 2.0, epsilon = 1e-7));
    }
}
