//! Drives soft-fixing passes over the converged relaxation.
//!
//! Each pass builds a fixing set from the LP hint or the incumbent, solves
//! the restricted integer master and keeps the strictly better solution. The
//! intensity `alpha` resets on improvement or on newly priced columns and
//! otherwise decays until the floor, which ends the run.

use std::time::Instant;

use log::{debug, info};

use crate::config::{CgConfig, SoftFixConfig};
use crate::entities::{Instance, IntegerSolution, PatternPool};
use crate::error::{CutStockError, OracleError, Result};
use crate::master::{self, Penalty, Relaxation};
use crate::pricing::{Priced, Pricing};
use crate::report::{PassStatus, ReportSink, SoftFixRecord};
use crate::softfix::{is_active, usage_of, FixingSet, SoftFixVariant};
use crate::solver::SolverOracle;

#[derive(Debug, Clone)]
pub struct SoftFixOutcome {
    pub best: IntegerSolution,
    pub passes: usize,
    pub columns_added: usize,
}

pub struct SoftFixController<'a> {
    instance: &'a Instance,
    cg: &'a CgConfig,
    sf: &'a SoftFixConfig,
}

impl<'a> SoftFixController<'a> {
    pub fn new(instance: &'a Instance, cg: &'a CgConfig, sf: &'a SoftFixConfig) -> Self {
        Self { instance, cg, sf }
    }

    /// Solves the unrestricted integer master over the pool.
    ///
    /// This is the baseline every variant starts from; unlike restricted
    /// passes its infeasibility is fatal, since the relaxation was feasible.
    pub fn solve_baseline(
        &self,
        pool: &PatternPool,
        warm: Option<&IntegerSolution>,
        oracle: &mut impl SolverOracle,
    ) -> Result<IntegerSolution> {
        let model = master::integer_model(self.instance, pool, None, None);
        let hint: Option<Vec<f64>> = warm.map(|w| padded_usage(&w.usage, pool.len()));
        let sol = match oracle.solve_mip(&model, hint.as_deref()) {
            Ok(sol) => sol,
            Err(OracleError::Infeasible) => return Err(CutStockError::RestrictedInfeasible),
            Err(e) => return Err(CutStockError::Oracle(e)),
        };
        Ok(IntegerSolution {
            objective: sol.objective,
            usage: sol.primal,
        })
    }

    /// Runs the full alpha schedule for `variant`, starting from `baseline`.
    ///
    /// The pool may grow (recolumning variant); the incumbent only changes on
    /// strict improvement.
    pub fn run(
        &self,
        variant: SoftFixVariant,
        relaxation: &Relaxation,
        pool: &mut PatternPool,
        baseline: &IntegerSolution,
        oracle: &mut impl SolverOracle,
        sink: &mut dyn ReportSink,
    ) -> Result<SoftFixOutcome> {
        let mut best = baseline.clone();
        let mut passes = 0;
        let mut columns_added = 0;
        if variant == SoftFixVariant::None {
            return Ok(SoftFixOutcome {
                best,
                passes,
                columns_added,
            });
        }

        let mut alpha = self.sf.alpha_init;
        while passes < self.sf.max_passes {
            passes += 1;
            let pass_start = Instant::now();
            let pool_before = pool.len();
            let result = self.pass(variant, alpha, relaxation, pool, &best, oracle)?;
            let added = pool.len() - pool_before;
            columns_added += added;

            let (status, objective) = match &result {
                Some(sol) if sol.improves_on(&best) => (PassStatus::Improved, Some(sol.objective)),
                Some(sol) => (PassStatus::NoImprovement, Some(sol.objective)),
                None => (PassStatus::Skipped, None),
            };
            sink.softfix_pass(&SoftFixRecord {
                variant,
                pass: passes,
                objective,
                columns_added: added,
                elapsed: pass_start.elapsed(),
                status,
            });

            if status == PassStatus::Improved {
                best = result.unwrap_or(best);
                alpha = self.sf.alpha_init;
                debug!("[SF] pass {passes} improved the incumbent to {:.4}", best.objective);
            } else if added > 0 {
                alpha = self.sf.alpha_init;
                debug!("[SF] pass {passes} priced {added} new columns, alpha reset");
            } else if alpha > self.sf.alpha_floor + 1e-3 {
                alpha -= self.sf.alpha_step;
            } else {
                break;
            }
        }

        info!(
            "[SF] {variant} done after {passes} passes, incumbent {:.4}",
            best.objective
        );
        Ok(SoftFixOutcome {
            best,
            passes,
            columns_added,
        })
    }

    fn pass(
        &self,
        variant: SoftFixVariant,
        alpha: f64,
        relaxation: &Relaxation,
        pool: &mut PatternPool,
        incumbent: &IntegerSolution,
        oracle: &mut impl SolverOracle,
    ) -> Result<Option<IntegerSolution>> {
        match variant {
            SoftFixVariant::None => self.restricted(pool, None, None, incumbent, oracle),
            SoftFixVariant::GlobalThreshold => {
                let fixing = FixingSet::global_threshold(
                    pool,
                    &relaxation.usage,
                    alpha * self.sf.lp_activity_threshold,
                );
                self.restricted(pool, Some(&fixing), None, incumbent, oracle)
            }
            SoftFixVariant::PerItemActive => {
                let fixing = FixingSet::item_active(self.instance, pool, &relaxation.usage, 0.0);
                self.restricted(pool, Some(&fixing), None, incumbent, oracle)
            }
            SoftFixVariant::IterativeRecolumning => {
                self.recolumning(relaxation, pool, incumbent, oracle)
            }
            SoftFixVariant::IpActivePerItem => {
                let fixing = FixingSet::item_active(
                    self.instance,
                    pool,
                    &incumbent.usage,
                    self.sf.ip_support_threshold,
                );
                self.restricted(pool, Some(&fixing), None, incumbent, oracle)
            }
            SoftFixVariant::PatternwiseIpBounds => {
                let fixing = FixingSet::patternwise_bounds(
                    pool,
                    &incumbent.usage,
                    alpha,
                    self.sf.ip_support_threshold,
                );
                self.restricted(pool, Some(&fixing), None, incumbent, oracle)
            }
            SoftFixVariant::AggregateLpActive => {
                let fixing = FixingSet::aggregate_active(
                    pool,
                    &relaxation.usage,
                    alpha * self.sf.aggregate_threshold,
                );
                self.restricted(pool, Some(&fixing), None, incumbent, oracle)
            }
            SoftFixVariant::IpActiveThenBounds => {
                let first = self.pass(
                    SoftFixVariant::IpActivePerItem,
                    alpha,
                    relaxation,
                    pool,
                    incumbent,
                    oracle,
                )?;
                // the second stage fixes from the first stage's support
                let seed = first.as_ref().unwrap_or(incumbent);
                let fixing = FixingSet::patternwise_bounds(
                    pool,
                    &seed.usage,
                    alpha,
                    self.sf.ip_support_threshold,
                );
                let second = self.restricted(pool, Some(&fixing), None, incumbent, oracle)?;
                Ok(better_of(first, second))
            }
            SoftFixVariant::BoundsThenIpActive => {
                let first = self.pass(
                    SoftFixVariant::PatternwiseIpBounds,
                    alpha,
                    relaxation,
                    pool,
                    incumbent,
                    oracle,
                )?;
                let seed = first.as_ref().unwrap_or(incumbent);
                let fixing = FixingSet::item_active(
                    self.instance,
                    pool,
                    &seed.usage,
                    self.sf.ip_support_threshold,
                );
                let second = self.restricted(pool, Some(&fixing), None, incumbent, oracle)?;
                Ok(better_of(first, second))
            }
            SoftFixVariant::PenaltyUnderused => {
                // bias, not bounds: shortfall below the alpha-scaled LP hint
                // is priced into the objective
                let targets: Vec<_> = (0..pool.len())
                    .filter(|&p| is_active(&relaxation.usage, p))
                    .map(|p| (p, alpha * usage_of(&relaxation.usage, p)))
                    .collect();
                let penalty = Penalty {
                    targets,
                    weight: self.sf.penalty_weight,
                };
                self.restricted(pool, None, Some(&penalty), incumbent, oracle)
            }
        }
    }

    /// One restricted integer solve. Infeasibility or a node-limit bailout
    /// skips the pass; other oracle failures abort the run.
    fn restricted(
        &self,
        pool: &PatternPool,
        fixing: Option<&FixingSet>,
        penalty: Option<&Penalty>,
        incumbent: &IntegerSolution,
        oracle: &mut impl SolverOracle,
    ) -> Result<Option<IntegerSolution>> {
        let model = master::integer_model(self.instance, pool, fixing, penalty);
        let mut warm = padded_usage(&incumbent.usage, pool.len());
        if let Some(penalty) = penalty {
            for &(p, target) in &penalty.targets {
                warm.push((target - warm[p]).max(0.0));
            }
        }
        match oracle.solve_mip(&model, Some(&warm)) {
            Ok(sol) => {
                // penalty shortfall variables do not count rolls
                let usage = sol.primal[..pool.len()].to_vec();
                let objective = usage.iter().sum();
                Ok(Some(IntegerSolution { objective, usage }))
            }
            Err(OracleError::Infeasible) | Err(OracleError::NodeLimit) => {
                debug!("[SF] restricted solve skipped, incumbent retained");
                Ok(None)
            }
            Err(e) => Err(CutStockError::Oracle(e)),
        }
    }

    /// Per-item-active fixing alternated with restricted re-pricing rounds.
    ///
    /// Columns priced inside the pass enter the pool free, so each round's
    /// integer solve may use them.
    fn recolumning(
        &self,
        relaxation: &Relaxation,
        pool: &mut PatternPool,
        incumbent: &IntegerSolution,
        oracle: &mut impl SolverOracle,
    ) -> Result<Option<IntegerSolution>> {
        let pricing = Pricing::new(self.instance, self.cg.eps);
        let fixing = FixingSet::item_active(self.instance, pool, &relaxation.usage, 0.0);
        let mut pass_best: Option<IntegerSolution> = None;
        let mut pending_column = false;

        for _ in 0..self.sf.recolumn_rounds {
            if let Some(sol) = self.restricted(pool, Some(&fixing), None, incumbent, oracle)? {
                if pass_best.as_ref().map_or(true, |b| sol.improves_on(b)) {
                    pass_best = Some(sol);
                }
            }
            pending_column = false;

            let model = master::restricted_relaxation_model(self.instance, pool, Some(&fixing));
            let rel = match oracle.solve_lp(&model) {
                Ok(rel) => rel,
                Err(OracleError::Infeasible) => break,
                Err(e) => return Err(CutStockError::Oracle(e)),
            };
            match pricing.price(&rel.duals)? {
                Priced::Converged { .. } => break,
                Priced::Column(pattern) => {
                    let (_, fresh) = pool.insert(pattern);
                    if !fresh {
                        break;
                    }
                    pending_column = true;
                }
            }
        }

        if pending_column {
            // the round cap cut the loop after an insertion
            if let Some(sol) = self.restricted(pool, Some(&fixing), None, incumbent, oracle)? {
                if pass_best.as_ref().map_or(true, |b| sol.improves_on(b)) {
                    pass_best = Some(sol);
                }
            }
        }
        Ok(pass_best)
    }
}

fn padded_usage(usage: &[f64], len: usize) -> Vec<f64> {
    (0..len).map(|p| usage_of(usage, p)).collect()
}

fn better_of(
    a: Option<IntegerSolution>,
    b: Option<IntegerSolution>,
) -> Option<IntegerSolution> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if b.improves_on(&a) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cg::ColGen;
    use crate::entities::Item;
    use crate::report::NoSink;
    use crate::solver::SimplexOracle;
    use float_cmp::approx_eq;
    use test_case::test_case;

    fn instance() -> Instance {
        Instance::new(
            "t",
            7.0,
            vec![
                Item {
                    width: 3.0,
                    demand: 4,
                },
                Item {
                    width: 2.0,
                    demand: 6,
                },
            ],
        )
        .unwrap()
    }

    fn converged(
        instance: &Instance,
        cg: &CgConfig,
    ) -> (Relaxation, PatternPool, SimplexOracle) {
        let mut pool = PatternPool::seeded(instance);
        let mut oracle = SimplexOracle::default();
        let outcome = ColGen::new(instance, cg)
            .run(&mut pool, &mut oracle, &mut NoSink)
            .unwrap();
        (outcome.relaxation, pool, oracle)
    }

    #[test]
    fn baseline_covers_demand() {
        let instance = instance();
        let cg = CgConfig::default();
        let (_, pool, mut oracle) = converged(&instance, &cg);
        let sf = SoftFixConfig::default();
        let controller = SoftFixController::new(&instance, &cg, &sf);
        let baseline = controller.solve_baseline(&pool, None, &mut oracle).unwrap();
        assert!(baseline.covers_demand(&instance, &pool));
    }

    #[test_case(SoftFixVariant::None)]
    #[test_case(SoftFixVariant::GlobalThreshold)]
    #[test_case(SoftFixVariant::PerItemActive)]
    #[test_case(SoftFixVariant::IterativeRecolumning)]
    #[test_case(SoftFixVariant::IpActivePerItem)]
    #[test_case(SoftFixVariant::PatternwiseIpBounds)]
    #[test_case(SoftFixVariant::AggregateLpActive)]
    #[test_case(SoftFixVariant::IpActiveThenBounds)]
    #[test_case(SoftFixVariant::BoundsThenIpActive)]
    #[test_case(SoftFixVariant::PenaltyUnderused)]
    fn every_variant_yields_a_feasible_incumbent(variant: SoftFixVariant) {
        let instance = instance();
        let cg = CgConfig::default();
        let (relaxation, mut pool, mut oracle) = converged(&instance, &cg);
        let sf = SoftFixConfig::default();
        let controller = SoftFixController::new(&instance, &cg, &sf);
        let baseline = controller.solve_baseline(&pool, None, &mut oracle).unwrap();

        let outcome = controller
            .run(variant, &relaxation, &mut pool, &baseline, &mut oracle, &mut NoSink)
            .unwrap();
        assert!(outcome.best.covers_demand(&instance, &pool));
        // the incumbent never regresses below the baseline
        assert!(outcome.best.objective <= baseline.objective + 1e-9);
    }

    #[test]
    fn none_variant_skips_all_passes() {
        let instance = instance();
        let cg = CgConfig::default();
        let (relaxation, mut pool, mut oracle) = converged(&instance, &cg);
        let sf = SoftFixConfig::default();
        let controller = SoftFixController::new(&instance, &cg, &sf);
        let baseline = controller.solve_baseline(&pool, None, &mut oracle).unwrap();

        let outcome = controller
            .run(
                SoftFixVariant::None,
                &relaxation,
                &mut pool,
                &baseline,
                &mut oracle,
                &mut NoSink,
            )
            .unwrap();
        assert_eq!(outcome.passes, 0);
        assert!(approx_eq!(f64, outcome.best.objective, baseline.objective, epsilon = 1e-9));
    }

    #[test]
    fn penalty_objective_counts_rolls_only() {
        let instance = instance();
        let cg = CgConfig::default();
        let (relaxation, mut pool, mut oracle) = converged(&instance, &cg);
        let sf = SoftFixConfig::default();
        let controller = SoftFixController::new(&instance, &cg, &sf);
        let baseline = controller.solve_baseline(&pool, None, &mut oracle).unwrap();

        let outcome = controller
            .run(
                SoftFixVariant::PenaltyUnderused,
                &relaxation,
                &mut pool,
                &baseline,
                &mut oracle,
                &mut NoSink,
            )
            .unwrap();
        // roll counts are integral even though shortfall terms are continuous
        assert!(approx_eq!(
            f64,
            outcome.best.objective,
            outcome.best.objective.round(),
            epsilon = 1e-6
        ));
    }

    #[test]
    fn determinism_across_runs() {
        let instance = instance();
        let cg = CgConfig::default();
        let sf = SoftFixConfig::default();
        let run_once = || {
            let (relaxation, mut pool, mut oracle) = converged(&instance, &cg);
            let controller = SoftFixController::new(&instance, &cg, &sf);
            let baseline = controller.solve_baseline(&pool, None, &mut oracle).unwrap();
            controller
                .run(
                    SoftFixVariant::PenaltyUnderused,
                    &relaxation,
                    &mut pool,
                    &baseline,
                    &mut oracle,
                    &mut NoSink,
                )
                .unwrap()
        };
        let a = run_once();
        let b = run_once();
        assert_eq!(a.best.objective.to_bits(), b.best.objective.to_bits());
        assert_eq!(
            a.best.usage.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b.best.usage.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
        assert_eq!(a.passes, b.passes);
    }
}
