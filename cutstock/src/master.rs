//! Master problem construction and solves over the pattern pool.
//!
//! The relaxation is `min sum(lambda_p)` subject to the demand cover
//! `sum_p a_{p,i} * lambda_p >= d_i` with `lambda_p >= 0`. Restricted integer
//! models are derived from the same pool by index-subsetting: a fixing set
//! turns into variable bounds, and the penalty variant appends continuous
//! shortfall columns.

use crate::entities::{Instance, PatternId, PatternPool};
use crate::error::Result;
use crate::softfix::{FixStatus, FixingSet};
use crate::solver::{LpModel, RowSense, SolverOracle, VarDef};

/// Result of a relaxation solve: objective, pattern usages and dual prices.
///
/// The duals are owned by the current CG iteration and must not be cached
/// across solves.
#[derive(Debug, Clone)]
pub struct Relaxation {
    pub objective: f64,
    pub usage: Vec<f64>,
    pub duals: Vec<f64>,
}

/// Objective bias of the penalty soft-fixing variant: for each targeted
/// pattern, a continuous shortfall variable `s_p >= target_p - lambda_p`
/// enters the objective with `weight`.
#[derive(Debug, Clone)]
pub struct Penalty {
    pub targets: Vec<(PatternId, f64)>,
    pub weight: f64,
}

fn demand_rows(instance: &Instance, pool: &PatternPool, model: &mut LpModel) {
    for (i, item) in instance.items.iter().enumerate() {
        let coefs: Vec<(usize, f64)> = pool
            .iter()
            .filter(|(_, pattern)| pattern.covers(i))
            .map(|(p, pattern)| (p, pattern.counts[i] as f64))
            .collect();
        model.add_row(coefs, RowSense::Geq, item.demand as f64);
    }
}

fn pattern_var(fixing: Option<&FixingSet>, p: PatternId, integer: bool) -> VarDef {
    let mut var = if integer {
        VarDef::integer(1.0)
    } else {
        VarDef::continuous(1.0)
    };
    match fixing.map_or(FixStatus::Free, |f| f.status(p)) {
        FixStatus::Free => {}
        FixStatus::Zero => var.ub = Some(0.0),
        FixStatus::AtLeast(floor) => var.lb = floor,
    }
    var
}

/// The LP relaxation over the full pool.
pub fn relaxation_model(instance: &Instance, pool: &PatternPool) -> LpModel {
    restricted_relaxation_model(instance, pool, None)
}

/// The LP relaxation with a fixing set applied as variable bounds.
pub fn restricted_relaxation_model(
    instance: &Instance,
    pool: &PatternPool,
    fixing: Option<&FixingSet>,
) -> LpModel {
    let mut model = LpModel::default();
    for (p, _) in pool.iter() {
        model.add_var(pattern_var(fixing, p, false));
    }
    demand_rows(instance, pool, &mut model);
    model
}

/// The integer master over the pool, optionally restricted by a fixing set
/// and biased by penalty terms.
pub fn integer_model(
    instance: &Instance,
    pool: &PatternPool,
    fixing: Option<&FixingSet>,
    penalty: Option<&Penalty>,
) -> LpModel {
    let mut model = LpModel::default();
    for (p, _) in pool.iter() {
        model.add_var(pattern_var(fixing, p, true));
    }
    demand_rows(instance, pool, &mut model);
    if let Some(penalty) = penalty {
        for &(p, target) in &penalty.targets {
            let s = model.add_var(VarDef::continuous(penalty.weight));
            model.add_row(vec![(p, 1.0), (s, 1.0)], RowSense::Geq, target);
        }
    }
    model
}

/// Solves the relaxation over the current pool and returns usages and duals.
pub fn solve_relaxation(
    instance: &Instance,
    pool: &PatternPool,
    oracle: &mut impl SolverOracle,
) -> Result<Relaxation> {
    debug_assert!(!pool.is_empty(), "the pool must be seeded before solving");
    let model = relaxation_model(instance, pool);
    let sol = oracle.solve_lp(&model)?;
    debug_assert_eq!(sol.duals.len(), instance.n_items());
    Ok(Relaxation {
        objective: sol.objective,
        usage: sol.primal,
        duals: sol.duals,
    })
}
