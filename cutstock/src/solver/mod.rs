//! Solver oracle boundary: model types, the [`SolverOracle`] contract and a
//! self-contained simplex + branch-and-bound backend.
//!
//! The core never touches a concrete backend; it builds an [`LpModel`] and
//! hands it to whatever implements [`SolverOracle`]. Backends must be
//! deterministic: identical models yield identical solutions.

mod branch_and_bound;
mod simplex;

pub use branch_and_bound::SimplexOracle;

use crate::error::OracleError;

/// Row sense of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    Geq,
    Leq,
    Eq,
}

/// A sparse linear constraint `sum(coef * var) <sense> rhs`.
#[derive(Debug, Clone)]
pub struct Row {
    pub coefs: Vec<(usize, f64)>,
    pub sense: RowSense,
    pub rhs: f64,
}

/// A decision variable: objective coefficient, bounds and integrality.
#[derive(Debug, Clone, Copy)]
pub struct VarDef {
    pub obj: f64,
    pub lb: f64,
    pub ub: Option<f64>,
    pub integer: bool,
}

impl VarDef {
    /// Nonnegative continuous variable.
    pub fn continuous(obj: f64) -> Self {
        Self {
            obj,
            lb: 0.0,
            ub: None,
            integer: false,
        }
    }

    /// Nonnegative integer variable.
    pub fn integer(obj: f64) -> Self {
        Self {
            integer: true,
            ..Self::continuous(obj)
        }
    }
}

/// A linear model, minimized by convention. Integrality flags are ignored by
/// LP solves and honored by MIP solves.
#[derive(Debug, Clone, Default)]
pub struct LpModel {
    pub vars: Vec<VarDef>,
    pub rows: Vec<Row>,
}

impl LpModel {
    pub fn add_var(&mut self, var: VarDef) -> usize {
        self.vars.push(var);
        self.vars.len() - 1
    }

    pub fn add_row(&mut self, coefs: Vec<(usize, f64)>, sense: RowSense, rhs: f64) {
        debug_assert!(coefs.iter().all(|&(j, _)| j < self.vars.len()));
        self.rows.push(Row { coefs, sense, rhs });
    }

    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.vars.iter().zip(x).map(|(v, &xj)| v.obj * xj).sum()
    }

    /// Whether `x` satisfies bounds, rows and integrality within `tol`.
    pub fn is_feasible(&self, x: &[f64], tol: f64) -> bool {
        if x.len() != self.vars.len() {
            return false;
        }
        for (v, &xj) in self.vars.iter().zip(x) {
            if xj < v.lb - tol {
                return false;
            }
            if let Some(ub) = v.ub {
                if xj > ub + tol {
                    return false;
                }
            }
            if v.integer && (xj - xj.round()).abs() > tol {
                return false;
            }
        }
        self.rows.iter().all(|row| {
            let lhs: f64 = row.coefs.iter().map(|&(j, c)| c * x[j]).sum();
            match row.sense {
                RowSense::Geq => lhs >= row.rhs - tol,
                RowSense::Leq => lhs <= row.rhs + tol,
                RowSense::Eq => (lhs - row.rhs).abs() <= tol,
            }
        })
    }
}

/// Primal and dual result of an LP solve.
#[derive(Debug, Clone)]
pub struct LpSolution {
    pub objective: f64,
    pub primal: Vec<f64>,
    /// One dual value per model row, in row order.
    pub duals: Vec<f64>,
}

/// Result of a MIP solve.
#[derive(Debug, Clone)]
pub struct MipSolution {
    pub objective: f64,
    pub primal: Vec<f64>,
    /// False when the search stopped at the node cap with an incumbent.
    pub proven_optimal: bool,
}

/// The solve primitive the core relies on.
///
/// `warm_start` is an optional hint (a known feasible point) that backends
/// may use to accelerate consecutive restricted solves; ignoring it is
/// correct, only slower.
pub trait SolverOracle {
    fn solve_lp(&mut self, model: &LpModel) -> Result<LpSolution, OracleError>;

    fn solve_mip(
        &mut self,
        model: &LpModel,
        warm_start: Option<&[f64]>,
    ) -> Result<MipSolution, OracleError>;
}
