//! Error taxonomy of the solver.

use thiserror::Error;

/// Errors surfaced by the column generation / soft fixing core.
#[derive(Error, Debug)]
pub enum CutStockError {
    /// Invalid instance data: rejected before any solve is attempted.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The pricing subproblem has no feasible pattern at all.
    /// Unreachable for instances that passed validation.
    #[error("pricing subproblem is infeasible: no item fits within the capacity")]
    PricingInfeasible,

    /// A restricted master solve turned out infeasible where it should not be.
    #[error("restricted master problem is infeasible")]
    RestrictedInfeasible,

    /// The solver oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Failures of the LP/MIP solver oracle backend.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleError {
    #[error("model is infeasible")]
    Infeasible,

    #[error("model is unbounded")]
    Unbounded,

    #[error("node limit exhausted before any integer-feasible point was found")]
    NodeLimit,

    #[error("numerical failure in backend: {0}")]
    Numerical(&'static str),
}

pub type Result<T> = std::result::Result<T, CutStockError>;
