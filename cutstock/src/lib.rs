//! Column generation with soft fixing for the 1D cutting stock / set covering problem.
//!
//! The crate is organized around a growing [`entities::PatternPool`] of cutting
//! patterns: a restricted master LP is solved over the pool, its duals feed a
//! bounded-knapsack pricing oracle ([`pricing`]), and newly priced columns are
//! inserted until no improving column exists ([`cg`]). The fractional solution
//! is then turned into an integer one by a family of soft-fixing heuristics
//! ([`softfix`]) that restrict or bias the integer master problem.
//!
//! All LP/MIP solving goes through the [`solver::SolverOracle`] trait; a
//! self-contained simplex + branch-and-bound backend is provided, but any
//! backend honoring the contract can be substituted.

pub mod cg;
pub mod config;
pub mod entities;
pub mod error;
pub mod master;
pub mod pipeline;
pub mod pricing;
pub mod report;
pub mod softfix;
pub mod solver;
