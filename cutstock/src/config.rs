//! Configuration of the column generation loop and the soft-fixing controller.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of the column generation loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CgConfig {
    /// Reduced-cost tolerance: a pattern is improving iff its dual-weighted
    /// value exceeds `1 + eps`.
    pub eps: f64,
    /// Maximum number of master LP / pricing rounds before an early stop.
    pub max_iterations: usize,
    /// Optional wall-clock budget for the loop. `None` disables the check.
    #[serde(default)]
    pub time_budget: Option<Duration>,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            eps: 1e-4,
            max_iterations: 1000,
            time_budget: None,
        }
    }
}

/// Configuration of the soft-fixing controller.
///
/// The default constants are those of the reference heuristics: intensity
/// starts at 0.9 and decays in steps of 0.1 down to 0.1, LP activity is read
/// at 0.5, aggregate activity at 0.3, integer support at 0.5.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SoftFixConfig {
    /// Initial fixing intensity (alpha).
    pub alpha_init: f64,
    /// Decrement applied to alpha after a pass without improvement.
    pub alpha_step: f64,
    /// The controller stops once alpha would fall below this floor.
    pub alpha_floor: f64,
    /// LP usage below this value counts as inactive for threshold fixing.
    pub lp_activity_threshold: f64,
    /// LP usage above this value counts as active for aggregate fixing.
    pub aggregate_threshold: f64,
    /// Integer usage above this value counts as support of an IP solution.
    pub ip_support_threshold: f64,
    /// Objective weight of the shortfall terms in the penalty variant.
    pub penalty_weight: f64,
    /// Safety cap on the number of soft-fixing passes per run.
    pub max_passes: usize,
    /// Cap on fix/re-price rounds inside the recolumning variant.
    pub recolumn_rounds: usize,
}

impl Default for SoftFixConfig {
    fn default() -> Self {
        Self {
            alpha_init: 0.9,
            alpha_step: 0.1,
            alpha_floor: 0.1,
            lp_activity_threshold: 0.5,
            aggregate_threshold: 0.3,
            ip_support_threshold: 0.5,
            penalty_weight: 0.5,
            max_passes: 100,
            recolumn_rounds: 50,
        }
    }
}
