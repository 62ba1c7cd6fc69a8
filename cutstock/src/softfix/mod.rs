//! Soft-fixing: variable-fixing policies that bias the integer master toward
//! the fractional hint of the relaxation.
//!
//! A [`FixingSet`] partitions the pool variables into forced-zero,
//! forced-lower-bound and free. It is built fresh per pass from an LP or
//! integer solution and applied as variable bounds on the restricted model.
//! Patterns priced into the pool after the set was built are free by
//! construction.

mod controller;

pub use controller::{SoftFixController, SoftFixOutcome};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::{Instance, PatternId, PatternPool};

const ACTIVITY_TOL: f64 = 1e-9;

/// The soft-fixing strategy catalogue, selectable by numeric code 0 to 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftFixVariant {
    /// No fixing, solve the unrestricted pool (baseline).
    None,
    /// Zero-fix patterns with LP usage below a threshold.
    GlobalThreshold,
    /// Free, per item, the patterns with positive LP usage covering it.
    PerItemActive,
    /// Per-item-active fixing alternated with restricted re-pricing rounds.
    IterativeRecolumning,
    /// Like `PerItemActive` but active in the incumbent integer solution.
    IpActivePerItem,
    /// Lower bounds derived from the incumbent's pattern multiplicities.
    PatternwiseIpBounds,
    /// Free every pattern above an aggregate LP usage threshold.
    AggregateLpActive,
    /// `IpActivePerItem`, then `PatternwiseIpBounds` seeded by its result.
    IpActiveThenBounds,
    /// `PatternwiseIpBounds`, then `IpActivePerItem` seeded by its result.
    BoundsThenIpActive,
    /// No hard fixing; penalize integer usage falling short of the LP hint.
    PenaltyUnderused,
}

impl SoftFixVariant {
    pub const ALL: [SoftFixVariant; 10] = [
        SoftFixVariant::None,
        SoftFixVariant::GlobalThreshold,
        SoftFixVariant::PerItemActive,
        SoftFixVariant::IterativeRecolumning,
        SoftFixVariant::IpActivePerItem,
        SoftFixVariant::PatternwiseIpBounds,
        SoftFixVariant::AggregateLpActive,
        SoftFixVariant::IpActiveThenBounds,
        SoftFixVariant::BoundsThenIpActive,
        SoftFixVariant::PenaltyUnderused,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        Self::ALL.iter().position(|&v| v == self).unwrap() as u8
    }
}

impl fmt::Display for SoftFixVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SoftFixVariant::None => "none",
            SoftFixVariant::GlobalThreshold => "global-threshold",
            SoftFixVariant::PerItemActive => "per-item-active",
            SoftFixVariant::IterativeRecolumning => "iterative-recolumning",
            SoftFixVariant::IpActivePerItem => "ip-active-per-item",
            SoftFixVariant::PatternwiseIpBounds => "patternwise-ip-bounds",
            SoftFixVariant::AggregateLpActive => "aggregate-lp-active",
            SoftFixVariant::IpActiveThenBounds => "ip-active-then-bounds",
            SoftFixVariant::BoundsThenIpActive => "bounds-then-ip-active",
            SoftFixVariant::PenaltyUnderused => "penalty-underused",
        };
        write!(f, "{name}")
    }
}

/// Bound class of one pool variable within a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixStatus {
    Free,
    Zero,
    AtLeast(f64),
}

/// Per-pass partition of pool variables into bound classes.
///
/// Indices beyond the recorded length are free, so a set built before the
/// pool grew stays valid for the grown pool.
#[derive(Debug, Clone)]
pub struct FixingSet {
    statuses: Vec<FixStatus>,
}

impl FixingSet {
    pub fn free(n: usize) -> Self {
        Self {
            statuses: vec![FixStatus::Free; n],
        }
    }

    pub fn status(&self, p: PatternId) -> FixStatus {
        self.statuses.get(p).copied().unwrap_or(FixStatus::Free)
    }

    pub fn set(&mut self, p: PatternId, status: FixStatus) {
        self.statuses[p] = status;
    }

    pub fn n_fixed_zero(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| matches!(s, FixStatus::Zero))
            .count()
    }

    fn zero_except(pool: &PatternPool, mut keep: impl FnMut(PatternId) -> bool) -> Self {
        let statuses = (0..pool.len())
            .map(|p| {
                if keep(p) {
                    FixStatus::Free
                } else {
                    FixStatus::Zero
                }
            })
            .collect();
        Self { statuses }
    }

    /// Zero-fix every pattern whose usage falls below `threshold`.
    pub fn global_threshold(pool: &PatternPool, usage: &[f64], threshold: f64) -> Self {
        Self::zero_except(pool, |p| usage_of(usage, p) >= threshold)
    }

    /// Free the union, over items, of actively used patterns covering them.
    ///
    /// `support` is the usage cut deciding "active": strictly positive for
    /// LP solutions, around one half for integer solutions.
    pub fn item_active(
        instance: &Instance,
        pool: &PatternPool,
        usage: &[f64],
        support: f64,
    ) -> Self {
        Self::zero_except(pool, |p| {
            usage_of(usage, p) > support
                && (0..instance.n_items()).any(|i| pool.pattern(p).covers(i))
        })
    }

    /// Free every pattern above the aggregate usage threshold.
    pub fn aggregate_active(pool: &PatternPool, usage: &[f64], threshold: f64) -> Self {
        Self::zero_except(pool, |p| usage_of(usage, p) > threshold)
    }

    /// Lower-bound each supported pattern at an alpha fraction of its
    /// incumbent multiplicity; everything else stays free.
    pub fn patternwise_bounds(
        pool: &PatternPool,
        ip_usage: &[f64],
        alpha: f64,
        support: f64,
    ) -> Self {
        let statuses = (0..pool.len())
            .map(|p| {
                let x = usage_of(ip_usage, p);
                if x > support {
                    FixStatus::AtLeast((alpha * x).ceil())
                } else {
                    FixStatus::Free
                }
            })
            .collect();
        Self { statuses }
    }
}

// usage vectors may predate pool growth; missing entries read as zero
fn usage_of(usage: &[f64], p: PatternId) -> f64 {
    usage.get(p).copied().unwrap_or(0.0)
}

pub(crate) fn is_active(usage: &[f64], p: PatternId) -> bool {
    usage_of(usage, p) > ACTIVITY_TOL
}
