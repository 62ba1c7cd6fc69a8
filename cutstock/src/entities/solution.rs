use crate::entities::{Instance, PatternId, PatternPool};

/// Fractional solution of the master relaxation over the pool.
///
/// `usage[p]` is the LP value of pattern `p`'s variable at the time of the
/// solve; patterns added later implicitly have usage zero.
#[derive(Debug, Clone)]
pub struct RelaxedSolution {
    pub objective: f64,
    pub usage: Vec<f64>,
}

impl RelaxedSolution {
    pub fn usage_of(&self, id: PatternId) -> f64 {
        self.usage.get(id).copied().unwrap_or(0.0)
    }

    /// Ceiling of every fractional usage: a quick primal bound on the roll count.
    pub fn rounded_value(&self) -> u64 {
        self.usage
            .iter()
            .filter(|&&u| u > 1e-9)
            .map(|u| u.ceil() as u64)
            .sum()
    }
}

/// Integer solution over the pool; the incumbent is the best one found so far.
#[derive(Debug, Clone)]
pub struct IntegerSolution {
    /// Number of rolls used (sum of the pattern usages).
    pub objective: f64,
    pub usage: Vec<f64>,
}

impl IntegerSolution {
    pub fn usage_of(&self, id: PatternId) -> f64 {
        self.usage.get(id).copied().unwrap_or(0.0)
    }

    /// Checks the demand cover: nonnegative integral usages supplying every item.
    pub fn covers_demand(&self, instance: &Instance, pool: &PatternPool) -> bool {
        let integral = self
            .usage
            .iter()
            .all(|&u| u >= -1e-9 && (u - u.round()).abs() < 1e-6);
        if !integral {
            return false;
        }
        instance.items.iter().enumerate().all(|(i, item)| {
            let supplied: f64 = self
                .usage
                .iter()
                .enumerate()
                .map(|(p, &u)| u.round() * pool.pattern(p).counts[i] as f64)
                .sum();
            supplied + 1e-6 >= item.demand as f64
        })
    }

    /// Strict improvement test: ties keep the earlier solution.
    pub fn improves_on(&self, other: &IntegerSolution) -> bool {
        self.objective < other.objective - 1e-9
    }
}
