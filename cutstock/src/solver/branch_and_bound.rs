//! Depth-first branch-and-bound over the simplex relaxation.
//!
//! Branching is deterministic: the lowest-index fractional integer variable
//! is split, and the floor branch is explored first. Warm-start hints that
//! are feasible for the model seed the incumbent, which tightens pruning on
//! consecutive restricted solves.

use log::{debug, warn};

use crate::error::OracleError;
use crate::solver::{simplex, LpModel, LpSolution, MipSolution, SolverOracle};

/// Default backend: two-phase simplex for LPs, DFS branch-and-bound for MIPs.
#[derive(Debug, Clone, Copy)]
pub struct SimplexOracle {
    /// Cap on explored branch-and-bound nodes.
    pub node_limit: usize,
    /// A value within this distance of an integer counts as integral.
    pub int_tol: f64,
}

impl Default for SimplexOracle {
    fn default() -> Self {
        Self {
            node_limit: 200_000,
            int_tol: 1e-6,
        }
    }
}

struct Node {
    bounds: Vec<(f64, Option<f64>)>,
}

impl SolverOracle for SimplexOracle {
    fn solve_lp(&mut self, model: &LpModel) -> Result<LpSolution, OracleError> {
        simplex::solve(model)
    }

    fn solve_mip(
        &mut self,
        model: &LpModel,
        warm_start: Option<&[f64]>,
    ) -> Result<MipSolution, OracleError> {
        let mut incumbent: Option<(Vec<f64>, f64)> = None;
        if let Some(hint) = warm_start {
            if model.is_feasible(hint, self.int_tol) {
                incumbent = Some((hint.to_vec(), model.objective_value(hint)));
            } else {
                debug!("[BNB] warm-start hint is infeasible for this model, ignoring");
            }
        }

        let root = Node {
            bounds: model.vars.iter().map(|v| (v.lb, v.ub)).collect(),
        };
        let mut stack = vec![root];
        let mut scratch = model.clone();
        let mut nodes = 0usize;
        let mut capped = false;

        while let Some(node) = stack.pop() {
            if nodes >= self.node_limit {
                warn!("[BNB] node limit of {} reached", self.node_limit);
                capped = true;
                break;
            }
            nodes += 1;

            for (var, &(lb, ub)) in scratch.vars.iter_mut().zip(&node.bounds) {
                var.lb = lb;
                var.ub = ub;
            }
            let rel = match simplex::solve(&scratch) {
                Ok(sol) => sol,
                Err(OracleError::Infeasible) => continue,
                Err(e) => return Err(e),
            };
            if let Some((_, inc_obj)) = &incumbent {
                if rel.objective >= inc_obj - 1e-9 {
                    continue;
                }
            }

            let fractional = model.vars.iter().enumerate().position(|(j, v)| {
                v.integer && (rel.primal[j] - rel.primal[j].round()).abs() > self.int_tol
            });
            match fractional {
                None => {
                    let mut x = rel.primal.clone();
                    for (j, v) in model.vars.iter().enumerate() {
                        if v.integer {
                            x[j] = x[j].round();
                        }
                    }
                    if !model.is_feasible(&x, 1e-4) {
                        continue;
                    }
                    let obj = model.objective_value(&x);
                    let better = incumbent
                        .as_ref()
                        .map_or(true, |(_, inc_obj)| obj < inc_obj - 1e-9);
                    if better {
                        debug!("[BNB] incumbent {obj:.6} after {nodes} nodes");
                        incumbent = Some((x, obj));
                    }
                }
                Some(j) => {
                    let v = rel.primal[j];
                    let mut up = node.bounds.clone();
                    up[j].0 = up[j].0.max(v.ceil());
                    let mut down = node.bounds;
                    down[j].1 = Some(match down[j].1 {
                        Some(ub) => ub.min(v.floor()),
                        None => v.floor(),
                    });
                    // floor branch is pushed last so it is explored first
                    stack.push(Node { bounds: up });
                    stack.push(Node { bounds: down });
                }
            }
        }

        match incumbent {
            Some((primal, objective)) => Ok(MipSolution {
                objective,
                primal,
                proven_optimal: !capped,
            }),
            None if capped => Err(OracleError::NodeLimit),
            None => Err(OracleError::Infeasible),
        }
    }
}
