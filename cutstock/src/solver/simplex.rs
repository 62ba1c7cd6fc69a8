//! Dense two-phase primal simplex.
//!
//! Bland's rule throughout (lowest eligible index enters, ties in the ratio
//! test broken by lowest basic index), which makes the solver cycle-free and
//! deterministic. Every row carries an artificial column so the duals can be
//! read off the final reduced costs uniformly.
//!
//! Variable lower bounds are handled by shifting, upper bounds by explicit
//! rows appended after the model rows.

use crate::error::OracleError;
use crate::solver::{LpModel, LpSolution, RowSense};

const PIVOT_TOL: f64 = 1e-9;
const FEAS_TOL: f64 = 1e-7;

struct BuildRow {
    coefs: Vec<f64>,
    sense: RowSense,
    rhs: f64,
}

pub(crate) fn solve(model: &LpModel) -> Result<LpSolution, OracleError> {
    let n = model.vars.len();
    let lbs: Vec<f64> = model.vars.iter().map(|v| v.lb).collect();

    for v in &model.vars {
        if let Some(ub) = v.ub {
            if ub < v.lb - FEAS_TOL {
                return Err(OracleError::Infeasible);
            }
        }
    }

    // model rows in the shifted space y = x - lb, then upper-bound rows
    let mut rows: Vec<BuildRow> = Vec::with_capacity(model.rows.len());
    for row in &model.rows {
        let mut dense = vec![0.0; n];
        let mut shift = 0.0;
        for &(j, c) in &row.coefs {
            dense[j] += c;
            shift += c * lbs[j];
        }
        rows.push(BuildRow {
            coefs: dense,
            sense: row.sense,
            rhs: row.rhs - shift,
        });
    }
    let n_model_rows = rows.len();
    for (j, v) in model.vars.iter().enumerate() {
        if let Some(ub) = v.ub {
            let mut dense = vec![0.0; n];
            dense[j] = 1.0;
            rows.push(BuildRow {
                coefs: dense,
                sense: RowSense::Leq,
                rhs: ub - v.lb,
            });
        }
    }
    let m = rows.len();

    if m == 0 {
        // no constraints: the optimum sits on the lower bounds
        if model.vars.iter().any(|v| v.obj < 0.0 && v.ub.is_none()) {
            return Err(OracleError::Unbounded);
        }
        let primal = lbs;
        let objective = model.objective_value(&primal);
        return Ok(LpSolution {
            objective,
            primal,
            duals: vec![],
        });
    }

    // normalize to nonnegative right-hand sides
    let mut flipped = vec![false; m];
    for (i, r) in rows.iter_mut().enumerate() {
        if r.rhs < 0.0 {
            for c in r.coefs.iter_mut() {
                *c = -*c;
            }
            r.rhs = -r.rhs;
            r.sense = match r.sense {
                RowSense::Geq => RowSense::Leq,
                RowSense::Leq => RowSense::Geq,
                RowSense::Eq => RowSense::Eq,
            };
            flipped[i] = true;
        }
    }

    // column layout: structurals, slack/surplus, one artificial per row
    let mut aux_col = vec![None; m];
    let mut next = n;
    for (i, r) in rows.iter().enumerate() {
        if r.sense != RowSense::Eq {
            aux_col[i] = Some(next);
            next += 1;
        }
    }
    let art_start = next;
    let cols = art_start + m;

    let mut a = vec![vec![0.0; cols]; m];
    let mut rhs = vec![0.0; m];
    let mut basis = vec![0usize; m];
    for i in 0..m {
        a[i][..n].copy_from_slice(&rows[i].coefs);
        if let Some(c) = aux_col[i] {
            a[i][c] = match rows[i].sense {
                RowSense::Leq => 1.0,
                RowSense::Geq => -1.0,
                RowSense::Eq => unreachable!(),
            };
        }
        a[i][art_start + i] = 1.0;
        rhs[i] = rows[i].rhs;
        basis[i] = match rows[i].sense {
            RowSense::Leq => aux_col[i].unwrap(),
            _ => art_start + i,
        };
    }

    // phase 1: drive the artificials to zero
    let phase1 = |j: usize| if j >= art_start { 1.0 } else { 0.0 };
    pivot_until_optimal(&mut a, &mut rhs, &mut basis, art_start, &phase1)?;
    let infeasibility: f64 = basis
        .iter()
        .zip(&rhs)
        .filter(|&(&b, _)| b >= art_start)
        .map(|(_, &r)| r)
        .sum();
    if infeasibility > 1e-6 {
        return Err(OracleError::Infeasible);
    }
    for i in 0..m {
        if basis[i] >= art_start {
            // basic artificial at zero: pivot it out if the row is not redundant
            if let Some(j) = (0..art_start).find(|&j| a[i][j].abs() > PIVOT_TOL) {
                pivot(&mut a, &mut rhs, &mut basis, i, j);
            }
        }
    }

    // phase 2: the real objective
    let objs: Vec<f64> = model.vars.iter().map(|v| v.obj).collect();
    let phase2 = |j: usize| if j < n { objs[j] } else { 0.0 };
    pivot_until_optimal(&mut a, &mut rhs, &mut basis, art_start, &phase2)?;

    let mut primal = lbs;
    for i in 0..m {
        if basis[i] < n {
            primal[basis[i]] += rhs[i].max(0.0);
        }
    }
    let objective = model.objective_value(&primal);

    // dual of row i = -(reduced cost of its artificial), sign-adjusted for
    // rows that were normalized by negation
    let mut duals = Vec::with_capacity(n_model_rows);
    for i in 0..n_model_rows {
        let rc = reduced_cost(&a, &basis, art_start + i, &phase2);
        let pi = -rc;
        duals.push(if flipped[i] { -pi } else { pi });
    }

    Ok(LpSolution {
        objective,
        primal,
        duals,
    })
}

fn reduced_cost(a: &[Vec<f64>], basis: &[usize], j: usize, cost: &impl Fn(usize) -> f64) -> f64 {
    let direct: f64 = cost(j);
    let priced: f64 = basis
        .iter()
        .enumerate()
        .map(|(i, &b)| cost(b) * a[i][j])
        .sum();
    direct - priced
}

fn pivot_until_optimal(
    a: &mut [Vec<f64>],
    rhs: &mut [f64],
    basis: &mut [usize],
    art_start: usize,
    cost: &impl Fn(usize) -> f64,
) -> Result<(), OracleError> {
    let m = a.len();
    let pivot_cap = 20_000 + 200 * (m + art_start);
    for _ in 0..pivot_cap {
        // Bland: lowest-index non-artificial column with negative reduced cost
        let mut entering = None;
        for j in 0..art_start {
            if reduced_cost(a, basis, j, cost) < -PIVOT_TOL {
                entering = Some(j);
                break;
            }
        }
        let Some(j) = entering else {
            return Ok(());
        };

        let mut leave: Option<(usize, f64)> = None;
        for i in 0..m {
            if a[i][j] > PIVOT_TOL {
                let ratio = rhs[i].max(0.0) / a[i][j];
                leave = match leave {
                    None => Some((i, ratio)),
                    Some((li, lr)) => {
                        if ratio < lr - 1e-12 || ((ratio - lr).abs() <= 1e-12 && basis[i] < basis[li])
                        {
                            Some((i, ratio))
                        } else {
                            Some((li, lr))
                        }
                    }
                };
            }
        }
        let Some((r, _)) = leave else {
            return Err(OracleError::Unbounded);
        };
        pivot(a, rhs, basis, r, j);
    }
    log::warn!("[SIMPLEX] pivot cap reached, aborting solve");
    Err(OracleError::Numerical("simplex pivot cap reached"))
}

fn pivot(a: &mut [Vec<f64>], rhs: &mut [f64], basis: &mut [usize], r: usize, j: usize) {
    let m = a.len();
    let piv = a[r][j];
    for c in a[r].iter_mut() {
        *c /= piv;
    }
    rhs[r] /= piv;
    let prow = a[r].clone();
    let prhs = rhs[r];
    for i in 0..m {
        if i == r {
            continue;
        }
        let f = a[i][j];
        if f.abs() > 1e-12 {
            for (c, &pc) in a[i].iter_mut().zip(&prow) {
                *c -= f * pc;
            }
            rhs[i] -= f * prhs;
            a[i][j] = 0.0;
        }
    }
    a[r][j] = 1.0;
    basis[r] = j;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{RowSense, VarDef};
    use float_cmp::approx_eq;

    #[test]
    fn covering_lp_with_duals() {
        // min x0 + x1  s.t.  x0 >= 1,  2 x1 >= 1
        let mut model = LpModel::default();
        let x0 = model.add_var(VarDef::continuous(1.0));
        let x1 = model.add_var(VarDef::continuous(1.0));
        model.add_row(vec![(x0, 1.0)], RowSense::Geq, 1.0);
        model.add_row(vec![(x1, 2.0)], RowSense::Geq, 1.0);

        let sol = solve(&model).unwrap();
        assert!(approx_eq!(f64, sol.objective, 1.5, epsilon = 1e-7));
        assert!(approx_eq!(f64, sol.primal[x0], 1.0, epsilon = 1e-7));
        assert!(approx_eq!(f64, sol.primal[x1], 0.5, epsilon = 1e-7));
        assert!(approx_eq!(f64, sol.duals[0], 1.0, epsilon = 1e-7));
        assert!(approx_eq!(f64, sol.duals[1], 0.5, epsilon = 1e-7));
    }

    #[test]
    fn single_pattern_relaxation() {
        // min x  s.t.  40 x >= 10   ->  x = 0.25, dual 0.025
        let mut model = LpModel::default();
        let x = model.add_var(VarDef::continuous(1.0));
        model.add_row(vec![(x, 40.0)], RowSense::Geq, 10.0);

        let sol = solve(&model).unwrap();
        assert!(approx_eq!(f64, sol.objective, 0.25, epsilon = 1e-9));
        assert!(approx_eq!(f64, sol.duals[0], 0.025, epsilon = 1e-9));
    }

    #[test]
    fn respects_bounds() {
        // min x0 + x1  s.t.  x0 + x1 >= 3,  x0 <= 1
        let mut model = LpModel::default();
        let x0 = model.add_var(VarDef {
            obj: 1.0,
            lb: 0.0,
            ub: Some(1.0),
            integer: false,
        });
        let x1 = model.add_var(VarDef::continuous(1.0));
        model.add_row(vec![(x0, 1.0), (x1, 1.0)], RowSense::Geq, 3.0);

        let sol = solve(&model).unwrap();
        assert!(approx_eq!(f64, sol.objective, 3.0, epsilon = 1e-7));
        assert!(sol.primal[x0] <= 1.0 + 1e-7);
    }

    #[test]
    fn lower_bound_shifting() {
        // min x0  s.t.  x0 >= 0 and lb = 2 -> optimum at the bound
        let mut model = LpModel::default();
        let x0 = model.add_var(VarDef {
            obj: 1.0,
            lb: 2.0,
            ub: None,
            integer: false,
        });
        model.add_row(vec![(x0, 1.0)], RowSense::Geq, 1.0);

        let sol = solve(&model).unwrap();
        assert!(approx_eq!(f64, sol.primal[x0], 2.0, epsilon = 1e-7));
        assert!(approx_eq!(f64, sol.objective, 2.0, epsilon = 1e-7));
    }

    #[test]
    fn detects_infeasibility() {
        // x <= 1 and x >= 2 cannot hold together
        let mut model = LpModel::default();
        let x = model.add_var(VarDef::continuous(1.0));
        model.add_row(vec![(x, 1.0)], RowSense::Leq, 1.0);
        model.add_row(vec![(x, 1.0)], RowSense::Geq, 2.0);

        assert!(matches!(solve(&model), Err(OracleError::Infeasible)));
    }

    #[test]
    fn detects_inconsistent_bounds() {
        let mut model = LpModel::default();
        model.add_var(VarDef {
            obj: 1.0,
            lb: 3.0,
            ub: Some(1.0),
            integer: false,
        });
        assert!(matches!(solve(&model), Err(OracleError::Infeasible)));
    }

    #[test]
    fn detects_unboundedness() {
        // min -x  s.t.  x >= 0, no upper bound
        let mut model = LpModel::default();
        let x = model.add_var(VarDef::continuous(-1.0));
        model.add_row(vec![(x, 1.0)], RowSense::Geq, 0.0);

        assert!(matches!(solve(&model), Err(OracleError::Unbounded)));
    }

    #[test]
    fn equality_rows() {
        // min x0 + x1  s.t.  x0 + x1 = 2,  x0 - x1 = 0
        let mut model = LpModel::default();
        let x0 = model.add_var(VarDef::continuous(1.0));
        let x1 = model.add_var(VarDef::continuous(1.0));
        model.add_row(vec![(x0, 1.0), (x1, 1.0)], RowSense::Eq, 2.0);
        model.add_row(vec![(x0, 1.0), (x1, -1.0)], RowSense::Eq, 0.0);

        let sol = solve(&model).unwrap();
        assert!(approx_eq!(f64, sol.primal[x0], 1.0, epsilon = 1e-7));
        assert!(approx_eq!(f64, sol.primal[x1], 1.0, epsilon = 1e-7));
    }

    #[test]
    fn deterministic_across_runs() {
        let build = || {
            let mut model = LpModel::default();
            for k in 0..5 {
                model.add_var(VarDef::continuous(1.0 + k as f64 * 0.1));
            }
            model.add_row(
                vec![(0, 3.0), (1, 2.0), (2, 1.0)],
                RowSense::Geq,
                7.0,
            );
            model.add_row(
                vec![(2, 4.0), (3, 1.0), (4, 2.0)],
                RowSense::Geq,
                5.0,
            );
            model.add_row(vec![(0, 1.0), (4, 1.0)], RowSense::Geq, 2.0);
            model
        };
        let a = solve(&build()).unwrap();
        let b = solve(&build()).unwrap();
        assert_eq!(a.objective.to_bits(), b.objective.to_bits());
        assert_eq!(
            a.primal.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b.primal.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }
}
