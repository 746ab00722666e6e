//! Bi-exponential fit of autocorrelation curves.
//!
//! The model `f(x) = a + b·x + d·e^(c·x)` splits a correlation curve into a
//! long-term linear drift `(a, b)` and a short-term exponential excursion of
//! initial size `d` decaying at rate `c`. Parameters are found with a
//! weighted Levenberg-Marquardt solver using the analytic Jacobian.

use serde::{Deserialize, Serialize};

use crate::config::defaults::{FIT_INITIAL_GUESS, FIT_MAX_ITERATIONS};

// ============================================================================
// Generic Weighted Least Squares
// ============================================================================

/// A model with `P` parameters and an analytic gradient.
pub trait ParametricModel<const P: usize> {
    fn value(&self, x: f64, params: &[f64; P]) -> f64;

    /// Partial derivatives of `value` with respect to each parameter.
    fn gradient(&self, x: f64, params: &[f64; P]) -> [f64; P];
}

/// One observed point with its weight (diagonal of the weight matrix).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

/// Result of a solver run. `params` is always the best iterate found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOutcome<const P: usize> {
    pub params: [f64; P],
    /// Weighted sum of squared residuals at `params`
    pub cost: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// Levenberg-Marquardt with Marquardt diagonal scaling.
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardt {
    pub max_iterations: usize,
    pub max_evaluations: usize,
    /// Relative cost reduction below which the fit is considered converged
    pub cost_tolerance: f64,
    /// Relative parameter step below which the fit is considered converged
    pub param_tolerance: f64,
    pub initial_damping: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            max_iterations: FIT_MAX_ITERATIONS,
            max_evaluations: usize::MAX,
            cost_tolerance: 1e-10,
            param_tolerance: 1e-10,
            initial_damping: 1e-3,
        }
    }
}

const MIN_DAMPING: f64 = 1e-12;
const MAX_DAMPING: f64 = 1e16;

impl LevenbergMarquardt {
    pub fn with_max_iterations(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Minimize `Σ wᵢ(f(xᵢ; θ) - yᵢ)²` starting from `start`.
    ///
    /// Never fails: running out of iterations or evaluations returns the
    /// best parameters seen with `converged = false`.
    pub fn solve<M, const P: usize>(
        &self,
        model: &M,
        observations: &[Observation],
        start: [f64; P],
    ) -> SolverOutcome<P>
    where
        M: ParametricModel<P>,
    {
        let mut params = start;
        let mut cost = weighted_cost(model, observations, &params);
        let mut evaluations = 1;
        let mut damping = self.initial_damping;
        let mut iterations = 0;
        let mut converged = false;

        'outer: while iterations < self.max_iterations {
            iterations += 1;
            let (jtj, jtr) = normal_equations(model, observations, &params);

            loop {
                if evaluations >= self.max_evaluations {
                    break 'outer;
                }

                let mut damped = jtj;
                for (i, row) in damped.iter_mut().enumerate() {
                    row[i] += damping * jtj[i][i].max(MIN_DAMPING);
                }

                let Some(step) = solve_linear(damped, jtr) else {
                    damping *= 10.0;
                    if damping > MAX_DAMPING {
                        break 'outer;
                    }
                    continue;
                };

                let mut candidate = params;
                for (p, s) in candidate.iter_mut().zip(step.iter()) {
                    *p += s;
                }

                let candidate_cost = weighted_cost(model, observations, &candidate);
                evaluations += 1;

                if candidate_cost.is_finite() && candidate_cost < cost {
                    let reduction = (cost - candidate_cost) / cost.max(f64::MIN_POSITIVE);
                    let small_step = step
                        .iter()
                        .zip(candidate.iter())
                        .all(|(s, p)| s.abs() <= self.param_tolerance * p.abs().max(1e-12));

                    params = candidate;
                    cost = candidate_cost;
                    damping = (damping / 10.0).max(MIN_DAMPING);

                    if reduction <= self.cost_tolerance || small_step || cost == 0.0 {
                        converged = true;
                        break 'outer;
                    }
                    break;
                }

                damping *= 10.0;
                if damping > MAX_DAMPING {
                    // No downhill step exists at any damping: a stationary point
                    converged = true;
                    break 'outer;
                }
            }
        }

        SolverOutcome {
            params,
            cost,
            iterations,
            evaluations,
            converged,
        }
    }
}

fn weighted_cost<M, const P: usize>(model: &M, observations: &[Observation], params: &[f64; P]) -> f64
where
    M: ParametricModel<P>,
{
    observations
        .iter()
        .map(|o| {
            let r = model.value(o.x, params) - o.y;
            o.weight * r * r
        })
        .sum()
}

/// `JᵀWJ` and `JᵀW(y - f)` at `params`.
fn normal_equations<M, const P: usize>(
    model: &M,
    observations: &[Observation],
    params: &[f64; P],
) -> ([[f64; P]; P], [f64; P])
where
    M: ParametricModel<P>,
{
    let mut jtj = [[0.0; P]; P];
    let mut jtr = [0.0; P];

    for o in observations {
        let g = model.gradient(o.x, params);
        let r = o.y - model.value(o.x, params);
        for i in 0..P {
            jtr[i] += o.weight * g[i] * r;
            for j in 0..P {
                jtj[i][j] += o.weight * g[i] * g[j];
            }
        }
    }

    (jtj, jtr)
}

/// Solve `A·x = b` by Gaussian elimination with partial pivoting.
/// Returns None if singular or non-finite.
fn solve_linear<const P: usize>(mut a: [[f64; P]; P], mut b: [f64; P]) -> Option<[f64; P]> {
    for col in 0..P {
        let pivot = (col..P).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if !a[pivot][col].is_finite() || a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..P {
            let factor = a[row][col] / a[col][col];
            for k in col..P {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; P];
    for row in (0..P).rev() {
        let tail: f64 = (row + 1..P).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

// ============================================================================
// Bi-Exponential Model
// ============================================================================

/// `f(x) = a + b·x + d·e^(c·x)`
#[derive(Debug, Clone, Copy, Default)]
pub struct BiExponential;

impl ParametricModel<4> for BiExponential {
    fn value(&self, x: f64, p: &[f64; 4]) -> f64 {
        p[0] + p[1] * x + p[3] * (p[2] * x).exp()
    }

    fn gradient(&self, x: f64, p: &[f64; 4]) -> [f64; 4] {
        let e = (p[2] * x).exp();
        [1.0, x, p[3] * x * e, e]
    }
}

/// Fitted model parameters `[a, b, c, d]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParameters {
    /// Long-term offset
    pub a: f64,
    /// Long-term slope
    pub b: f64,
    /// Exponential rate (negative for a decay)
    pub c: f64,
    /// Initial size of the exponential excursion
    pub d: f64,
}

impl FitParameters {
    pub fn from_array([a, b, c, d]: [f64; 4]) -> Self {
        Self { a, b, c, d }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    pub fn value(&self, x: f64) -> f64 {
        BiExponential.value(x, &self.to_array())
    }

    /// `(offset, slope)` of the long-term trend line.
    pub fn long_term_line(&self) -> (f64, f64) {
        (self.a, self.b)
    }

    /// `(offset, slope)` of the tangent to the model at `x = 0`.
    pub fn short_term_line(&self) -> (f64, f64) {
        (self.a + self.d, self.b + self.c * self.d)
    }

    /// Crossover of the short-term and long-term lines.
    ///
    /// Infinite or NaN when both slopes coincide; callers must check before
    /// using it as a length.
    pub fn characteristic_time(&self) -> f64 {
        let (long_offset, long_slope) = self.long_term_line();
        let (short_offset, short_slope) = self.short_term_line();
        (short_offset - long_offset) / (long_slope - short_slope)
    }

    /// `characteristic_time` as a point count, or None if not usable.
    pub fn characteristic_length(&self) -> Option<usize> {
        let t = self.characteristic_time();
        (t.is_finite() && t >= 0.0).then(|| t as usize)
    }

    /// Model values at `x = 0..len`.
    pub fn fitted_values(&self, len: usize) -> Vec<f64> {
        (0..len).map(|i| self.value(i as f64)).collect()
    }
}

/// Points of the line `offset + slope·i` for `i = 0..len`.
pub fn linear_values(offset: f64, slope: f64, len: usize) -> Vec<f64> {
    (0..len).map(|i| offset + i as f64 * slope).collect()
}

/// Outcome of fitting one autocorrelation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub params: FitParameters,
    pub converged: bool,
    pub iterations: usize,
    pub cost: f64,
}

/// Fits [`BiExponential`] to autocorrelation curves.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiExponentialFitter {
    solver: LevenbergMarquardt,
}

impl BiExponentialFitter {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            solver: LevenbergMarquardt::with_max_iterations(max_iterations),
        }
    }

    /// Fit the curve, one unit-weight observation per lag.
    pub fn fit(&self, curve: &[f64]) -> FitReport {
        let observations: Vec<Observation> = curve
            .iter()
            .enumerate()
            .map(|(i, &y)| Observation {
                x: i as f64,
                y,
                weight: 1.0,
            })
            .collect();

        let outcome = self.solver.solve(&BiExponential, &observations, FIT_INITIAL_GUESS);
        let params = FitParameters::from_array(outcome.params);

        if outcome.converged {
            tracing::debug!(
                a = params.a,
                b = params.b,
                c = params.c,
                d = params.d,
                iterations = outcome.iterations,
                cost = outcome.cost,
                "Bi-exponential fit converged"
            );
        } else {
            tracing::warn!(
                iterations = outcome.iterations,
                evaluations = outcome.evaluations,
                cost = outcome.cost,
                "Bi-exponential fit did not converge, returning best iterate"
            );
        }

        FitReport {
            params,
            converged: outcome.converged,
            iterations: outcome.iterations,
            cost: outcome.cost,
        }
    }
}

/// Fit with the default solver settings.
pub fn fit(curve: &[f64]) -> FitParameters {
    BiExponentialFitter::default().fit(curve).params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_curve(p: FitParameters, len: usize) -> Vec<f64> {
        p.fitted_values(len)
    }

    #[test]
    fn test_degenerate_model_is_constant() {
        let p = FitParameters::from_array([0.7, 0.0, -0.3, 0.0]);
        for x in [0.0, 1.0, 12.5, 299.0, 1e6] {
            assert_eq!(p.value(x), 0.7);
        }
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let p = [0.8, -1e-4, -0.05, 0.3];
        let x = 7.0;
        let g = BiExponential.gradient(x, &p);
        let h = 1e-7;
        for i in 0..4 {
            let mut up = p;
            let mut down = p;
            up[i] += h;
            down[i] -= h;
            let numeric = (BiExponential.value(x, &up) - BiExponential.value(x, &down)) / (2.0 * h);
            assert!((numeric - g[i]).abs() < 1e-5, "param {i}: {numeric} vs {}", g[i]);
        }
    }

    #[test]
    fn test_characteristic_time_is_line_crossover() {
        let p = FitParameters::from_array([0.6, -2e-4, -0.04, 0.35]);
        let t = p.characteristic_time();
        let (lo, ls) = p.long_term_line();
        let (so, ss) = p.short_term_line();
        assert!((lo + ls * t - (so + ss * t)).abs() < 1e-9);
        assert!((t - 25.0).abs() < 1e-9);
        assert_eq!(p.characteristic_length(), Some(25));
    }

    #[test]
    fn test_characteristic_time_undefined_for_equal_slopes() {
        let p = FitParameters::from_array([0.6, 0.0, 0.0, 0.35]);
        assert!(!p.characteristic_time().is_finite());
        assert_eq!(p.characteristic_length(), None);
    }

    #[test]
    fn test_fit_recovers_decaying_curve() {
        let truth = FitParameters::from_array([0.7, -1e-4, -0.08, 0.3]);
        let curve = synthetic_curve(truth, 300);
        let report = BiExponentialFitter::default().fit(&curve);
        let p = report.params;
        assert!((p.a - truth.a).abs() < 1e-4, "{p:?}");
        assert!((p.b - truth.b).abs() < 1e-6, "{p:?}");
        assert!((p.c - truth.c).abs() < 1e-3, "{p:?}");
        assert!((p.d - truth.d).abs() < 1e-3, "{p:?}");
        assert!(report.cost < 1e-10);
    }

    #[test]
    fn test_fit_never_panics_on_flat_curve() {
        let p = fit(&[0.0; 300]);
        assert!(p.a.is_finite());
        // Non-convergence still yields parameters
        let report = BiExponentialFitter::new(1).fit(&vec![1.0; 50]);
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn test_linear_values_and_fitted_values_lengths() {
        let line = linear_values(1.0, 0.5, 4);
        assert_eq!(line, vec![1.0, 1.5, 2.0, 2.5]);
        let p = FitParameters::from_array([0.8, 0.0, -0.05, 0.5]);
        assert_eq!(p.fitted_values(10).len(), 10);
        assert!((p.fitted_values(1)[0] - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_solve_linear_pivots() {
        let a = [[0.0, 2.0], [3.0, 1.0]];
        let x = solve_linear(a, [4.0, 5.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
        assert!(solve_linear([[1.0, 2.0], [2.0, 4.0]], [1.0, 2.0]).is_none());
    }
}
