use crate::foundation::math::cubic_coord;

/// Iteration cap for the time-axis bisection (one per bit of an `f64`'s storage).
pub const MAX_ITERATIONS: u32 = 32;

/// How the time-axis bisection stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The curve's time value matched the queried position exactly.
    Exact,
    /// The search parameter could no longer move toward the target.
    Stalled,
    /// The iteration cap was reached; the last parameter is an approximation.
    IterationCap,
}

/// Result of solving a 1-D cubic Bezier for the parameter at a given time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierSolve {
    /// Curve parameter in `[0, 1]`.
    pub t: f64,
    /// `|x(t) - position|` at the returned parameter.
    pub residual: f64,
    pub iterations: u32,
    pub termination: Termination,
}

impl BezierSolve {
    pub fn converged(&self) -> bool {
        self.termination != Termination::IterationCap
    }
}

/// Find `t` such that the time-axis cubic `(x0, x1, x2, x3)` evaluates to `position`.
///
/// Uses monotonic bisection starting from `t = 0.5`. The curve is assumed to be monotonic in `t`
/// (one time value per parameter); non-convergence never fails, it returns the last `t` reached.
pub fn solve_time(x0: f64, x1: f64, x2: f64, x3: f64, position: f64) -> BezierSolve {
    solve_time_capped(x0, x1, x2, x3, position, MAX_ITERATIONS)
}

pub(crate) fn solve_time_capped(
    x0: f64,
    x1: f64,
    x2: f64,
    x3: f64,
    position: f64,
    max_iterations: u32,
) -> BezierSolve {
    let mut t_min = 0.0f64;
    let mut t_max = 1.0f64;
    let mut t = 0.5f64;
    let mut iterations = 0u32;

    let termination = loop {
        let x = cubic_coord(t, x0, x1, x2, x3);
        if x == position {
            break Termination::Exact;
        }
        if position > x {
            if t_min == t {
                break Termination::Stalled;
            }
            t_min = t;
            t += (t_max - t) / 2.0;
        } else {
            if t_max == t {
                break Termination::Stalled;
            }
            t_max = t;
            t -= (t - t_min) / 2.0;
        }

        iterations += 1;
        if iterations >= max_iterations {
            break Termination::IterationCap;
        }
    };

    let residual = (cubic_coord(t, x0, x1, x2, x3) - position).abs();
    if termination != Termination::Exact {
        tracing::debug!(
            t,
            residual,
            iterations,
            ?termination,
            "bezier time solve stopped before an exact match"
        );
    }

    BezierSolve {
        t,
        residual,
        iterations,
        termination,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/bezier.rs"]
mod tests;
