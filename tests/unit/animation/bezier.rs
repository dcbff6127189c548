use super::*;

#[test]
fn linear_handles_solve_exactly_at_midpoint() {
    // Handles at 1/3 and 2/3 make x(t) = t * 3.
    let s = solve_time(0.0, 1.0, 2.0, 3.0, 1.5);
    assert_eq!(s.t, 0.5);
    assert_eq!(s.termination, Termination::Exact);
    assert_eq!(s.iterations, 0);
    assert!(s.converged());
}

#[test]
fn eased_curve_lands_in_unit_range_with_small_residual() {
    // Ease-in-out shaped time axis over [0, 1000] ms.
    for position in [1.0, 123.0, 499.0, 777.7, 999.0] {
        let s = solve_time(0.0, 400.0, 600.0, 1000.0, position);
        assert!((0.0..=1.0).contains(&s.t), "t out of range: {}", s.t);
        assert!(s.residual < 1e-3, "residual too large: {}", s.residual);
    }
}

#[test]
fn error_bound_halves_with_each_iteration() {
    let (x0, x1, x2, x3) = (0.0, 800.0, 100.0, 1000.0);
    let position = 333.0;
    let reference = solve_time(x0, x1, x2, x3, position).t;

    let mut previous_bound = 1.0;
    for cap in 1..=24 {
        let s = solve_time_capped(x0, x1, x2, x3, position, cap);
        let bound = 0.5f64.powi(cap as i32);
        assert!(bound < previous_bound);
        assert!(
            (s.t - reference).abs() <= bound,
            "cap {cap}: |{} - {reference}| > {bound}",
            s.t
        );
        previous_bound = bound;
    }
}

#[test]
fn iteration_cap_is_reported() {
    let s = solve_time(0.0, 400.0, 600.0, 1000.0, 123.456);
    assert_eq!(s.iterations, MAX_ITERATIONS);
    assert_eq!(s.termination, Termination::IterationCap);
    assert!(!s.converged());
}

#[test]
fn positions_outside_the_curve_pin_to_the_ends() {
    let before = solve_time(0.0, 10.0, 20.0, 30.0, -5.0);
    assert!(before.t < 1e-6);
    let after = solve_time(0.0, 10.0, 20.0, 30.0, 50.0);
    assert!(after.t > 1.0 - 1e-6);
}
