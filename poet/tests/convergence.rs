//! Simulated-plant convergence: the estimator and control law driven
//! together in closed loop against a simple linear plant, the way a real
//! host would drive them one iteration at a time.

use poet::config::ConfigEntry;
use poet::control::MultiplierState;
use poet::estimator::FilterState;
use poet::numeric::Real;

/// A plant whose observed rate is simply `base_rate * applied_multiplier`,
/// the same linear model the control law's coefficients are derived
/// against (§4.3's design note).
struct SimulatedIterativeHost {
    base_rate: f64,
}

impl SimulatedIterativeHost {
    fn new(base_rate: f64) -> Self {
        Self { base_rate }
    }

    fn observe(&self, applied_multiplier: f64) -> f64 {
        self.base_rate * applied_multiplier
    }
}

fn three_state_table() -> Vec<ConfigEntry> {
    vec![
        ConfigEntry {
            speedup: 0.0,
            cost: 0.0,
            idle_partner_id: 1,
        },
        ConfigEntry {
            speedup: 1.0,
            cost: 1.0,
            idle_partner_id: 0,
        },
        ConfigEntry {
            speedup: 4.0,
            cost: 5.0,
            idle_partner_id: 0,
        },
    ]
}

/// Runs `iterations` steps of filter-update -> control-law -> plant-observe
/// and returns the final steady-state error against `target`.
fn run_closed_loop(host: &SimulatedIterativeHost, target: f64, iterations: usize) -> f64 {
    let table = three_state_table();
    let mut filter = FilterState::new();
    let mut multiplier = MultiplierState::from_speedup_table(&table);

    let mut rate = host.observe(multiplier.u.to_f64());
    let mut error = f64::INFINITY;
    for _ in 0..iterations {
        let workload = filter.update(Real::konst(rate), multiplier.u);
        let u = multiplier.calculate_xup(Real::konst(rate), Real::konst(target), workload);
        rate = host.observe(u.to_f64());
        error = target - rate;
    }
    error
}

#[test]
fn closed_loop_converges_to_target_rate() {
    let host = SimulatedIterativeHost::new(3.0);
    let error = run_closed_loop(&host, 9.0, 80);
    assert!(error.abs() < 1e-6, "did not converge: e={error}");
}

#[test]
fn closed_loop_converges_from_a_different_base_rate_and_target() {
    let host = SimulatedIterativeHost::new(5.0);
    let error = run_closed_loop(&host, 7.5, 80);
    assert!(error.abs() < 1e-6, "did not converge: e={error}");
}

/// The Kalman filter's state estimate should settle near the plant's true
/// base rate regardless of which multiplier history drove it there.
#[test]
fn filter_estimate_settles_near_true_base_rate() {
    let table = three_state_table();
    let host = SimulatedIterativeHost::new(3.0);
    let mut filter = FilterState::new();
    let mut multiplier = MultiplierState::from_speedup_table(&table);

    let mut rate = host.observe(multiplier.u.to_f64());
    let mut last_x_hat = 0.0;
    for _ in 0..80 {
        let workload = filter.update(Real::konst(rate), multiplier.u);
        let u = multiplier.calculate_xup(Real::konst(rate), Real::konst(9.0), workload);
        rate = host.observe(u.to_f64());
        last_x_hat = filter.x_hat.to_f64();
    }
    assert!(
        (last_x_hat - 3.0).abs() < 1e-3,
        "estimate did not settle near base rate: x_hat={last_x_hat}"
    );
}

/// Replaying the same closed loop twice from scratch must produce the
/// identical trajectory: nothing in the estimator or control law carries
/// hidden, non-deterministic state.
#[test]
fn closed_loop_trajectory_is_deterministic() {
    let host = SimulatedIterativeHost::new(3.0);
    let first = run_closed_loop(&host, 9.0, 40);
    let second = run_closed_loop(&host, 9.0, 40);
    assert_eq!(first, second);
}
