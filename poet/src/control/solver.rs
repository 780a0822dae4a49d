//! Time-division solver: given a lower/upper configuration pair and a
//! target multiplier, computes the iteration split realising it (§4.4).

use crate::numeric::Real;

/// Everything the solver needs about a candidate configuration pair,
/// already projected onto the controlled metric (speedup under
/// PERFORMANCE, cost under POWER) and the secondary metric (the other
/// one).
pub struct Candidate {
    pub lower_xup: Real,
    pub lower_cost: Real,
    pub upper_xup: Real,
    pub upper_cost: Real,
    /// Only meaningful when `lower_xup < 1` (idle lower).
    pub partner_xup: Real,
    pub partner_cost: Real,
}

/// Result of solving one candidate pair against a target multiplier and
/// control period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub low_state_iters: u32,
    pub idle_ns: u64,
    pub cost_estimate: Real,
    pub cost_xup_estimate: Real,
}

/// Solves §4.4 for one candidate pair, period `period_iters`, target
/// multiplier `tau`, and base workload `w` (used only by the idle branch,
/// to convert the idle fraction of an iteration into nanoseconds).
pub fn solve(candidate: &Candidate, period_iters: u32, tau: Real, w: Real) -> Solution {
    let t = period_iters as f64;
    let lower = candidate.lower_xup.to_f64();
    let upper = candidate.upper_xup.to_f64();
    let tau_f = tau.to_f64();

    if lower >= 1.0 {
        solve_non_idle(candidate, t, lower, upper, tau_f)
    } else {
        solve_idle(candidate, t, lower, upper, tau_f, w)
    }
}

fn solve_non_idle(candidate: &Candidate, t: f64, lower: f64, upper: f64, tau: f64) -> Solution {
    let x = if (upper - lower).abs() < f64::EPSILON {
        0.0
    } else {
        (upper * lower - tau * lower) / (upper * tau - tau * lower)
    };
    let l = (t * x).trunc();
    let low_state_iters = l as u32;

    let lower_cost = candidate.lower_cost.to_f64();
    let upper_cost = candidate.upper_cost.to_f64();
    let cost = (l / lower) * lower_cost + ((t - l) / upper) * upper_cost;
    let cost_xup = (l * lower_cost + (t - l) * upper_cost) / t;

    Solution {
        low_state_iters,
        idle_ns: 0,
        cost_estimate: Real::konst(cost),
        cost_xup_estimate: Real::konst(cost_xup),
    }
}

fn solve_idle(candidate: &Candidate, t: f64, lower: f64, upper: f64, tau: f64, w: Real) -> Solution {
    let partner = candidate.partner_xup.to_f64();
    let upper_cost = candidate.upper_cost.to_f64();
    let h = (tau * upper) / (t * (upper - tau) + tau);

    if h >= partner {
        let cost = (t / upper) * upper_cost;
        return Solution {
            low_state_iters: 0,
            idle_ns: 0,
            cost_estimate: Real::konst(cost),
            cost_xup_estimate: Real::konst(upper_cost),
        };
    }

    let lower_cost = candidate.lower_cost.to_f64();
    let partner_cost = candidate.partner_cost.to_f64();
    let (x, hybrid_cost) = if lower <= 0.0 {
        let x = 1.0 - h / partner;
        (x, x * lower_cost + (1.0 - x) * partner_cost)
    } else {
        let x = lower * (h - partner) / (h * (lower - partner));
        (
            x,
            (x / lower) * lower_cost + ((1.0 - x) / partner) * partner_cost,
        )
    };

    let idle_sec = w.to_f64() * (1.0 / h - x / partner);
    let idle_ns = (idle_sec * 1e9).trunc().max(0.0) as u64;
    let cost = (1.0 / h) * hybrid_cost + ((t - 1.0) / upper) * upper_cost;
    let cost_xup = (hybrid_cost + (t - 1.0) * upper_cost) / t;

    Solution {
        low_state_iters: 1,
        idle_ns,
        cost_estimate: Real::konst(cost),
        cost_xup_estimate: Real::konst(cost_xup),
    }
}
