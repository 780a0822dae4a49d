//! O(N²) configuration planner (§4.5): searches ordered (upper, lower)
//! pairs for the one whose predicted secondary cost best satisfies the
//! constraint.

use crate::config::ConfigEntry;
use crate::control::solver::{self, Candidate, Solution};
use crate::control::xup::MultiplierState;
use crate::driver::Constraint;
use crate::numeric::Real;

/// Outcome of a planning pass. `None` means no pair qualified; the driver
/// treats that tick as a no-op.
#[derive(Debug, Clone, Copy)]
pub struct PlanResult {
    pub lower_id: usize,
    pub upper_id: usize,
    pub low_state_iters: u32,
    pub idle_ns: u64,
    pub cost_estimate: Real,
    pub cost_xup_estimate: Real,
}

fn controlled(entry: &ConfigEntry, constraint: Constraint) -> f64 {
    match constraint {
        Constraint::Performance => entry.speedup,
        Constraint::Power => entry.cost,
    }
}

fn secondary(entry: &ConfigEntry, constraint: Constraint) -> f64 {
    match constraint {
        Constraint::Performance => entry.cost,
        Constraint::Power => entry.speedup,
    }
}

fn beats(constraint: Constraint, candidate_cost: f64, best_cost: f64) -> bool {
    match constraint {
        Constraint::Performance => candidate_cost < best_cost,
        Constraint::Power => candidate_cost > best_cost,
    }
}

/// Runs §4.5 over `table` for target multiplier `tau` and base workload
/// `w`, honoring `disable_idle` (the snapshotted `POET_DISABLE_IDLE` flag).
pub fn plan(
    table: &[ConfigEntry],
    constraint: Constraint,
    tau: Real,
    w: Real,
    period_iters: u32,
    disable_idle: bool,
) -> Option<PlanResult> {
    let n = table.len();
    let tau_f = tau.to_f64();
    let mut best: Option<(usize, usize, Solution)> = None;
    let mut best_cost = match constraint {
        Constraint::Performance => f64::INFINITY,
        Constraint::Power => 0.0,
    };

    for i in 0..n {
        let upper_entry = &table[i];
        let upper_controlled = controlled(upper_entry, constraint);
        if upper_controlled < tau_f || upper_controlled < 1.0 {
            continue;
        }
        for j in 0..n {
            let lower_entry = &table[j];
            let lower_controlled = controlled(lower_entry, constraint);
            if lower_controlled > tau_f {
                continue;
            }
            let is_idle = lower_entry.is_idle();
            if disable_idle && lower_controlled < 1.0 {
                continue;
            }

            let partner = if is_idle {
                &table[lower_entry.idle_partner_id]
            } else {
                lower_entry
            };

            let candidate = Candidate {
                lower_xup: Real::konst(lower_controlled),
                lower_cost: Real::konst(secondary(lower_entry, constraint)),
                upper_xup: Real::konst(upper_controlled),
                upper_cost: Real::konst(secondary(upper_entry, constraint)),
                partner_xup: Real::konst(controlled(partner, constraint)),
                partner_cost: Real::konst(secondary(partner, constraint)),
            };

            let solution = solver::solve(&candidate, period_iters, tau, w);
            let cost = solution.cost_estimate.to_f64();

            if beats(constraint, cost, best_cost) {
                best_cost = cost;
                best = Some((i, j, solution));
            }
        }
    }

    best.map(|(upper_id, lower_id, solution)| PlanResult {
        lower_id,
        upper_id,
        low_state_iters: solution.low_state_iters,
        idle_ns: solution.idle_ns,
        cost_estimate: solution.cost_estimate,
        cost_xup_estimate: solution.cost_xup_estimate,
    })
}

/// Primes the secondary multiplier state after planning (§4.5, last
/// paragraph): next period's controller for the *other* constraint starts
/// from the realised cost multiplier rather than its own control law.
pub fn prime_secondary(secondary_state: &mut MultiplierState, cost_xup_estimate: Real) {
    secondary_state.uoo = secondary_state.uo;
    secondary_state.u = cost_xup_estimate;
    secondary_state.uo = secondary_state.u;
    secondary_state.e = Real::ZERO;
    secondary_state.eo = Real::ZERO;
}
