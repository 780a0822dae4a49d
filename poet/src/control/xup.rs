//! Discrete-time control law mapping (target rate, observed rate, base
//! workload) to a bounded multiplier (§4.3).

use crate::config::ConfigEntry;
use crate::numeric::Real;

/// Pole/zero design parameters, baked in. Chosen for closed-loop stability
/// of the discrete second-order controller against the Kalman-estimated
/// base workload; not tunable at runtime.
const P1: f64 = 0.2;
const P2: f64 = 0.2;
const Z1: f64 = 0.3;
const MU: f64 = 1.0;

/// Floors under which a multiplier is never allowed to be derived, even if
/// every table entry reports a lower metric.
const U_MIN_SPEEDUP: f64 = 0.1;
const U_MIN_COST: f64 = 0.1;

/// One tracked multiplier's history. Held twice per session: once for
/// speedup, once for powerup.
#[derive(Debug, Clone, Copy)]
pub struct MultiplierState {
    pub u: Real,
    pub uo: Real,
    pub uoo: Real,
    pub e: Real,
    pub eo: Real,
    pub umin: Real,
    pub umax: Real,
}

impl MultiplierState {
    /// Derives `umin`/`umax` from the configuration table's speedup or cost
    /// column (per §9's open-question resolution): `umin = max(floor, min
    /// over the table of the metric, ignoring only entries whose value is
    /// exactly zero)`; `umax = max over the table`.
    pub fn from_table(table: &[ConfigEntry], metric: impl Fn(&ConfigEntry) -> f64, floor: f64) -> Self {
        let mut min_nonzero = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for entry in table {
            let v = metric(entry);
            if v > max {
                max = v;
            }
            if v != 0.0 && v < min_nonzero {
                min_nonzero = v;
            }
        }
        if !min_nonzero.is_finite() {
            min_nonzero = floor;
        }
        let umin = floor.max(min_nonzero);
        Self {
            u: Real::ONE,
            uo: Real::ONE,
            uoo: Real::ONE,
            e: Real::ZERO,
            eo: Real::ZERO,
            umin: Real::konst(umin),
            umax: Real::konst(max),
        }
    }

    pub fn from_speedup_table(table: &[ConfigEntry]) -> Self {
        Self::from_table(table, |e| e.speedup, U_MIN_SPEEDUP)
    }

    pub fn from_cost_table(table: &[ConfigEntry]) -> Self {
        Self::from_table(table, |e| e.cost, U_MIN_COST)
    }

    fn clamp(&self, u: Real) -> Real {
        if u.to_f64() < self.umin.to_f64() {
            self.umin
        } else if u.to_f64() > self.umax.to_f64() {
            self.umax
        } else {
            u
        }
    }

    /// Runs one step of the control law (§4.3): computes the requested
    /// multiplier from current/desired rate and base workload, clamps it
    /// to `[umin, umax]`, and shifts the u/e history.
    pub fn calculate_xup(&mut self, current_rate: Real, desired_rate: Real, w: Real) -> Real {
        let p1 = Real::konst(P1);
        let p2 = Real::konst(P2);
        let z1 = Real::konst(Z1);
        let mu = Real::konst(MU);
        let one = Real::ONE;

        let a = -(-p1.mult(z1) - p2.mult(z1) + mu.mult3(p1, p2) - mu.mult(p2) + p2 - mu.mult(p1)
            + p1
            + mu);
        let b = -(-mu.mult4(p1, p2, z1) + p1.mult3(p2, z1) + mu.mult3(p2, z1) + mu.mult3(p1, z1)
            - mu.mult(z1)
            - p1.mult(p2));
        let c = ((mu - mu.mult(p1)).mult(p2) + mu.mult(p1) - mu).mult(w);
        let d = ((mu.mult(p1) - mu).mult(p2) - mu.mult(p1) + mu).mult3(w, z1);
        let f = one.div(z1 - one);

        let e = desired_rate - current_rate;
        let u = f.mult(a.mult(self.uo) + b.mult(self.uoo) + c.mult(e) + d.mult(self.eo));

        let u = self.clamp(u);

        self.uoo = self.uo;
        self.uo = u;
        self.eo = e;
        self.e = e;
        self.u = u;
        u
    }
}
