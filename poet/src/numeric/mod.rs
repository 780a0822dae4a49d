//! Real-number abstraction with two interchangeable backings.
//!
//! All controller math ([`crate::estimator`], [`crate::control`]) is written
//! against the [`Real`] type alias. Which concrete type it names is decided
//! at build time by Cargo feature, not by runtime dispatch: exactly one of
//! `floating-point` (default) or `fixed-point` is compiled in, and both
//! [`floating::FloatReal`] and [`fixed::FixedReal`] expose the same inherent
//! methods so the rest of the crate never needs to know which one is active.
//!
//! `mult3`/`mult4` exist alongside `mult` because the fixed-point backing
//! loses precision on every rescale; folding three or four multiplicands
//! through one pair of rescales (rather than two or three independent
//! `mult` calls) keeps the intermediate product in full width for longer.

mod fixed;
mod floating;

pub use fixed::FixedReal;
pub use floating::FloatReal;

#[cfg(all(feature = "floating-point", feature = "fixed-point"))]
compile_error!("features \"floating-point\" and \"fixed-point\" are mutually exclusive");

#[cfg(feature = "fixed-point")]
pub type Real = FixedReal;

#[cfg(not(feature = "fixed-point"))]
pub type Real = FloatReal;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn konst_roundtrips_through_f64() {
        let r = Real::konst(1.5);
        assert!((r.to_f64() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn mult3_matches_chained_mult() {
        let a = Real::konst(1.25);
        let b = Real::konst(2.0);
        let c = Real::konst(0.5);
        let chained = a.mult(b).mult(c);
        let folded = a.mult3(b, c);
        assert!((chained.to_f64() - folded.to_f64()).abs() < 1e-4);
    }

    #[test]
    fn mult4_matches_chained_mult() {
        let a = Real::konst(1.25);
        let b = Real::konst(2.0);
        let c = Real::konst(0.5);
        let d = Real::konst(3.0);
        let chained = a.mult(b).mult(c).mult(d);
        let folded = a.mult4(b, c, d);
        assert!((chained.to_f64() - folded.to_f64()).abs() < 1e-3);
    }

    #[test]
    fn from_int_to_int_roundtrips() {
        let r = Real::from_int(7);
        assert_eq!(r.to_int(), 7);
        let neg = Real::from_int(-3);
        assert_eq!(neg.to_int(), -3);
    }

    #[test]
    fn div_is_inverse_of_mult() {
        let a = Real::konst(6.0);
        let b = Real::konst(3.0);
        let q = a.div(b);
        assert!((q.to_f64() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn zero_and_one_constants() {
        assert_eq!(Real::ZERO.to_int(), 0);
        assert_eq!(Real::ONE.to_int(), 1);
    }
}
