//! # POET — Performance/Power Tradeoff Controller
//!
//! A runtime feedback controller for iterative applications. Once per
//! iteration the host reports an observed performance rate and power draw;
//! the controller decides which of a finite set of pre-characterised
//! system configurations the host should run in, and for how many of the
//! next iterations, so that a user-specified performance or power goal is
//! met while the other quantity is minimised (or maximised, under a power
//! cap).
//!
//! ## Architecture
//!
//! 1. **[`numeric`]** — the real-number abstraction controller math is
//!    written against (floating-point or fixed-point backing, selected at
//!    build time by feature flag).
//! 2. **[`estimator`]** — a scalar Kalman filter estimating the per-iteration
//!    base workload from observed rate and applied multiplier.
//! 3. **[`control::xup`]** — the discrete-time control law mapping
//!    (target rate, observed rate, base workload) to a bounded multiplier.
//! 4. **[`control::solver`]** — the time-division solver: given a lower and
//!    upper configuration and a target multiplier, computes the iteration
//!    split (including the idle sub-iteration case).
//! 5. **[`control::planner`]** — the O(N²) search over configuration pairs
//!    that picks the pair with minimal (or maximal, under a power cap)
//!    secondary cost.
//! 6. **[`driver`]** — orchestrates one control period: estimator →
//!    controller → planner on tick 0, hands out configurations on
//!    subsequent ticks, invokes the host's apply collaborator on change.
//! 7. **[`log`]** — ring-buffered snapshot recorder flushed to a text sink.
//!
//! ## Concurrency
//!
//! The controller is strictly single-threaded and synchronous. Nothing in
//! this crate spawns a thread, blocks, or sleeps; [`driver::ControlUnit`]
//! must be driven from a single call site (or under external mutual
//! exclusion).

pub mod config;
pub mod control;
pub mod driver;
pub mod env;
pub mod error;
pub mod estimator;
pub mod log;
pub mod numeric;

pub use config::ConfigEntry;
pub use driver::{Constraint, ControlUnit, HostCollaborator};
pub use error::PoetError;
pub use numeric::Real;
