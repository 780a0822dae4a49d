//! Controller, time-division solver, and configuration planner (§4.3–§4.5).

pub mod planner;
pub mod solver;
pub mod xup;

pub use planner::{plan, PlanResult};
pub use xup::MultiplierState;
