//! Snapshotted environment flags.
//!
//! The reference driver re-reads `getenv` on every decision; that hides
//! global mutable state behind what looks like pure control logic and makes
//! tests order-dependent. [`EnvFlags::from_env`] is read once, at session
//! construction, and threaded through explicitly from then on. Presence of
//! the variable disables the behavior regardless of its value, matching
//! the reference's `getenv(...) == NULL ? 0 : 1` check.

/// Boolean flags snapshotted from the process environment at session init.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvFlags {
    pub disable_control: bool,
    pub disable_idle: bool,
    pub disable_apply: bool,
}

impl EnvFlags {
    /// Snapshots `POET_DISABLE_CONTROL`/`POET_DISABLE_IDLE`/`POET_DISABLE_APPLY`
    /// from the process environment. Any value, including an empty string,
    /// counts as present.
    pub fn from_env() -> Self {
        Self {
            disable_control: std::env::var_os("POET_DISABLE_CONTROL").is_some(),
            disable_idle: std::env::var_os("POET_DISABLE_IDLE").is_some(),
            disable_apply: std::env::var_os("POET_DISABLE_APPLY").is_some(),
        }
    }
}
