//! Controller driver (§4.6): orchestrates one control period and hands the
//! decided configuration id to the host's apply collaborator.

use std::path::Path;

use tracing::{debug, warn};

use crate::config::ConfigEntry;
use crate::control::planner::{self, PlanResult};
use crate::control::xup::MultiplierState;
use crate::env::EnvFlags;
use crate::error::PoetError;
use crate::estimator::FilterState;
use crate::log::{Logger, Snapshot};
use crate::numeric::Real;

/// Which quantity the controller is driving to the goal; the other is
/// minimised (PERFORMANCE) or maximised (POWER) as a secondary objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Performance,
    Power,
}

/// The host-supplied collaborator that actually reconfigures the system.
/// `apply_states` in the reference's opaque-pointer design becomes `self`:
/// implementors carry whatever state they need to act.
pub trait HostCollaborator {
    /// Idempotently reconfigures the host to `new_id`, optionally sleeping
    /// for `idle_ns` nanoseconds on entry. Called only when `new_id !=
    /// last_id` or on the first apply.
    fn apply(&mut self, n: usize, new_id: usize, last_id: usize, idle_ns: u64, is_first_apply: bool);

    /// Queries the host's current configuration id at session start. The
    /// default returns `None`, which makes [`ControlUnit::init`] default
    /// to `N - 1`, matching the reference's failure handling.
    fn current(&mut self, _n: usize) -> Option<usize> {
        None
    }
}

/// A collaborator that does nothing; useful when only decisions (not
/// actual reconfiguration) are needed, e.g. in tests.
#[derive(Debug, Default)]
pub struct NoopCollaborator;

impl HostCollaborator for NoopCollaborator {
    fn apply(&mut self, _n: usize, _new_id: usize, _last_id: usize, _idle_ns: u64, _is_first_apply: bool) {}
}

/// A single POET control session.
///
/// Owns its filter/multiplier state and log buffer; borrows the
/// configuration table and the host collaborator, both of which must
/// outlive the session.
pub struct ControlUnit<'table, 'host, H: HostCollaborator> {
    table: &'table [ConfigEntry],
    host: Option<&'host mut H>,
    env: EnvFlags,

    constraint: Constraint,
    constraint_goal: f64,
    period: u32,
    current_action: u32,

    lower_id: Option<usize>,
    upper_id: Option<usize>,
    last_id: usize,
    low_state_iters: u32,
    idle_ns: u64,
    cost_estimate: Real,
    cost_xup_estimate: Real,
    is_first_apply: bool,

    pfs: FilterState,
    cfs: FilterState,
    scs: MultiplierState,
    pcs: MultiplierState,

    logger: Option<Logger<std::io::BufWriter<std::fs::File>>>,
}

impl<'table, 'host, H: HostCollaborator> ControlUnit<'table, 'host, H> {
    /// Validates arguments, derives `umin`/`umax`, optionally queries the
    /// host for its current id (defaulting to `N - 1` on absence or
    /// failure), and opens the log sink if requested.
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        goal: f64,
        constraint: Constraint,
        table: &'table [ConfigEntry],
        mut host: Option<&'host mut H>,
        period: u32,
        buffer_depth: usize,
        log_filename: Option<&Path>,
        env: EnvFlags,
    ) -> Result<Self, PoetError> {
        if goal <= 0.0 {
            warn!(goal, "rejecting control unit init: goal must be > 0");
            return Err(PoetError::InvalidArgument("goal must be > 0".into()));
        }
        if table.is_empty() {
            warn!("rejecting control unit init: configuration table is empty");
            return Err(PoetError::InvalidArgument(
                "configuration table must have at least one entry".into(),
            ));
        }
        if period == 0 {
            warn!("rejecting control unit init: period must be > 0");
            return Err(PoetError::InvalidArgument("period must be > 0".into()));
        }
        if buffer_depth == 0 && log_filename.is_some() {
            warn!("rejecting control unit init: log filename given with zero buffer depth");
            return Err(PoetError::InvalidArgument(
                "a log filename requires a non-zero buffer depth".into(),
            ));
        }
        crate::config::validate_table(table)?;

        let n = table.len();
        let last_id = host
            .as_mut()
            .and_then(|h| h.current(n))
            .filter(|&id| id < n)
            .unwrap_or_else(|| {
                debug!(n, "host collaborator did not report a valid current id, defaulting to N - 1");
                n - 1
            });

        let mut scs = MultiplierState::from_speedup_table(table);
        scs.u = Real::konst(table[last_id].speedup);
        scs.uo = scs.u;
        scs.uoo = scs.u;

        let mut pcs = MultiplierState::from_cost_table(table);
        pcs.u = Real::konst(table[last_id].cost);
        pcs.uo = pcs.u;
        pcs.uoo = pcs.u;

        let logger = match log_filename {
            Some(path) => Some(Logger::open(path, buffer_depth)?),
            None => None,
        };

        Ok(Self {
            table,
            host,
            env,
            constraint,
            constraint_goal: goal,
            period,
            current_action: 0,
            lower_id: None,
            upper_id: None,
            last_id,
            low_state_iters: 0,
            idle_ns: 0,
            cost_estimate: Real::ZERO,
            cost_xup_estimate: Real::ZERO,
            is_first_apply: true,
            pfs: FilterState::new(),
            cfs: FilterState::new(),
            scs,
            pcs,
            logger,
        })
    }

    /// Mutates constraint and goal together; ignored if `goal <= 0`.
    pub fn set_constraint_type(&mut self, constraint: Constraint, goal: f64) {
        if goal > 0.0 {
            self.constraint = constraint;
            self.constraint_goal = goal;
        }
    }

    pub fn constraint(&self) -> Constraint {
        self.constraint
    }

    pub fn last_id(&self) -> usize {
        self.last_id
    }

    /// Runs one host iteration (§4.6).
    pub fn apply_control(&mut self, id: u64, perf: f64, pwr: f64) {
        if self.env.disable_control {
            return;
        }

        if self.current_action == 0 {
            self.run_decision(id, perf, pwr);
        }

        let config_id = if self.low_state_iters > 0 {
            self.low_state_iters -= 1;
            self.lower_id
        } else {
            self.upper_id
        };

        if let Some(new_id) = config_id {
            if new_id != self.last_id || self.is_first_apply {
                if !self.env.disable_apply {
                    if let Some(host) = self.host.as_mut() {
                        host.apply(
                            self.table.len(),
                            new_id,
                            self.last_id,
                            self.idle_ns,
                            self.is_first_apply,
                        );
                        self.is_first_apply = false;
                    }
                }
                self.last_id = new_id;
                self.idle_ns = 0;
            }
        }

        self.current_action = (self.current_action + 1) % self.period;
    }

    fn run_decision(&mut self, id: u64, perf: f64, pwr: f64) {
        let time_workload = self.pfs.update(Real::konst(perf), self.scs.u);
        let energy_workload = self.cfs.update(Real::konst(pwr), self.pcs.u);

        let (tau, workload) = match self.constraint {
            Constraint::Performance => (
                self.scs
                    .calculate_xup(Real::konst(perf), Real::konst(self.constraint_goal), time_workload),
                time_workload,
            ),
            Constraint::Power => (
                self.pcs
                    .calculate_xup(Real::konst(pwr), Real::konst(self.constraint_goal), energy_workload),
                energy_workload,
            ),
        };

        let plan = planner::plan(
            self.table,
            self.constraint,
            tau,
            workload,
            self.period,
            self.env.disable_idle,
        );

        if plan.is_none() {
            warn!(tick = id, constraint = ?self.constraint, "planner found no feasible configuration pair for this tick");
        }
        self.apply_plan(plan);

        if let Some(PlanResult {
            cost_xup_estimate, ..
        }) = plan
        {
            let secondary = match self.constraint {
                Constraint::Performance => &mut self.pcs,
                Constraint::Power => &mut self.scs,
            };
            planner::prime_secondary(secondary, cost_xup_estimate);
        }

        if self.logger.is_some() {
            let snapshot = Snapshot {
                tag: id,
                constraint: self.constraint,
                actual_rate: perf,
                pfs: self.pfs,
                scs_u: self.scs.u.to_f64(),
                scs_e: self.scs.e.to_f64(),
                actual_power: pwr,
                cfs: self.cfs,
                pcs_u: self.pcs.u.to_f64(),
                pcs_e: self.pcs.e.to_f64(),
                time_workload: time_workload.to_f64(),
                energy_workload: energy_workload.to_f64(),
                lower_id: self.lower_id.map(|v| v as i64).unwrap_or(-1),
                upper_id: self.upper_id.map(|v| v as i64).unwrap_or(-1),
                low_state_iters: self.low_state_iters,
                idle_ns: self.idle_ns,
            };
            self.logger.as_mut().unwrap().record(id, self.period, snapshot);
        }
    }

    fn apply_plan(&mut self, plan: Option<PlanResult>) {
        match plan {
            Some(result) => {
                self.lower_id = Some(result.lower_id);
                self.upper_id = Some(result.upper_id);
                self.low_state_iters = result.low_state_iters;
                self.idle_ns = result.idle_ns;
                self.cost_estimate = result.cost_estimate;
                self.cost_xup_estimate = result.cost_xup_estimate;
            }
            None => {
                self.lower_id = None;
                self.upper_id = None;
                self.low_state_iters = 0;
                self.idle_ns = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_state_table() -> Vec<ConfigEntry> {
        vec![ConfigEntry {
            speedup: 1.0,
            cost: 1.0,
            idle_partner_id: 0,
        }]
    }

    struct RecordingCollaborator {
        calls: Vec<(usize, usize, u64, bool)>,
    }

    impl HostCollaborator for RecordingCollaborator {
        fn apply(&mut self, _n: usize, new_id: usize, last_id: usize, idle_ns: u64, is_first_apply: bool) {
            self.calls.push((new_id, last_id, idle_ns, is_first_apply));
        }
    }

    #[test]
    fn single_state_table_applies_once_at_tick_zero() {
        let table = single_state_table();
        let mut collaborator = RecordingCollaborator { calls: Vec::new() };
        let mut unit = ControlUnit::init(
            1.0,
            Constraint::Performance,
            &table,
            Some(&mut collaborator),
            10,
            0,
            None,
            EnvFlags::default(),
        )
        .unwrap();

        for tick in 0..20u64 {
            unit.apply_control(tick, 1.0, 1.0);
        }

        assert_eq!(collaborator.calls.len(), 1);
        assert_eq!(collaborator.calls[0].0, 0);
    }

    #[test]
    fn rejects_non_positive_goal() {
        let table = single_state_table();
        let result: Result<ControlUnit<NoopCollaborator>, _> = ControlUnit::init(
            0.0,
            Constraint::Performance,
            &table,
            None,
            10,
            0,
            None,
            EnvFlags::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_table() {
        let table: Vec<ConfigEntry> = vec![];
        let result: Result<ControlUnit<NoopCollaborator>, _> = ControlUnit::init(
            1.0,
            Constraint::Performance,
            &table,
            None,
            10,
            0,
            None,
            EnvFlags::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn set_constraint_type_ignores_non_positive_goal() {
        let table = single_state_table();
        let mut unit: ControlUnit<NoopCollaborator> = ControlUnit::init(
            1.0,
            Constraint::Performance,
            &table,
            None,
            10,
            0,
            None,
            EnvFlags::default(),
        )
        .unwrap();
        unit.set_constraint_type(Constraint::Power, -1.0);
        assert_eq!(unit.constraint(), Constraint::Performance);
        unit.set_constraint_type(Constraint::Power, 5.0);
        assert_eq!(unit.constraint(), Constraint::Power);
    }

    #[test]
    fn disable_control_flag_short_circuits_apply_control() {
        let table = single_state_table();
        let mut collaborator = RecordingCollaborator { calls: Vec::new() };
        let env = EnvFlags {
            disable_control: true,
            ..Default::default()
        };
        let mut unit = ControlUnit::init(
            1.0,
            Constraint::Performance,
            &table,
            Some(&mut collaborator),
            10,
            0,
            None,
            env,
        )
        .unwrap();
        unit.apply_control(0, 1.0, 1.0);
        assert!(collaborator.calls.is_empty());
    }

    #[test]
    fn disable_apply_flag_still_decides_but_never_calls_host() {
        let table = vec![
            ConfigEntry {
                speedup: 1.0,
                cost: 1.0,
                idle_partner_id: 0,
            },
            ConfigEntry {
                speedup: 2.0,
                cost: 3.0,
                idle_partner_id: 0,
            },
        ];
        let mut collaborator = RecordingCollaborator { calls: Vec::new() };
        let env = EnvFlags {
            disable_apply: true,
            ..Default::default()
        };
        let mut unit = ControlUnit::init(
            1.5,
            Constraint::Performance,
            &table,
            Some(&mut collaborator),
            10,
            0,
            None,
            env,
        )
        .unwrap();
        for tick in 0..10u64 {
            unit.apply_control(tick, 1.5, 2.0);
        }
        assert!(collaborator.calls.is_empty());
    }

    #[test]
    fn is_first_apply_forces_call_even_when_id_unchanged() {
        let table = single_state_table();
        let mut collaborator = RecordingCollaborator { calls: Vec::new() };
        let mut unit = ControlUnit::init(
            1.0,
            Constraint::Performance,
            &table,
            Some(&mut collaborator),
            1,
            0,
            None,
            EnvFlags::default(),
        )
        .unwrap();
        unit.apply_control(0, 1.0, 1.0);
        assert_eq!(collaborator.calls.len(), 1);
        assert!(collaborator.calls[0].3);
    }

    #[test]
    fn low_state_iters_decrements_each_tick_it_is_used() {
        let table = vec![
            ConfigEntry {
                speedup: 1.0,
                cost: 1.0,
                idle_partner_id: 0,
            },
            ConfigEntry {
                speedup: 2.0,
                cost: 3.0,
                idle_partner_id: 0,
            },
        ];
        let mut collaborator = RecordingCollaborator { calls: Vec::new() };
        let mut unit = ControlUnit::init(
            1.5,
            Constraint::Performance,
            &table,
            Some(&mut collaborator),
            10,
            0,
            None,
            EnvFlags::default(),
        )
        .unwrap();
        for tick in 0..10u64 {
            unit.apply_control(tick, 1.5, 2.0);
        }
        // first call is id 0 or 1 (whichever lower_id resolves to), the
        // rest of the period must alternate at most once more (lower -> upper)
        assert!(collaborator.calls.len() <= 2);
    }
}
