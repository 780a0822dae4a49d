//! Ring-buffered snapshot recorder, flushed to a text sink (§4.7, §6).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::driver::Constraint;
use crate::error::PoetError;
use crate::estimator::FilterState;

/// One decision tick's worth of loggable state.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pub tag: u64,
    pub constraint: Constraint,
    pub actual_rate: f64,
    pub pfs: FilterState,
    pub scs_u: f64,
    pub scs_e: f64,
    pub actual_power: f64,
    pub cfs: FilterState,
    pub pcs_u: f64,
    pub pcs_e: f64,
    pub time_workload: f64,
    pub energy_workload: f64,
    pub lower_id: i64,
    pub upper_id: i64,
    pub low_state_iters: u32,
    pub idle_ns: u64,
}

const HEADER: &str = concat!(
    "TAG CONSTRAINT ACTUAL_RATE P_X_HAT_MINUS P_X_HAT P_P_MINUS P_H P_K P_P P_SPEEDUP P_ERROR ",
    "ACTUAL_POWER C_X_HAT_MINUS C_X_HAT C_P_MINUS C_H C_K C_P C_POWERUP C_ERROR ",
    "TIME_WORKLOAD ENERGY_WORKLOAD LOWER_ID UPPER_ID LOW_STATE_ITERS IDLE_NS",
);

/// Ring buffer recorder. A snapshot is accepted on every decision tick into
/// slot `(id / period) % buffer_depth`; when that slot is the last one in
/// the cycle (`buffer_depth - 1`) the whole buffer is flushed as
/// fixed-width text and the cycle restarts. A partial buffer at drop time
/// is never flushed, matching the reference.
pub struct Logger<W: Write> {
    sink: W,
    buffer: Vec<Option<Snapshot>>,
    buffer_depth: usize,
}

impl Logger<BufWriter<File>> {
    /// Opens `path` for writing and emits the header row immediately.
    pub fn open(path: &Path, buffer_depth: usize) -> Result<Self, PoetError> {
        let file = File::create(path).map_err(|source| {
            tracing::error!(path = %path.display(), %source, "failed to open log sink");
            PoetError::LogOpen {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::new(BufWriter::new(file), buffer_depth)
    }
}

impl<W: Write> Logger<W> {
    pub fn new(mut sink: W, buffer_depth: usize) -> Result<Self, PoetError> {
        writeln!(sink, "{}", format_header()).map_err(|source| PoetError::LogOpen {
            path: PathBuf::new(),
            source,
        })?;
        Ok(Self {
            sink,
            buffer: vec![None; buffer_depth],
            buffer_depth,
        })
    }

    /// Records `snapshot` for tick `id` under the given control `period`,
    /// flushing the buffer to the sink if the cycle just completed.
    pub fn record(&mut self, id: u64, period: u32, snapshot: Snapshot) {
        let index = (id as usize / period as usize) % self.buffer_depth;
        self.buffer[index] = Some(snapshot);
        if index == self.buffer_depth - 1 {
            self.flush_cycle();
        }
    }

    fn flush_cycle(&mut self) {
        for slot in &self.buffer {
            if let Some(snapshot) = slot {
                let _ = writeln!(self.sink, "{}", format_row(snapshot));
            }
        }
        let _ = self.sink.flush();
    }
}

fn format_header() -> String {
    HEADER
        .split(' ')
        .map(|field| format!("{field:>16}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_row(s: &Snapshot) -> String {
    let constraint = match s.constraint {
        Constraint::Power => "POWER",
        Constraint::Performance => "PERFORMANCE",
    };
    format!(
        "{:>16} {:>16} \
         {:>16.6} {:>16.6} {:>16.6} {:>16.6} {:>16.6} {:>16.6} {:>16.6} {:>16.6} {:>16.6} \
         {:>16.6} {:>16.6} {:>16.6} {:>16.6} {:>16.6} {:>16.6} {:>16.6} {:>16.6} {:>16.6} \
         {:>16.6} {:>16.6} {:>16} {:>16} {:>16} {:>16}",
        s.tag,
        constraint,
        s.actual_rate,
        s.pfs.x_hat_minus.to_f64(),
        s.pfs.x_hat.to_f64(),
        s.pfs.p_minus.to_f64(),
        s.pfs.h.to_f64(),
        s.pfs.k.to_f64(),
        s.pfs.p.to_f64(),
        s.scs_u,
        s.scs_e,
        s.actual_power,
        s.cfs.x_hat_minus.to_f64(),
        s.cfs.x_hat.to_f64(),
        s.cfs.p_minus.to_f64(),
        s.cfs.h.to_f64(),
        s.cfs.k.to_f64(),
        s.cfs.p.to_f64(),
        s.pcs_u,
        s.pcs_e,
        s.time_workload,
        s.energy_workload,
        s.lower_id,
        s.upper_id,
        s.low_state_iters,
        s.idle_ns,
    )
}
