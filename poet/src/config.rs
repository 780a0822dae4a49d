//! Configuration table: the set of pre-characterised system configurations
//! the planner chooses between.

use std::path::Path;

use serde::Deserialize;
use tracing::error;

use crate::error::PoetError;

/// One entry of the configuration table (§3).
///
/// `speedup < 1` marks an *idle* entry; `idle_partner_id` is only consulted
/// for idle entries and must name a non-idle one.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ConfigEntry {
    pub speedup: f64,
    pub cost: f64,
    #[serde(default)]
    pub idle_partner_id: usize,
}

impl ConfigEntry {
    pub fn is_idle(&self) -> bool {
        self.speedup < 1.0
    }
}

/// Top-level shape of a TOML configuration file: `[[state]]` tables.
#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(rename = "state")]
    entries: Vec<ConfigEntry>,
}

/// Loads a configuration table from a TOML file and validates it.
pub fn load_table(path: &Path) -> Result<Vec<ConfigEntry>, PoetError> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        error!(path = %path.display(), %source, "failed to read configuration table");
        PoetError::ConfigRead {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let file: TableFile = toml::from_str(&text).map_err(|source| {
        error!(path = %path.display(), %source, "failed to parse configuration table");
        PoetError::ConfigParse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    if let Err(err) = validate_table(&file.entries) {
        error!(path = %path.display(), %err, "configuration table failed validation");
        return Err(err);
    }
    Ok(file.entries)
}

/// Validates the §3 table invariant: every idle entry's `speedup ≥ 0`,
/// `cost ≥ 0`, and `idle_partner_id` names a distinct, non-idle entry.
pub fn validate_table(table: &[ConfigEntry]) -> Result<(), PoetError> {
    if table.is_empty() {
        return Err(PoetError::InvalidTable(
            "configuration table must have at least one entry".into(),
        ));
    }
    for (i, entry) in table.iter().enumerate() {
        if entry.speedup < 0.0 || entry.cost < 0.0 {
            return Err(PoetError::InvalidTable(format!(
                "entry {i}: speedup and cost must be non-negative"
            )));
        }
        if entry.is_idle() {
            let partner = entry.idle_partner_id;
            if partner >= table.len() {
                return Err(PoetError::InvalidTable(format!(
                    "entry {i}: idle_partner_id {partner} out of range"
                )));
            }
            if table[partner].is_idle() {
                return Err(PoetError::InvalidTable(format!(
                    "entry {i}: idle_partner_id {partner} is itself an idle entry"
                )));
            }
        }
    }
    Ok(())
}
