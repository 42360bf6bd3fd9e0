use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::{
    core::Ticks,
    error::{InvalidInput, Result, SimError},
    sim::{ProcessSpec, Workload},
};

pub const DEFAULT_QUANTA: [Ticks; 3] = [2, 4, 8];
pub const DEFAULT_PROMOTION_THRESHOLD: Ticks = 8;

/// A process as written in a config file. Signed so that negative values reach
/// validation instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub id: i64,
    pub burst: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub quanta: Vec<Ticks>,
    pub promotion_threshold: Ticks,
    /// Real-time pause between ticks. Does not affect simulated time.
    pub tick_delay_ms: u64,
    #[serde(rename = "process")]
    pub processes: Vec<ProcessEntry>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            quanta: DEFAULT_QUANTA.to_vec(),
            promotion_threshold: DEFAULT_PROMOTION_THRESHOLD,
            tick_delay_ms: 0,
            processes: Vec::new(),
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SimError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn tick_delay(&self) -> Duration {
        Duration::from_millis(self.tick_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        validate_quanta(&self.quanta)?;
        validate_threshold(self.promotion_threshold)
    }

    /// Validates every entry and builds the process list, in file order.
    pub fn workload(&self) -> Result<Workload> {
        let mut workload = Workload::new();
        for entry in &self.processes {
            let id = u64::try_from(entry.id)
                .ok()
                .filter(|&id| id > 0)
                .ok_or(InvalidInput::NonPositiveId(entry.id))?;
            let burst = u64::try_from(entry.burst)
                .map_err(|_| InvalidInput::NegativeBurst {
                    id,
                    burst: entry.burst,
                })?;
            workload.add(ProcessSpec::new(id, burst))?;
        }
        Ok(workload)
    }
}

pub fn validate_quanta(quanta: &[Ticks]) -> Result<()> {
    if quanta.is_empty() {
        return Err(InvalidInput::EmptyQuanta.into());
    }
    if let Some(level) = quanta.iter().position(|&q| q == 0) {
        return Err(InvalidInput::ZeroQuantum { level }.into());
    }
    Ok(())
}

pub fn validate_threshold(threshold: Ticks) -> Result<()> {
    if threshold == 0 {
        return Err(InvalidInput::ZeroThreshold.into());
    }
    Ok(())
}
