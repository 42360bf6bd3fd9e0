use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    core::{Process, ProcessId, Ticks},
    error::{InvalidInput, Result},
};

/// A process definition as entered by the user. Never mutated by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub id: ProcessId,
    pub burst_time: Ticks,
}

impl ProcessSpec {
    pub fn new(id: ProcessId, burst_time: Ticks) -> Self {
        Self { id, burst_time }
    }

    fn validate(&self) -> Result<()> {
        if self.id == 0 {
            return Err(InvalidInput::NonPositiveId(0).into());
        }
        if self.burst_time == 0 {
            return Err(InvalidInput::ZeroBurst(self.id).into());
        }
        Ok(())
    }
}

/// The ordered process list a controller maintains between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    specs: Vec<ProcessSpec>,
}

impl Workload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: impl IntoIterator<Item = ProcessSpec>) -> Result<Self> {
        let mut workload = Self::new();
        for spec in specs {
            workload.add(spec)?;
        }
        Ok(workload)
    }

    pub fn add(&mut self, spec: ProcessSpec) -> Result<()> {
        spec.validate()?;
        if self.get(spec.id).is_some() {
            return Err(InvalidInput::DuplicateId(spec.id).into());
        }
        self.specs.push(spec);
        Ok(())
    }

    /// Changes the burst time of an existing process. Returns `false` if `id` is unknown.
    pub fn update(&mut self, id: ProcessId, burst_time: Ticks) -> Result<bool> {
        ProcessSpec::new(id, burst_time).validate()?;
        match self.specs.iter_mut().find(|s| s.id == id) {
            Some(spec) => {
                spec.burst_time = burst_time;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove(&mut self, id: ProcessId) -> bool {
        let before = self.specs.len();
        self.specs.retain(|s| s.id != id);
        self.specs.len() != before
    }

    pub fn get(&self, id: ProcessId) -> Option<&ProcessSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn total_burst(&self) -> Ticks {
        self.specs.iter().map(|s| s.burst_time).sum()
    }

    /// Fresh working copies for one run, in definition order.
    pub fn instantiate(&self) -> Result<Vec<Process>> {
        let mut seen = FxHashSet::default();
        self.specs
            .iter()
            .map(|spec| -> Result<Process> {
                spec.validate()?;
                if !seen.insert(spec.id) {
                    return Err(InvalidInput::DuplicateId(spec.id).into());
                }
                Ok(Process::new(spec.id, spec.burst_time))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn rejects_duplicates_and_zero_bursts() {
        let mut w = Workload::new();
        w.add(ProcessSpec::new(1, 3)).unwrap();
        assert_eq!(
            w.add(ProcessSpec::new(1, 5)),
            Err(SimError::InvalidInput(InvalidInput::DuplicateId(1)))
        );
        assert_eq!(
            w.add(ProcessSpec::new(2, 0)),
            Err(SimError::InvalidInput(InvalidInput::ZeroBurst(2)))
        );
        assert!(w.add(ProcessSpec::new(0, 1)).is_err());
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn update_and_remove() {
        let mut w = Workload::from_specs([ProcessSpec::new(1, 3), ProcessSpec::new(2, 4)]).unwrap();
        assert!(w.update(2, 9).unwrap());
        assert!(!w.update(7, 9).unwrap());
        assert!(w.update(2, 0).is_err());
        assert_eq!(w.get(2).map(|s| s.burst_time), Some(9));

        assert!(w.remove(1));
        assert!(!w.remove(1));
        assert_eq!(w.total_burst(), 9);
    }

    #[test]
    fn instantiate_gives_fresh_processes() {
        let w = Workload::from_specs([ProcessSpec::new(4, 2), ProcessSpec::new(3, 6)]).unwrap();
        let procs = w.instantiate().unwrap();
        assert_eq!(procs.len(), 2);
        assert_eq!((procs[0].id, procs[0].remaining_burst), (4, 2));
        assert_eq!((procs[1].id, procs[1].remaining_slice), (3, None));
    }
}
