use rustc_hash::FxHashSet;

use super::state::{ProcessId, RunState, Ticks};
use crate::error::{Result, SimError};

/// Cross-checks the run state after every tick.
#[derive(Debug)]
pub struct Observer {
    step: u64,
    total_burst: Ticks,
    consumed: Ticks,
    finished: FxHashSet<ProcessId>,
}

impl Observer {
    pub fn new(total_burst: Ticks) -> Self {
        Self {
            step: 0,
            total_burst,
            consumed: 0,
            finished: FxHashSet::default(),
        }
    }

    pub fn record_execution(&mut self) {
        self.consumed += 1;
    }

    pub fn record_finished(&mut self, id: ProcessId) {
        self.finished.insert(id);
    }

    pub fn consumed(&self) -> Ticks {
        self.consumed
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn observe(&mut self, state: &RunState) -> Result<()> {
        self.step += 1;
        let now = state.now;

        let mut seen = FxHashSet::default();
        let mut remaining: Ticks = 0;

        if let Some(running) = &state.running {
            let p = &running.process;
            if p.is_finished() {
                return Err(SimError::invariant(
                    now,
                    format!("finished P{} still occupies the CPU", p.id),
                ));
            }
            if p.priority != running.level {
                return Err(SimError::invariant(
                    now,
                    format!(
                        "running P{} has priority {} but was dispatched from {}",
                        p.id, p.priority, running.level
                    ),
                ));
            }
            seen.insert(p.id);
            remaining += p.remaining_burst;
        }

        for queue in &state.queues {
            for p in queue.iter() {
                if !seen.insert(p.id) {
                    return Err(SimError::invariant(
                        now,
                        format!("P{} is present in more than one place", p.id),
                    ));
                }
                if self.finished.contains(&p.id) || p.is_finished() {
                    return Err(SimError::invariant(
                        now,
                        format!("finished P{} reappeared in queue {}", p.id, queue.priority()),
                    ));
                }
                if p.priority != queue.priority() {
                    return Err(SimError::invariant(
                        now,
                        format!("P{} stamped {} but held by queue {}", p.id, p.priority, queue.priority()),
                    ));
                }
                remaining += p.remaining_burst;
            }
        }

        if remaining + self.consumed != self.total_burst {
            return Err(SimError::invariant(
                now,
                format!(
                    "burst not conserved: remaining {remaining} + consumed {} != {}",
                    self.consumed, self.total_burst
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Process, Running};

    #[test]
    fn detects_duplicate_membership() {
        let mut state = RunState::new(2);
        state.queues[0].enqueue(Process::new(1, 2), 0);
        state.queues[1].enqueue(Process::new(1, 2), 0);

        let err = Observer::new(4).observe(&state).unwrap_err();
        assert!(matches!(err, SimError::InvariantViolation { .. }));
    }

    #[test]
    fn detects_lost_burst() {
        let mut state = RunState::new(1);
        state.queues[0].enqueue(Process::new(1, 2), 0);
        assert!(Observer::new(3).observe(&state).is_err());
        assert!(Observer::new(2).observe(&state).is_ok());
    }

    #[test]
    fn counts_running_process_once() {
        let mut state = RunState::new(2);
        let mut p = Process::new(1, 3);
        p.remaining_burst = 2;
        state.running = Some(Running {
            process: p,
            level: 0,
            start: 0,
        });

        let mut observer = Observer::new(3);
        observer.record_execution();
        assert!(observer.observe(&state).is_ok());
        assert_eq!(observer.steps(), 1);
    }

    #[test]
    fn detects_resurrected_process() {
        let mut state = RunState::new(1);
        state.queues[0].enqueue(Process::new(1, 2), 0);
        let mut observer = Observer::new(2);
        observer.record_finished(1);
        assert!(observer.observe(&state).is_err());
    }
}
