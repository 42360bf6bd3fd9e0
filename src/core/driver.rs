use log::{debug, info};
use rustc_hash::FxHashSet;

use super::{
    event::{GanttEvent, QueueSnapshot, SchedEvent},
    observer::Observer,
    state::{CoreState, Level, Process, RunState, Running, Ticks},
};
use crate::{
    error::{InvalidInput, Result, SimError},
    scheduler::QueueService,
};

/// How the running process left the tick it just executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continues,
    Finished,
    QuantumExpired,
}

pub struct MlfqCore {
    pub ctx: RunState,
    quanta: Vec<Ticks>,
    promotion_threshold: Ticks,
    observer: Observer,
    done_emitted: bool,
}

impl MlfqCore {
    /// Admits `processes` into queue 0 at time 0, in the given order.
    ///
    /// Rejects duplicate ids, zero bursts and bad quanta or threshold before anything runs.
    pub fn new(
        processes: impl IntoIterator<Item = Process>,
        quanta: Vec<Ticks>,
        promotion_threshold: Ticks,
    ) -> Result<Self> {
        crate::config::validate_quanta(&quanta)?;
        crate::config::validate_threshold(promotion_threshold)?;

        let mut ctx = RunState::new(quanta.len());
        let mut total_burst = 0;
        let mut ids = FxHashSet::default();
        for process in processes {
            if process.remaining_burst == 0 {
                return Err(InvalidInput::ZeroBurst(process.id).into());
            }
            if !ids.insert(process.id) {
                return Err(InvalidInput::DuplicateId(process.id).into());
            }
            total_burst += process.remaining_burst;
            ctx.queues[0].enqueue(process, 0);
        }

        Ok(Self {
            ctx,
            quanta,
            promotion_threshold,
            observer: Observer::new(total_burst),
            done_emitted: false,
        })
    }

    pub fn now(&self) -> Ticks {
        self.ctx.now
    }

    pub fn state(&self) -> CoreState {
        self.ctx.state()
    }

    pub fn is_done(&self) -> bool {
        self.state() == CoreState::Done
    }

    pub fn consumed(&self) -> Ticks {
        self.observer.consumed()
    }

    pub fn quanta(&self) -> &[Ticks] {
        &self.quanta
    }

    /// Queue state at the current time, before the next tick runs.
    pub fn initial_snapshot(&self) -> QueueSnapshot {
        QueueSnapshot::capture(&self.ctx, self.ctx.now)
    }

    /// Advances the simulation by one tick and returns what happened during it.
    ///
    /// Once the run is done the first call returns `[Done]`, later calls return nothing.
    pub fn step(&mut self) -> Result<Vec<SchedEvent>> {
        if self.is_done() {
            if self.done_emitted {
                return Ok(Vec::new());
            }
            self.done_emitted = true;
            info!("t={} all processes completed", self.ctx.now);
            return Ok(vec![SchedEvent::Done]);
        }

        let now = self.ctx.now;
        let mut events = Vec::with_capacity(2);

        QueueService::new(&mut self.ctx.queues).promote(now, self.promotion_threshold);

        if self.ctx.cpu_is_idle() {
            self.dispatch();
        }

        let Some(outcome) = self.execute()? else {
            // Queues were non-empty, so dispatch must have found something
            return Err(SimError::invariant(now, "CPU idle with runnable processes"));
        };

        events.push(SchedEvent::Snapshot(QueueSnapshot::capture(
            &self.ctx,
            now + 1,
        )));
        if let Some(gantt) = self.resolve(outcome) {
            events.push(SchedEvent::Gantt(gantt));
        }

        self.ctx.advance_time(1);
        self.observer.observe(&self.ctx)?;
        Ok(events)
    }

    /// Steps until done, returning every event in order (including the final `Done`).
    pub fn run_to_completion(&mut self) -> Result<Vec<SchedEvent>> {
        let mut events = Vec::new();
        loop {
            let batch = self.step()?;
            let finished = batch.iter().any(|e| matches!(e, SchedEvent::Done));
            events.extend(batch);
            if finished || (self.done_emitted && self.is_done()) {
                return Ok(events);
            }
        }
    }

    fn dispatch(&mut self) {
        let now = self.ctx.now;
        if let Some((level, mut process)) = self.ctx.pick_next() {
            process.remaining_slice = Some(self.quanta[level]);
            debug!(
                "t={now} dispatch P{} from queue {level} (burst {}, slice {})",
                process.id, process.remaining_burst, self.quanta[level]
            );
            self.ctx.running = Some(Running {
                process,
                level,
                start: now,
            });
        }
    }

    // One tick of CPU for the running process. `None` if the CPU stayed idle.
    fn execute(&mut self) -> Result<Option<TickOutcome>> {
        let now = self.ctx.now;
        let Some(running) = self.ctx.running.as_mut() else {
            return Ok(None);
        };
        let process = &mut running.process;

        let slice = match process.remaining_slice.as_mut() {
            Some(slice) if *slice > 0 => slice,
            _ => {
                return Err(SimError::invariant(
                    now,
                    format!("P{} running without quantum left", process.id),
                ));
            }
        };
        if process.remaining_burst == 0 {
            return Err(SimError::invariant(
                now,
                format!("P{} running with no burst left", process.id),
            ));
        }

        *slice -= 1;
        let slice_left = *slice;
        process.remaining_burst -= 1;
        process.entry_time = now + 1;
        self.observer.record_execution();

        Ok(Some(if process.remaining_burst == 0 {
            TickOutcome::Finished
        } else if slice_left == 0 {
            TickOutcome::QuantumExpired
        } else {
            TickOutcome::Continues
        }))
    }

    fn resolve(&mut self, outcome: TickOutcome) -> Option<GanttEvent> {
        let end = self.ctx.now + 1;
        match outcome {
            TickOutcome::Continues => None,
            TickOutcome::Finished => {
                let Running {
                    process,
                    level,
                    start,
                } = self.ctx.running.take()?;
                debug!("t={end} P{} finished at queue {level}", process.id);
                self.observer.record_finished(process.id);
                Some(gantt(&process, start, end, level))
            }
            TickOutcome::QuantumExpired => {
                let Running {
                    process,
                    level,
                    start,
                } = self.ctx.running.take()?;
                let event = gantt(&process, start, end, level);
                QueueService::new(&mut self.ctx.queues).demote(process, end, level);
                Some(event)
            }
        }
    }
}

fn gantt(process: &Process, start: Ticks, end: Ticks, level: Level) -> GanttEvent {
    GanttEvent {
        process_id: process.id,
        start,
        end,
        level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core(bursts: &[(u64, Ticks)], quanta: &[Ticks], threshold: Ticks) -> MlfqCore {
        let processes = bursts.iter().map(|&(id, b)| Process::new(id, b));
        MlfqCore::new(processes, quanta.to_vec(), threshold).unwrap()
    }

    fn gantt_of(events: &[SchedEvent]) -> Vec<(u64, Ticks, Ticks, Level)> {
        events
            .iter()
            .filter_map(|e| match e {
                SchedEvent::Gantt(g) => Some((g.process_id, g.start, g.end, g.level)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn single_process_is_demoted_once() {
        let mut core = core(&[(1, 5)], &[2, 4, 8], 8);
        let events = core.run_to_completion().unwrap();
        assert_eq!(gantt_of(&events), vec![(1, 0, 2, 0), (1, 2, 5, 1)]);
        assert_eq!(core.now(), 5);
        assert_eq!(core.consumed(), 5);
        assert!(matches!(events.last(), Some(SchedEvent::Done)));
    }

    #[test]
    fn two_processes_keep_arrival_order_at_level_one() {
        let mut core = core(&[(1, 3), (2, 3)], &[2, 4, 8], 8);
        let events = core.run_to_completion().unwrap();
        assert_eq!(
            gantt_of(&events),
            vec![(1, 0, 2, 0), (2, 2, 4, 0), (1, 4, 5, 1), (2, 5, 6, 1)]
        );
    }

    #[test]
    fn finishing_on_quantum_expiry_is_not_a_demotion() {
        let mut core = core(&[(1, 2), (2, 1)], &[2, 4], 8);
        let events = core.run_to_completion().unwrap();
        assert_eq!(gantt_of(&events), vec![(1, 0, 2, 0), (2, 2, 3, 0)]);
        assert!(core.ctx.queues[1].is_empty());
    }

    #[test]
    fn empty_run_is_done_immediately() {
        let mut core = core(&[], &[2, 4, 8], 8);
        assert!(core.is_done());
        assert!(core.initial_snapshot().is_empty());
        assert_eq!(core.step().unwrap(), vec![SchedEvent::Done]);
        assert!(core.step().unwrap().is_empty());
        assert_eq!(core.now(), 0);
    }

    #[test]
    fn step_emits_snapshot_every_tick() {
        let mut core = core(&[(1, 3)], &[4], 8);
        let first = core.step().unwrap();
        assert_eq!(first.len(), 1);
        let SchedEvent::Snapshot(snap) = &first[0] else {
            panic!("expected snapshot, got {first:?}");
        };
        assert_eq!(snap.time, 1);
        assert_eq!(snap.running, Some(1));
        let view = &snap.levels[0].entries[0];
        assert_eq!((view.remaining_burst, view.remaining_slice, view.wait_time), (2, Some(3), 0));
        assert!(view.running);
        assert_eq!(core.state(), CoreState::Running);
    }

    #[test]
    fn last_level_requeues_in_place() {
        let mut core = core(&[(1, 5)], &[1, 1], 100);
        let events = core.run_to_completion().unwrap();
        assert_eq!(
            gantt_of(&events),
            vec![(1, 0, 1, 0), (1, 1, 2, 1), (1, 2, 3, 1), (1, 3, 4, 1), (1, 4, 5, 1)]
        );
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(MlfqCore::new(Vec::new(), vec![], 8).is_err());
        assert!(MlfqCore::new(Vec::new(), vec![2, 0], 8).is_err());
        assert!(MlfqCore::new(Vec::new(), vec![2], 0).is_err());
        assert!(MlfqCore::new([Process::new(1, 0)], vec![2], 8).is_err());
        assert!(MlfqCore::new([Process::new(1, 2), Process::new(1, 3)], vec![2], 8).is_err());
    }
}
