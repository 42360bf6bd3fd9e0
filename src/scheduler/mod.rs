use log::debug;

use crate::core::{Level, Process, ProcessId, Queue, Ticks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    pub process_id: ProcessId,
    pub from: Level,
    pub to: Level,
}

/// Promotion and demotion rules over a borrowed queue hierarchy.
///
/// Holds no state of its own; every call works directly on the engine's queues.
pub struct QueueService<'a> {
    queues: &'a mut [Queue],
}

impl<'a> QueueService<'a> {
    pub fn new(queues: &'a mut [Queue]) -> Self {
        Self { queues }
    }

    fn last_level(&self) -> Level {
        self.queues.len().saturating_sub(1)
    }

    /// Moves every process that has waited at least `threshold` ticks up one level.
    ///
    /// Levels are scanned in ascending order, so a process promoted out of level `i + 1`
    /// is appended to level `i` after level `i` has already been scanned and cannot move
    /// twice in one call. Level 0 is never scanned.
    pub fn promote(&mut self, now: Ticks, threshold: Ticks) -> Vec<Promotion> {
        let mut promoted = Vec::new();
        for level in 1..self.queues.len() {
            let eligible = self.queues[level].take_where(|p| p.wait_time(now) >= threshold);
            for process in eligible {
                debug!(
                    "t={now} promote P{} {} -> {} (waited {})",
                    process.id,
                    level,
                    level - 1,
                    process.wait_time(now)
                );
                promoted.push(Promotion {
                    process_id: process.id,
                    from: level,
                    to: level - 1,
                });
                self.queues[level - 1].enqueue(process, now);
            }
        }
        promoted
    }

    /// Re-enqueues a process whose quantum expired one level lower, or at the
    /// last level again. Returns the destination level.
    pub fn demote(&mut self, process: Process, now: Ticks, current_level: Level) -> Level {
        let target = (current_level + 1).min(self.last_level());
        debug!("t={now} demote P{} {current_level} -> {target}", process.id);
        self.queues[target].enqueue(process, now);
        target
    }
}
