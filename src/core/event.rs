use serde::{Deserialize, Serialize};

use crate::core::{Level, Process, ProcessId, RunState, Ticks};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedEvent {
    Snapshot(QueueSnapshot),
    Gantt(GanttEvent),
    // Emitted once, when all queues are empty and the CPU is idle
    Done,
}

/// One contiguous span during which a process occupied the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GanttEvent {
    pub process_id: ProcessId,
    pub start: Ticks,
    pub end: Ticks,
    pub level: Level,
}

impl GanttEvent {
    pub fn duration(&self) -> Ticks {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessView {
    pub id: ProcessId,
    pub remaining_burst: Ticks,
    pub wait_time: Ticks,
    pub remaining_slice: Option<Ticks>,
    pub running: bool,
}

impl ProcessView {
    fn of(process: &Process, time: Ticks, running: bool) -> Self {
        Self {
            id: process.id,
            remaining_burst: process.remaining_burst,
            wait_time: process.wait_time(time),
            remaining_slice: process.remaining_slice,
            running,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub level: Level,
    pub entries: Vec<ProcessView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub time: Ticks,
    pub levels: Vec<LevelSnapshot>,
    pub running: Option<ProcessId>,
}

impl QueueSnapshot {
    /// Captures queue contents at `time`. An unfinished running process is shown at the
    /// head of the level it was dispatched from.
    pub fn capture(state: &RunState, time: Ticks) -> Self {
        let shown = state
            .running
            .as_ref()
            .filter(|r| !r.process.is_finished());

        let levels = state
            .queues
            .iter()
            .map(|queue| {
                let level = queue.priority();
                let head = shown
                    .filter(|r| r.level == level)
                    .map(|r| ProcessView::of(&r.process, time, true));
                let entries = head
                    .into_iter()
                    .chain(queue.iter().map(|p| ProcessView::of(p, time, false)))
                    .collect();
                LevelSnapshot { level, entries }
            })
            .collect();

        Self {
            time,
            levels,
            running: shown.map(|r| r.process.id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(|l| l.entries.is_empty())
    }

    /// Processes waiting for dispatch, excluding the running one.
    pub fn queued_ids(&self, level: Level) -> Vec<ProcessId> {
        self.levels
            .get(level)
            .map(|l| l.entries.iter().filter(|e| !e.running).map(|e| e.id).collect())
            .unwrap_or_default()
    }
}
