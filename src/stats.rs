use average::{Estimate, Mean};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    core::{GanttEvent, ProcessId, SchedEvent, Ticks},
    sim::{ProcessSpec, RunStatus},
};

/// Everything a finished (or cancelled) run leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub total_ticks: Ticks,
    pub snapshots: usize,
    pub processes: Vec<ProcessSpec>,
    pub gantt: Vec<GanttEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub id: ProcessId,
    pub burst_time: Ticks,
    pub first_start: Option<Ticks>,
    pub completion: Option<Ticks>,
    pub cpu_time: Ticks,
    pub intervals: usize,
}

impl ProcessStats {
    // Every process arrives at t=0, so turnaround is the completion tick
    pub fn turnaround(&self) -> Option<Ticks> {
        self.completion
    }

    pub fn waiting(&self) -> Option<Ticks> {
        self.completion.map(|c| c - self.burst_time)
    }

    pub fn response(&self) -> Option<Ticks> {
        self.first_start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub processes: Vec<ProcessStats>,
    pub avg_turnaround: f64,
    pub avg_waiting: f64,
    pub avg_response: f64,
    pub busy_ticks: Ticks,
    pub idle_ticks: Ticks,
    pub context_switches: usize,
}

impl RunReport {
    pub fn new(processes: impl IntoIterator<Item = ProcessSpec>) -> Self {
        Self {
            status: RunStatus::Cancelled,
            total_ticks: 0,
            snapshots: 0,
            processes: processes.into_iter().collect(),
            gantt: Vec::new(),
        }
    }

    pub fn record(&mut self, event: &SchedEvent) {
        match event {
            SchedEvent::Snapshot(_) => self.snapshots += 1,
            SchedEvent::Gantt(gantt) => self.gantt.push(*gantt),
            SchedEvent::Done => {}
        }
    }

    pub fn finish(&mut self, status: RunStatus, now: Ticks) {
        self.status = status;
        self.total_ticks = now;
    }

    pub fn gantt_for(&self, id: ProcessId) -> impl Iterator<Item = &GanttEvent> {
        self.gantt.iter().filter(move |g| g.process_id == id)
    }

    pub fn summary(&self) -> RunSummary {
        let mut by_id: FxHashMap<ProcessId, ProcessStats> = FxHashMap::default();
        for spec in &self.processes {
            by_id.insert(
                spec.id,
                ProcessStats {
                    id: spec.id,
                    burst_time: spec.burst_time,
                    first_start: None,
                    completion: None,
                    cpu_time: 0,
                    intervals: 0,
                },
            );
        }

        for g in &self.gantt {
            let Some(stats) = by_id.get_mut(&g.process_id) else {
                continue;
            };
            stats.first_start = Some(stats.first_start.map_or(g.start, |s| s.min(g.start)));
            stats.cpu_time += g.duration();
            stats.intervals += 1;
            if stats.cpu_time == stats.burst_time {
                stats.completion = Some(g.end);
            }
        }

        let processes: Vec<ProcessStats> = self
            .processes
            .iter()
            .filter_map(|spec| by_id.remove(&spec.id))
            .collect();

        let busy_ticks = self.gantt.iter().map(GanttEvent::duration).sum();

        RunSummary {
            avg_turnaround: avg(processes.iter().filter_map(ProcessStats::turnaround)),
            avg_waiting: avg(processes.iter().filter_map(ProcessStats::waiting)),
            avg_response: avg(processes.iter().filter_map(ProcessStats::response)),
            busy_ticks,
            idle_ticks: self.total_ticks.saturating_sub(busy_ticks),
            context_switches: self.gantt.len().saturating_sub(1),
            processes,
        }
    }
}

fn avg(iter: impl Iterator<Item = Ticks>) -> f64 {
    iter.map(|t| t as f64).collect::<Mean>().estimate()
}
