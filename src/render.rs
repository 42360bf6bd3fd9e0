use std::{
    fmt::Write as _,
    io::{self, Write},
};

use crate::{
    core::{GanttEvent, Level, QueueSnapshot},
    sim::SimObserver,
    stats::{RunReport, RunSummary},
};

pub fn level_name(level: Level) -> String {
    match level {
        0 => "High".to_string(),
        1 => "Medium".to_string(),
        2 => "Low".to_string(),
        n => format!("Queue {n}"),
    }
}

/// Text dump of every queue, one line per process.
pub fn render_snapshot(snapshot: &QueueSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Time: {}", snapshot.time);
    for level in &snapshot.levels {
        let _ = writeln!(out, "Queue {} ({}):", level.level, level_name(level.level));
        for p in &level.entries {
            let slice = p
                .remaining_slice
                .map_or_else(|| "-".to_string(), |s| s.to_string());
            let marker = if p.running { " *" } else { "" };
            let _ = writeln!(
                out,
                "  P{} | Remaining Burst: {} | WT: {} | RT Slice: {}{marker}",
                p.id, p.remaining_burst, p.wait_time, slice
            );
        }
    }
    out
}

/// One character cell per tick, labelled with the process id and its queue level.
pub fn render_gantt(gantt: &[GanttEvent]) -> String {
    if gantt.is_empty() {
        return "(no CPU activity)\n".to_string();
    }

    let mut bar = String::from("|");
    let mut axis = String::from("0");
    let mut cursor = 0;
    for g in gantt {
        if g.start > cursor {
            let idle = format!(" idle ({}) |", g.start - cursor);
            axis.push_str(&format!("{:>width$}", g.start, width = idle.len()));
            bar.push_str(&idle);
        }
        let cell = format!(" P{}@{} ({}) |", g.process_id, g.level, g.duration());
        axis.push_str(&format!("{:>width$}", g.end, width = cell.len()));
        bar.push_str(&cell);
        cursor = g.end;
    }
    format!("{bar}\n{axis}\n")
}

pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    for p in &summary.processes {
        let show = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
        let _ = writeln!(
            out,
            "P{:<4} burst {:>4}  response {:>4}  turnaround {:>4}  waiting {:>4}  slices {}",
            p.id,
            p.burst_time,
            show(p.response()),
            show(p.turnaround()),
            show(p.waiting()),
            p.intervals
        );
    }
    let _ = writeln!(out, "Average response time: {:.2} ticks", summary.avg_response);
    let _ = writeln!(out, "Average turnaround time: {:.2} ticks", summary.avg_turnaround);
    let _ = writeln!(out, "Average waiting time: {:.2} ticks", summary.avg_waiting);
    let _ = writeln!(
        out,
        "CPU busy {} / idle {} ticks, {} context switches",
        summary.busy_ticks, summary.idle_ticks, summary.context_switches
    );
    out
}

/// Writes queue state every tick and the Gantt chart at the end.
pub struct TextRenderer<W: Write> {
    out: W,
    snapshots: bool,
    error: Option<io::Error>,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            snapshots: true,
            error: None,
        }
    }

    pub fn gantt_only(mut self) -> Self {
        self.snapshots = false;
        self
    }

    fn write(&mut self, text: &str) {
        if self.error.is_none() {
            if let Err(e) = self.out.write_all(text.as_bytes()) {
                self.error = Some(e);
            }
        }
    }

    /// Returns the writer, or the first write error seen during the run.
    pub fn finish(mut self) -> io::Result<W> {
        match self.error.take() {
            Some(e) => Err(e),
            None => {
                self.out.flush()?;
                Ok(self.out)
            }
        }
    }
}

impl<W: Write> SimObserver for TextRenderer<W> {
    fn on_snapshot(&mut self, snapshot: &QueueSnapshot) {
        if self.snapshots {
            let text = render_snapshot(snapshot);
            self.write(&text);
            self.write("\n");
        }
    }

    fn on_done(&mut self, report: &RunReport) {
        let text = render_gantt(&report.gantt);
        self.write("Gantt chart:\n");
        self.write(&text);
    }
}
