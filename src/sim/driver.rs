use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use super::workload::Workload;
use crate::{
    config::{self, SimConfig},
    core::{GanttEvent, MlfqCore, QueueSnapshot, SchedEvent, Ticks},
    error::Result,
    stats::RunReport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Hooks for whatever presents a run. All methods default to doing nothing.
pub trait SimObserver {
    fn on_snapshot(&mut self, _snapshot: &QueueSnapshot) {}

    fn on_gantt(&mut self, _event: &GanttEvent) {}

    // Called once, only when the run completes
    fn on_done(&mut self, _report: &RunReport) {}
}

impl SimObserver for () {}

/// Shared stop flag, checked once per tick between ticks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owns the user's process definitions and run parameters. Every run starts from a
/// fresh copy of the definitions, so runs are repeatable.
#[derive(Debug, Clone)]
pub struct Sim {
    workload: Workload,
    quanta: Vec<Ticks>,
    promotion_threshold: Ticks,
    tick_delay: Duration,
}

impl Sim {
    pub fn new(workload: Workload, quanta: Vec<Ticks>, promotion_threshold: Ticks) -> Result<Self> {
        config::validate_quanta(&quanta)?;
        config::validate_threshold(promotion_threshold)?;
        Ok(Self {
            workload,
            quanta,
            promotion_threshold,
            tick_delay: Duration::ZERO,
        })
    }

    pub fn from_config(config: &SimConfig) -> Result<Self> {
        config.validate()?;
        let sim = Self::new(
            config.workload()?,
            config.quanta.clone(),
            config.promotion_threshold,
        )?;
        Ok(sim.with_tick_delay(config.tick_delay()))
    }

    pub fn with_tick_delay(mut self, delay: Duration) -> Self {
        self.tick_delay = delay;
        self
    }

    pub fn workload(&self) -> &Workload {
        &self.workload
    }

    pub fn workload_mut(&mut self) -> &mut Workload {
        &mut self.workload
    }

    pub fn quanta(&self) -> &[Ticks] {
        &self.quanta
    }

    pub fn promotion_threshold(&self) -> Ticks {
        self.promotion_threshold
    }

    /// A freshly admitted engine for manual stepping.
    pub fn start(&self) -> Result<MlfqCore> {
        MlfqCore::new(
            self.workload.instantiate()?,
            self.quanta.clone(),
            self.promotion_threshold,
        )
    }

    pub fn run_to_end(&self) -> Result<RunReport> {
        self.run(&mut (), &CancelToken::new())
    }

    /// Runs to completion or until `cancel` is set, feeding `observer` as it goes.
    ///
    /// The admission snapshot at t=0 is delivered before the first tick. Invalid input
    /// is reported before anything reaches the observer.
    pub fn run(&self, observer: &mut dyn SimObserver, cancel: &CancelToken) -> Result<RunReport> {
        let mut core = self.start()?;
        let mut report = RunReport::new(self.workload.iter().copied());

        info!(
            "starting MLFQ run: {} processes, quanta {:?}, promotion threshold {}",
            self.workload.len(),
            self.quanta,
            self.promotion_threshold
        );

        let initial = core.initial_snapshot();
        report.record(&SchedEvent::Snapshot(initial.clone()));
        observer.on_snapshot(&initial);

        loop {
            if cancel.is_cancelled() {
                warn!("run cancelled at t={}", core.now());
                report.finish(RunStatus::Cancelled, core.now());
                return Ok(report);
            }

            let events = core.step()?;
            let mut done = events.is_empty();
            for event in &events {
                report.record(event);
                match event {
                    SchedEvent::Snapshot(snapshot) => observer.on_snapshot(snapshot),
                    SchedEvent::Gantt(gantt) => observer.on_gantt(gantt),
                    SchedEvent::Done => done = true,
                }
            }

            if done {
                report.finish(RunStatus::Completed, core.now());
                info!(
                    "run completed at t={} ({} intervals)",
                    core.now(),
                    report.gantt.len()
                );
                observer.on_done(&report);
                return Ok(report);
            }

            if !self.tick_delay.is_zero() {
                thread::sleep(self.tick_delay);
            }
        }
    }
}
