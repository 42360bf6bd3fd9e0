use crossbeam_channel::{Receiver, Sender, unbounded};
use log::warn;
use std::thread::{self, JoinHandle};

use super::driver::{CancelToken, Sim, SimObserver};
use crate::{
    core::{GanttEvent, QueueSnapshot, SchedEvent},
    error::{Result, SimError},
    stats::RunReport,
};

/// A run executing on a worker thread.
pub struct RunHandle {
    pub events: Receiver<SchedEvent>,
    pub cancel: CancelToken,
    handle: JoinHandle<Result<RunReport>>,
}

impl RunHandle {
    pub fn join(self) -> Result<RunReport> {
        self.handle
            .join()
            .unwrap_or_else(|_| Err(SimError::invariant(0, "simulation worker panicked")))
    }
}

// Forwards events to the host; a dropped receiver stops the run.
struct ChannelObserver {
    tx: Sender<SchedEvent>,
    cancel: CancelToken,
}

impl ChannelObserver {
    fn send(&self, event: SchedEvent) {
        if self.tx.send(event).is_err() && !self.cancel.is_cancelled() {
            warn!("event receiver dropped, cancelling run");
            self.cancel.cancel();
        }
    }
}

impl SimObserver for ChannelObserver {
    fn on_snapshot(&mut self, snapshot: &QueueSnapshot) {
        self.send(SchedEvent::Snapshot(snapshot.clone()));
    }

    fn on_gantt(&mut self, event: &GanttEvent) {
        self.send(SchedEvent::Gantt(*event));
    }

    fn on_done(&mut self, _report: &RunReport) {
        self.send(SchedEvent::Done);
    }
}

/// Moves `sim` onto its own thread so the caller stays responsive.
pub fn spawn(sim: Sim) -> RunHandle {
    let (tx, events) = unbounded();
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();

    let handle = thread::spawn(move || {
        let mut observer = ChannelObserver {
            tx,
            cancel: worker_cancel.clone(),
        };
        sim.run(&mut observer, &worker_cancel)
    });

    RunHandle {
        events,
        cancel,
        handle,
    }
}
