use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub type ProcessId = u64;
pub type Level = usize;
pub type Ticks = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreState {
    Idle,
    Running,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub id: ProcessId,
    pub burst_time: Ticks,
    pub remaining_burst: Ticks,
    pub priority: Level,
    pub entry_time: Ticks,
    // Unset until first dispatch
    pub remaining_slice: Option<Ticks>,
}

impl Process {
    pub fn new(id: ProcessId, burst_time: Ticks) -> Self {
        Self {
            id,
            burst_time,
            remaining_burst: burst_time,
            priority: 0,
            entry_time: 0,
            remaining_slice: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_burst == 0
    }

    pub fn wait_time(&self, now: Ticks) -> Ticks {
        now.saturating_sub(self.entry_time)
    }
}

/// One priority level. Members are owned by the queue and served strictly FIFO.
#[derive(Debug, Clone)]
pub struct Queue {
    priority: Level,
    members: VecDeque<Process>,
}

impl Queue {
    pub fn new(priority: Level) -> Self {
        Self {
            priority,
            members: VecDeque::new(),
        }
    }

    pub fn priority(&self) -> Level {
        self.priority
    }

    /// Appends `process` to the tail, stamping it with this level and `at_time`.
    pub fn enqueue(&mut self, mut process: Process, at_time: Ticks) {
        process.priority = self.priority;
        process.entry_time = at_time;
        self.members.push_back(process);
    }

    pub fn dequeue(&mut self) -> Option<Process> {
        self.members.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.members.iter()
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.members.iter().any(|p| p.id == id)
    }

    // Removes every member matching `pred`; both halves keep their relative order.
    pub fn take_where(&mut self, mut pred: impl FnMut(&Process) -> bool) -> Vec<Process> {
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(self.members.len());
        for process in self.members.drain(..) {
            if pred(&process) {
                taken.push(process);
            } else {
                kept.push_back(process);
            }
        }
        self.members = kept;
        taken
    }
}

/// The process currently occupying the CPU, plus where it came from.
#[derive(Debug, Clone)]
pub struct Running {
    pub process: Process,
    pub level: Level,
    pub start: Ticks,
}

#[derive(Debug)]
pub struct RunState {
    pub now: Ticks,
    pub queues: Vec<Queue>,
    pub running: Option<Running>,
}

impl RunState {
    pub fn new(num_levels: usize) -> Self {
        Self {
            now: 0,
            queues: (0..num_levels).map(Queue::new).collect(),
            running: None,
        }
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn last_level(&self) -> Level {
        self.queues.len().saturating_sub(1)
    }

    pub fn all_queues_empty(&self) -> bool {
        self.queues.iter().all(Queue::is_empty)
    }

    pub fn cpu_is_idle(&self) -> bool {
        self.running.is_none()
    }

    pub fn state(&self) -> CoreState {
        match (&self.running, self.all_queues_empty()) {
            (Some(_), _) => CoreState::Running,
            (None, true) => CoreState::Done,
            (None, false) => CoreState::Idle,
        }
    }

    /// Pops the head of the highest-priority non-empty queue.
    pub fn pick_next(&mut self) -> Option<(Level, Process)> {
        let queue = self.queues.iter_mut().find(|q| !q.is_empty())?;
        let level = queue.priority();
        queue.dequeue().map(|p| (level, p))
    }

    pub fn queued(&self) -> impl Iterator<Item = &Process> {
        self.queues.iter().flat_map(Queue::iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_stamps_priority_and_entry_time() {
        let mut q = Queue::new(2);
        let mut p = Process::new(7, 4);
        p.priority = 0;
        p.entry_time = 1;
        q.enqueue(p, 9);

        let head = q.dequeue().unwrap();
        assert_eq!(head.priority, 2);
        assert_eq!(head.entry_time, 9);
        assert!(q.is_empty());
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn queue_is_fifo() {
        let mut q = Queue::new(0);
        for id in 1..=3 {
            q.enqueue(Process::new(id, 1), 0);
        }
        let order: Vec<_> = std::iter::from_fn(|| q.dequeue()).map(|p| p.id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn take_where_is_stable() {
        let mut q = Queue::new(1);
        for id in 1..=5 {
            q.enqueue(Process::new(id, 1), 0);
        }
        let taken: Vec<_> = q.take_where(|p| p.id % 2 == 1).iter().map(|p| p.id).collect();
        let kept: Vec<_> = q.iter().map(|p| p.id).collect();
        assert_eq!(taken, vec![1, 3, 5]);
        assert_eq!(kept, vec![2, 4]);
    }

    #[test]
    fn pick_next_prefers_lowest_level() {
        let mut state = RunState::new(3);
        state.queues[2].enqueue(Process::new(1, 1), 0);
        state.queues[1].enqueue(Process::new(2, 1), 0);
        assert_eq!(state.state(), CoreState::Idle);

        let (level, p) = state.pick_next().unwrap();
        assert_eq!((level, p.id), (1, 2));
        let (level, p) = state.pick_next().unwrap();
        assert_eq!((level, p.id), (2, 1));
        assert!(state.pick_next().is_none());
        assert_eq!(state.state(), CoreState::Done);
    }
}
