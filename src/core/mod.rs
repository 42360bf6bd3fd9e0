pub mod driver;
pub mod event;
pub mod observer;
pub mod state;

pub use driver::{MlfqCore, TickOutcome};
pub use event::{GanttEvent, LevelSnapshot, ProcessView, QueueSnapshot, SchedEvent};
pub use observer::Observer;
pub use state::{CoreState, Level, Process, ProcessId, Queue, RunState, Running, Ticks};
