pub mod config;
pub mod core;
pub mod error;
pub mod render;
pub mod scheduler;
pub mod sim;
pub mod stats;

pub use config::SimConfig;
pub use self::core::{GanttEvent, MlfqCore, QueueSnapshot, SchedEvent};
pub use error::{Result, SimError};
pub use sim::{CancelToken, ProcessSpec, Sim, SimObserver, Workload};
pub use stats::{RunReport, RunSummary};
