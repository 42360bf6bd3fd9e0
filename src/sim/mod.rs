pub mod driver;
pub mod worker;
pub mod workload;

pub use driver::{CancelToken, RunStatus, Sim, SimObserver};
pub use worker::RunHandle;
pub use workload::{ProcessSpec, Workload};
