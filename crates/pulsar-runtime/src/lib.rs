#[macro_use]
mod log_macros;

pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod orchestrator;
pub mod store;
pub mod tracing_init;

pub use error::{RuntimeError, RuntimeReason, RuntimeResult};
pub use lifecycle::{PulsarRuntime, RunOptions, load_plan_dir, wait_for_signal};
pub use metrics::RuntimeMetrics;
pub use orchestrator::Orchestrator;
pub use store::{MemoryStore, SensorStore, build_store};
