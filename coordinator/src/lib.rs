pub mod bootstrap;
pub mod handlers;
pub mod monitor;
pub mod registry;
pub mod server;
pub mod state;

pub use monitor::MonitorExit;
pub use registry::{CompletionOutcome, ReduceAssignment, TaskRegistry};
pub use state::AppState;
