pub mod client;
pub mod error;
pub mod retry;
pub mod worker;

pub use client::CoordinatorClient;
pub use error::WorkerError;
pub use retry::RetryPolicy;
pub use worker::{WorkerAgent, WorkerExit, WorkerSettings};
