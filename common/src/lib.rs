pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod layout;
pub mod task;
pub mod wordcount;

pub use error::{ExecError, JobConfigError, ProtocolError};
pub use executor::{MapExecutor, ReduceExecutor};
pub use job::JobConfig;
pub use layout::FsLayout;
pub use task::{Assignment, CompletionReport, Phase, TaskId, TaskKind, TaskReply, NOT_READY_ID};
pub use wordcount::WordCount;
