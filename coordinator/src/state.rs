// coordinator/src/state.rs

use common::JobConfig;
use std::sync::Arc;

use crate::registry::TaskRegistry;

#[derive(Clone)]
pub struct AppState {
    // inmutable: los handlers lo leen sin lock
    pub job: JobConfig,
    // colas y completadas, con su propio mutex
    pub registry: Arc<TaskRegistry>,
}

impl AppState {
    pub fn new(job: JobConfig) -> Self {
        Self {
            job,
            registry: Arc::new(TaskRegistry::new(job)),
        }
    }
}
