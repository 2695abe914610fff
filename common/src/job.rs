use serde::{Deserialize, Serialize};

use crate::error::JobConfigError;

/// Parámetros inmutables del job: N shards (tareas map) y M buckets (tareas reduce).
///
/// Se serializa tal cual lo devuelve `GET /info`: `{"N": 4, "M": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(rename = "N")]
    n: u32,
    #[serde(rename = "M")]
    m: u32,
}

impl JobConfig {
    pub fn new(n: u32, m: u32) -> Result<Self, JobConfigError> {
        if n == 0 {
            return Err(JobConfigError::ZeroMapTasks);
        }
        if m == 0 {
            return Err(JobConfigError::ZeroReduceTasks);
        }
        Ok(Self { n, m })
    }

    /// Cantidad de tareas map (shards de entrada).
    pub fn map_tasks(&self) -> u32 {
        self.n
    }

    /// Cantidad de tareas reduce (buckets de salida).
    pub fn reduce_tasks(&self) -> u32 {
        self.m
    }

    /// Valida un JobConfig recibido por la red (serde no pasa por `new`).
    pub fn validated(self) -> Result<Self, JobConfigError> {
        Self::new(self.n, self.m)
    }
}
