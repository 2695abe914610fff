use crate::{error::ExecError, job::JobConfig, layout::FsLayout, task::TaskId};

/// Estrategia de la fase map.
///
/// Contrato: cuando `run_map` devuelve `Ok`, todos los archivos intermedios de
/// `map_id` están escritos, con flush y cerrados. El worker reporta la tarea
/// recién después de eso.
pub trait MapExecutor: Send + Sync {
    fn run_map(
        &self,
        map_id: TaskId,
        job: &JobConfig,
        layout: &FsLayout,
    ) -> Result<(), ExecError>;
}

/// Estrategia de la fase reduce. Mismo contrato de cierre que `MapExecutor`
/// para el archivo de salida del bucket.
pub trait ReduceExecutor: Send + Sync {
    fn run_reduce(
        &self,
        bucket_id: TaskId,
        job: &JobConfig,
        layout: &FsLayout,
    ) -> Result<(), ExecError>;
}
