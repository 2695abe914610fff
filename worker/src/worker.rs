use common::{
    config, Assignment, FsLayout, JobConfig, MapExecutor, Phase, ReduceExecutor, TaskId,
    WordCount,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::CoordinatorClient;
use crate::error::WorkerError;
use crate::retry::{sleep_or_cancel, RetryError, RetryPolicy};

/// Tiempos del worker. Todos fijos, ninguno se adapta a la carga.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Espera entre intentos de `GET /info` (sin límite de intentos).
    pub bootstrap_retry: Duration,
    /// Reintentos de `GET /task` ante errores de red.
    pub task_retry: RetryPolicy,
    /// Espera tras un reduce "todavía no".
    pub not_ready_backoff: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            bootstrap_retry: config::DEFAULT_BOOTSTRAP_RETRY,
            task_retry: RetryPolicy::unbounded(config::DEFAULT_TASK_RETRY),
            not_ready_backoff: config::DEFAULT_NOT_READY_BACKOFF,
        }
    }
}

impl WorkerSettings {
    /// Defaults pisados por env vars:
    /// - WORKER_BOOTSTRAP_RETRY_MS
    /// - WORKER_TASK_RETRY_MS
    /// - WORKER_NOT_READY_BACKOFF_MS
    /// - WORKER_MAX_TASK_RETRIES (si no está, reintenta para siempre)
    pub fn from_env() -> Self {
        let task_delay = config::env_millis("WORKER_TASK_RETRY_MS", config::DEFAULT_TASK_RETRY);
        let task_retry = match config::env_u32("WORKER_MAX_TASK_RETRIES") {
            Some(max) => RetryPolicy::bounded(task_delay, max),
            None => RetryPolicy::unbounded(task_delay),
        };

        Self {
            bootstrap_retry: config::env_millis(
                "WORKER_BOOTSTRAP_RETRY_MS",
                config::DEFAULT_BOOTSTRAP_RETRY,
            ),
            task_retry,
            not_ready_backoff: config::env_millis(
                "WORKER_NOT_READY_BACKOFF_MS",
                config::DEFAULT_NOT_READY_BACKOFF,
            ),
        }
    }
}

/// Cómo terminó el worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// El coordinator respondió `no_tasks`.
    Finished,
    /// Cancelado desde afuera (Ctrl+C).
    Interrupted,
    /// Se agotaron los reintentos de `GET /task` (política acotada).
    CoordinatorUnreachable,
    /// No se pudo reportar una tarea terminada: el job ya cerró o no hay coordinator.
    ReportFailed,
}

impl WorkerExit {
    pub fn exit_code(&self) -> u8 {
        match self {
            WorkerExit::Finished | WorkerExit::Interrupted => 0,
            WorkerExit::CoordinatorUnreachable => 2,
            WorkerExit::ReportFailed => 3,
        }
    }
}

/// Loop principal del worker:
/// - pide N y M al coordinator (reintenta hasta que aparezca)
/// - pide tareas, ejecuta map/reduce y reporta cada una
/// - termina con `no_tasks`, cancelación o si no puede reportar
pub struct WorkerAgent {
    client: CoordinatorClient,
    layout: FsLayout,
    settings: WorkerSettings,
    map_exec: Arc<dyn MapExecutor>,
    reduce_exec: Arc<dyn ReduceExecutor>,
    shutdown: CancellationToken,
}

impl WorkerAgent {
    /// Worker de WordCount.
    pub fn new(
        client: CoordinatorClient,
        layout: FsLayout,
        settings: WorkerSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            client,
            layout,
            settings,
            map_exec: Arc::new(WordCount),
            reduce_exec: Arc::new(WordCount),
            shutdown,
        }
    }

    pub fn with_executors(
        mut self,
        map_exec: Arc<dyn MapExecutor>,
        reduce_exec: Arc<dyn ReduceExecutor>,
    ) -> Self {
        self.map_exec = map_exec;
        self.reduce_exec = reduce_exec;
        self
    }

    pub async fn run(&self) -> Result<WorkerExit, WorkerError> {
        info!("buscando coordinator en {}", self.client.base_url());

        let job = match RetryPolicy::unbounded(self.settings.bootstrap_retry)
            .run("GET /info", &self.shutdown, || self.client.job_info())
            .await
        {
            Ok(job) => job,
            Err(RetryError::Cancelled) => return Ok(WorkerExit::Interrupted),
            Err(RetryError::Exhausted { .. }) => return Ok(WorkerExit::CoordinatorUnreachable),
            Err(RetryError::Fatal(e)) => return Err(e),
        };

        info!(
            "coordinator encontrado (N={}, M={}), empezando a trabajar",
            job.map_tasks(),
            job.reduce_tasks()
        );

        loop {
            let assignment = match self
                .settings
                .task_retry
                .run("GET /task", &self.shutdown, || self.client.next_task())
                .await
            {
                Ok(a) => a,
                Err(RetryError::Cancelled) => return Ok(WorkerExit::Interrupted),
                Err(RetryError::Exhausted { attempts, last }) => {
                    warn!(
                        "sin respuesta del coordinator tras {} intentos ({}), abandonando",
                        attempts, last
                    );
                    return Ok(WorkerExit::CoordinatorUnreachable);
                }
                Err(RetryError::Fatal(e)) => return Err(e),
            };

            match assignment {
                Assignment::NoTask => {
                    info!("no quedan tareas, apagando el worker");
                    return Ok(WorkerExit::Finished);
                }
                Assignment::NotReadyYet => {
                    debug!(
                        "maps todavía sin terminar, durmiendo {:?}",
                        self.settings.not_ready_backoff
                    );
                    if !sleep_or_cancel(self.settings.not_ready_backoff, &self.shutdown).await {
                        return Ok(WorkerExit::Interrupted);
                    }
                }
                Assignment::Assigned { phase, id } => {
                    self.execute(phase, id, job).await?;

                    // los archivos ya están cerrados: recién ahora se avisa
                    if let Err(e) = self.client.report_done(phase, id).await {
                        warn!(
                            "no se pudo reportar {} {} ({}), \
                             el job terminó o el coordinator no está",
                            phase, id, e
                        );
                        return Ok(WorkerExit::ReportFailed);
                    }
                    debug!("reportada tarea {} {}", phase, id);
                }
            }
        }
    }

    async fn execute(&self, phase: Phase, id: TaskId, job: JobConfig) -> Result<(), WorkerError> {
        info!("ejecutando tarea {} con id {}", phase, id);
        let started = Instant::now();
        let layout = self.layout.clone();

        // E/S bloqueante en un hilo aparte; no se corta a mitad de camino
        let result = match phase {
            Phase::Map => {
                let exec = self.map_exec.clone();
                tokio::task::spawn_blocking(move || exec.run_map(id, &job, &layout)).await?
            }
            Phase::Reduce => {
                let exec = self.reduce_exec.clone();
                tokio::task::spawn_blocking(move || exec.run_reduce(id, &job, &layout)).await?
            }
        };

        if let Err(e) = result {
            warn!("tarea {} {} falló: {}", phase, id, e);
            return Err(e.into());
        }

        info!(
            "terminé tarea {} {} en {} ms",
            phase,
            id,
            started.elapsed().as_millis()
        );
        Ok(())
    }
}
