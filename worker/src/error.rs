use common::{ExecError, JobConfigError, ProtocolError};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("error HTTP contra el coordinator: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("el coordinator respondió status {0}")]
    Status(StatusCode),

    #[error("respuesta fuera de protocolo: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("configuración de job inválida: {0}")]
    Job(#[from] JobConfigError),

    #[error("falló el executor: {0}")]
    Exec(#[from] ExecError),

    #[error("el executor entró en pánico: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl WorkerError {
    /// Errores que vale la pena reintentar: red caída, timeouts, 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            WorkerError::Transport(e) => {
                e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
            }
            WorkerError::Status(status) => status.is_server_error(),
            _ => false,
        }
    }
}
