use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobConfigError {
    #[error("N (tareas map) debe ser mayor que 0")]
    ZeroMapTasks,
    #[error("M (tareas reduce) debe ser mayor que 0")]
    ZeroReduceTasks,
}

/// Respuesta de `/task` que no respeta el protocolo.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("tarea {task} sin id")]
    MissingId { task: &'static str },
    #[error("id inválido {id} para tarea {task}")]
    InvalidId { task: &'static str, id: i64 },
}

/// Error de un executor map/reduce. Siempre lleva la ruta que falló.
#[derive(Debug, Error)]
#[error("error de E/S en {}: {source}", .path.display())]
pub struct ExecError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl ExecError {
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
