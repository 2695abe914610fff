use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Id centinela del protocolo: reduce "todavía no", volver a preguntar.
pub const NOT_READY_ID: i64 = -1;

pub type TaskId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Map,
    Reduce,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Map => "map",
            Phase::Reduce => "reduce",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resultado tipado de pedir una tarea. Es lo único que ven el worker y el registry;
/// el centinela `-1` sólo existe en el JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// No quedan tareas de ninguna fase.
    NoTask,
    Assigned { phase: Phase, id: TaskId },
    /// Fase map sin terminar: esperar y volver a pedir.
    NotReadyYet,
}

/* --------- Formato en el cable (GET /task, POST /) --------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Map,
    Reduce,
    NoTasks,
}

/// Cuerpo de `GET /task`: `{"task": "map"|"reduce"|"no_tasks", "id": int|null}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReply {
    pub task: TaskKind,
    pub id: Option<i64>,
}

impl From<Assignment> for TaskReply {
    fn from(assignment: Assignment) -> Self {
        match assignment {
            Assignment::NoTask => TaskReply {
                task: TaskKind::NoTasks,
                id: None,
            },
            Assignment::Assigned { phase, id } => TaskReply {
                task: match phase {
                    Phase::Map => TaskKind::Map,
                    Phase::Reduce => TaskKind::Reduce,
                },
                id: Some(i64::from(id)),
            },
            Assignment::NotReadyYet => TaskReply {
                task: TaskKind::Reduce,
                id: Some(NOT_READY_ID),
            },
        }
    }
}

impl TryFrom<TaskReply> for Assignment {
    type Error = ProtocolError;

    fn try_from(reply: TaskReply) -> Result<Self, Self::Error> {
        let phase = match reply.task {
            TaskKind::NoTasks => return Ok(Assignment::NoTask),
            TaskKind::Map => Phase::Map,
            TaskKind::Reduce => Phase::Reduce,
        };

        let id = reply.id.ok_or(ProtocolError::MissingId {
            task: phase.as_str(),
        })?;

        if phase == Phase::Reduce && id == NOT_READY_ID {
            return Ok(Assignment::NotReadyYet);
        }

        let id = TaskId::try_from(id).map_err(|_| ProtocolError::InvalidId {
            task: phase.as_str(),
            id,
        })?;

        Ok(Assignment::Assigned { phase, id })
    }
}

/// Cuerpo de `POST /`: el worker avisa que terminó una tarea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub task: Phase,
    pub id: i64,
}

impl CompletionReport {
    pub fn new(task: Phase, id: TaskId) -> Self {
        Self {
            task,
            id: i64::from(id),
        }
    }

    /// Id real de la tarea, o `None` para el centinela y cualquier id fuera de rango.
    pub fn task_id(&self) -> Option<TaskId> {
        TaskId::try_from(self.id).ok()
    }
}
