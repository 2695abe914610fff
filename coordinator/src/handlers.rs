use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::{Assignment, CompletionReport, JobConfig, Phase, TaskReply};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::registry::CompletionOutcome;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(job_info))
        .route("/task", get(next_task))
        .route("/", post(complete_task))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

// N y M del job; no toca el registry
async fn job_info(State(state): State<AppState>) -> Json<JobConfig> {
    Json(state.job)
}

// Asigna la siguiente tarea (map, reduce, centinela o no_tasks)
async fn next_task(State(state): State<AppState>) -> Json<TaskReply> {
    let assignment = state.registry.next_assignment();

    match assignment {
        Assignment::Assigned { phase, id } => {
            info!("enviando tarea {} con id {} al worker", phase, id);
        }
        Assignment::NotReadyYet => {
            debug!(
                "reduce pedido con maps pendientes ({}/{} completados), respondiendo id -1",
                state.registry.map_done_count(),
                state.job.map_tasks()
            );
        }
        Assignment::NoTask => {
            debug!("no quedan tareas, respondiendo no_tasks");
        }
    }

    Json(TaskReply::from(assignment))
}

// Worker reporta que terminó una tarea. Siempre 200: el protocolo no tiene status de error.
async fn complete_task(
    State(state): State<AppState>,
    body: Result<Json<CompletionReport>, JsonRejection>,
) -> StatusCode {
    let report = match body {
        Ok(Json(report)) => report,
        Err(rejection) => {
            warn!("ignorando reporte mal formado: {}", rejection.body_text());
            return StatusCode::OK;
        }
    };

    let Some(id) = report.task_id() else {
        warn!(
            "ignorando reporte de {} con id {} (centinela o inválido)",
            report.task, report.id
        );
        return StatusCode::OK;
    };

    match state.registry.mark_complete(report.task, id) {
        CompletionOutcome::Recorded => {
            info!("tarea {} con id {} terminada", report.task, id);
            log_phase_progress(&state, report.task);
        }
        CompletionOutcome::Duplicate => {
            info!("reporte duplicado de {} {}, se ignora", report.task, id);
        }
        CompletionOutcome::OutOfRange => {
            warn!("reporte de {} con id {} fuera de rango", report.task, id);
        }
        CompletionOutcome::NotDispatched => {
            warn!("reporte de {} {} que nunca se despachó", report.task, id);
        }
    }

    StatusCode::OK
}

fn log_phase_progress(state: &AppState, phase: Phase) {
    let (done, total) = match phase {
        Phase::Map => (state.registry.map_done_count(), state.job.map_tasks()),
        Phase::Reduce => (state.registry.reduce_done_count(), state.job.reduce_tasks()),
    };
    if done == total {
        info!("fase {} completa ({} tareas)", phase, total);
    } else {
        debug!("fase {}: {}/{} completadas", phase, done, total);
    }
}
