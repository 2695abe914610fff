use crate::registry::TaskRegistry;
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// Todas las reduce completas y pasó la gracia.
    AllTasksDone,
    /// Corte externo (Ctrl+C o el server se cayó).
    Interrupted,
}

/// Espera a que se completen las M tareas reduce, deja pasar `grace` y cancela
/// `shutdown` (que es lo que cierra el listener).
///
/// La gracia existe porque puede haber workers durmiendo tras un reduce `-1`;
/// tienen que poder volver a preguntar y recibir `no_tasks` en vez de un error
/// de conexión. Si `shutdown` se cancela desde afuera, sale sin esperar.
pub async fn run_phase_monitor(
    registry: Arc<TaskRegistry>,
    grace: Duration,
    shutdown: CancellationToken,
) -> MonitorExit {
    let total = registry.job().reduce_tasks();
    let rx = registry.watch_reduce_done();

    let all_done = tokio::select! {
        reached = all_reduced(rx, total) => reached,
        _ = shutdown.cancelled() => false,
    };

    if !all_done {
        info!("monitor interrumpido antes de completar el job");
        return MonitorExit::Interrupted;
    }

    info!(
        "todas las tareas completas ({} reduce), apagando en {:?}",
        total, grace
    );

    tokio::select! {
        _ = sleep(grace) => {}
        _ = shutdown.cancelled() => {
            info!("interrupción durante la gracia, apagando ya");
            return MonitorExit::Interrupted;
        }
    }

    info!("gracia terminada, cerrando el coordinator");
    shutdown.cancel();
    MonitorExit::AllTasksDone
}

async fn all_reduced(mut rx: watch::Receiver<u32>, total: u32) -> bool {
    rx.wait_for(|done| *done >= total).await.is_ok()
}
