use anyhow::Result;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::handlers;
use crate::monitor::{run_phase_monitor, MonitorExit};
use crate::state::AppState;

/// Sirve la API sobre `listener` hasta que `shutdown` se cancele: lo cancela el
/// monitor al terminar la gracia, o quien llame (Ctrl+C).
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    grace: Duration,
    shutdown: CancellationToken,
) -> Result<MonitorExit> {
    let app = handlers::build_router(state.clone());

    // monitor de fases en segundo plano
    let monitor = tokio::spawn(run_phase_monitor(
        state.registry.clone(),
        grace,
        shutdown.clone(),
    ));

    info!("coordinator escuchando en {}", listener.local_addr()?);

    let signal = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { signal.cancelled().await })
        .await;

    // si el server terminó por error, el monitor no tiene que quedar colgado
    shutdown.cancel();
    let exit = monitor.await?;
    served?;

    Ok(exit)
}
