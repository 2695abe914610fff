use anyhow::Result;
use clap::Parser;
use common::{config, FsLayout, JobConfig};
use coordinator::{bootstrap, server, AppState, MonitorExit};
use std::{path::PathBuf, time::Duration};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coordinator")]
#[command(about = "Coordinator de map/reduce (word count) sobre HTTP")]
struct Args {
    /// Cantidad de tareas map (shards de entrada)
    #[arg(short = 'N', long = "map-tasks")]
    n: u32,

    /// Cantidad de tareas reduce (buckets de salida)
    #[arg(short = 'M', long = "reduce-tasks")]
    m: u32,

    /// Puerto donde escucha el coordinator
    #[arg(short = 'p', long = "port")]
    port: u16,

    /// Directorio con los .txt de entrada
    #[arg(long, default_value = "inputs")]
    input_dir: PathBuf,

    /// Raíz de temp/, intermediate/ y out/
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Segundos entre "todo completo" y cerrar el listener
    #[arg(long, default_value_t = config::DEFAULT_GRACE_PERIOD.as_secs())]
    grace_secs: u64,

    /// No regenerar temp/ (usar shards ya existentes)
    #[arg(long)]
    skip_split: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coordinator=debug,axum=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let job = JobConfig::new(args.n, args.m)?;
    let layout = FsLayout::new(&args.workdir);

    bootstrap::prepare_workspace(&layout, args.skip_split)?;
    if !args.skip_split {
        bootstrap::split_inputs(&args.input_dir, job.map_tasks(), &layout)?;
    }

    let grace = Duration::from_secs(args.grace_secs);
    if grace <= config::DEFAULT_NOT_READY_BACKOFF {
        warn!(
            "gracia de {:?} no supera el backoff por defecto de los workers ({:?})",
            grace,
            config::DEFAULT_NOT_READY_BACKOFF
        );
    }

    info!(
        "corriendo map/reduce con N={} tareas map y M={} tareas reduce, salida en {}",
        job.map_tasks(),
        job.reduce_tasks(),
        layout.output_dir().display()
    );

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;

    // Ctrl+C sigue el mismo camino que el apagado normal
    let shutdown = CancellationToken::new();
    let on_interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupción recibida, apagando");
            on_interrupt.cancel();
        }
    });

    match server::serve(listener, AppState::new(job), grace, shutdown).await? {
        MonitorExit::AllTasksDone => info!("job terminado"),
        MonitorExit::Interrupted => info!("coordinator interrumpido"),
    }

    Ok(())
}
