use anyhow::Result;
use clap::Parser;
use common::FsLayout;
use std::{path::PathBuf, process::ExitCode};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use worker::{CoordinatorClient, WorkerAgent, WorkerSettings};

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "Worker de map/reduce: pide tareas al coordinator hasta que no queden")]
struct Args {
    /// Puerto del coordinator
    #[arg(short = 'p', long = "port")]
    port: u16,

    /// Host del coordinator
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Raíz de temp/, intermediate/ y out/ (la misma que el coordinator)
    #[arg(long, default_value = ".")]
    workdir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=debug,reqwest=info")),
        )
        .init();

    let args = Args::parse();
    let client = CoordinatorClient::for_port(&args.host, args.port)?;
    let settings = WorkerSettings::from_env();

    let shutdown = CancellationToken::new();
    let on_interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupción recibida, el worker deja de pedir tareas");
            on_interrupt.cancel();
        }
    });

    // id local sólo para distinguir workers en los logs
    let worker_id = Uuid::new_v4();
    let agent = WorkerAgent::new(client, FsLayout::new(&args.workdir), settings, shutdown);
    let exit = agent
        .run()
        .instrument(info_span!("worker", id = %worker_id))
        .await?;

    info!("worker {} terminó: {:?}", worker_id, exit);
    Ok(ExitCode::from(exit.exit_code()))
}
