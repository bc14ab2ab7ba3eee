use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;

use stock_hunter::worker::{self, LeanAndMeanHandler, WorkerServer};

#[derive(Debug, Parser)]
#[command(name = "hunter-worker", about = "Runs a remote fetch worker")]
struct Args {
    /// Worker to run (`lean_and_mean`)
    worker: String,

    /// Listen on this address instead of the worker's fixed endpoint
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = PathBuf::from(format!("./{}.txt", args.worker));
    let _guard = stock_hunter::logging::init("stock_hunter=debug,hunter_worker=debug", Some(&log_file))?;

    let addr = match (args.bind, worker::endpoint(&args.worker)) {
        (Some(addr), Some(_)) => addr,
        (None, Some(endpoint)) => endpoint.to_string(),
        (_, None) => bail!("unknown worker: {}", args.worker),
    };

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("unable to bind {}", addr))?;
    info!("{} worker listening on {}", args.worker, addr);

    WorkerServer::new(LeanAndMeanHandler::new()?)
        .serve(listener)
        .await?;
    Ok(())
}
