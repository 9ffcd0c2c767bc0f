//! barrier: Distributed readiness barrier.
//!
//! Every peer listed in the host file runs this binary. Each one keeps
//! announcing itself over UDP until it has heard from all the others or
//! the deadline passes. Diagnostics go to stderr; the outcome is reported
//! through the exit status (0 = READY, 124 = timed out).

use anyhow::{Context, Result};
use barrier_daemon::cli::{Args, exit_status};
use barrier_daemon::{Coordinator, DnsResolver, read_peer_list, self_identity, socket};
use clap::Parser;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose {
        "debug,barrier_daemon=debug,barrier_core=debug"
    } else {
        "info,barrier_daemon=info,barrier_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = args.barrier_config();

    let peers = read_peer_list(&args.hostfile)
        .await
        .context("Error opening hostfile")?;
    info!("Loaded {} peer(s) from {:?}", peers.len(), args.hostfile);

    let local_peer_id = match args.hostname {
        Some(id) => id,
        None => self_identity().await.context("Error reading hostname")?,
    };
    info!("Local peer ID: {}", local_peer_id);

    let socket = socket::bind(config.port)
        .await
        .with_context(|| format!("Socket bind failed on port {}", config.port))?;

    let resolver = DnsResolver::new(config.port);
    let coordinator = Coordinator::new(peers, local_peer_id, config, socket, resolver)
        .context("Invalid barrier configuration")?;

    let report = coordinator.run().await;
    info!(
        "Barrier finished: {} after {:.1}s",
        report.outcome,
        report.elapsed.as_secs_f64()
    );

    Ok(ExitCode::from(exit_status(report.outcome)))
}
