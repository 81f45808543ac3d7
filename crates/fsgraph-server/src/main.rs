//! fsgraph server binary
//!
//! ## Usage
//!
//! ```bash
//! # Serve the current directory; writes go to a temporary overlay
//! fsgraph-server
//!
//! # Serve a tree for real, on another port, with a fixed ID scope
//! fsgraph-server --root /srv/data --protected false --address 0.0.0.0:9000 --scope data
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fsgraph_kernel::{FsGraph, LocalBackend, OverlayBackend, VfsOps};
use fsgraph_server::{Args, Listener, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = ServerConfig::from_args(args)?;
    let scope = config.scope();
    tracing::info!(root = %config.root.display(), "serving");
    tracing::info!(scope = %scope, seed = %config.scope_seed, "scope");

    let base: Arc<dyn VfsOps> = Arc::new(LocalBackend::new(&config.root));
    let (store, scratch) = if config.protected {
        let (overlay, scratch) = OverlayBackend::protect(base)?;
        (Arc::new(overlay) as Arc<dyn VfsOps>, Some(scratch))
    } else {
        tracing::warn!("unprotected: writes go to the real tree");
        (base, None)
    };

    let graph = Arc::new(FsGraph::new(store, scope));
    let listener = TcpListener::bind(&config.address)
        .await
        .with_context(|| format!("unable to listen on {}", config.address))?;
    tracing::info!(address = %listener.local_addr()?, "listening");

    let served = Arc::new(Listener::new(graph))
        .serve(listener, shutdown_signal())
        .await;

    if let Some(scratch) = scratch {
        // Failure is already logged and doesn't change the exit status.
        let _ = scratch.cleanup();
    }
    served
}

/// Resolves on SIGINT, SIGTERM or SIGHUP.
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut streams = Vec::new();
    for kind in [SignalKind::interrupt(), SignalKind::terminate(), SignalKind::hangup()] {
        match signal(kind) {
            Ok(stream) => streams.push(stream),
            Err(e) => tracing::warn!("unable to install signal handler: {e}"),
        }
    }
    if streams.is_empty() {
        return std::future::pending().await;
    }

    let waits = streams.iter_mut().map(|s| Box::pin(s.recv()));
    let _ = futures::future::select_all(waits).await;
    tracing::info!("shutdown signal received");
}
