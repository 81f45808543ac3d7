//! TCP listener for JSON-line requests.
//!
//! Clients connect, write one request per line, and read one response per
//! line. Requests on a connection are answered in order; connections are
//! served concurrently, each on its own task.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

use fsgraph_kernel::FsGraph;

use crate::constants::DRAIN_TIMEOUT;
use crate::dispatch::dispatch;
use crate::protocol::{ErrorBody, Request, Response};

/// Serves one [`FsGraph`] to any number of connections.
pub struct Listener {
    graph: Arc<FsGraph>,
    drain_timeout: Duration,
}

impl Listener {
    pub fn new(graph: Arc<FsGraph>) -> Self {
        Self {
            graph,
            drain_timeout: DRAIN_TIMEOUT,
        }
    }

    /// How long [`serve`](Self::serve) waits for open connections after
    /// `shutdown` resolves before aborting them.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Accept connections until `shutdown` resolves, then stop every
    /// connection after its current request and wait for them.
    ///
    /// When this returns no connection task is left touching the graph.
    pub async fn serve(
        self: Arc<Self>,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> anyhow::Result<()> {
        tokio::pin!(shutdown);
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("listener shutting down");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "connection opened");
                        let this = Arc::clone(&self);
                        let stop = stop_rx.clone();
                        connections.spawn(async move {
                            if let Err(e) = this.handle_connection(stream, stop).await {
                                tracing::debug!(%peer, "connection error: {e}");
                            }
                            tracing::debug!(%peer, "connection closed");
                        });
                    }
                    Err(e) => {
                        tracing::warn!("accept error: {e}");
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        tracing::warn!("connection task failed: {e}");
                    }
                }
            }
        }

        drop(listener);
        let _ = stop_tx.send(true);

        let open = connections.len();
        if open > 0 {
            tracing::info!(open, "waiting for connections to finish");
        }
        let drained = tokio::time::timeout(self.drain_timeout, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                open = connections.len(),
                "connections still busy after {:?}, aborting",
                self.drain_timeout
            );
            connections.shutdown().await;
        }

        Ok(())
    }

    /// Answer request lines until the peer hangs up or `stop` changes.
    ///
    /// A request already read is always answered.
    async fn handle_connection(
        &self,
        stream: TcpStream,
        mut stop: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = stop.changed() => None,
            };
            let Some(line) = line else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = self.handle_line(line).await;
            let json = serde_json::to_string(&response)?;
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }

        writer.shutdown().await?;
        Ok(())
    }

    /// Decode, run and encode one request.
    ///
    /// The `id` is echoed whenever the line is a JSON object, even if the
    /// operation in it is malformed.
    pub async fn handle_line(&self, line: &str) -> Response {
        let request: Value = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                return Response::err(
                    Value::Null,
                    ErrorBody::invalid_request(format!("invalid request: {e}")),
                );
            }
        };
        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let request: Request = match serde_json::from_value(request) {
            Ok(request) => request,
            Err(e) => {
                return Response::err(
                    id,
                    ErrorBody::invalid_request(format!("invalid request: {e}")),
                );
            }
        };

        let op = request.op.name();
        match dispatch(&self.graph, request.op).await {
            Ok(result) => Response::ok(request.id, result),
            Err(e) => {
                tracing::debug!(op, error = %e, "request failed");
                Response::err(request.id, ErrorBody::from(&e))
            }
        }
    }
}
