//! Scripted `/health` endpoint built on `axum`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Debug, Default)]
struct Script {
    statuses: Vec<u16>,
    served: Mutex<Vec<u16>>,
}

/// Serves `GET /health` with a fixed sequence of status codes.
///
/// The n-th request gets `statuses[n]`; once the list is exhausted the last
/// status repeats. An empty list always answers 200.
#[derive(Debug)]
pub struct MockHealthServer {
    addr: SocketAddr,
    script: Arc<Script>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockHealthServer {
    pub async fn start(statuses: Vec<u16>) -> anyhow::Result<Self> {
        let script = Arc::new(Script {
            statuses,
            served: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/health", get(handle_health))
            .with_state(Arc::clone(&script));

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                tracing::error!("mock health server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            script,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Always healthy.
    pub async fn healthy() -> anyhow::Result<Self> {
        Self::start(vec![200]).await
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// `127.0.0.1:port`
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn hits(&self) -> usize {
        self.served().len()
    }

    /// Status codes answered so far, in order.
    pub fn served(&self) -> Vec<u16> {
        self.script
            .served
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Drop for MockHealthServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle_health(State(script): State<Arc<Script>>) -> StatusCode {
    let mut served = script.served.lock().unwrap_or_else(|e| e.into_inner());
    let code = script
        .statuses
        .get(served.len())
        .or(script.statuses.last())
        .copied()
        .unwrap_or(200);
    served.push(code);
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A local port with nothing listening on it.
pub async fn unused_local_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}
