//! Listener runtime: an isolated execution context per server.
//!
//! # Responsibilities
//! - Run an axum listener on a dedicated thread with its own runtime
//! - Acknowledge start/stop transitions over the handshake slot
//! - Tear down hard on request: drop the serve loop, abort callback tasks
//!
//! # Design Decisions
//! - `Started` is pushed after bind and immediately before accepting, so the
//!   owner learns actual readiness
//! - Shutdown drops the serve future instead of draining connections; the
//!   runtime (and any spawned callback task) dies with the thread

use std::future::IntoFuture;
use std::time::Duration;

use axum::Router;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use crate::callback;
use crate::error::StubError;
use crate::model::OutboundRequest;
use crate::routing::unknown_endpoint;

use super::handshake::{self, HandshakeWait, ServerSignal, SignalReceiver, SignalSender};
use super::ports;

/// Default bound on handshake waits.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Address of one mock listener, shared or dedicated.
#[derive(Debug, Clone)]
pub struct MockServer {
    host: String,
    port: u16,
}

impl MockServer {
    /// Allocate a listener address from the port cursor.
    pub fn new() -> Self {
        Self::at("127.0.0.1", ports::next_port())
    }

    pub fn at(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Launch the listener in its own execution context serving `router`.
    /// `startup` requests are fired once the socket is bound.
    pub fn spawn(
        &self,
        router: Router,
        startup: Vec<OutboundRequest>,
    ) -> Result<ServerHandle, StubError> {
        let (signal_tx, signal_rx) = handshake::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let host = self.host.clone();
        let port = self.port;
        let thread = std::thread::Builder::new()
            .name(format!("httpstub-{host}-{port}"))
            .spawn(move || {
                runtime.block_on(serve(host, port, router, startup, signal_tx, shutdown_rx));
            })?;

        Ok(ServerHandle {
            shutdown: Some(shutdown_tx),
            signals: signal_rx,
            thread: Some(thread),
        })
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

async fn serve(
    host: String,
    port: u16,
    router: Router,
    startup: Vec<OutboundRequest>,
    signals: SignalSender,
    shutdown: oneshot::Receiver<()>,
) {
    let router = router
        .fallback(unknown_endpoint)
        .layer(TraceLayer::new_for_http());

    // reuseaddr lets a restarted service rebind its port while old
    // connections are still in TIME_WAIT
    let listener = match bind_reusable(&host, port) {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%host, port, error = %err, "failed to bind mock listener");
            return;
        }
    };

    if !startup.is_empty() {
        tokio::spawn(callback::run_requests(startup));
    }

    signals.notify(ServerSignal::Started);
    tracing::debug!(%host, port, "mock server accepting connections");

    let server = axum::serve(listener, router).into_future();
    tokio::select! {
        result = server => {
            if let Err(err) = result {
                tracing::error!(error = %err, "mock server terminated with error");
            }
        }
        _ = shutdown => {
            tracing::trace!(%host, port, "mock server shutdown requested");
        }
    }

    signals.notify(ServerSignal::Stopped);
}

fn bind_reusable(host: &str, port: u16) -> std::io::Result<TcpListener> {
    let addr: std::net::SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(1024)
}

/// Owner-side handle to a spawned listener.
pub struct ServerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    signals: SignalReceiver,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Block on the handshake slot for at most `timeout`.
    pub fn wait_signal(&self, timeout: Duration) -> HandshakeWait {
        self.signals.wait(timeout)
    }

    /// Request immediate teardown. Idempotent; does not wait.
    pub fn terminate(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }

    /// Reap the listener thread. Called after the `Stopped` acknowledgement
    /// so the port is free before any restart.
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("mock server thread panicked");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.terminate();
        self.join();
    }
}
