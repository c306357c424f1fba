//! Graceful shutdown of the dice service.
//!
//! One trigger stops the HTTP server from accepting and lets in-flight rolls
//! finish. Telemetry is released by the caller after the server returns.

use std::future::Future;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::lifecycle::signals::wait_for_signal;

/// Broadcast handle every long-running task listens on.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to hand to [`HttpServer::run`](crate::http::HttpServer::run).
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire now. Subscribers that join later miss it.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Fire once `event` completes.
    pub fn trigger_when<F>(&self, event: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.clone();
        tokio::spawn(async move {
            event.await;
            shutdown.trigger();
        })
    }

    /// Fire on the first SIGINT or SIGTERM.
    pub fn trigger_on_signal(&self) -> JoinHandle<()> {
        self.trigger_when(wait_for_signal())
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
