//! Stop signal for the daemon.
//!
//! One `watch` flag flips from `false` to `true` once; the HTTP server holds
//! a future that resolves on the flip, and `main` bounds how long in-flight
//! requests get to drain afterwards.

use std::future::Future;
use tokio::sync::watch;

pub struct Shutdown {
    stop: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self { stop }
    }

    pub fn trigger(&self) {
        self.stop.send_replace(true);
    }

    /// Resolves once [`trigger`](Self::trigger) has been called, including
    /// calls made before the future was created.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.stop.subscribe();
        async move {
            let _ = rx.wait_for(|stop| *stop).await;
        }
    }

    /// Wait for Ctrl-C or SIGTERM, then trigger.
    pub async fn on_os_signal(&self) {
        let name = os_signal().await;
        tracing::info!(signal = name, "stop requested");
        self.trigger();
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn os_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!("SIGTERM handler unavailable, only Ctrl-C stops the daemon: {e}");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn os_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl-C"
}
