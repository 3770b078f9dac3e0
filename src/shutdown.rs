//! Cooperative cancellation shared by every pipeline stage.
//!
//! [`ShutdownSignal`] is fired once; every [`ShutdownListener`] observes it.
//! The state is level-triggered: a listener that checks after the signal
//! fired, or that was created after it fired, still sees it as fired.

use std::io;
use std::sync::Arc;

use tokio::sync::watch;

/// The firing side of the cancellation signal.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal.  Firing again is a no-op; it never blocks.
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }

    /// Create a listener for one stage.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// The observing side of the cancellation signal.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolve once the signal has fired.
    ///
    /// If every [`ShutdownSignal`] handle has been dropped the signal can no
    /// longer fire, and that is treated as fired too, so no stage waits
    /// forever on an orphaned listener.
    pub async fn cancelled(&mut self) {
        let _ = self.rx.wait_for(|fired| *fired).await;
    }
}

/// Process termination signals the service shuts down on.
///
/// Handlers are installed up front so a registration failure surfaces at
/// startup instead of after the pipeline is running.
pub struct OsSignals {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
}

impl OsSignals {
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next termination signal and return its name.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.interrupt.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "ctrl-c",
            Err(_) => std::future::pending().await,
        }
    }
}
