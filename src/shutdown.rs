//! Cooperative shutdown.
//!
//! A single `watch` channel carries the phase `Running -> Stopping ->
//! Stopped`. The sampler and the dashboard loop subscribe to it; signals,
//! the quit key and fatal render errors all funnel into [`ShutdownCoordinator::stop`].

use std::fmt;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Stopping,
    Stopped,
}

impl Phase {
    pub fn is_running(&self) -> bool {
        matches!(self, Phase::Running)
    }
}

/// What triggered the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupt,
    Terminate,
    Quit,
    InputClosed,
    RenderFailure,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Interrupt => "SIGINT",
            StopReason::Terminate => "SIGTERM",
            StopReason::Quit => "quit key",
            StopReason::InputClosed => "input stream closed",
            StopReason::RenderFailure => "render failure",
        };
        f.write_str(text)
    }
}

#[derive(Clone)]
pub struct ShutdownCoordinator {
    phase: Arc<watch::Sender<Phase>>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Phase::Running);
        Self {
            phase: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.phase().is_running()
    }

    /// Starts the shutdown sequence. Only the first call has any effect;
    /// returns `true` for that call.
    pub fn stop(&self, reason: StopReason) -> bool {
        let started = self.phase.send_if_modified(|phase| {
            if phase.is_running() {
                *phase = Phase::Stopping;
                true
            } else {
                false
            }
        });

        if started {
            info!("Received {}, shutting down gracefully...", reason);
        } else {
            debug!("Ignoring {}: shutdown already in progress", reason);
        }
        started
    }

    /// Marks the sequence complete once the display surface is released.
    pub fn finish(&self) {
        let finished = self.phase.send_if_modified(|phase| {
            if *phase == Phase::Stopped {
                false
            } else {
                *phase = Phase::Stopped;
                true
            }
        });
        if finished {
            info!("procdash stopped");
        }
    }

    /// Waits for SIGINT or SIGTERM and triggers [`stop`](Self::stop).
    /// Returns early once shutdown was started by something else.
    pub async fn listen_for_signals(self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let mut phase = self.subscribe();

        tokio::select! {
            _ = ctrl_c => {
                self.stop(StopReason::Interrupt);
            }
            _ = terminate => {
                self.stop(StopReason::Terminate);
            }
            _ = phase.wait_for(|p| !p.is_running()) => {
                debug!("Signal listener exiting");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_advance_in_order() {
        let shutdown = ShutdownCoordinator::new();
        assert_eq!(shutdown.phase(), Phase::Running);

        assert!(shutdown.stop(StopReason::Quit));
        assert_eq!(shutdown.phase(), Phase::Stopping);

        shutdown.finish();
        assert_eq!(shutdown.phase(), Phase::Stopped);
    }

    #[test]
    fn test_second_trigger_is_noop() {
        let shutdown = ShutdownCoordinator::new();
        assert!(shutdown.stop(StopReason::Terminate));
        assert!(!shutdown.stop(StopReason::Quit));
        assert_eq!(shutdown.phase(), Phase::Stopping);

        shutdown.finish();
        assert!(!shutdown.stop(StopReason::Interrupt));
        assert_eq!(shutdown.phase(), Phase::Stopped);
    }

    #[test]
    fn test_clones_share_phase() {
        let shutdown = ShutdownCoordinator::new();
        let other = shutdown.clone();
        other.stop(StopReason::Quit);
        assert!(!shutdown.is_running());
    }

    #[tokio::test]
    async fn test_subscribers_observe_stop() {
        let shutdown = ShutdownCoordinator::new();
        let mut rx = shutdown.subscribe();

        let waiter = tokio::spawn(async move {
            rx.wait_for(|p| !p.is_running()).await.map(|p| *p).ok()
        });
        shutdown.stop(StopReason::Quit);

        assert_eq!(waiter.await.unwrap(), Some(Phase::Stopping));
    }

    #[tokio::test]
    async fn test_signal_listener_exits_after_quit() {
        let shutdown = ShutdownCoordinator::new();
        let listener = tokio::spawn(shutdown.clone().listen_for_signals());

        shutdown.stop(StopReason::Quit);
        tokio::time::timeout(std::time::Duration::from_secs(1), listener)
            .await
            .expect("listener returns once shutdown started")
            .unwrap();
    }
}
