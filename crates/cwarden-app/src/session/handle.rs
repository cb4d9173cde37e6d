//! Session handle and background task control for one console view.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::session::ConsoleSession;

/// Handle pairing a session's state with its polling tasks.
pub struct SessionHandle {
    /// The session state
    pub session: ConsoleSession,

    /// Shutdown sender for the metrics polling task.
    ///
    /// Sending `true` stops the polling loop cleanly. Stored as `Arc` because
    /// the `Message` enum (which carries the initial sender) requires `Clone`.
    /// Set by `MetricsPollingStarted`, cleared when the instance stops.
    pub metrics_shutdown_tx: Option<Arc<watch::Sender<bool>>>,

    /// JoinHandle for the metrics polling task.
    ///
    /// Aborted alongside the shutdown signal so a tick already in flight
    /// cannot outlive the view. Set by `MetricsPollingStarted`.
    pub metrics_task: Option<JoinHandle<()>>,

    /// Shutdown sender for the status refresh task.
    pub status_shutdown_tx: Option<Arc<watch::Sender<bool>>>,

    /// JoinHandle for the status refresh task.
    pub status_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session", &self.session)
            .field("has_metrics_shutdown", &self.metrics_shutdown_tx.is_some())
            .field("has_metrics_task", &self.metrics_task.is_some())
            .field("has_status_shutdown", &self.status_shutdown_tx.is_some())
            .field("has_status_task", &self.status_task.is_some())
            .finish()
    }
}

impl SessionHandle {
    /// Create a new session handle
    pub fn new(session: ConsoleSession) -> Self {
        Self {
            session,
            metrics_shutdown_tx: None,
            metrics_task: None,
            status_shutdown_tx: None,
            status_task: None,
        }
    }

    /// Stop the metrics polling task, if one is attached.
    ///
    /// Safe to call when no task is attached or it already exited.
    pub fn stop_metrics_task(&mut self) {
        if let Some(h) = self.metrics_task.take() {
            h.abort();
        }
        if let Some(tx) = self.metrics_shutdown_tx.take() {
            let _ = tx.send(true);
        }
    }

    /// Stop the status refresh task, if one is attached.
    pub fn stop_status_task(&mut self) {
        if let Some(h) = self.status_task.take() {
            h.abort();
        }
        if let Some(tx) = self.status_shutdown_tx.take() {
            let _ = tx.send(true);
        }
    }

    /// Stop every background task for this view.
    pub fn stop_all_tasks(&mut self) {
        self.stop_metrics_task();
        self.stop_status_task();
    }

    pub fn has_metrics_task(&self) -> bool {
        self.metrics_task.is_some()
    }

    pub fn has_status_task(&self) -> bool {
        self.status_task.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cwarden_core::metrics::EvictionPolicy;
    use cwarden_core::types::InstanceSummary;
    use std::time::Duration;

    fn test_handle() -> SessionHandle {
        let instance = InstanceSummary {
            id: "abc".to_string(),
            name: "lobby".to_string(),
            software: "vanilla".to_string(),
            version: "1.20.4".to_string(),
            running: true,
            tunnel_enabled: false,
        };
        SessionHandle::new(ConsoleSession::new(
            1,
            &instance,
            EvictionPolicy::MaxCount(60),
        ))
    }

    #[test]
    fn test_stop_without_tasks_is_harmless() {
        let mut handle = test_handle();
        handle.stop_all_tasks();
        assert!(!handle.has_metrics_task());
        assert!(!handle.has_status_task());
    }

    #[tokio::test]
    async fn test_stop_metrics_signals_and_clears() {
        let mut handle = test_handle();
        let (tx, mut rx) = tokio::sync::watch::channel(false);
        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        handle.metrics_shutdown_tx = Some(Arc::new(tx));
        handle.metrics_task = Some(task);

        handle.stop_metrics_task();

        assert!(!handle.has_metrics_task());
        assert!(handle.metrics_shutdown_tx.is_none());
        // The sender was consumed after signalling true.
        assert!(rx.has_changed().is_err() || *rx.borrow());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut handle = test_handle();
        let (tx, _rx) = tokio::sync::watch::channel(false);
        handle.status_shutdown_tx = Some(Arc::new(tx));
        handle.status_task = Some(tokio::spawn(async {}));

        handle.stop_status_task();
        handle.stop_status_task();
        assert!(!handle.has_status_task());
    }
}
