//! Background connectivity probe.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use stepwise_core::assistant::AssistantBackend;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Periodically calls the backend health endpoint and keeps an online flag.
///
/// Purely informational: nothing on the navigation or chat paths waits on it.
pub struct ConnectivityMonitor {
    online: Arc<AtomicBool>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectivityMonitor {
    /// Starts probing every `interval`. Must be called inside a tokio runtime.
    pub fn start(backend: Arc<dyn AssistantBackend>, interval: Duration) -> Self {
        let online = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let online = online.clone();
            let cancel = cancel.clone();
            async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {}
                    }
                    let reachable = match backend.health_check().await {
                        Ok(()) => true,
                        Err(err) => {
                            tracing::debug!("[Connectivity] Health check failed: {}", err);
                            false
                        }
                    };
                    if online.swap(reachable, Ordering::Relaxed) != reachable {
                        if reachable {
                            tracing::info!("[Connectivity] Backend reachable again");
                        } else {
                            tracing::warn!("[Connectivity] Backend unreachable");
                        }
                    }
                }
                tracing::debug!("[Connectivity] Probe stopped");
            }
        });

        Self {
            online,
            cancel,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// A monitor that never probes and always reports online.
    pub fn disabled() -> Self {
        Self {
            online: Arc::new(AtomicBool::new(true)),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
            && self
                .handle
                .try_lock()
                .map(|handle| handle.as_ref().is_some_and(|h| !h.is_finished()))
                .unwrap_or(true)
    }

    /// Stops the probe and waits for the task to exit.
    pub async fn stop(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(err) = handle.await {
                tracing::warn!("[Connectivity] Probe task ended abnormally: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use stepwise_core::assistant::{ChatRequest, ChatStream, ValidationOutcome, ValidationRequest};
    use stepwise_core::error::{Result, StepwiseError};

    struct FlakyBackend {
        healthy: AtomicBool,
        probes: AtomicUsize,
    }

    #[async_trait]
    impl AssistantBackend for FlakyBackend {
        async fn stream_chat(&self, _: &ChatRequest, _: &str) -> Result<ChatStream> {
            Err(StepwiseError::internal("not used"))
        }

        async fn validate(&self, _: &ValidationRequest, _: &str) -> Result<ValidationOutcome> {
            Err(StepwiseError::internal("not used"))
        }

        async fn health_check(&self) -> Result<()> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(StepwiseError::network("connection refused"))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_tracks_backend_health() {
        let backend = Arc::new(FlakyBackend {
            healthy: AtomicBool::new(false),
            probes: AtomicUsize::new(0),
        });
        let monitor = ConnectivityMonitor::start(backend.clone(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!monitor.is_online());

        backend.healthy.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(monitor.is_online());
        assert!(backend.probes.load(Ordering::SeqCst) >= 2);

        monitor.stop().await;
        let probes = backend.probes.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(backend.probes.load(Ordering::SeqCst), probes);
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_disabled_monitor_reports_online() {
        let monitor = ConnectivityMonitor::disabled();
        assert!(monitor.is_online());
        assert!(!monitor.is_running());
        monitor.stop().await;
    }
}
