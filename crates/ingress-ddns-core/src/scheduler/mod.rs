//! Fixed-delay pass scheduler
//!
//! Runs one reconciliation pass immediately, then waits a fixed delay after
//! each pass completes before starting the next. Passes never overlap: the
//! loop awaits a whole pass before it starts sleeping.
//!
//! Shutdown is only observed while sleeping, so a pass in progress always
//! completes.

use std::future::Future;
use std::time::Duration;
use tracing::info;

use crate::error::Result;
use crate::reconciler::Reconciler;

/// Drives a [`Reconciler`] forever on a fixed delay
pub struct Scheduler {
    reconciler: Reconciler,
    interval: Duration,
}

impl Scheduler {
    /// Create a scheduler running `reconciler` every `interval`
    pub fn new(reconciler: Reconciler, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
        }
    }

    /// Run until `shutdown` resolves
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!("Starting reconcile loop (interval={:?})", self.interval);

        loop {
            self.reconciler.run_pass().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received, reconcile loop stopped");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run with a controlled shutdown signal
    ///
    /// `None` never shuts down.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        match shutdown_rx {
            Some(rx) => {
                self.run_until(async {
                    let _ = rx.await;
                })
                .await
            }
            None => self.run_until(std::future::pending::<()>()).await,
        }
    }
}
