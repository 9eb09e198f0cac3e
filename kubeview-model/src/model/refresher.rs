use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::future::BoxFuture;
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::backoff::{Backoff, ExpBackoff};
use crate::{
    config::{BackoffConfig, ModelConfig},
    error::{ModelError, Result},
};

/// A view-model the refresh loop can drive.
pub trait Refreshable: Send + Sync + 'static {
    /// Label used in logs.
    fn name(&self) -> &str;

    /// Pulls fresh state and notifies change listeners when it moved.
    fn reconcile(&self) -> BoxFuture<'_, Result<()>>;

    fn notify_failed(&self, err: &ModelError);
}

/// Outcome of a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Done,
    /// Another reconciliation was already in flight.
    Dropped,
}

/// Why a watch loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
    GaveUp,
}

/// Drives a model's reconciliation on a timer, one attempt at a time, backing
/// off on failures.
pub struct Refresher<M> {
    model: Arc<M>,
    in_update: Arc<Mutex<()>>,
    rate_ms: Arc<AtomicU64>,
    initial: Duration,
    backoff: BackoffConfig,
}

impl<M> Clone for Refresher<M> {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
            in_update: self.in_update.clone(),
            rate_ms: self.rate_ms.clone(),
            initial: self.initial,
            backoff: self.backoff.clone(),
        }
    }
}

impl<M: Refreshable> Refresher<M> {
    pub fn new(model: Arc<M>, cfg: &ModelConfig) -> Self {
        Self {
            model,
            in_update: Arc::new(Mutex::new(())),
            rate_ms: Arc::new(AtomicU64::new(as_millis(cfg.refresh_rate()))),
            initial: cfg.initial_refresh(),
            backoff: cfg.backoff.clone(),
        }
    }

    pub fn with_refresh_rate(self, rate: Duration) -> Self {
        self.set_refresh_rate(rate);
        self
    }

    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    pub fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.rate_ms.load(Ordering::Relaxed))
    }

    /// Takes effect after the next successful tick.
    pub fn set_refresh_rate(&self, rate: Duration) {
        self.rate_ms.store(as_millis(rate), Ordering::Relaxed);
    }

    /// Runs one reconciliation unless one is already in flight. Failures
    /// are reported to the model's failure listeners before being returned.
    #[tracing::instrument(skip(self), fields(model = self.model.name()))]
    pub async fn refresh(&self) -> Result<Refresh> {
        let Ok(_guard) = self.in_update.try_lock() else {
            debug!("dropping update");
            return Ok(Refresh::Dropped);
        };

        if let Err(err) = self.model.reconcile().await {
            warn!(error = %err, "reconcile failed");
            self.model.notify_failed(&err);
            return Err(err);
        }

        Ok(Refresh::Done)
    }

    /// Loads the model once, then keeps it fresh in the background until
    /// `cancel` fires or the backoff budget runs out.
    pub async fn watch(&self, cancel: CancellationToken) -> Result<JoinHandle<LoopExit>> {
        self.refresh().await?;

        let this = self.clone();
        Ok(tokio::spawn(async move { this.run(cancel).await }))
    }

    async fn run(self, cancel: CancellationToken) -> LoopExit {
        let mut backoff = ExpBackoff::from_config(&self.backoff);
        let mut delay = self.initial;

        loop {
            let res = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                res = self.tick(delay) => res,
            };

            match res {
                Ok(_) => {
                    backoff.reset();
                    delay = self.refresh_rate();
                }
                Err(err) => match backoff.next_backoff() {
                    Backoff::RetryAfter(d) => delay = d,
                    Backoff::GiveUp => {
                        error!(
                            model = self.model.name(),
                            attempts = backoff.attempts(),
                            error = %err,
                            "giving up refresh"
                        );
                        return LoopExit::GaveUp;
                    }
                },
            }
        }
        debug!(model = self.model.name(), "refresh loop cancelled");

        LoopExit::Cancelled
    }

    async fn tick(&self, delay: Duration) -> Result<Refresh> {
        time::sleep(delay).await;
        self.refresh().await
    }
}

fn as_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
