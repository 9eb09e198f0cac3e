use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    listeners::Subscription,
    refresher::{LoopExit, Refresh, Refreshable, Refresher},
    viewer::{ResourceViewerListener, Viewer},
};
use crate::{
    config::ModelConfig,
    error::{ModelError, Result},
    registry::Registry,
    render::Describer,
};

struct Describe {
    path: String,
    describer: Arc<dyn Describer>,
    decode: AtomicBool,
    viewer: Viewer,
}

impl Refreshable for Describe {
    fn name(&self) -> &str {
        &self.path
    }

    fn reconcile(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let text = self
                .describer
                .describe(&self.path, self.decode.load(Ordering::Relaxed))
                .await
                .map_err(|source| ModelError::Describe {
                    path: self.path.clone(),
                    source,
                })?;
            self.viewer.set_lines(text.lines().map(String::from).collect());
            Ok(())
        })
    }

    fn notify_failed(&self, err: &ModelError) {
        self.viewer.notify_failed(err);
    }
}

/// Live description of a single object.
#[derive(Clone)]
pub struct DescribeModel {
    refresher: Refresher<Describe>,
}

impl DescribeModel {
    pub fn new(
        kind: &str,
        path: impl Into<String>,
        registry: &Registry,
        cfg: &ModelConfig,
    ) -> Result<Self> {
        let describer = registry
            .meta(kind)?
            .describer
            .clone()
            .ok_or_else(|| ModelError::NoDescriber(kind.to_string()))?;
        let describe = Describe {
            path: path.into(),
            describer,
            decode: AtomicBool::new(false),
            viewer: Viewer::default(),
        };

        Ok(Self {
            refresher: Refresher::new(Arc::new(describe), cfg)
                .with_refresh_rate(cfg.reader_refresh_rate()),
        })
    }

    fn describe(&self) -> &Describe {
        self.refresher.model()
    }

    pub fn path(&self) -> &str {
        &self.describe().path
    }

    pub fn add_listener(&self, l: Arc<dyn ResourceViewerListener>) -> Subscription {
        self.describe().viewer.add_listener(l)
    }

    pub fn remove_listener(&self, sub: Subscription) -> bool {
        self.describe().viewer.remove_listener(sub)
    }

    /// Flips between raw and decoded secret data. Picked up on the next
    /// refresh.
    pub fn toggle(&self) -> bool {
        !self.describe().decode.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn filter(&self, q: &str) {
        self.describe().viewer.filter(q);
    }

    pub fn clear_filter(&self) {
        self.describe().viewer.clear_filter();
    }

    pub fn peek(&self) -> Vec<String> {
        self.describe().viewer.peek()
    }

    pub async fn refresh(&self) -> Result<Refresh> {
        self.refresher.refresh().await
    }

    pub async fn watch(&self, cancel: CancellationToken) -> Result<JoinHandle<LoopExit>> {
        self.refresher.watch(cancel).await
    }

    pub fn set_refresh_rate(&self, rate: Duration) {
        self.refresher.set_refresh_rate(rate);
    }
}
