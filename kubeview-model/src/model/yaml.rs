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
    render::Accessor,
};

struct Yaml {
    path: String,
    accessor: Arc<dyn Accessor>,
    show_managed: AtomicBool,
    viewer: Viewer,
}

impl Yaml {
    async fn manifest(&self) -> Result<String> {
        let mut obj = self
            .accessor
            .get(&self.path)
            .await
            .map_err(|source| ModelError::Fetch {
                path: self.path.clone(),
                source,
            })?;
        if !self.show_managed.load(Ordering::Relaxed) {
            obj.metadata.managed_fields = None;
        }

        Ok(serde_yaml::to_string(&obj)?)
    }
}

impl Refreshable for Yaml {
    fn name(&self) -> &str {
        &self.path
    }

    fn reconcile(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let raw = self.manifest().await?;
            self.viewer.set_lines(raw.lines().map(String::from).collect());
            Ok(())
        })
    }

    fn notify_failed(&self, err: &ModelError) {
        self.viewer.notify_failed(err);
    }
}

/// Live YAML manifest of a single object.
#[derive(Clone)]
pub struct YamlModel {
    refresher: Refresher<Yaml>,
}

impl YamlModel {
    pub fn new(
        kind: &str,
        path: impl Into<String>,
        registry: &Registry,
        cfg: &ModelConfig,
    ) -> Result<Self> {
        let yaml = Yaml {
            path: path.into(),
            accessor: registry.meta(kind)?.accessor.clone(),
            show_managed: AtomicBool::new(false),
            viewer: Viewer::default(),
        };

        Ok(Self {
            refresher: Refresher::new(Arc::new(yaml), cfg)
                .with_refresh_rate(cfg.reader_refresh_rate()),
        })
    }

    fn yaml(&self) -> &Yaml {
        self.refresher.model()
    }

    pub fn path(&self) -> &str {
        &self.yaml().path
    }

    pub fn show_managed_fields(&self) -> bool {
        self.yaml().show_managed.load(Ordering::Relaxed)
    }

    /// Flips `managedFields` output and re-renders right away.
    pub async fn set_show_managed_fields(&self, show: bool) -> Result<Refresh> {
        self.yaml().show_managed.store(show, Ordering::Relaxed);
        self.refresher.refresh().await
    }

    pub fn add_listener(&self, l: Arc<dyn ResourceViewerListener>) -> Subscription {
        self.yaml().viewer.add_listener(l)
    }

    pub fn remove_listener(&self, sub: Subscription) -> bool {
        self.yaml().viewer.remove_listener(sub)
    }

    pub fn filter(&self, q: &str) {
        self.yaml().viewer.filter(q);
    }

    pub fn clear_filter(&self) {
        self.yaml().viewer.clear_filter();
    }

    pub fn peek(&self) -> Vec<String> {
        self.yaml().viewer.peek()
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
