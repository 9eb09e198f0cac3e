use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    listeners::{Listeners, Subscription},
    refresher::{LoopExit, Refresh, Refreshable, Refresher},
};
use crate::{
    config::ModelConfig,
    error::{ModelError, Result},
    registry::{Registry, ResourceMeta},
    scope,
    table::{filter, TableData},
};

/// Observes a table view-model.
pub trait TableListener: Send + Sync {
    fn table_data_changed(&self, data: &TableData);
    fn table_load_failed(&self, err: &ModelError);
}

#[derive(Debug, Default)]
struct Query {
    labels: String,
    instance: String,
}

struct Table {
    kind: String,
    meta: ResourceMeta,
    data: TableData,
    query: RwLock<Query>,
    listeners: Listeners<dyn TableListener>,
}

impl Table {
    fn query(&self) -> (String, String) {
        let q = self.query.read().unwrap_or_else(PoisonError::into_inner);
        (q.labels.clone(), q.instance.clone())
    }

    async fn load(&self) -> Result<()> {
        let ns = self.data.namespace();
        let (labels, instance) = self.query();
        let accessor = &self.meta.accessor;
        let list_err = |source| ModelError::List {
            kind: self.kind.clone(),
            source,
        };

        let objects = if instance.is_empty() {
            accessor.list(&ns, &labels).await.map_err(list_err)?
        } else {
            vec![accessor.get(&instance).await.map_err(list_err)?]
        };
        debug!(count = objects.len(), "fetched");

        self.data.reconcile(&ns, self.meta.renderer.as_ref(), &objects)
    }
}

impl Refreshable for Table {
    fn name(&self) -> &str {
        &self.kind
    }

    fn reconcile(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.load().await?;
            let snapshot = self.data.clone();
            self.listeners.notify(|l| l.table_data_changed(&snapshot));
            Ok(())
        })
    }

    fn notify_failed(&self, err: &ModelError) {
        self.listeners.notify(|l| l.table_load_failed(err));
    }
}

/// Live tabular view of one resource kind.
#[derive(Clone)]
pub struct TableModel {
    refresher: Refresher<Table>,
}

impl TableModel {
    pub fn new(kind: impl Into<String>, registry: &Registry, cfg: &ModelConfig) -> Result<Self> {
        let kind = kind.into();
        let meta = registry.meta(&kind)?.clone();
        let table = Table {
            data: TableData::new(kind.as_str()),
            kind,
            meta,
            query: RwLock::default(),
            listeners: Listeners::new(),
        };

        Ok(Self {
            refresher: Refresher::new(Arc::new(table), cfg),
        })
    }

    fn table(&self) -> &Table {
        self.refresher.model()
    }

    pub fn kind(&self) -> &str {
        &self.table().kind
    }

    pub fn add_listener(&self, l: Arc<dyn TableListener>) -> Subscription {
        self.table().listeners.add(l)
    }

    pub fn remove_listener(&self, sub: Subscription) -> bool {
        self.table().listeners.remove(sub)
    }

    /// Restricts listings to objects matching a label selector.
    /// Accepts a bare selector or the `-l` filter form.
    pub fn set_label_selector(&self, sel: &str) {
        self.table()
            .query
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .labels = filter::label_selector(sel).to_string();
    }

    pub fn label_selector(&self) -> String {
        self.table().query().0
    }

    /// Tracks a single object (`ns/name`) instead of a listing. An empty
    /// path goes back to listing.
    pub fn set_instance(&self, path: impl Into<String>) {
        self.table()
            .query
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .instance = path.into();
    }

    /// Switches scope. The table is emptied until the next refresh.
    pub fn set_namespace(&self, ns: impl Into<String>) {
        self.table().data.reset(ns);
    }

    pub fn namespace(&self) -> String {
        self.table().data.namespace()
    }

    /// True when the table holds data for `ns`.
    pub fn in_namespace(&self, ns: &str) -> bool {
        self.namespace() == ns && !self.is_empty()
    }

    pub fn cluster_wide(&self) -> bool {
        scope::is_cluster_wide(&self.namespace())
    }

    pub fn is_empty(&self) -> bool {
        self.table().data.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.table().data.row_count()
    }

    /// Snapshot of the current table.
    pub fn peek(&self) -> TableData {
        self.table().data.clone()
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

    pub fn refresh_rate(&self) -> Duration {
        self.refresher.refresh_rate()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        registry::tests::{registry, StaticAccessor},
        render::tests::pod,
        table::ResEvent,
    };

    #[derive(Default)]
    struct Recorder {
        tables: Mutex<Vec<TableData>>,
        errors: Mutex<Vec<String>>,
    }

    impl TableListener for Recorder {
        fn table_data_changed(&self, data: &TableData) {
            self.tables.lock().unwrap().push(data.clone());
        }

        fn table_load_failed(&self, err: &ModelError) {
            self.errors.lock().unwrap().push(err.to_string());
        }
    }

    fn setup() -> (TableModel, Arc<StaticAccessor>, Arc<Recorder>) {
        let acc = Arc::new(StaticAccessor::default());
        acc.set(vec![
            pod("ns1", "a", &[("app", "a")]),
            pod("ns1", "b", &[]),
            pod("ns2", "c", &[]),
        ]);
        let m = TableModel::new("pods", &registry("pods", acc.clone()), &ModelConfig::default())
            .unwrap();
        let rec = Arc::new(Recorder::default());
        m.add_listener(rec.clone());

        (m, acc, rec)
    }

    #[test]
    fn test_unknown_kind() {
        let reg = registry("pods", Arc::default());

        assert!(matches!(
            TableModel::new("nodes", &reg, &ModelConfig::default()),
            Err(ModelError::UnknownResource(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh() {
        let (m, acc, rec) = setup();
        m.set_namespace("ns1");
        assert!(!m.in_namespace("ns1"));

        m.refresh().await.unwrap();
        assert_eq!(m.row_count(), 2);
        assert!(m.in_namespace("ns1"));
        assert!(!m.cluster_wide());

        acc.set(vec![pod("ns1", "a", &[("app", "a")])]);
        m.refresh().await.unwrap();

        let tables = rec.tables.lock().unwrap();
        assert_eq!(tables.len(), 2);
        let last = tables.last().unwrap();
        assert_eq!(last.row_count(), 1);
        assert_eq!(last.row_at(0).unwrap().kind, ResEvent::Unchanged);
        assert_eq!(*last, m.peek());
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_failure_keeps_state() {
        let (m, acc, rec) = setup();
        m.refresh().await.unwrap();
        assert_eq!(m.row_count(), 3);

        acc.fail_with(Some("boom"));
        assert!(matches!(m.refresh().await, Err(ModelError::List { .. })));

        assert_eq!(m.row_count(), 3);
        assert_eq!(*rec.errors.lock().unwrap(), vec!["failed to list pods: boom"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_label_selector_reaches_accessor() {
        let (m, acc, _) = setup();
        m.set_label_selector("app=a");
        m.refresh().await.unwrap();

        assert_eq!(m.label_selector(), "app=a");
        assert_eq!(*acc.seen_labels.lock().unwrap(), vec!["app=a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_label_filter_form_is_stripped() {
        let (m, acc, _) = setup();
        m.set_label_selector("-l app=a");
        m.refresh().await.unwrap();
        m.set_label_selector("app=b");
        m.refresh().await.unwrap();

        assert_eq!(m.label_selector(), "app=b");
        assert_eq!(*acc.seen_labels.lock().unwrap(), vec!["app=a", "app=b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_instance() {
        let (m, _, _) = setup();
        m.set_instance("ns2/c");
        m.refresh().await.unwrap();

        assert_eq!(m.row_count(), 1);
        assert!(m.peek().find_row("ns2/c").is_some());

        m.set_instance("ns2/nope");
        assert!(m.refresh().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_removal() {
        let (m, _, rec) = setup();
        let other = Arc::new(Recorder::default());
        let sub = m.add_listener(other.clone());
        m.refresh().await.unwrap();
        assert!(m.remove_listener(sub));
        m.refresh().await.unwrap();

        assert_eq!(other.tables.lock().unwrap().len(), 1);
        assert_eq!(rec.tables.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch() {
        let (m, acc, rec) = setup();
        m.set_refresh_rate(Duration::from_secs(1));
        let cancel = CancellationToken::new();

        let handle = m.watch(cancel.clone()).await.unwrap();
        assert_eq!(rec.tables.lock().unwrap().len(), 1);

        acc.set(vec![]);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(m.is_empty());

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), LoopExit::Cancelled);
    }
}
