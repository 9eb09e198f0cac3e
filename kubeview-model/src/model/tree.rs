use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use futures::future::BoxFuture;
use kube::api::{DynamicObject, ResourceExt};
use regex::Regex;
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
    registry::Registry,
    render::Accessor,
    scope,
    table::filter::compile,
};

/// Observes a tree view-model.
pub trait TreeListener: Send + Sync {
    fn tree_changed(&self, root: &TreeNode);
    fn tree_load_failed(&self, err: &ModelError);
}

/// One node of the resource tree. Ids are resource paths (`ns/name`),
/// namespace nodes use the bare namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, self included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }

    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    fn sort(&mut self) {
        self.children.sort_by(|a, b| a.id.cmp(&b.id));
        self.children.iter_mut().for_each(TreeNode::sort);
    }

    /// Keeps the nodes whose id matches, along with their ancestors. The
    /// root always stays.
    pub fn filter(&self, rx: &Regex) -> TreeNode {
        TreeNode {
            children: self.children.iter().filter_map(|c| c.prune(rx)).collect(),
            ..TreeNode::new(self.id.as_str(), self.kind.as_str(), self.name.as_str())
        }
    }

    fn prune(&self, rx: &Regex) -> Option<TreeNode> {
        if rx.is_match(&self.id) {
            return Some(self.clone());
        }
        let children: Vec<TreeNode> = self.children.iter().filter_map(|c| c.prune(rx)).collect();
        (!children.is_empty()).then(|| TreeNode {
            children,
            ..TreeNode::new(self.id.as_str(), self.kind.as_str(), self.name.as_str())
        })
    }
}

/// Builds the tree for `objects`: namespaces under the root, owned objects
/// under their owners. Cluster-scoped objects hang off the root.
pub fn build_tree(kind: &str, objects: &[DynamicObject]) -> TreeNode {
    let by_uid: HashMap<&str, usize> = objects
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.metadata.uid.as_deref().map(|uid| (uid, i)))
        .collect();

    let mut owned: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut tops: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, o) in objects.iter().enumerate() {
        let owner = o
            .owner_references()
            .iter()
            .find_map(|r| by_uid.get(r.uid.as_str()).copied())
            .filter(|&owner| owner != i);
        match owner {
            Some(owner) => owned.entry(owner).or_default().push(i),
            None => tops
                .entry(o.namespace().unwrap_or_default())
                .or_default()
                .push(i),
        }
    }

    let mut seen = HashSet::new();
    let mut root = TreeNode::new(kind, kind, kind);
    for (ns, idxs) in tops {
        let nodes = idxs
            .into_iter()
            .map(|i| object_node(kind, objects, i, &owned, &mut seen));
        if ns.is_empty() {
            root.children.extend(nodes);
        } else {
            let mut ns_node = TreeNode::new(ns.as_str(), "Namespace", ns.as_str());
            ns_node.children.extend(nodes);
            root.children.push(ns_node);
        }
    }
    root.sort();

    root
}

fn object_node(
    kind: &str,
    objects: &[DynamicObject],
    i: usize,
    owned: &HashMap<usize, Vec<usize>>,
    seen: &mut HashSet<usize>,
) -> TreeNode {
    let o = &objects[i];
    let name = o.name_any();
    let mut node = TreeNode::new(
        scope::fqn(o.metadata.namespace.as_deref().unwrap_or_default(), &name),
        o.types.as_ref().map_or(kind, |t| t.kind.as_str()),
        name,
    );
    if !seen.insert(i) {
        return node;
    }
    for &c in owned.get(&i).into_iter().flatten() {
        if !seen.contains(&c) {
            node.children.push(object_node(kind, objects, c, owned, seen));
        }
    }

    node
}

#[derive(Debug, Default)]
struct TreeState {
    query: String,
    raw: TreeNode,
    shown: Option<TreeNode>,
}

struct Tree {
    kind: String,
    accessor: Arc<dyn Accessor>,
    namespace: RwLock<String>,
    state: RwLock<TreeState>,
    listeners: Listeners<dyn TreeListener>,
}

impl Tree {
    /// Recomputes the visible tree and notifies listeners when it moved.
    fn publish(&self, raw: Option<TreeNode>) -> Result<()> {
        let shown = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(raw) = raw {
                state.raw = raw;
            }
            let shown = if state.query.is_empty() {
                state.raw.clone()
            } else {
                state.raw.filter(&compile(&state.query)?)
            };
            if state.shown.as_ref() == Some(&shown) {
                return Ok(());
            }
            state.shown = Some(shown.clone());
            shown
        };
        debug!(kind = %self.kind, nodes = shown.count(), "tree changed");
        self.listeners.notify(|l| l.tree_changed(&shown));

        Ok(())
    }
}

impl Refreshable for Tree {
    fn name(&self) -> &str {
        &self.kind
    }

    fn reconcile(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let ns = self
                .namespace
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            let objects = self
                .accessor
                .list(&ns, "")
                .await
                .map_err(|source| ModelError::List {
                    kind: self.kind.clone(),
                    source,
                })?;
            self.publish(Some(build_tree(&self.kind, &objects)))
        })
    }

    fn notify_failed(&self, err: &ModelError) {
        self.listeners.notify(|l| l.tree_load_failed(err));
    }
}

/// Live ownership tree of one resource kind.
#[derive(Clone)]
pub struct TreeModel {
    refresher: Refresher<Tree>,
}

impl TreeModel {
    pub fn new(kind: impl Into<String>, registry: &Registry, cfg: &ModelConfig) -> Result<Self> {
        let kind = kind.into();
        let tree = Tree {
            accessor: registry.meta(&kind)?.accessor.clone(),
            kind,
            namespace: RwLock::default(),
            state: RwLock::default(),
            listeners: Listeners::new(),
        };

        Ok(Self {
            refresher: Refresher::new(Arc::new(tree), cfg),
        })
    }

    fn tree(&self) -> &Tree {
        self.refresher.model()
    }

    pub fn add_listener(&self, l: Arc<dyn TreeListener>) -> Subscription {
        self.tree().listeners.add(l)
    }

    pub fn remove_listener(&self, sub: Subscription) -> bool {
        self.tree().listeners.remove(sub)
    }

    pub fn set_namespace(&self, ns: impl Into<String>) {
        *self
            .tree()
            .namespace
            .write()
            .unwrap_or_else(PoisonError::into_inner) = ns.into();
    }

    pub fn namespace(&self) -> String {
        self.tree()
            .namespace
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Narrows the tree to nodes whose path matches `q`, case-insensitively.
    /// An empty query shows everything.
    pub fn filter(&self, q: &str) -> Result<()> {
        if !q.is_empty() {
            compile(q)?;
        }
        self.tree()
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .query = q.to_string();
        self.tree().publish(None)
    }

    pub fn clear_filter(&self) -> Result<()> {
        self.filter("")
    }

    /// The tree as last shown to listeners.
    pub fn peek(&self) -> TreeNode {
        self.tree()
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .shown
            .clone()
            .unwrap_or_default()
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
