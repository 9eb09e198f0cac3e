//! Boundary with the outside world: listing objects, turning them into rows
//! and describing them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use kube::{
    api::{Api, ApiResource, DynamicObject, ListParams, ResourceExt},
    Client,
};
use tracing::{debug, debug_span, Instrument};

use crate::{
    error::BoxError,
    scope,
    table::{Header, HeaderColumn, Row, AGE_COL, LABELS_COL, NAMESPACE_COL, NAME_COL},
};

/// Turns a domain object into table text for one resource kind.
pub trait Renderer: Send + Sync {
    /// Column schema for the given scope.
    fn header(&self, ns: &str) -> Header;

    /// Fills `row`, pre-sized to the header, with the object's values.
    fn render(&self, obj: &DynamicObject, ns: &str, row: &mut Row) -> Result<(), BoxError>;
}

/// Fetches domain objects for a scope.
pub trait Accessor: Send + Sync {
    fn list<'a>(
        &'a self,
        ns: &'a str,
        labels: &'a str,
    ) -> BoxFuture<'a, Result<Vec<DynamicObject>, BoxError>>;

    /// Fetches a single object by path (`ns/name` or `name`).
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<DynamicObject, BoxError>>;
}

/// Produces a human readable description of a single object.
pub trait Describer: Send + Sync {
    fn describe<'a>(&'a self, path: &'a str, decode: bool) -> BoxFuture<'a, Result<String, BoxError>>;
}

/// Compact age of a timestamp, e.g. `2y12d`, `3d4h`, `5m12s`.
pub fn to_age(ts: &DateTime<Utc>) -> String {
    let total_secs = Utc::now().signed_duration_since(*ts).num_seconds().max(0);
    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if days > 365 {
        format!("{}y{}d", days / 365, days % 365)
    } else if days > 7 {
        format!("{}d", days)
    } else if days > 0 {
        format!("{}d{}h", days, hours)
    } else if hours > 0 {
        format!("{}h{}m", hours, mins)
    } else if mins > 0 {
        format!("{}m{}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Serializes a label set the way the LABELS column expects it.
pub fn join_labels(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders any object from its metadata alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericRenderer;

impl Renderer for GenericRenderer {
    fn header(&self, _ns: &str) -> Header {
        Header(vec![
            HeaderColumn::new(NAMESPACE_COL),
            HeaderColumn::new(NAME_COL),
            HeaderColumn::wide(LABELS_COL),
            HeaderColumn {
                time: true,
                ..HeaderColumn::new(AGE_COL)
            },
        ])
    }

    fn render(&self, obj: &DynamicObject, _ns: &str, row: &mut Row) -> Result<(), BoxError> {
        let name = obj.metadata.name.as_deref().ok_or("object has no name")?;
        let ns = obj.metadata.namespace.as_deref().unwrap_or_default();

        row.id = scope::fqn(ns, name);
        row.fields = vec![
            ns.to_string(),
            name.to_string(),
            join_labels(obj.labels()),
            obj.metadata
                .creation_timestamp
                .as_ref()
                .map(|ts| to_age(&ts.0))
                .unwrap_or_default(),
        ];

        Ok(())
    }
}

/// Lists and describes objects of one kind through the cluster API.
#[derive(Clone)]
pub struct KubeAccessor {
    client: Client,
    ar: ApiResource,
    namespaced: bool,
}

impl KubeAccessor {
    pub fn new(client: Client, ar: ApiResource, namespaced: bool) -> Self {
        Self {
            client,
            ar,
            namespaced,
        }
    }

    fn api(&self, ns: &str) -> Api<DynamicObject> {
        let ns = scope::cleanse_namespace(ns);
        if self.namespaced && !ns.is_empty() {
            Api::namespaced_with(self.client.clone(), ns, &self.ar)
        } else {
            Api::all_with(self.client.clone(), &self.ar)
        }
    }

    /// Returns the object as stored, `managedFields` included.
    async fn fetch(&self, path: &str) -> Result<DynamicObject, BoxError> {
        let (ns, name) = scope::split_path(path);
        Ok(self.api(ns).get(name).await?)
    }
}

impl Accessor for KubeAccessor {
    fn list<'a>(
        &'a self,
        ns: &'a str,
        labels: &'a str,
    ) -> BoxFuture<'a, Result<Vec<DynamicObject>, BoxError>> {
        Box::pin(async move {
            let mut lp = ListParams::default();
            if !labels.is_empty() {
                lp = lp.labels(labels);
            }
            let mut list = self.api(ns).list(&lp).await?;
            for obj in &mut list.items {
                obj.managed_fields_mut().clear();
            }
            debug!(count = list.items.len(), "listed");

            Ok(list.items)
        }
        .instrument(debug_span!("list", kind = %self.ar.kind, ns, labels)))
    }

    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<DynamicObject, BoxError>> {
        Box::pin(self.fetch(path))
    }
}

impl Describer for KubeAccessor {
    fn describe<'a>(&'a self, path: &'a str, decode: bool) -> BoxFuture<'a, Result<String, BoxError>> {
        Box::pin(async move {
            let obj = self.fetch(path).await?;
            describe_object(&self.ar.kind, &obj, decode)
        })
    }
}

/// Text description of an object: identity, labels and annotations, then
/// the remaining content as YAML. With `decode`, base64 `data` entries are
/// shown decoded.
pub fn describe_object(kind: &str, obj: &DynamicObject, decode: bool) -> Result<String, BoxError> {
    let mut out = Vec::new();
    out.push(format!("Name:         {}", obj.name_any()));
    if let Some(ns) = obj.metadata.namespace.as_deref() {
        out.push(format!("Namespace:    {ns}"));
    }
    out.push(format!("Kind:         {kind}"));
    push_map(&mut out, "Labels:", obj.labels());
    push_map(&mut out, "Annotations:", obj.annotations());
    if let Some(ts) = obj.metadata.creation_timestamp.as_ref() {
        out.push(format!("Created:      {} ({})", ts.0.to_rfc3339(), to_age(&ts.0)));
    }

    let mut data = obj.data.clone();
    if decode {
        decode_data(&mut data);
    }
    if data.as_object().is_some_and(|m| !m.is_empty()) {
        out.push(String::new());
        out.push(serde_yaml::to_string(&data)?.trim_end().to_string());
    }

    Ok(out.join("\n"))
}

fn push_map(out: &mut Vec<String>, title: &str, kv: &BTreeMap<String, String>) {
    if kv.is_empty() {
        out.push(format!("{title:<14}<none>"));
        return;
    }
    for (i, (k, v)) in kv.iter().enumerate() {
        let title = if i == 0 { title } else { "" };
        out.push(format!("{title:<14}{k}={v}"));
    }
}

fn decode_data(data: &mut k8s_openapi::serde_json::Value) {
    use k8s_openapi::{serde_json, ByteString};

    let Some(serde_json::Value::Object(entries)) = data.get_mut("data") else {
        return;
    };
    for v in entries.values_mut() {
        if let Ok(ByteString(bytes)) = serde_json::from_value::<ByteString>(v.clone()) {
            *v = serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned());
        }
    }
}
