//! Namespace scope conventions shared by every view-model.
//!
//! A scope is a plain string: `""` or `"all"` spans every namespace, `"-"`
//! marks a cluster-scoped resource, anything else names one namespace.

pub const NAMESPACE_ALL: &str = "all";
pub const BLANK_NAMESPACE: &str = "";
pub const CLUSTER_SCOPE: &str = "-";

pub fn is_all_namespace(ns: &str) -> bool {
    ns == NAMESPACE_ALL
}

pub fn is_all_namespaces(ns: &str) -> bool {
    ns == NAMESPACE_ALL || ns == BLANK_NAMESPACE
}

pub fn is_cluster_scoped(ns: &str) -> bool {
    ns == CLUSTER_SCOPE
}

pub fn is_cluster_wide(ns: &str) -> bool {
    is_cluster_scoped(ns) || is_all_namespaces(ns)
}

/// True when the scope names exactly one namespace.
pub fn is_namespaced(ns: &str) -> bool {
    !is_all_namespaces(ns) && !is_cluster_scoped(ns)
}

/// Normalizes the scope handed to an accessor.
pub fn cleanse_namespace(ns: &str) -> &str {
    if is_all_namespace(ns) || is_cluster_scoped(ns) {
        BLANK_NAMESPACE
    } else {
        ns
    }
}

/// Splits a resource path (`ns/name` or `name`) into namespace and name.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.split_once('/') {
        Some((ns, name)) => (ns, name),
        None => (BLANK_NAMESPACE, path),
    }
}

/// Joins a namespace and a name into a resource path.
pub fn fqn(ns: &str, name: &str) -> String {
    if ns.is_empty() {
        name.to_string()
    } else {
        format!("{ns}/{name}")
    }
}
