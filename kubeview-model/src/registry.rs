use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    error::{ModelError, Result},
    render::{Accessor, Describer, Renderer},
};

/// The collaborators backing one resource kind.
#[derive(Clone)]
pub struct ResourceMeta {
    pub accessor: Arc<dyn Accessor>,
    pub renderer: Arc<dyn Renderer>,
    pub describer: Option<Arc<dyn Describer>>,
}

impl ResourceMeta {
    pub fn new(accessor: Arc<dyn Accessor>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            accessor,
            renderer,
            describer: None,
        }
    }

    pub fn with_describer(mut self, describer: Arc<dyn Describer>) -> Self {
        self.describer = Some(describer);
        self
    }
}

impl fmt::Debug for ResourceMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceMeta")
            .field("describer", &self.describer.is_some())
            .finish_non_exhaustive()
    }
}

/// Kind name to collaborators. Built once at startup and handed to every
/// view-model.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    metas: HashMap<String, ResourceMeta>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `meta` for `kind`, replacing any previous entry.
    pub fn register(&mut self, kind: impl Into<String>, meta: ResourceMeta) -> &mut Self {
        self.metas.insert(kind.into(), meta);
        self
    }

    pub fn meta(&self, kind: &str) -> Result<&ResourceMeta> {
        self.metas
            .get(kind)
            .ok_or_else(|| ModelError::UnknownResource(kind.to_string()))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.metas.keys().map(String::as_str)
    }
}
