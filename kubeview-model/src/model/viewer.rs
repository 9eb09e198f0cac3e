use std::sync::{Arc, PoisonError, RwLock};

use tracing::error;

use super::listeners::{Listeners, Subscription};
use crate::{
    error::ModelError,
    table::filter::{match_lines, LineMatch},
};

/// Observes a line-oriented view-model.
pub trait ResourceViewerListener: Send + Sync {
    fn resource_changed(&self, lines: &[String], matches: &[LineMatch]);
    fn resource_failed(&self, err: &ModelError);
}

#[derive(Debug, Default)]
struct Content {
    lines: Vec<String>,
    query: String,
}

/// Lines, filter query and listeners shared by the text viewers.
#[derive(Default)]
pub(crate) struct Viewer {
    content: RwLock<Content>,
    listeners: Listeners<dyn ResourceViewerListener>,
}

impl Viewer {
    pub(crate) fn add_listener(&self, l: Arc<dyn ResourceViewerListener>) -> Subscription {
        self.listeners.add(l)
    }

    pub(crate) fn remove_listener(&self, sub: Subscription) -> bool {
        self.listeners.remove(sub)
    }

    /// Stores `lines` and notifies listeners, unless nothing changed.
    pub(crate) fn set_lines(&self, lines: Vec<String>) -> bool {
        let query = {
            let mut c = self.content.write().unwrap_or_else(PoisonError::into_inner);
            if c.lines == lines {
                return false;
            }
            c.lines = lines.clone();
            c.query.clone()
        };
        self.fire_changed(&lines, &query);

        true
    }

    pub(crate) fn peek(&self) -> Vec<String> {
        self.content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lines
            .clone()
    }

    pub(crate) fn query(&self) -> String {
        self.content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .query
            .clone()
    }

    pub(crate) fn filter(&self, q: &str) {
        let lines = {
            let mut c = self.content.write().unwrap_or_else(PoisonError::into_inner);
            c.query = q.to_string();
            c.lines.clone()
        };
        self.fire_changed(&lines, q);
    }

    pub(crate) fn clear_filter(&self) {
        self.filter("");
    }

    pub(crate) fn notify_failed(&self, err: &ModelError) {
        self.listeners.notify(|l| l.resource_failed(err));
    }

    fn fire_changed(&self, lines: &[String], q: &str) {
        match match_lines(q, lines) {
            Ok(matches) => self.listeners.notify(|l| l.resource_changed(lines, &matches)),
            Err(err) => {
                error!(query = q, error = %err, "invalid filter");
                self.notify_failed(&ModelError::from(err));
            }
        }
    }
}
