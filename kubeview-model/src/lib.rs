//! View-model core of a terminal cluster browser.
//!
//! Listings are rendered into identity-tracked tables ([`table::TableData`])
//! whose row events tell the UI what was added, updated or left alone. The
//! [`model`] view-models keep tables, descriptions, manifests and ownership
//! trees fresh in the background and report to registered listeners.

pub mod config;
pub mod error;
pub mod log;
pub mod model;
pub mod registry;
pub mod render;
pub mod scope;
pub mod table;

pub use config::{BackoffConfig, ModelConfig, ViewSetting};
pub use error::{BoxError, ModelError, Result};
pub use log::setup_logger;
pub use registry::{Registry, ResourceMeta};
pub use render::{Accessor, Describer, GenericRenderer, KubeAccessor, Renderer};
