//! View-models: live, listener-driven views over the cluster, each kept fresh
//! by a [`Refresher`].

pub mod backoff;
mod describe;
mod listeners;
mod refresher;
mod table;
mod tree;
mod viewer;
mod yaml;

pub use backoff::{Backoff, ExpBackoff};
pub use describe::DescribeModel;
pub use listeners::{Listeners, Subscription};
pub use refresher::{LoopExit, Refresh, Refreshable, Refresher};
pub use table::{TableListener, TableModel};
pub use tree::{build_tree, TreeListener, TreeModel, TreeNode};
pub use viewer::ResourceViewerListener;
pub use yaml::YamlModel;
