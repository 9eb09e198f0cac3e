use thiserror::Error;

/// Error surfaced by external collaborators (accessors, renderers, describers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to render {kind}: {source}")]
    Render {
        kind: String,
        #[source]
        source: BoxError,
    },

    #[error("fail to list resource {0}: no columns produced")]
    NoColumns(String),

    #[error("unable to delete row with id: {0:?}")]
    RowNotFound(String),

    #[error("failed to list {kind}: {source}")]
    List {
        kind: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to describe {path}: {source}")]
    Describe {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid filter: {0}")]
    Filter(#[from] regex::Error),

    #[error("no describer for {0:?}")]
    NoDescriber(String),

    #[error("no resource meta registered for {0:?}")]
    UnknownResource(String),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
