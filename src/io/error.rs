use crate::error::Error as ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse topology document: {0}")]
    Deserialize(#[from] toml::de::Error),

    #[error("failed to serialize topology document: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An entry of the document refers to something that does not exist or
    /// is ambiguous.
    #[error("{item}: {details}")]
    Resolve { item: String, details: String },

    /// An entry is well-formed but violates a model invariant.
    #[error("invalid {item}: {source}")]
    Model {
        item: String,
        #[source]
        source: ModelError,
    },
}

impl Error {
    pub fn resolve(item: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Resolve {
            item: item.into(),
            details: details.into(),
        }
    }

    pub fn model(item: impl Into<String>, source: impl Into<ModelError>) -> Self {
        Self::Model {
            item: item.into(),
            source: source.into(),
        }
    }
}
