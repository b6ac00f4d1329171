use std::io;
use std::path::PathBuf;

use boxlabel_core::decode::DecodeError;
use boxlabel_core::encode::{CompressError, EncodeError};
use boxlabel_core::label::LabelError;
use thiserror::Error;

/// Errors surfaced to the routing layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A folder or image name that would escape its directory.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Compress(#[from] CompressError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    /// `map_err` adapter attaching the path to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ServiceError::Io { path, source }
    }

    /// Whether the error means "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::NotFound(_) | ServiceError::Label(LabelError::BoxNotFound(_)) => true,
            ServiceError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
