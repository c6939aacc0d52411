//! Error types for tree edits and schema export.
use std::path::PathBuf;

use thiserror::Error;

use crate::path::FieldPath;

pub type Result<T> = std::result::Result<T, EditError>;

/// Why a single edit was refused. A refused edit never mutates the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no field at path {path}")]
    PathNotFound { path: FieldPath },

    #[error("invalid operation at path {path}: {reason}")]
    InvalidOperation { path: FieldPath, reason: String },
}

impl EditError {
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::PathNotFound { path } | Self::InvalidOperation { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
