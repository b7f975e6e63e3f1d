//! Error types for odbx-io

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("cannot open result database {}: {source}", path.display())]
    DatabaseIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode result database {}: {source}", path.display())]
    DatabaseFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Step '{name}' not found. Available: {available:?}")]
    StepNotFound { name: String, available: Vec<String> },

    #[error("Step '{step}' has no frames")]
    NoFrames { step: String },

    #[error("Frame {index} out of range for step '{step}' ({count} frames)")]
    FrameOutOfRange {
        step: String,
        index: i64,
        count: usize,
    },

    #[error("Field '{field}' not present in frame {frame} of step '{step}'")]
    MissingField {
        field: String,
        step: String,
        frame: i32,
    },

    #[error("Could not get field '{field}' at INTEGRATION_POINT or ELEMENT_NODAL")]
    NoSupportedPosition { field: String },

    #[error("No instances found in rootAssembly")]
    NoInstances,

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExportError::Write {
            path: path.into(),
            source,
        }
    }
}
