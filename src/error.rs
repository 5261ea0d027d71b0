use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a run. Every one of them is reported as the `error`
/// outcome; none of them leaves a partially written dataset behind.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("dataset '{}' is not a JSON array of activities: {source}", path.display())]
    DatasetFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("event payload '{}' is not valid JSON: {source}", path.display())]
    EventFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema '{}' is not valid JSON: {source}", path.display())]
    SchemaFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema '{}' cannot be compiled: {reason}", path.display())]
    SchemaCompile { path: PathBuf, reason: String },
    #[error("cannot encode dataset: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("cannot write run results to '{}': {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl IntakeError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        IntakeError::Io {
            path: path.into(),
            source,
        }
    }
}
