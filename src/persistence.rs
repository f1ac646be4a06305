pub mod delta;
pub mod snapshot;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The only failures that abort a run.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed accessing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid snapshot '{path}': {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
