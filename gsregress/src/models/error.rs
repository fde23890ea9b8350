use gsrunner::models::batch::BatchError;
use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Unable to create output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to resolve path {path:?}: {source}")]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Upscale multiplier must be a positive number, got {0}")]
    InvalidUpscale(f64),
    #[error("Too many parallel batches requested: {0}")]
    TooManyBatches(i64),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("Unable to write run plan: {0}")]
    Plan(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}
