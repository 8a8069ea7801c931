use std::path::PathBuf;

use library_core::ConfigError;
use thiserror::Error;

/// Errors raised while loading configs, running batches, or exporting results.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("invalid simulation config: {0}")]
    Config(#[from] ConfigError),

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("no results to export")]
    EmptyResults,
}
