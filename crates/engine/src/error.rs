use std::path::PathBuf;
use thiserror::Error;

/// Typed engine failures, carried inside `anyhow::Error`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was opened on a directory that does not exist. Fatal to
    /// construction: the engine never creates its own data root.
    #[error("data root {0} does not exist")]
    DataRootMissing(PathBuf),
}
