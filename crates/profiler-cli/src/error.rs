use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, #[source] source: std::io::Error },

    #[error("invalid ROM: {0}")]
    Rom(#[from] gb_core::CoreError),

    #[error("{0}")]
    Profiler(#[from] profiler_core::ProfilerError),

    #[error("malformed config file {path}: {source}")]
    ConfigToml { path: PathBuf, #[source] source: toml::de::Error },

    #[error("malformed input-event file {path}: {source}")]
    InputJson { path: PathBuf, #[source] source: serde_json::Error },

    #[error("failed to encode PNG for {path}: {source}")]
    Png { path: PathBuf, #[source] source: png::EncodingError },

    #[error("the two runs of --verify-determinism produced different traces")]
    NonDeterministic,
}
