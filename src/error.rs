/// Errors raised while loading a level.
///
/// Only loading can fail. Runtime queries answer with `None` or a sentinel.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} has no map rows", path.display())]
    EmptyMap { path: PathBuf },

    #[error("tile size must be positive, got {0}")]
    InvalidTileSize(f32),
}
