use std::path::PathBuf;

use canvas::error::CanvasError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("no snapshot at index {0}")]
    NoSuchSnapshot(usize),
    #[error("cannot tell the export format of {}; pass --format", .0.display())]
    UnknownFormat(PathBuf),
    #[error("asset key {0:?} must be a relative path inside the asset directory")]
    AssetOutsideDirectory(String),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
