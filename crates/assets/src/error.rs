use std::path::PathBuf;

use tessera_common::AssetHandle;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("expected asset type {expected:?}, found {found:?}")]
    WrongAssetType {
        expected: &'static str,
        found: Option<String>,
    },
    #[error("malformed asset: {0}")]
    Malformed(String),
    #[error("unknown tile source type {0}")]
    UnknownSourceType(i64),
    #[error("tile id 0 is reserved for empty cells")]
    ReservedTileId,
    #[error("tile set has no free tile ids left")]
    TileIdsExhausted,
    #[error("asset not found: {0}")]
    NotFound(AssetHandle),
    #[error("asset {0} has no source path")]
    NoSourcePath(AssetHandle),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
