use peaceboard_shared::models::PeaceMap;
use peaceboard_shared::peace;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub struct Assets {
    pub peace_map: PeaceMap,
}

impl Assets {
    pub fn load(assets_dir: &Path) -> Result<Self, AssetError> {
        let path = assets_dir.join("peace-map.json");
        let data = std::fs::read_to_string(&path).map_err(|source| AssetError::Read {
            path: path.clone(),
            source,
        })?;
        let peace_map: PeaceMap =
            serde_json::from_str(&data).map_err(|source| AssetError::Parse { path, source })?;

        tracing::info!(countries = peace_map.len(), "Loaded peace map");

        Ok(Assets { peace_map })
    }

    /// Like [`Assets::load`], falling back to the built-in table.
    pub fn load_or_default(assets_dir: &Path) -> Self {
        Self::load(assets_dir).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using built-in peace map");
            Assets {
                peace_map: peace::default_peace_map(),
            }
        })
    }
}
