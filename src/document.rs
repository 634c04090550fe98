//! The working document: an engine restored from a snapshot file on disk.
//!
//! Every command opens the document, applies one change and writes it back,
//! so the file on disk is always a valid importable snapshot.

#[cfg(test)]
#[path = "document_test.rs"]
mod document_test;

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use canvas::assets::{RasterImage, is_data_url};
use canvas::config::CanvasConfig;
use canvas::doc::ObjectKind;
use canvas::engine::EngineCore;
use canvas::scene::SceneEngine;
use canvas::snapshot::SavedDocumentSnapshot;
use tracing::{debug, info, warn};

use crate::error::CliError;

/// Built-in defaults overlaid with the JSON file at `path`, if any.
///
/// # Errors
///
/// I/O failures and any [`canvas::error::CanvasError::InvalidConfig`].
pub fn load_config(path: Option<&Path>) -> Result<CanvasConfig, CliError> {
    let Some(path) = path else {
        return Ok(CanvasConfig::default());
    };
    let raw = fs::read_to_string(path).map_err(CliError::io(path))?;
    let config = CanvasConfig::from_json(&raw)?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

pub struct Document {
    pub name: String,
    pub core: EngineCore,
}

impl Document {
    /// A document holding only the page region.
    ///
    /// # Errors
    ///
    /// [`canvas::error::CanvasError::InvalidConfig`] for a bad config.
    pub fn create(name: &str, config: CanvasConfig) -> Result<Self, CliError> {
        Ok(Self { name: name.to_owned(), core: EngineCore::with_config(config)? })
    }

    /// Restore the snapshot file at `path`, resolving icon assets against
    /// `assets`.
    ///
    /// # Errors
    ///
    /// I/O failures and the import errors of the engine.
    pub fn open(path: &Path, config: CanvasConfig, assets: Option<&Path>) -> Result<Self, CliError> {
        let raw = fs::read_to_string(path).map_err(CliError::io(path))?;
        Self::from_snapshot(&SavedDocumentSnapshot::from_json(&raw)?, config, assets)
    }

    /// # Errors
    ///
    /// As [`EngineCore::restore`], plus asset read failures.
    pub fn from_snapshot(
        snapshot: &SavedDocumentSnapshot,
        config: CanvasConfig,
        assets: Option<&Path>,
    ) -> Result<Self, CliError> {
        let mut core = EngineCore::with_config(config)?;
        let report = core.restore(snapshot)?;
        if report.changed() {
            info!(name = %snapshot.name, "document was reconciled on load");
        }
        let mut doc = Self { name: snapshot.name.clone(), core };
        if let Some(dir) = assets {
            doc.load_icon_assets(dir)?;
        }
        Ok(doc)
    }

    /// Register every icon asset the scene references that is not yet known.
    /// Missing files are left unresolved and render as placeholders.
    ///
    /// # Errors
    ///
    /// Unreadable or undecodable asset files.
    pub fn load_icon_assets(&mut self, dir: &Path) -> Result<usize, CliError> {
        let keys: Vec<String> = self
            .core
            .scene
            .objects()
            .into_iter()
            .filter(|o| o.kind == ObjectKind::Icon)
            .filter_map(|o| o.src.clone())
            .filter(|src| !is_data_url(src))
            .collect();

        let mut loaded = 0;
        for key in keys {
            if self.core.assets.contains(&key) {
                continue;
            }
            let path = asset_path(dir, &key)?;
            if !path.is_file() {
                warn!(key, path = %path.display(), "icon asset not found");
                continue;
            }
            self.register_asset_file(&key, &path)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Decode the image at `path` and register it under `key`.
    ///
    /// # Errors
    ///
    /// I/O failures and [`canvas::error::CanvasError::InvalidImage`].
    pub fn register_asset_file(&mut self, key: &str, path: &Path) -> Result<(), CliError> {
        let bytes = fs::read(path).map_err(CliError::io(path))?;
        let raster = RasterImage::decode(&bytes)?;
        debug!(key, width = raster.width(), height = raster.height(), "asset registered");
        self.core.register_asset(key, raster);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<SavedDocumentSnapshot, CliError> {
        Ok(self.core.snapshot(&self.name, now_ms())?)
    }

    /// Write the document to `path` as an importable snapshot.
    ///
    /// # Errors
    ///
    /// Serialization and I/O failures.
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        let rendered = self.snapshot()?.to_json()?;
        fs::write(path, rendered).map_err(CliError::io(path))?;
        info!(path = %path.display(), name = %self.name, "document saved");
        Ok(())
    }
}

/// `dir/key`, refusing keys that would escape `dir`.
///
/// # Errors
///
/// [`CliError::AssetOutsideDirectory`] for absolute keys or `..` components.
pub fn asset_path(dir: &Path, key: &str) -> Result<PathBuf, CliError> {
    let relative = Path::new(key);
    let inside = relative.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if key.is_empty() || !inside {
        return Err(CliError::AssetOutsideDirectory(key.to_owned()));
    }
    Ok(dir.join(relative))
}

pub fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}
