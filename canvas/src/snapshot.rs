//! Document snapshots: capture, import/export, storage, and restore.
//!
//! A snapshot is transport-neutral JSON:
//!
//! ```json
//! { "version": 1, "name": "Plant room", "savedAt": 1760000000000, "sceneJson": { "objects": [] } }
//! ```
//!
//! `sceneJson` is whatever the scene engine's `serialize` produced; on import
//! it may also arrive as a string holding that JSON. Restoring clears the
//! scene, loads the objects, and reconciles them:
//!
//! - the page and the background are always locked, icons never are;
//! - icon angles are normalized into `[0, 360)`;
//! - extra backgrounds beyond the topmost one are dropped;
//! - inline data-URL images are registered with the asset library.
//!
//! A scene that does not hold exactly one page region is rejected and the
//! previous scene is put back.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::assets::{AssetLibrary, is_data_url};
use crate::consts::SNAPSHOT_VERSION;
use crate::doc::{ObjectId, ObjectKind, SceneObject, normalize_degrees};
use crate::error::{CanvasError, Result};
use crate::scene::{SceneEngine, ids_of_kind, page_object};

/// A named, timestamped copy of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDocumentSnapshot {
    pub version: i64,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub saved_at: i64,
    #[serde(deserialize_with = "scene_from_value_or_string")]
    pub scene_json: Value,
}

fn scene_from_value_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Value, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(raw) => serde_json::from_str(&raw).map_err(serde::de::Error::custom),
        other => Ok(other),
    }
}

impl SavedDocumentSnapshot {
    /// Parse an imported snapshot document.
    ///
    /// # Errors
    ///
    /// [`CanvasError::InvalidSnapshot`] for malformed JSON or a missing
    /// version, [`CanvasError::UnsupportedVersion`] for any version other than
    /// the current one.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|e| CanvasError::InvalidSnapshot(e.to_string()))?;
        let version = value
            .get("version")
            .and_then(Value::as_i64)
            .ok_or_else(|| CanvasError::InvalidSnapshot("missing integer \"version\"".into()))?;
        check_version(version)?;
        Self::deserialize(value).map_err(|e| CanvasError::InvalidSnapshot(e.to_string()))
    }

    /// Pretty-printed JSON for export.
    ///
    /// # Errors
    ///
    /// [`CanvasError::InvalidSnapshot`] if the scene value cannot be printed.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CanvasError::InvalidSnapshot(e.to_string()))
    }
}

fn check_version(found: i64) -> Result<()> {
    if found == SNAPSHOT_VERSION {
        Ok(())
    } else {
        Err(CanvasError::UnsupportedVersion { found, expected: SNAPSHOT_VERSION })
    }
}

/// Ordered snapshot storage, most recent first.
pub trait SnapshotStore {
    /// Insert `snapshot` at the front of the list.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Store`] if the backing storage fails.
    fn append(&mut self, snapshot: SavedDocumentSnapshot) -> Result<()>;

    /// Every stored snapshot, most recent first.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Store`] if the backing storage fails.
    fn list(&self) -> Result<Vec<SavedDocumentSnapshot>>;

    /// The snapshot at `index` in [`SnapshotStore::list`] order.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Store`] if the backing storage fails.
    fn get(&self, index: usize) -> Result<Option<SavedDocumentSnapshot>> {
        Ok(self.list()?.into_iter().nth(index))
    }

    /// Remove the snapshot at `index`, returning it. Out-of-range is `None`.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Store`] if the backing storage fails.
    fn delete(&mut self, index: usize) -> Result<Option<SavedDocumentSnapshot>>;
}

/// Volatile [`SnapshotStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<SavedDocumentSnapshot>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn append(&mut self, snapshot: SavedDocumentSnapshot) -> Result<()> {
        self.entries.insert(0, snapshot);
        Ok(())
    }

    fn list(&self) -> Result<Vec<SavedDocumentSnapshot>> {
        Ok(self.entries.clone())
    }

    fn get(&self, index: usize) -> Result<Option<SavedDocumentSnapshot>> {
        Ok(self.entries.get(index).cloned())
    }

    fn delete(&mut self, index: usize) -> Result<Option<SavedDocumentSnapshot>> {
        if index < self.entries.len() { Ok(Some(self.entries.remove(index))) } else { Ok(None) }
    }
}

/// What reconciliation changed during a restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Objects present after the restore.
    pub objects: usize,
    /// Page/background objects that arrived unlocked.
    pub relocked: usize,
    /// Icons that arrived locked.
    pub unlocked: usize,
    /// Icons whose angle was outside `[0, 360)`.
    pub angles_normalized: usize,
    /// Backgrounds removed because another one sat above them.
    pub backgrounds_dropped: usize,
}

impl Reconciliation {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.relocked + self.unlocked + self.angles_normalized + self.backgrounds_dropped > 0
    }
}

/// Capture the scene as a snapshot.
///
/// # Errors
///
/// Propagates the scene's serialization error.
pub fn capture<S: SceneEngine + ?Sized>(scene: &S, name: &str, saved_at: i64) -> Result<SavedDocumentSnapshot> {
    Ok(SavedDocumentSnapshot {
        version: SNAPSHOT_VERSION,
        name: name.to_owned(),
        saved_at,
        scene_json: scene.serialize()?,
    })
}

/// Replace the scene's contents with `snapshot` and reconcile.
///
/// On failure the scene holds exactly what it held before the call.
///
/// # Errors
///
/// [`CanvasError::UnsupportedVersion`] for a foreign version,
/// [`CanvasError::InvalidImage`] for an undecodable inline image, and
/// [`CanvasError::InvalidSnapshot`] for anything else wrong with the scene,
/// including a page-region count other than one.
pub fn restore_into<S: SceneEngine + ?Sized>(
    scene: &mut S,
    assets: &mut AssetLibrary,
    snapshot: &SavedDocumentSnapshot,
) -> Result<Reconciliation> {
    check_version(snapshot.version)?;
    let backup = scene.serialize()?;
    scene.clear();
    let mut registered = Vec::new();
    match load_and_reconcile(scene, assets, &snapshot.scene_json, &mut registered) {
        Ok(report) => {
            scene.request_render();
            Ok(report)
        }
        Err(err) => {
            for key in &registered {
                assets.remove(key);
            }
            scene.clear();
            if let Err(rollback) = scene.deserialize(&backup) {
                tracing::error!(error = %rollback, "failed to roll back scene after rejected restore");
            }
            Err(err)
        }
    }
}

/// Inline images added to `assets` are recorded in `registered` so a failed
/// restore can take them back out.
fn load_and_reconcile<S: SceneEngine + ?Sized>(
    scene: &mut S,
    assets: &mut AssetLibrary,
    scene_json: &Value,
    registered: &mut Vec<String>,
) -> Result<Reconciliation> {
    scene.deserialize(scene_json)?;
    page_object(scene).map_err(|e| CanvasError::InvalidSnapshot(e.to_string()))?;

    let mut report = Reconciliation::default();

    // Draw order is bottom first, so the last background is the visible one.
    let mut backgrounds = ids_of_kind(scene, ObjectKind::Background);
    backgrounds.pop();
    for id in &backgrounds {
        scene.remove_object(id);
        report.backgrounds_dropped += 1;
    }

    let fixes: Vec<(ObjectId, ObjectKind, bool, f64, Option<String>)> = scene
        .objects()
        .into_iter()
        .map(|o| (o.id, o.kind, o.locked, o.angle, o.src.clone()))
        .collect();
    report.objects = fixes.len();

    for (id, kind, locked, angle, src) in fixes {
        let want_locked = kind.is_protected();
        if locked != want_locked {
            scene.set_object_locked(&id, want_locked);
            if want_locked {
                report.relocked += 1;
            } else {
                report.unlocked += 1;
            }
        }
        let normalized = normalize_degrees(angle);
        if normalized.to_bits() != angle.to_bits() {
            if let Some(mut transform) = scene.object(&id).map(SceneObject::transform) {
                transform.angle = normalized;
                scene.set_object_transform(&id, transform);
                report.angles_normalized += 1;
            }
        }
        if let Some(src) = src.filter(|s| is_data_url(s) && !assets.contains(s)) {
            assets.register_data_url(&src)?;
            registered.push(src);
        }
    }
    Ok(report)
}
