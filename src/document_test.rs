#![allow(clippy::float_cmp)]

use canvas::camera::Point;
use canvas::export::encode_png;
use canvas::scene::ids_of_kind;

use super::*;

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let bytes = encode_png(&RasterImage::filled(width, height, [200, 40, 40, 255]).unwrap()).unwrap();
    fs::write(&path, bytes).unwrap();
    path
}

// =============================================================
// Configuration
// =============================================================

#[test]
fn no_config_file_means_defaults() {
    assert_eq!(load_config(None).unwrap(), CanvasConfig::default());
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "jpeg_quality": 0.5, "zoom": { "min": 0.5, "max": 4.0 } }"#).unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert!((config.jpeg_quality - 0.5).abs() < f64::EPSILON);
    assert!((config.zoom.max - 4.0).abs() < f64::EPSILON);
    assert_eq!(config.page_width, CanvasConfig::default().page_width);
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "zoom": { "min": 4.0, "max": 1.0 } }"#).unwrap();
    assert!(matches!(load_config(Some(&path)), Err(CliError::Canvas(_))));
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(load_config(Some(&dir.path().join("absent.json"))), Err(CliError::Io { .. })));
}

// =============================================================
// Save / open
// =============================================================

#[test]
fn saved_document_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.json");

    let doc = Document::create("Plant room", CanvasConfig::default()).unwrap();
    doc.save(&path).unwrap();

    let reopened = Document::open(&path, CanvasConfig::default(), None).unwrap();
    assert_eq!(reopened.name, "Plant room");
    assert_eq!(ids_of_kind(&reopened.core.scene, ObjectKind::Page).len(), 1);
}

#[test]
fn saved_file_is_importable_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.json");
    Document::create("a", CanvasConfig::default()).unwrap().save(&path).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    let snap = SavedDocumentSnapshot::from_json(&raw).unwrap();
    assert_eq!(snap.version, 1);
    assert!(snap.saved_at > 0);
}

#[test]
fn open_rejects_non_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.json");
    fs::write(&path, "[]").unwrap();
    assert!(matches!(Document::open(&path, CanvasConfig::default(), None), Err(CliError::Canvas(_))));
}

// =============================================================
// Assets
// =============================================================

#[test]
fn open_resolves_icon_assets_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let asset = write_png(dir.path(), "valve.png", 6, 4);
    let path = dir.path().join("sheet.json");

    let mut doc = Document::create("a", CanvasConfig::default()).unwrap();
    doc.register_asset_file("valve.png", &asset).unwrap();
    doc.core.place_icon("valve.png", Point::new(100.0, 100.0)).unwrap();
    doc.save(&path).unwrap();

    let without = Document::open(&path, CanvasConfig::default(), None).unwrap();
    assert!(!without.core.assets.contains("valve.png"));

    let with = Document::open(&path, CanvasConfig::default(), Some(dir.path())).unwrap();
    assert!(with.core.assets.contains("valve.png"));
}

#[test]
fn missing_asset_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let asset = write_png(dir.path(), "pump.png", 2, 2);

    let mut doc = Document::create("a", CanvasConfig::default()).unwrap();
    doc.register_asset_file("pump.png", &asset).unwrap();
    doc.core.place_icon("pump.png", Point::new(10.0, 10.0)).unwrap();
    doc.core.assets.remove("pump.png");
    fs::remove_file(&asset).unwrap();

    assert_eq!(doc.load_icon_assets(dir.path()).unwrap(), 0);
    assert!(!doc.core.assets.contains("pump.png"));
}

#[test]
fn asset_path_stays_inside_directory() {
    let dir = Path::new("/srv/icons");
    assert_eq!(asset_path(dir, "valves/gate.png").unwrap(), dir.join("valves/gate.png"));
    assert!(matches!(asset_path(dir, "../secret.png"), Err(CliError::AssetOutsideDirectory(_))));
    assert!(matches!(asset_path(dir, "/etc/passwd"), Err(CliError::AssetOutsideDirectory(_))));
    assert!(matches!(asset_path(dir, ""), Err(CliError::AssetOutsideDirectory(_))));
}

#[test]
fn now_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}
