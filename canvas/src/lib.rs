//! Drawing engine for composing a single A3 sheet.
//!
//! A document holds exactly one page region (the printable A3 sheet), at most
//! one locked background rasterized from an uploaded PDF or image, and any
//! number of icons dropped from an asset palette. This crate owns everything
//! between raw DOM input and pixels: the viewport, the gesture state machine,
//! hit-testing, rasterization, export, and snapshot persistence. The host
//! JavaScript layer wires events to [`engine::Engine`] and reacts to the
//! returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`doc`] | In-memory scene store and scene object types |
//! | [`scene`] | The scene-engine seam and page-region queries |
//! | [`camera`] | Viewport transform and coordinate conversions |
//! | [`viewport`] | Pan/zoom controller with clamped scale |
//! | [`fit`] | Fitting the page region into the surface |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing against scene objects |
//! | [`assets`] | Decoded rasters and the asset library |
//! | [`raster`] | CPU rasterization of the scene |
//! | [`render`] | Blitting the raster and drawing overlays on a 2D context |
//! | [`export`] | PNG/JPEG/PDF export of the page region |
//! | [`upload`] | Background upload kinds and the rasterizer seam |
//! | `pdf` | pdfium-backed PDF rasterizer (`pdf` feature) |
//! | [`snapshot`] | Saved documents, stores, and restore reconciliation |
//! | [`config`] | Engine tunables |
//! | [`error`] | The crate error type |
//! | [`consts`] | Shared numeric constants (page size, zoom limits, etc.) |

pub mod assets;
pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod export;
pub mod fit;
pub mod hit;
pub mod input;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod raster;
pub mod render;
pub mod scene;
pub mod snapshot;
pub mod upload;
pub mod viewport;
