mod document;
mod error;
mod store;

use std::path::{Path, PathBuf};

use canvas::camera::Point;
use canvas::config::CanvasConfig;
use canvas::consts::ROTATE_STEP_DEG;
use canvas::engine::Action;
use canvas::export::ExportFormat;
use canvas::scene::{SceneEngine, page_region};
use canvas::snapshot::{SavedDocumentSnapshot, SnapshotStore};
use canvas::upload::{DocumentRasterizer, ImageRasterizer, UploadKind};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};

use crate::document::Document;
use crate::error::CliError;
use crate::store::FileStore;

#[derive(Parser, Debug)]
#[command(name = "a3sheet", about = "Compose and export single-page A3 sheets")]
struct Cli {
    /// JSON file overriding the built-in engine configuration.
    #[arg(long, env = "A3SHEET_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory that icon asset keys resolve against.
    #[arg(long, env = "A3SHEET_ASSETS", global = true)]
    assets: Option<PathBuf>,

    /// Directory holding the pdfium shared library used for PDF backgrounds.
    #[arg(long, env = "PDFIUM_DYNAMIC_LIB_PATH", global = true)]
    pdfium: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a document holding an empty page.
    New {
        doc: PathBuf,
        #[arg(long, default_value = "Untitled")]
        name: String,
    },
    /// Place an icon, centred on a page point (the page centre by default).
    Place {
        doc: PathBuf,
        /// Asset key, relative to the asset directory.
        asset: String,
        #[arg(long, requires = "y")]
        x: Option<f64>,
        #[arg(long, requires = "x")]
        y: Option<f64>,
        /// Quarter turns clockwise; negative turns counter-clockwise.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        turns: i32,
    },
    /// Replace the background with a PNG or JPEG, or the first page of a PDF
    /// when built with the `pdf` feature and pdfium can be loaded.
    Background { doc: PathBuf, file: PathBuf },
    /// Render the page region to PNG, JPEG or PDF.
    Export(ExportArgs),
    /// Print the objects of a document.
    Show { doc: PathBuf },
    /// Manage the snapshot store.
    Store(StoreCommand),
}

#[derive(Args, Debug)]
struct ExportArgs {
    doc: PathBuf,
    out: PathBuf,
    /// Output format; inferred from the output extension when absent.
    #[arg(long)]
    format: Option<ExportFormat>,
    /// Output pixels per page unit.
    #[arg(long)]
    multiplier: Option<f64>,
    /// JPEG quality in 0..=1 (also used for the image inside a PDF).
    #[arg(long)]
    quality: Option<f64>,
}

#[derive(Args, Debug)]
struct StoreCommand {
    #[arg(long, env = "A3SHEET_STORE", default_value = "a3sheet-store.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: StoreSubcommand,
}

#[derive(Subcommand, Debug)]
enum StoreSubcommand {
    /// List saved documents, most recent first.
    List,
    /// Save the working document into the store.
    Save {
        doc: PathBuf,
        /// Store under a different name.
        #[arg(long)]
        name: Option<String>,
    },
    /// Restore a stored document into a working document file.
    Open { index: usize, doc: PathBuf },
    Delete { index: usize },
    /// Add a previously exported document to the store.
    Import { file: PathBuf },
    /// Write a stored document as a single JSON file.
    Export { index: usize, out: PathBuf },
}

#[derive(Debug, Clone)]
struct CliContext {
    config: CanvasConfig,
    assets: Option<PathBuf>,
    pdfium: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let ctx = CliContext {
        config: document::load_config(cli.config.as_deref())?,
        assets: cli.assets,
        pdfium: cli.pdfium,
    };

    match cli.command {
        Command::New { doc, name } => run_new(&ctx, doc, name).await,
        Command::Place { doc, asset, x, y, turns } => {
            let at = x.zip(y).map(|(x, y)| Point::new(x, y));
            run_place(&ctx, doc, asset, at, turns).await
        }
        Command::Background { doc, file } => run_background(&ctx, doc, file).await,
        Command::Export(args) => run_export(&ctx, args).await,
        Command::Show { doc } => run_show(&ctx, doc).await,
        Command::Store(store) => run_store(&ctx, store).await,
    }
}

/// Run synchronous engine work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T, CliError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CliError> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

async fn run_new(ctx: &CliContext, path: PathBuf, name: String) -> Result<(), CliError> {
    let config = ctx.config.clone();
    blocking(move || {
        let doc = Document::create(&name, config)?;
        doc.save(&path)?;
        println!("{}", path.display());
        Ok(())
    })
    .await
}

async fn run_place(
    ctx: &CliContext,
    path: PathBuf,
    asset: String,
    at: Option<Point>,
    turns: i32,
) -> Result<(), CliError> {
    let ctx = ctx.clone();
    blocking(move || {
        let mut doc = Document::open(&path, ctx.config, ctx.assets.as_deref())?;
        if !doc.core.assets.contains(&asset) {
            let dir = ctx.assets.as_deref().unwrap_or_else(|| Path::new("."));
            doc.register_asset_file(&asset, &document::asset_path(dir, &asset)?)?;
        }

        let world = match at {
            Some(point) => point,
            None => page_region(&doc.core.scene)?.center(),
        };
        let actions = doc.core.place_icon(&asset, world)?;
        let Some(id) = actions.iter().find_map(|a| match a {
            Action::ObjectCreated(obj) => Some(obj.id),
            _ => None,
        }) else {
            return Ok(());
        };
        if turns != 0 {
            doc.core.rotate_object(&id, f64::from(turns) * ROTATE_STEP_DEG);
        }
        doc.save(&path)?;
        println!("{id}");
        Ok(())
    })
    .await
}

async fn run_background(ctx: &CliContext, path: PathBuf, file: PathBuf) -> Result<(), CliError> {
    let ctx = ctx.clone();
    blocking(move || {
        let mut doc = Document::open(&path, ctx.config, ctx.assets.as_deref())?;
        let bytes = std::fs::read(&file).map_err(CliError::io(&file))?;
        let file_name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let rasterizer: Box<dyn DocumentRasterizer> =
            if UploadKind::from_file_name(&file_name).is_ok_and(UploadKind::is_paginated) {
                pdf_rasterizer(ctx.pdfium.as_deref())
            } else {
                Box::new(ImageRasterizer)
            };
        doc.core.upload_background(&file_name, &bytes, rasterizer.as_ref())?;
        doc.save(&path)
    })
    .await
}

#[cfg(feature = "pdf")]
fn pdf_rasterizer(pdfium_dir: Option<&Path>) -> Box<dyn DocumentRasterizer> {
    match canvas::pdf::PdfiumRasterizer::new(pdfium_dir) {
        Ok(rasterizer) => Box::new(rasterizer),
        Err(err) => {
            tracing::warn!(%err, "pdfium unavailable");
            Box::new(ImageRasterizer)
        }
    }
}

/// Without pdfium the upload fails with a rasterizer-unavailable error.
#[cfg(not(feature = "pdf"))]
fn pdf_rasterizer(_pdfium_dir: Option<&Path>) -> Box<dyn DocumentRasterizer> {
    Box::new(ImageRasterizer)
}

async fn run_export(ctx: &CliContext, args: ExportArgs) -> Result<(), CliError> {
    let format = match args.format {
        Some(format) => format,
        None => args
            .out
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse::<ExportFormat>().ok())
            .ok_or_else(|| CliError::UnknownFormat(args.out.clone()))?,
    };

    let mut config = ctx.config.clone();
    if let Some(multiplier) = args.multiplier {
        config.export_multiplier = multiplier;
    }
    if let Some(quality) = args.quality {
        config.jpeg_quality = quality;
    }
    config.validate()?;

    let assets = ctx.assets.clone();
    blocking(move || {
        let doc = Document::open(&args.doc, config, assets.as_deref())?;
        let bytes = doc.core.export_page(format, None)?;
        std::fs::write(&args.out, &bytes).map_err(CliError::io(&args.out))?;
        println!("{} ({} bytes)", args.out.display(), bytes.len());
        Ok(())
    })
    .await
}

async fn run_show(ctx: &CliContext, path: PathBuf) -> Result<(), CliError> {
    let ctx = ctx.clone();
    blocking(move || {
        let doc = Document::open(&path, ctx.config, ctx.assets.as_deref())?;
        let objects: Vec<Value> = doc
            .core
            .scene
            .objects()
            .into_iter()
            .map(|o| {
                json!({
                    "id": o.id,
                    "kind": o.kind,
                    "x": o.x,
                    "y": o.y,
                    "angle": o.angle,
                    "locked": o.locked,
                    "src": o.src.as_deref().map(abbreviate_src),
                })
            })
            .collect();
        print_json(&json!({ "name": doc.name, "objects": objects }))
    })
    .await
}

async fn run_store(ctx: &CliContext, command: StoreCommand) -> Result<(), CliError> {
    let ctx = ctx.clone();
    blocking(move || {
        let mut store = FileStore::new(command.store);
        match command.command {
            StoreSubcommand::List => print_json(&store.listing()?),
            StoreSubcommand::Save { doc, name } => {
                let mut document = Document::open(&doc, ctx.config, ctx.assets.as_deref())?;
                if let Some(name) = name {
                    document.name = name;
                }
                store.append(document.snapshot()?)?;
                println!("saved {:?}", document.name);
                Ok(())
            }
            StoreSubcommand::Open { index, doc } => {
                let snapshot = stored(&store, index)?;
                Document::from_snapshot(&snapshot, ctx.config, ctx.assets.as_deref())?.save(&doc)
            }
            StoreSubcommand::Delete { index } => {
                let removed = store.delete(index)?.ok_or(CliError::NoSuchSnapshot(index))?;
                println!("deleted {:?}", removed.name);
                Ok(())
            }
            StoreSubcommand::Import { file } => {
                let raw = std::fs::read_to_string(&file).map_err(CliError::io(&file))?;
                let snapshot = SavedDocumentSnapshot::from_json(&raw)?;
                // Reject snapshots that would not restore before storing them.
                Document::from_snapshot(&snapshot, ctx.config, None)?;
                println!("imported {:?}", snapshot.name);
                store.append(snapshot)?;
                Ok(())
            }
            StoreSubcommand::Export { index, out } => {
                let snapshot = stored(&store, index)?;
                std::fs::write(&out, snapshot.to_json()?).map_err(CliError::io(&out))?;
                println!("{}", out.display());
                Ok(())
            }
        }
    })
    .await
}

fn stored(store: &FileStore, index: usize) -> Result<SavedDocumentSnapshot, CliError> {
    store.get(index)?.ok_or(CliError::NoSuchSnapshot(index))
}

/// Inline images are long; show only their media type.
fn abbreviate_src(src: &str) -> String {
    match src.split_once(',') {
        Some((header, _)) if header.starts_with("data:") => format!("{header},…"),
        _ => src.to_owned(),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
