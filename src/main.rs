extern crate log;
pub mod cache;
pub mod config;
pub mod error;
pub mod geofile;
pub mod map;
pub mod remote;
pub mod view;
use crate::cache::{feature_cache::FeatureCache, snapshot_store::FileSnapshotStore};
use crate::config::Config;
use crate::map::geojson_renderer::{GeoJsonLayerRenderer, MapContainer};
use crate::map::renderer::{MapRenderer, Viewport};
use crate::remote::feature_source::HttpFeatureSource;
use crate::view::events::{forward_commands, parse_coordinates, EventBridge};
use crate::view::map_view::{MapView, Message};
use crate::view::tasks::RayonTaskRunner;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// Keep a map of forest-rights claims in sync with the claims backend.
///
/// Commands are read from stdin, one per line: `show <lat>,<lng>`, `refresh`, `finalize`,
/// `basemap <street|imagery>`, `quit`. The live marker layer is written to `<data_dir>/map_layer.geojson`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: PathBuf,

    /// Candidate location "lat,lng" to show right away. Overrides the config file.
    #[arg(short, long)]
    initial_coordinates: Option<String>,
}

fn initial_candidate(coordinates: Option<&str>) -> Option<(f64, f64)> {
    let coordinates = coordinates?;
    match parse_coordinates(coordinates) {
        Ok(candidate) => Some(candidate),
        Err(err) => {
            log::warn!("Ignoring initial coordinates: {:#}", err);
            None
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::try_parse()?;
    let config = Config::load(&args.config_filepath)?;
    log::info!("Using data directory {:?}", config.data_dir);

    let mut renderer = GeoJsonLayerRenderer::initialize(MapContainer {
        export_path: config.layer_export_path(),
        viewport: Viewport {
            center: geo::Point::new(config.viewport.center_lng, config.viewport.center_lat),
            zoom: config.viewport.zoom,
        },
        candidate_zoom: config.candidate_zoom,
    })?;
    if let Some(kind) = config.basemap {
        if !renderer.select_basemap(kind) {
            log::warn!("No {:?} basemap installed, keeping the default", kind);
        }
    }
    let cache = FeatureCache::new(
        Box::new(FileSnapshotStore::new(&config.snapshot_dir())?),
        &config.cache_key,
    );
    let source = Arc::new(HttpFeatureSource::new(&config.remote)?);
    let bridge = EventBridge::new();
    let initial = initial_candidate(
        args.initial_coordinates
            .as_deref()
            .or(config.initial_coordinates.as_deref()),
    );

    let mut view = MapView::open(
        renderer,
        cache,
        source,
        Box::new(RayonTaskRunner),
        &bridge,
        initial,
    );

    let shutdown = view.sender();
    std::thread::spawn(move || {
        if let Err(err) = forward_commands(std::io::stdin().lock(), &bridge) {
            log::error!("Could not read commands: {:#}", err);
        }
        let _ = shutdown.send(Message::Shutdown);
    });

    view.run();
    Ok(())
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
