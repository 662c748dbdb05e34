//! Coverage scan CLI: point, region, global-sample, hotspots and catalog
//! operations as JSON on stdout.
//!
//! The model bundle is searched at a few conventional locations (or the
//! path given with --model); when none loads the tool keeps running in
//! degraded zero-coverage mode, matching the library's tolerance policy.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;

use florcast_core::catalog::PlantCatalog;
use florcast_core::scan::{
    global_sample, hotspots, scan_region, to_feature_collection, RegionBounds, Resolution,
};
use florcast_core::{FlowerDetector, LoadOptions, SyntheticImagery};

/// Default bundle locations, tried in order.
const DEFAULT_MODEL_PATHS: [&str; 3] = [
    "physics_coverage_model.json",
    "models/physics_coverage_model.json",
    "data/physics_coverage_model.json",
];

#[derive(Parser, Debug)]
#[command(name = "scan", about = "Flower coverage scans over synthetic imagery")]
struct Args {
    /// Model asset bundle path (overrides the default search locations).
    #[arg(long)]
    model: Option<String>,

    /// Reject bundles whose feature names the extractor does not know.
    #[arg(long)]
    strict_features: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate coverage at a single point.
    Point {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lng: f64,
        #[arg(long, default_value = "2023-06-15")]
        date: NaiveDate,
    },
    /// Scan a bounding box and emit blooming events as GeoJSON.
    Region {
        #[arg(long)]
        north: f64,
        #[arg(long)]
        south: f64,
        #[arg(long)]
        east: f64,
        #[arg(long)]
        west: f64,
        #[arg(long, default_value = "2023-06-15")]
        date: NaiveDate,
        #[arg(long, default_value = "medium")]
        resolution: Resolution,
        #[arg(long, default_value = "1000")]
        max_points: usize,
    },
    /// Evaluate the fixed strategic world sample.
    GlobalSample {
        #[arg(long, default_value = "2023-06-15")]
        date: NaiveDate,
    },
    /// Evaluate the known flower hotspots with seasonal scaling.
    Hotspots {
        #[arg(long, default_value = "2023-06-15")]
        date: NaiveDate,
    },
    /// Print the demonstration plant catalog and its statistics.
    Catalog {
        /// Center latitude for the proximity listing.
        #[arg(long, default_value = "51.5074")]
        lat: f64,
        /// Center longitude for the proximity listing.
        #[arg(long, default_value = "-0.1278")]
        lng: f64,
        #[arg(long, default_value = "1000.0")]
        radius_km: f64,
    },
}

fn build_detector(args: &Args) -> FlowerDetector {
    let options = LoadOptions { strict_features: args.strict_features };
    match &args.model {
        Some(path) => FlowerDetector::from_search_paths(&[path.as_str()], &options),
        None => FlowerDetector::from_search_paths(&DEFAULT_MODEL_PATHS, &options),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let detector = build_detector(&args);
    let source = SyntheticImagery::new();

    let output = match args.command {
        Command::Point { lat, lng, date } => {
            let estimate =
                florcast_core::scan::evaluate_point(&detector, &source, lat, lng, date);
            json!({
                "coordinates": [lat, lng],
                "date": date,
                "coverage": estimate.coverage,
                "category": estimate.category,
                "intensity": estimate.intensity,
                "color": estimate.color,
                "degraded": detector.is_degraded(),
            })
        }
        Command::Region { north, south, east, west, date, resolution, max_points } => {
            let bounds = RegionBounds { north, south, east, west };
            let scan = scan_region(&detector, &source, bounds, date, resolution, max_points);
            to_feature_collection(
                &scan.events,
                json!({
                    "totalPoints": scan.total_points,
                    "bloomingPoints": scan.blooming_points,
                    "region": [west, south, east, north],
                    "date": date,
                    "resolution": resolution,
                }),
            )
        }
        Command::GlobalSample { date } => {
            let estimates = global_sample(&detector, &source, date);
            let blooming = estimates.iter().filter(|e| e.coverage > 0.1).count();
            to_feature_collection(
                &estimates,
                json!({
                    "totalPoints": estimates.len(),
                    "bloomingPoints": blooming,
                    "region": [-180, -90, 180, 90],
                    "date": date,
                    "type": "global_sample",
                }),
            )
        }
        Command::Hotspots { date } => {
            let spots = hotspots(&detector, &source, date);
            json!({
                "type": "hotspots",
                "date": date,
                "spots": spots,
            })
        }
        Command::Catalog { lat, lng, radius_km } => {
            let catalog = PlantCatalog::with_sample_data();
            json!({
                "plants": catalog.all(),
                "statistics": catalog.statistics(),
                "nearby": catalog.nearby(lat, lng, radius_km),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
