//! Batch scan orchestration: fans point evaluations out over a grid or a
//! fixed point list and assembles geospatial output.
//!
//! Each point is evaluated independently; an imagery failure degrades
//! that point to zero coverage instead of aborting the batch. Results
//! carry their own (lat, lng), so ordering across workers is irrelevant.

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::classify::{classify, BloomIntensity, CoverageCategory};
use crate::detector::FlowerDetector;
use crate::imagery::ReflectanceSource;

/// Points at or below this coverage are not reported as events.
pub const BLOOM_THRESHOLD: f64 = 0.05;

/// Grid density for region scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// ~5 km spacing.
    Low,
    /// ~2 km spacing.
    Medium,
    /// ~1 km spacing.
    High,
}

impl Resolution {
    pub fn grid_step(self) -> f64 {
        match self {
            Self::Low => 0.05,
            Self::Medium => 0.02,
            Self::High => 0.01,
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown resolution {other:?} (low|medium|high)")),
        }
    }
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegionBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// One evaluated point with its derived labels and render color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointEstimate {
    pub lat: f64,
    pub lng: f64,
    pub coverage: f64,
    pub category: CoverageCategory,
    pub intensity: BloomIntensity,
    pub color: &'static str,
}

impl PointEstimate {
    fn from_coverage(lat: f64, lng: f64, coverage: f64) -> Self {
        // Labels come from the raw value; rounding is for reporting only,
        // so a 4th-decimal boundary cannot shift the category.
        let result = classify(coverage);
        Self {
            lat,
            lng,
            coverage: round3(result.coverage),
            category: result.category,
            intensity: result.intensity,
            color: result.intensity.color(),
        }
    }

    fn degraded(lat: f64, lng: f64) -> Self {
        Self::from_coverage(lat, lng, 0.0)
    }
}

/// Result of a region scan.
#[derive(Debug, Clone, Serialize)]
pub struct RegionScan {
    pub events: Vec<PointEstimate>,
    pub total_points: usize,
    pub blooming_points: usize,
    pub date: NaiveDate,
    pub bounds: RegionBounds,
    pub resolution: Resolution,
}

/// Evaluate one point, converting any imagery failure into a degraded
/// zero-coverage estimate. Never fails.
pub fn evaluate_point<S: ReflectanceSource>(
    detector: &FlowerDetector,
    source: &S,
    lat: f64,
    lng: f64,
    date: NaiveDate,
) -> PointEstimate {
    match source.sample(lat, lng, date) {
        Ok(sample) => {
            let result = detector.evaluate(&sample);
            PointEstimate::from_coverage(lat, lng, result.coverage)
        }
        Err(err) => {
            log::warn!("point ({lat:.4}, {lng:.4}) degraded: {err}");
            PointEstimate::degraded(lat, lng)
        }
    }
}

/// Grid points at `step` spacing, south→north and west→east, capped at
/// `max_points`. Upper bounds are exclusive. Points are generated by
/// index (`south + i·step`) rather than accumulation, so spacing does not
/// drift across wide regions.
pub fn grid_points(bounds: &RegionBounds, step: f64, max_points: usize) -> Vec<(f64, f64)> {
    // Subtracting the difference of two coordinates leaves float noise in
    // the span; without the tolerance a span that is an exact multiple of
    // `step` would ceil up and gain a row on the excluded upper bound.
    let count =
        |span: f64| if span <= 0.0 { 0 } else { (span / step - 1e-9).ceil().max(0.0) as usize };
    let n_lat = count(bounds.north - bounds.south);
    let n_lng = count(bounds.east - bounds.west);

    let mut points = Vec::with_capacity((n_lat * n_lng).min(max_points));
    'outer: for i in 0..n_lat {
        for j in 0..n_lng {
            if points.len() >= max_points {
                break 'outer;
            }
            points.push((bounds.south + i as f64 * step, bounds.west + j as f64 * step));
        }
    }
    points
}

/// Scan a region: evaluate every grid point concurrently and keep the
/// blooming events (coverage above [`BLOOM_THRESHOLD`]).
pub fn scan_region<S: ReflectanceSource>(
    detector: &FlowerDetector,
    source: &S,
    bounds: RegionBounds,
    date: NaiveDate,
    resolution: Resolution,
    max_points: usize,
) -> RegionScan {
    let points = grid_points(&bounds, resolution.grid_step(), max_points);
    log::info!("scanning {} points at {:?} resolution", points.len(), resolution);

    let estimates: Vec<PointEstimate> = points
        .par_iter()
        .map(|&(lat, lng)| evaluate_point(detector, source, lat, lng, date))
        .collect();

    let events: Vec<PointEstimate> = estimates
        .into_iter()
        .filter(|e| e.coverage > BLOOM_THRESHOLD)
        .collect();

    RegionScan {
        total_points: points.len(),
        blooming_points: events.len(),
        events,
        date,
        bounds,
        resolution,
    }
}

/// Strategic world sample for initial map loading: major cities plus
/// dense sampling of known flower regions.
pub const GLOBAL_SAMPLE_POINTS: [(f64, f64); 28] = [
    // Europe
    (47.3769, 8.5417),
    (48.8566, 2.3522),
    (52.5200, 13.4050),
    (51.5074, -0.1278),
    (46.5, 8.0),
    (46.6, 8.2),
    (46.7, 8.4),
    (46.8, 8.6),
    (52.2, 4.8),
    (52.3, 5.0),
    (52.4, 5.2),
    // North America
    (40.7128, -74.0060),
    (34.0522, -118.2437),
    (43.6532, -79.3832),
    (34.0, -118.5),
    (34.1, -118.3),
    (34.2, -118.1),
    // Asia
    (35.6762, 139.6503),
    (31.2304, 121.4737),
    (28.6139, 77.2090),
    (39.9042, 116.4074),
    // Southern hemisphere
    (-33.8688, 151.2093),
    (-23.5505, -46.6333),
    (-1.2921, 36.8219),
    (-34.6037, -58.3816),
    // Additional coverage
    (55.7558, 37.6173),
    (19.4326, -99.1332),
    (30.0444, 31.2357),
];

/// Evaluate the fixed global sample list. Returns every point, blooming
/// or not; callers filter as needed.
pub fn global_sample<S: ReflectanceSource>(
    detector: &FlowerDetector,
    source: &S,
    date: NaiveDate,
) -> Vec<PointEstimate> {
    GLOBAL_SAMPLE_POINTS
        .par_iter()
        .map(|&(lat, lng)| evaluate_point(detector, source, lat, lng, date))
        .collect()
}

/// A famous flower site with its peak bloom month.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Hotspot {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub peak_month: u32,
}

pub const HOTSPOTS: [Hotspot; 9] = [
    Hotspot { name: "Keukenhof Gardens", lat: 52.27, lng: 4.55, peak_month: 4 },
    Hotspot { name: "Provence Lavender", lat: 43.92, lng: 5.08, peak_month: 7 },
    Hotspot { name: "Alpine Meadows", lat: 46.49, lng: 9.84, peak_month: 7 },
    Hotspot { name: "Carlsbad Flower Fields", lat: 33.12, lng: -117.32, peak_month: 4 },
    Hotspot { name: "Antelope Valley Poppies", lat: 34.72, lng: -118.36, peak_month: 4 },
    Hotspot { name: "Hitachi Seaside Park", lat: 36.40, lng: 140.59, peak_month: 4 },
    Hotspot { name: "Canola Flower Fields", lat: 23.13, lng: 113.25, peak_month: 3 },
    Hotspot { name: "Western Australia Wildflowers", lat: -31.95, lng: 115.86, peak_month: 9 },
    Hotspot { name: "Namaqualand Daisies", lat: -30.56, lng: 17.93, peak_month: 8 },
];

/// A hotspot estimate with its seasonal scaling applied.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HotspotEstimate {
    pub name: &'static str,
    pub peak_month: u32,
    pub seasonal_factor: f64,
    #[serde(flatten)]
    pub point: PointEstimate,
}

/// Seasonal proximity of `month` to `peak_month`: 1 at the peak, linear
/// falloff to 0 at six or more months away (no year wraparound, matching
/// the reference behavior).
pub fn seasonal_proximity(month: u32, peak_month: u32) -> f64 {
    let diff = (month as f64 - peak_month as f64).abs();
    1.0 - (diff / 6.0).min(1.0)
}

/// Evaluate the known hotspots, scaling coverage by seasonal proximity
/// and re-deriving the labels from the scaled value.
pub fn hotspots<S: ReflectanceSource>(
    detector: &FlowerDetector,
    source: &S,
    date: NaiveDate,
) -> Vec<HotspotEstimate> {
    let month = date.month();
    HOTSPOTS
        .par_iter()
        .map(|spot| {
            let factor = seasonal_proximity(month, spot.peak_month);
            let raw = evaluate_point(detector, source, spot.lat, spot.lng, date);
            HotspotEstimate {
                name: spot.name,
                peak_month: spot.peak_month,
                seasonal_factor: factor,
                point: PointEstimate::from_coverage(spot.lat, spot.lng, raw.coverage * factor),
            }
        })
        .collect()
}

/// Assemble point estimates into a GeoJSON FeatureCollection. `height`
/// extrudes coverage for 3-D rendering.
pub fn to_feature_collection(points: &[PointEstimate], metadata: Value) -> Value {
    let features: Vec<Value> = points
        .iter()
        .map(|p| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [p.lng, p.lat],
                },
                "properties": {
                    "coverage": p.coverage,
                    "category": p.category,
                    "intensity": p.intensity,
                    "color": p.color,
                    "height": p.coverage * 1000.0,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
        "metadata": metadata,
    })
}

/// Round to 3 decimals, the precision reported to callers.
fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
