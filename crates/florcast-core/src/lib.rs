//! florcast-core: flower coverage estimation from spectral reflectance.
//!
//! The pipeline runs (lat, lng, date) → reflectance sample → 13-feature
//! spectral vector → trained-forest coverage prediction → category and
//! intensity labels. Everything downstream of the asset bundle is pure
//! and lock-free: the bundle is loaded once, validated, and shared
//! read-only across scan workers.

pub mod assets;
pub mod catalog;
pub mod classify;
pub mod detector;
pub mod imagery;
pub mod scan;
pub mod spectral;

pub use assets::{AssetError, LoadOptions, ModelAssets};
pub use classify::{classify, BloomIntensity, CoverageCategory, CoverageResult};
pub use detector::FlowerDetector;
pub use imagery::{ImageryError, ReflectanceSource, SyntheticImagery};
pub use scan::{scan_region, PointEstimate, RegionBounds, RegionScan, Resolution};
pub use spectral::{extract_features, ColorSample, SpectralFeatures, FEATURE_NAMES};
