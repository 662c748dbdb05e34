//! The coverage detector: ties feature extraction, the trained forest and
//! the classifier into one always-succeeding pipeline.
//!
//! The asset bundle is injected at construction and shared read-only, so
//! any number of scan workers can evaluate points without locking. A
//! detector built without assets runs degraded: every prediction is 0.0.

use std::path::Path;
use std::sync::Arc;

use crate::assets::{LoadOptions, ModelAssets};
use crate::classify::{classify, CoverageResult};
use crate::spectral::{extract_features, ColorSample, SpectralFeatures};

#[derive(Debug, Clone)]
pub struct FlowerDetector {
    assets: Option<Arc<ModelAssets>>,
}

impl FlowerDetector {
    pub fn new(assets: ModelAssets) -> Self {
        Self { assets: Some(Arc::new(assets)) }
    }

    /// A detector with no model: predicts 0.0 coverage everywhere.
    pub fn degraded() -> Self {
        Self { assets: None }
    }

    /// Build from the first loadable bundle among `paths`, degraded when
    /// none loads. Never fails.
    pub fn from_search_paths<P: AsRef<Path>>(paths: &[P], options: &LoadOptions) -> Self {
        match ModelAssets::search(paths, options) {
            Some(assets) => Self::new(assets),
            None => Self::degraded(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.assets.is_none()
    }

    /// Reference data accessor, None in degraded mode.
    pub fn assets(&self) -> Option<&ModelAssets> {
        self.assets.as_deref()
    }

    /// Derive the 13-feature vector for a sample. None in degraded mode
    /// (no reference spectra to compare against).
    pub fn extract(&self, sample: &ColorSample) -> Option<SpectralFeatures> {
        let assets = self.assets.as_deref()?;
        Some(extract_features(
            sample,
            &assets.wavelengths,
            &assets.flower_spectrum,
            &assets.background_spectrum,
        ))
    }

    /// Predict coverage in [0, 1] from a feature vector.
    ///
    /// Features are looked up by name in the bundle's order; names the
    /// extractor does not produce default to 0.0 (tolerant policy, kept
    /// for compatibility with the trained bundle). Degraded mode returns
    /// exactly 0.0.
    pub fn predict(&self, features: &SpectralFeatures) -> f64 {
        let Some(assets) = self.assets.as_deref() else {
            return 0.0;
        };
        let mut vector: Vec<f64> = assets
            .feature_names
            .iter()
            .map(|name| features.get(name).unwrap_or(0.0))
            .collect();
        assets.scaler.transform(&mut vector);
        assets.forest.predict(&vector).clamp(0.0, 1.0)
    }

    /// Full pipeline: sample → features → coverage → labels.
    /// Always returns a well-formed result.
    pub fn evaluate(&self, sample: &ColorSample) -> CoverageResult {
        match self.extract(sample) {
            Some(features) => classify(self.predict(&features)),
            None => classify(0.0),
        }
    }
}
