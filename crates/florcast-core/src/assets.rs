//! Model asset bundle: trained regression forest, feature scaler, and the
//! reference spectra needed to reproduce inference.
//!
//! Loaded once at startup from a JSON bundle, validated, and held
//! immutable for the process lifetime. Absence is tolerated: callers fall
//! back to a degraded zero-coverage detector instead of crashing.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spectral::FEATURE_NAMES;

/// Leaf sentinel in the flattened tree arrays.
const LEAF: i32 = -1;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset bundle: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse asset bundle: {0}")]
    Json(#[from] serde_json::Error),
    #[error("asset bundle invalid: {0}")]
    Invalid(String),
    #[error("unknown feature name in bundle: {0}")]
    UnknownFeature(String),
}

/// Load-time options.
///
/// `strict_features` rejects bundles whose feature names are not all
/// known to the extractor. Off by default to stay compatible with older
/// bundles; the predict-time lookup remains tolerant either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub strict_features: bool,
}

/// Standard-scaler transform `(x - mean) / scale`, fitted at training
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    pub fn transform(&self, vector: &mut [f64]) {
        for (i, v) in vector.iter_mut().enumerate() {
            *v = (*v - self.mean[i]) / self.scale[i];
        }
    }
}

/// One regression tree in flattened node-array form.
///
/// Node `i` is a leaf when `feature[i] == -1` (output `value[i]`);
/// otherwise it routes `x[feature[i]] <= threshold[i]` to `left[i]`,
/// else `right[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub left: Vec<i32>,
    pub right: Vec<i32>,
    pub value: Vec<f64>,
}

impl Tree {
    fn predict(&self, x: &[f64]) -> f64 {
        let mut node = 0usize;
        // Validation guarantees a well-formed tree; the hop cap bounds
        // traversal even if it were not.
        for _ in 0..self.feature.len() {
            let f = self.feature[node];
            if f == LEAF {
                return self.value[node];
            }
            let v = x.get(f as usize).copied().unwrap_or(0.0);
            node = if v <= self.threshold[node] {
                self.left[node] as usize
            } else {
                self.right[node] as usize
            };
        }
        self.value[node]
    }

    fn validate(&self, n_features: usize) -> Result<(), AssetError> {
        let n = self.feature.len();
        if n == 0 {
            return Err(AssetError::Invalid("tree has no nodes".into()));
        }
        if [self.threshold.len(), self.left.len(), self.right.len(), self.value.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err(AssetError::Invalid("tree node arrays differ in length".into()));
        }
        for i in 0..n {
            let f = self.feature[i];
            if f == LEAF {
                continue;
            }
            if f < 0 || f as usize >= n_features {
                return Err(AssetError::Invalid(format!(
                    "tree node {i} references feature {f} of {n_features}"
                )));
            }
            for child in [self.left[i], self.right[i]] {
                if child <= i as i32 || child as usize >= n {
                    return Err(AssetError::Invalid(format!(
                        "tree node {i} has out-of-order child {child}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Regression forest: prediction is the mean of the tree outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forest {
    pub trees: Vec<Tree>,
}

impl Forest {
    pub fn predict(&self, x: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        sum / self.trees.len() as f64
    }
}

/// Training-time metrics, informational only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Performance {
    pub r2: f64,
}

/// The full asset bundle. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAssets {
    pub feature_names: Vec<String>,
    /// Ascending reference wavelength grid (nm).
    pub wavelengths: Vec<f64>,
    /// Mean flower reflectance on `wavelengths`, normalized to [0, 1].
    pub flower_spectrum: Vec<f64>,
    /// Mean background reflectance, same shape.
    pub background_spectrum: Vec<f64>,
    pub scaler: Scaler,
    pub forest: Forest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
}

impl ModelAssets {
    /// Load and validate a bundle from a JSON file.
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, AssetError> {
        let raw = fs::read_to_string(path)?;
        let assets: Self = serde_json::from_str(&raw)?;
        assets.validate(options)?;
        Ok(assets)
    }

    /// Try a list of candidate bundle locations in order, logging each
    /// failure. Returns None when no location yields a valid bundle;
    /// callers then run in degraded zero-coverage mode.
    pub fn search<P: AsRef<Path>>(paths: &[P], options: &LoadOptions) -> Option<Self> {
        for path in paths {
            let path = path.as_ref();
            match Self::load(path, options) {
                Ok(assets) => {
                    log::info!("loaded model assets from {}", path.display());
                    if let Some(perf) = assets.performance {
                        log::info!("model r2 = {:.3}", perf.r2);
                    }
                    return Some(assets);
                }
                Err(err) => log::warn!("skipping {}: {err}", path.display()),
            }
        }
        log::error!("no valid model asset bundle found; running degraded");
        None
    }

    pub fn validate(&self, options: &LoadOptions) -> Result<(), AssetError> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(AssetError::Invalid("feature_names is empty".into()));
        }
        for (i, name) in self.feature_names.iter().enumerate() {
            if self.feature_names[..i].contains(name) {
                return Err(AssetError::Invalid(format!("duplicate feature name {name}")));
            }
            if options.strict_features && !FEATURE_NAMES.contains(&name.as_str()) {
                return Err(AssetError::UnknownFeature(name.clone()));
            }
        }

        if self.wavelengths.len() < 2 {
            return Err(AssetError::Invalid("wavelength grid needs at least 2 points".into()));
        }
        if self.wavelengths.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AssetError::Invalid("wavelengths must be strictly ascending".into()));
        }
        for (label, spectrum) in [
            ("flower_spectrum", &self.flower_spectrum),
            ("background_spectrum", &self.background_spectrum),
        ] {
            if spectrum.len() != self.wavelengths.len() {
                return Err(AssetError::Invalid(format!(
                    "{label} length {} != wavelength count {}",
                    spectrum.len(),
                    self.wavelengths.len()
                )));
            }
            if spectrum.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > 1.0) {
                return Err(AssetError::Invalid(format!("{label} outside [0, 1]")));
            }
        }

        if self.scaler.mean.len() != n || self.scaler.scale.len() != n {
            return Err(AssetError::Invalid("scaler shape != feature count".into()));
        }
        if self.scaler.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(AssetError::Invalid("scaler scale entries must be finite non-zero".into()));
        }

        for tree in &self.forest.trees {
            tree.validate(n)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A single-split stump: flower_color_ratio <= 1.0 → 0.1, else 0.7.
    fn stump(feature: i32, threshold: f64, lo: f64, hi: f64) -> Tree {
        Tree {
            feature: vec![feature, LEAF, LEAF],
            threshold: vec![threshold, 0.0, 0.0],
            left: vec![1, 0, 0],
            right: vec![2, 0, 0],
            value: vec![0.0, lo, hi],
        }
    }

    fn fixture() -> ModelAssets {
        ModelAssets {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            wavelengths: vec![450.0, 550.0, 650.0, 750.0],
            flower_spectrum: vec![0.2, 0.8, 0.6, 0.3],
            background_spectrum: vec![0.5, 0.6, 0.4, 0.3],
            scaler: Scaler { mean: vec![0.0; 13], scale: vec![1.0; 13] },
            forest: Forest { trees: vec![stump(10, 1.0, 0.1, 0.7)] },
            performance: Some(Performance { r2: 0.85 }),
        }
    }

    #[test]
    fn fixture_validates() {
        fixture().validate(&LoadOptions { strict_features: true }).unwrap();
    }

    #[test]
    fn forest_averages_tree_outputs() {
        let forest = Forest { trees: vec![stump(0, 0.5, 0.2, 0.8), stump(0, 0.5, 0.4, 0.6)] };
        let mut x = vec![0.0; 13];
        x[0] = 0.3;
        assert_relative_eq!(forest.predict(&x), 0.3, epsilon = 1e-12);
        x[0] = 0.9;
        assert_relative_eq!(forest.predict(&x), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn empty_forest_predicts_zero() {
        assert_eq!(Forest { trees: vec![] }.predict(&[1.0; 13]), 0.0);
    }

    #[test]
    fn scaler_transform_centers_and_scales() {
        let scaler = Scaler { mean: vec![1.0, 2.0], scale: vec![2.0, 4.0] };
        let mut x = vec![3.0, 10.0];
        scaler.transform(&mut x);
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_spectrum_length_mismatch() {
        let mut assets = fixture();
        assets.flower_spectrum.pop();
        assert!(matches!(
            assets.validate(&LoadOptions::default()),
            Err(AssetError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_unsorted_wavelengths() {
        let mut assets = fixture();
        assets.wavelengths.swap(0, 1);
        assert!(assets.validate(&LoadOptions::default()).is_err());
    }

    #[test]
    fn rejects_duplicate_feature_names() {
        let mut assets = fixture();
        assets.feature_names[1] = assets.feature_names[0].clone();
        assert!(assets.validate(&LoadOptions::default()).is_err());
    }

    #[test]
    fn strict_mode_rejects_renamed_feature() {
        let mut assets = fixture();
        assets.feature_names[0] = "flower_similarity_v2".into();
        assert!(matches!(
            assets.validate(&LoadOptions { strict_features: true }),
            Err(AssetError::UnknownFeature(_))
        ));
        // Tolerant mode accepts it; the predictor will default it to 0.
        assets.validate(&LoadOptions::default()).unwrap();
    }

    #[test]
    fn rejects_zero_scale() {
        let mut assets = fixture();
        assets.scaler.scale[3] = 0.0;
        assert!(assets.validate(&LoadOptions::default()).is_err());
    }

    #[test]
    fn rejects_malformed_tree_child() {
        let mut assets = fixture();
        assets.forest.trees[0].left[0] = 0; // self-referential child
        assert!(assets.validate(&LoadOptions::default()).is_err());
    }

    #[test]
    fn load_round_trips_through_json_file() {
        let assets = fixture();
        let path = std::env::temp_dir().join("florcast_assets_test.json");
        fs::write(&path, serde_json::to_string(&assets).unwrap()).unwrap();
        let loaded = ModelAssets::load(&path, &LoadOptions { strict_features: true }).unwrap();
        assert_eq!(loaded.feature_names, assets.feature_names);
        assert_eq!(loaded.wavelengths, assets.wavelengths);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn search_returns_none_for_missing_paths() {
        let missing = [std::env::temp_dir().join("florcast_no_such_bundle.json")];
        assert!(ModelAssets::search(&missing, &LoadOptions::default()).is_none());
    }
}
