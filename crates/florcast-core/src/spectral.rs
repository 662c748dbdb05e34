//! Spectral feature extraction: 3-band color sample → 13 physics-derived
//! features.
//!
//! The extractor approximates a full reflectance spectrum from only three
//! measured bands by interpolating the RGB response onto the reference
//! wavelength grid, then compares the estimate against the library flower
//! and background spectra (cosine similarity, spectral angle) and reads
//! band reflectances, slope, ratios, entropy and variance off the
//! normalized curve.

/// Guard against division by zero and degenerate constant curves.
pub const EPS: f64 = 1e-6;

/// Source wavelengths (nm) of the three measured bands.
/// Pairing is fixed: red↔600, green↔550, blue↔450.
const RED_NM: f64 = 600.0;
const GREEN_NM: f64 = 550.0;
const BLUE_NM: f64 = 450.0;

/// Ordered feature names the trained model was fit against.
pub const FEATURE_NAMES: [&str; 13] = [
    "flower_similarity",
    "background_similarity",
    "flower_angle",
    "background_angle",
    "spectral_match_ratio",
    "reflectance_450nm",
    "reflectance_550nm",
    "reflectance_650nm",
    "spectral_slope",
    "green_peak_ratio",
    "flower_color_ratio",
    "spectral_entropy",
    "spectral_variance",
];

/// A 3-band reflectance-like sample. Values are conventionally in [0, 1]
/// but the extractor accepts any finite triple.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorSample {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl ColorSample {
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}

/// The 13 named features consumed by the coverage model.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SpectralFeatures {
    pub flower_similarity: f64,
    pub background_similarity: f64,
    pub flower_angle: f64,
    pub background_angle: f64,
    pub spectral_match_ratio: f64,
    pub reflectance_450nm: f64,
    pub reflectance_550nm: f64,
    pub reflectance_650nm: f64,
    pub spectral_slope: f64,
    pub green_peak_ratio: f64,
    pub flower_color_ratio: f64,
    pub spectral_entropy: f64,
    pub spectral_variance: f64,
}

impl SpectralFeatures {
    /// By-name lookup used to assemble the model's input vector.
    /// Unknown names return None; the predictor treats that as 0.0.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "flower_similarity" => Some(self.flower_similarity),
            "background_similarity" => Some(self.background_similarity),
            "flower_angle" => Some(self.flower_angle),
            "background_angle" => Some(self.background_angle),
            "spectral_match_ratio" => Some(self.spectral_match_ratio),
            "reflectance_450nm" => Some(self.reflectance_450nm),
            "reflectance_550nm" => Some(self.reflectance_550nm),
            "reflectance_650nm" => Some(self.reflectance_650nm),
            "spectral_slope" => Some(self.spectral_slope),
            "green_peak_ratio" => Some(self.green_peak_ratio),
            "flower_color_ratio" => Some(self.flower_color_ratio),
            "spectral_entropy" => Some(self.spectral_entropy),
            "spectral_variance" => Some(self.spectral_variance),
            _ => None,
        }
    }
}

/// Extract the 13-feature vector from a color sample and the reference
/// spectra. Pure and total: any finite input produces finite output.
///
/// `wavelengths`, `flower_spectrum` and `background_spectrum` must share
/// the same length (enforced at asset-load time).
pub fn extract_features(
    sample: &ColorSample,
    wavelengths: &[f64],
    flower_spectrum: &[f64],
    background_spectrum: &[f64],
) -> SpectralFeatures {
    // Three-point response curve, ascending wavelength order.
    let points = [
        (BLUE_NM, sample.blue),
        (GREEN_NM, sample.green),
        (RED_NM, sample.red),
    ];

    let estimated: Vec<f64> = wavelengths
        .iter()
        .map(|&wl| interp_extrapolate(&points, wl))
        .collect();
    let spectrum = minmax_normalize(&estimated);

    // Similarities are reported floored at 0, but the match ratio keeps
    // the raw values: the trained model saw that distribution.
    let flower_sim_raw = cosine_similarity(&spectrum, flower_spectrum);
    let background_sim_raw = cosine_similarity(&spectrum, background_spectrum);

    let red_idx = nearest_index(wavelengths, 650.0);
    let green_idx = nearest_index(wavelengths, 550.0);
    let blue_idx = nearest_index(wavelengths, 450.0);
    let red_reflectance = spectrum[red_idx];
    let green_reflectance = spectrum[green_idx];
    let blue_reflectance = spectrum[blue_idx];

    SpectralFeatures {
        flower_similarity: flower_sim_raw.max(0.0),
        background_similarity: background_sim_raw.max(0.0),
        flower_angle: spectral_angle(&spectrum, flower_spectrum),
        background_angle: spectral_angle(&spectrum, background_spectrum),
        spectral_match_ratio: flower_sim_raw / (background_sim_raw + EPS),
        reflectance_450nm: blue_reflectance,
        reflectance_550nm: green_reflectance,
        reflectance_650nm: red_reflectance,
        spectral_slope: (red_reflectance - blue_reflectance) / (650.0 - 450.0 + EPS),
        green_peak_ratio: green_reflectance
            / ((red_reflectance + blue_reflectance) / 2.0 + EPS),
        flower_color_ratio: green_reflectance / (red_reflectance + EPS),
        spectral_entropy: shifted_entropy(&spectrum),
        spectral_variance: population_variance(&spectrum),
    }
}

// ── Numeric helpers ──────────────────────────────────────────────────────────

/// Piecewise-linear interpolation over `points` (ascending x), with linear
/// extension of the nearest segment beyond the support.
fn interp_extrapolate(points: &[(f64, f64)], x: f64) -> f64 {
    debug_assert!(points.len() >= 2);
    let seg = if x <= points[0].0 {
        0
    } else if x >= points[points.len() - 1].0 {
        points.len() - 2
    } else {
        let mut i = 0;
        while points[i + 1].0 < x {
            i += 1;
        }
        i
    };
    let (x0, y0) = points[seg];
    let (x1, y1) = points[seg + 1];
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Min-max normalize to [0, 1]. A constant input maps to all zeros via
/// the ε-guarded denominator.
fn minmax_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    values.iter().map(|&v| (v - min) / (max - min + EPS)).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Cosine similarity `dot / (‖a‖·‖b‖ + ε)`. The ε keeps a zero vector at
/// similarity 0 instead of NaN.
fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    dot(a, b) / (norm(a) * norm(b) + EPS)
}

/// Spectral angle in radians. The ε-guarded cosine never leaves [-1, 1],
/// so the arccos is always defined.
fn spectral_angle(a: &[f64], b: &[f64]) -> f64 {
    (dot(a, b) / (norm(a) * norm(b) + EPS)).acos()
}

/// Index of the wavelength closest to `target`.
fn nearest_index(wavelengths: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &wl) in wavelengths.iter().enumerate() {
        let d = (wl - target).abs();
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Shannon entropy of the ε-shifted spectrum, natural log, computed on
/// the raw (not probability-normalized) vector.
fn shifted_entropy(spectrum: &[f64]) -> f64 {
    -spectrum.iter().map(|&v| (v + EPS) * (v + EPS).ln()).sum::<f64>()
}

/// Population variance (ddof = 0).
fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

// ── Unit tests ───────────────────────────────────────────────────────────────
