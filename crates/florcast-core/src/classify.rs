//! Coverage classification: two independent step functions mapping the
//! predicted coverage scalar to a category label and a render intensity.
//! Boundaries are inclusive on the lower bound.

use serde::{Deserialize, Serialize};

/// Discrete coverage category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageCategory {
    None,
    Sparse,
    Moderate,
    Dense,
    VeryDense,
}

impl CoverageCategory {
    /// Thresholds: 0.05 / 0.2 / 0.5 / 0.8.
    pub fn from_coverage(coverage: f64) -> Self {
        if coverage < 0.05 {
            Self::None
        } else if coverage < 0.2 {
            Self::Sparse
        } else if coverage < 0.5 {
            Self::Moderate
        } else if coverage < 0.8 {
            Self::Dense
        } else {
            Self::VeryDense
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sparse => "sparse",
            Self::Moderate => "moderate",
            Self::Dense => "dense",
            Self::VeryDense => "very_dense",
        }
    }
}

/// Discrete intensity level used for map colorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloomIntensity {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl BloomIntensity {
    /// Thresholds: 0.1 / 0.2 / 0.5 / 0.8.
    pub fn from_coverage(coverage: f64) -> Self {
        if coverage < 0.1 {
            Self::None
        } else if coverage < 0.2 {
            Self::Low
        } else if coverage < 0.5 {
            Self::Medium
        } else if coverage < 0.8 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }

    /// Fixed swatch consumed by the map renderer.
    pub fn color(&self) -> &'static str {
        match self {
            Self::None => "#444444",
            Self::Low => "#FFEB3B",
            Self::Medium => "#FF9800",
            Self::High => "#F44336",
            Self::VeryHigh => "#8B0000",
        }
    }
}

/// Coverage scalar with its derived labels. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageResult {
    pub coverage: f64,
    pub category: CoverageCategory,
    pub intensity: BloomIntensity,
}

/// Classify a coverage scalar. Total over all floats.
pub fn classify(coverage: f64) -> CoverageResult {
    CoverageResult {
        coverage,
        category: CoverageCategory::from_coverage(coverage),
        intensity: BloomIntensity::from_coverage(coverage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn category_boundaries_are_lower_inclusive() {
        use CoverageCategory::*;
        for (boundary, below, at) in [
            (0.05, None, Sparse),
            (0.2, Sparse, Moderate),
            (0.5, Moderate, Dense),
            (0.8, Dense, VeryDense),
        ] {
            assert_eq!(CoverageCategory::from_coverage(boundary - EPS), below);
            assert_eq!(CoverageCategory::from_coverage(boundary), at);
            assert_eq!(CoverageCategory::from_coverage(boundary + EPS), at);
        }
    }

    #[test]
    fn intensity_boundaries_are_lower_inclusive() {
        use BloomIntensity::*;
        for (boundary, below, at) in [
            (0.1, None, Low),
            (0.2, Low, Medium),
            (0.5, Medium, High),
            (0.8, High, VeryHigh),
        ] {
            assert_eq!(BloomIntensity::from_coverage(boundary - EPS), below);
            assert_eq!(BloomIntensity::from_coverage(boundary), at);
            assert_eq!(BloomIntensity::from_coverage(boundary + EPS), at);
        }
    }

    #[test]
    fn labels_are_monotone_in_coverage() {
        let mut prev_cat = CoverageCategory::None;
        let mut prev_int = BloomIntensity::None;
        let rank_cat = |c: CoverageCategory| c as u8;
        let rank_int = |i: BloomIntensity| i as u8;
        for step in 0..=1000 {
            let c = step as f64 / 1000.0;
            let cat = CoverageCategory::from_coverage(c);
            let int = BloomIntensity::from_coverage(c);
            assert!(rank_cat(cat) >= rank_cat(prev_cat));
            assert!(rank_int(int) >= rank_int(prev_int));
            prev_cat = cat;
            prev_int = int;
        }
    }

    #[test]
    fn zero_coverage_maps_to_none_with_grey_swatch() {
        let r = classify(0.0);
        assert_eq!(r.category, CoverageCategory::None);
        assert_eq!(r.intensity, BloomIntensity::None);
        assert_eq!(r.intensity.color(), "#444444");
    }

    #[test]
    fn serde_labels_use_snake_case() {
        assert_eq!(
            serde_json::to_string(&CoverageCategory::VeryDense).unwrap(),
            "\"very_dense\""
        );
        assert_eq!(
            serde_json::to_string(&BloomIntensity::VeryHigh).unwrap(),
            "\"very_high\""
        );
    }

    #[test]
    fn intensity_swatches_match_renderer_palette() {
        use BloomIntensity::*;
        assert_eq!(Low.color(), "#FFEB3B");
        assert_eq!(Medium.color(), "#FF9800");
        assert_eq!(High.color(), "#F44336");
        assert_eq!(VeryHigh.color(), "#8B0000");
    }
}
