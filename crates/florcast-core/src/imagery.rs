//! Reflectance sample acquisition.
//!
//! The detector only needs a 3-band sample per (lat, lng, date); where it
//! comes from is a collaborator concern behind [`ReflectanceSource`].
//! [`SyntheticImagery`] is the built-in fallback: seasonal and geographic
//! bloom patterns with a small reproducible jitter, standing in for real
//! satellite pixels when no provider is wired up.

use std::collections::hash_map::DefaultHasher;
use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::spectral::ColorSample;

#[derive(Debug, Error)]
pub enum ImageryError {
    #[error("imagery unavailable for ({lat:.4}, {lng:.4}) on {date}: {reason}")]
    Unavailable { lat: f64, lng: f64, date: NaiveDate, reason: String },
}

/// Supplier of a 3-band reflectance sample for a point and date.
/// `Sync` so the scan fan-out can share one source across workers.
pub trait ReflectanceSource: Sync {
    fn sample(&self, lat: f64, lng: f64, date: NaiveDate) -> Result<ColorSample, ImageryError>;
}

/// Deterministic synthetic imagery with seasonal and geographic bloom
/// patterns. The same (lat, lng, date) always yields the same sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticImagery;

impl SyntheticImagery {
    pub fn new() -> Self {
        Self
    }

    /// Annual bloom sine, bottoming out in March and peaking in
    /// September.
    fn seasonal_factor(date: NaiveDate) -> f64 {
        let month = date.month() as f64;
        0.3 + 0.5 * ((month - 6.0) * PI / 6.0).sin()
    }

    /// (base green reflectance, flower boost) for known bloom regions.
    fn region_profile(lat: f64, lng: f64) -> (f64, f64) {
        if (45.0..48.0).contains(&lat) && (5.0..15.0).contains(&lng) {
            (0.6, 0.3) // Alpine meadows
        } else if (33.0..35.0).contains(&lat) && (-120.0..-117.0).contains(&lng) {
            (0.65, 0.4) // California poppy fields
        } else if (52.0..53.0).contains(&lat) && (4.0..6.0).contains(&lng) {
            (0.7, 0.35) // Dutch tulip belt
        } else {
            (0.4, 0.15)
        }
    }

    fn jitter_rng(lat: f64, lng: f64, date: NaiveDate) -> StdRng {
        let mut hasher = DefaultHasher::new();
        lat.to_bits().hash(&mut hasher);
        lng.to_bits().hash(&mut hasher);
        date.hash(&mut hasher);
        StdRng::seed_from_u64(hasher.finish() ^ 0x6F10_8CA3_55D2_91BE)
    }
}

impl ReflectanceSource for SyntheticImagery {
    fn sample(&self, lat: f64, lng: f64, date: NaiveDate) -> Result<ColorSample, ImageryError> {
        let seasonal = Self::seasonal_factor(date);
        let (base_green, boost) = Self::region_profile(lat, lng);
        let spatial = (lat * 10.0).sin() * (lng * 10.0).cos() * 0.2;

        let mut rng = Self::jitter_rng(lat, lng, date);
        let mut jitter = || rng.gen_range(-0.02..0.02);

        let red = (0.3 + spatial * 0.7 + boost * 0.5 * seasonal + jitter()).clamp(0.1, 0.9);
        let green = (base_green + spatial + boost * seasonal + jitter()).clamp(0.2, 0.95);
        let blue = (0.25 + spatial * 0.5 + boost * 0.3 * seasonal + jitter()).clamp(0.1, 0.8);

        Ok(ColorSample::new(red, green, blue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn same_point_and_date_is_reproducible() {
        let source = SyntheticImagery::new();
        let a = source.sample(46.5, 8.0, date(2023, 6, 15)).unwrap();
        let b = source.sample(46.5, 8.0, date(2023, 6, 15)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_dates_differ() {
        let source = SyntheticImagery::new();
        let june = source.sample(46.5, 8.0, date(2023, 6, 15)).unwrap();
        let december = source.sample(46.5, 8.0, date(2023, 12, 15)).unwrap();
        assert_ne!(june, december);
    }

    #[test]
    fn channels_stay_in_sensor_range() {
        let source = SyntheticImagery::new();
        for lat in [-60.0, -10.0, 0.0, 34.2, 46.5, 52.3, 80.0] {
            for lng in [-150.0, -118.3, 5.1, 8.4, 120.0] {
                let s = source.sample(lat, lng, date(2023, 6, 15)).unwrap();
                assert!((0.1..=0.9).contains(&s.red));
                assert!((0.2..=0.95).contains(&s.green));
                assert!((0.1..=0.8).contains(&s.blue));
            }
        }
    }

    #[test]
    fn seasonal_factor_follows_annual_sine() {
        let september = SyntheticImagery::seasonal_factor(date(2023, 9, 1));
        let june = SyntheticImagery::seasonal_factor(date(2023, 6, 1));
        let march = SyntheticImagery::seasonal_factor(date(2023, 3, 1));
        assert_relative_eq!(september, 0.8, epsilon = 1e-12);
        assert_relative_eq!(june, 0.3, epsilon = 1e-12);
        assert_relative_eq!(march, -0.2, epsilon = 1e-12);
    }

    #[test]
    fn known_bloom_regions_have_elevated_base_green() {
        assert_eq!(SyntheticImagery::region_profile(46.5, 8.0), (0.6, 0.3));
        assert_eq!(SyntheticImagery::region_profile(34.1, -118.3), (0.65, 0.4));
        assert_eq!(SyntheticImagery::region_profile(52.3, 5.0), (0.7, 0.35));
        assert_eq!(SyntheticImagery::region_profile(0.0, 0.0), (0.4, 0.15));
    }
}
