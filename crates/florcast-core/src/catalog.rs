//! In-memory plant catalog: CRUD over observation records plus simple
//! statistics and great-circle proximity search. Process-lifetime only;
//! persistence is out of scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius (km) for the haversine distance.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A catalogued plant observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: u64,
    pub scientific_name: String,
    pub common_name: String,
    pub family: String,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub height_cm: Option<f64>,
    pub bloom_season: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantCreate {
    pub scientific_name: String,
    pub common_name: String,
    pub family: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub bloom_season: Option<String>,
}

/// Partial update; unset fields keep their current values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantUpdate {
    pub scientific_name: Option<String>,
    pub common_name: Option<String>,
    pub family: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub height_cm: Option<f64>,
    pub bloom_season: Option<String>,
}

/// Height distribution over the records carrying a height.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HeightStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation (ddof = 1); None with fewer than two
    /// measured heights.
    pub std: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatistics {
    pub total_plants: usize,
    pub families_count: usize,
    pub height: Option<HeightStats>,
}

/// A proximity-search hit, sorted ascending by distance.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyPlant {
    pub plant: Plant,
    pub distance_km: f64,
}

#[derive(Debug, Clone)]
pub struct PlantCatalog {
    plants: Vec<Plant>,
    next_id: u64,
}

impl Default for PlantCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PlantCatalog {
    pub fn new() -> Self {
        Self { plants: Vec::new(), next_id: 1 }
    }

    /// A catalog seeded with a few demonstration records.
    pub fn with_sample_data() -> Self {
        let mut catalog = Self::new();
        for plant in sample_plants() {
            catalog.create(plant);
        }
        catalog
    }

    pub fn all(&self) -> &[Plant] {
        &self.plants
    }

    pub fn get(&self, id: u64) -> Option<&Plant> {
        self.plants.iter().find(|p| p.id == id)
    }

    pub fn create(&mut self, data: PlantCreate) -> &Plant {
        let now = Utc::now();
        let plant = Plant {
            id: self.next_id,
            scientific_name: data.scientific_name,
            common_name: data.common_name,
            family: data.family,
            description: data.description,
            latitude: data.latitude,
            longitude: data.longitude,
            location_name: data.location_name,
            height_cm: data.height_cm,
            bloom_season: data.bloom_season,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        self.plants.push(plant);
        self.plants.last().unwrap()
    }

    /// Apply a partial update. Returns the updated record, or None for an
    /// unknown id.
    pub fn update(&mut self, id: u64, update: PlantUpdate) -> Option<&Plant> {
        let plant = self.plants.iter_mut().find(|p| p.id == id)?;
        if let Some(v) = update.scientific_name {
            plant.scientific_name = v;
        }
        if let Some(v) = update.common_name {
            plant.common_name = v;
        }
        if let Some(v) = update.family {
            plant.family = v;
        }
        if let Some(v) = update.description {
            plant.description = Some(v);
        }
        if let Some(v) = update.latitude {
            plant.latitude = Some(v);
        }
        if let Some(v) = update.longitude {
            plant.longitude = Some(v);
        }
        if let Some(v) = update.location_name {
            plant.location_name = Some(v);
        }
        if let Some(v) = update.height_cm {
            plant.height_cm = Some(v);
        }
        if let Some(v) = update.bloom_season {
            plant.bloom_season = Some(v);
        }
        plant.updated_at = Utc::now();
        Some(plant)
    }

    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.plants.len();
        self.plants.retain(|p| p.id != id);
        self.plants.len() < before
    }

    pub fn statistics(&self) -> CatalogStatistics {
        let mut families: Vec<&str> = self.plants.iter().map(|p| p.family.as_str()).collect();
        families.sort_unstable();
        families.dedup();

        let heights: Vec<f64> = self.plants.iter().filter_map(|p| p.height_cm).collect();
        let height = if heights.is_empty() {
            None
        } else {
            let mean = heights.iter().sum::<f64>() / heights.len() as f64;
            let std = if heights.len() > 1 {
                let var = heights.iter().map(|h| (h - mean).powi(2)).sum::<f64>()
                    / (heights.len() - 1) as f64;
                Some(var.sqrt())
            } else {
                None
            };
            Some(HeightStats {
                min: heights.iter().cloned().fold(f64::INFINITY, f64::min),
                max: heights.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                mean,
                std,
            })
        };

        CatalogStatistics {
            total_plants: self.plants.len(),
            families_count: families.len(),
            height,
        }
    }

    /// Plants with coordinates within `radius_km` of the target, sorted
    /// ascending by distance (rounded to 2 decimals for reporting).
    pub fn nearby(&self, latitude: f64, longitude: f64, radius_km: f64) -> Vec<NearbyPlant> {
        let mut hits: Vec<NearbyPlant> = self
            .plants
            .iter()
            .filter_map(|plant| {
                let (lat, lng) = (plant.latitude?, plant.longitude?);
                let distance = haversine_km(latitude, longitude, lat, lng);
                (distance <= radius_km).then(|| NearbyPlant {
                    plant: plant.clone(),
                    distance_km: (distance * 100.0).round() / 100.0,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        hits
    }
}

/// Great-circle distance between two (lat, lng) pairs in degrees.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (la1, la2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + la1.cos() * la2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

fn sample_plants() -> Vec<PlantCreate> {
    vec![
        PlantCreate {
            scientific_name: "Rosa rubiginosa".into(),
            common_name: "Sweet Briar Rose".into(),
            family: "Rosaceae".into(),
            description: Some(
                "A species of wild rose with fragrant foliage and pink flowers".into(),
            ),
            latitude: Some(51.5074),
            longitude: Some(-0.1278),
            location_name: Some("London, UK".into()),
            height_cm: Some(200.0),
            bloom_season: Some("Spring-Summer".into()),
        },
        PlantCreate {
            scientific_name: "Sequoiadendron giganteum".into(),
            common_name: "Giant Sequoia".into(),
            family: "Cupressaceae".into(),
            description: Some("One of the largest and longest-living trees on Earth".into()),
            latitude: Some(36.4864),
            longitude: Some(-118.5658),
            location_name: Some("Sequoia National Park, USA".into()),
            height_cm: Some(8000.0),
            bloom_season: Some("Winter-Spring".into()),
        },
        PlantCreate {
            scientific_name: "Lavandula angustifolia".into(),
            common_name: "English Lavender".into(),
            family: "Lamiaceae".into(),
            description: Some(
                "Aromatic flowering plant widely cultivated for its fragrant flowers".into(),
            ),
            latitude: Some(43.6108),
            longitude: Some(3.8767),
            location_name: Some("Montpellier, France".into()),
            height_cm: Some(60.0),
            bloom_season: Some("Summer".into()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bare(name: &str, family: &str) -> PlantCreate {
        PlantCreate {
            scientific_name: name.into(),
            common_name: name.into(),
            family: family.into(),
            description: None,
            latitude: None,
            longitude: None,
            location_name: None,
            height_cm: None,
            bloom_season: None,
        }
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let mut catalog = PlantCatalog::new();
        let first = catalog.create(bare("a", "fam")).id;
        let second = catalog.create(bare("b", "fam")).id;
        assert_eq!((first, second), (1, 2));
        assert_eq!(catalog.all().len(), 2);
    }

    #[test]
    fn get_update_delete_round_trip() {
        let mut catalog = PlantCatalog::with_sample_data();
        assert_eq!(catalog.get(1).unwrap().common_name, "Sweet Briar Rose");

        let updated = catalog
            .update(1, PlantUpdate { height_cm: Some(250.0), ..Default::default() })
            .unwrap();
        assert_eq!(updated.height_cm, Some(250.0));
        // Untouched fields survive a partial update.
        assert_eq!(updated.scientific_name, "Rosa rubiginosa");
        assert!(updated.updated_at >= updated.created_at);

        assert!(catalog.delete(1));
        assert!(catalog.get(1).is_none());
        assert!(!catalog.delete(1));
    }

    #[test]
    fn update_unknown_id_returns_none() {
        let mut catalog = PlantCatalog::new();
        assert!(catalog.update(99, PlantUpdate::default()).is_none());
    }

    #[test]
    fn statistics_over_sample_data() {
        let stats = PlantCatalog::with_sample_data().statistics();
        assert_eq!(stats.total_plants, 3);
        assert_eq!(stats.families_count, 3);
        let height = stats.height.unwrap();
        assert_eq!(height.min, 60.0);
        assert_eq!(height.max, 8000.0);
        assert_relative_eq!(height.mean, 2753.3333333333335, epsilon = 1e-9);
        assert_relative_eq!(height.std.unwrap(), 4544.285789134892, epsilon = 1e-6);
    }

    #[test]
    fn statistics_without_heights() {
        let mut catalog = PlantCatalog::new();
        catalog.create(bare("x", "fam"));
        let stats = catalog.statistics();
        assert_eq!(stats.total_plants, 1);
        assert!(stats.height.is_none());
    }

    #[test]
    fn haversine_matches_reference_distances() {
        // London → Paris.
        let d = haversine_km(51.5074, -0.1278, 48.8566, 2.3522);
        assert_relative_eq!(d, 343.55653488088313, epsilon = 1e-6);
        assert_eq!(haversine_km(46.0, 8.0, 46.0, 8.0), 0.0);
    }

    #[test]
    fn nearby_filters_by_radius_and_sorts_by_distance() {
        let catalog = PlantCatalog::with_sample_data();

        // From London: rose at 0 km, lavender ~928 km, sequoia ~8548 km.
        let hits = catalog.nearby(51.5074, -0.1278, 1000.0);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].plant.common_name, "Sweet Briar Rose");
        assert_eq!(hits[0].distance_km, 0.0);
        assert_eq!(hits[1].plant.common_name, "English Lavender");
        assert_relative_eq!(hits[1].distance_km, 927.69, epsilon = 1e-9);

        let all = catalog.nearby(51.5074, -0.1278, 10_000.0);
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn nearby_skips_records_without_coordinates() {
        let mut catalog = PlantCatalog::new();
        catalog.create(bare("no-coords", "fam"));
        assert!(catalog.nearby(0.0, 0.0, 20_000.0).is_empty());
    }
}
