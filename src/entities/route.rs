use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// Driving path between two selected markers. Transient, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub coordinates: Vec<Coordinates>,
}

impl Route {
    pub fn new(distance_meters: f64, duration_seconds: f64, coordinates: Vec<Coordinates>) -> Self {
        Self {
            distance_meters,
            duration_seconds,
            coordinates,
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn duration_minutes(&self) -> u64 {
        (self.duration_seconds / 60.0).round() as u64
    }
}

#[test]
fn display_units() {
    let route = Route::new(12_345.0, 1_530.0, vec![]);

    assert_eq!(format!("{:.2}", route.distance_km()), "12.35");
    assert_eq!(route.duration_minutes(), 26);
}
