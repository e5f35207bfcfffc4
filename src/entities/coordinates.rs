use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{validation_error, Error};

/// A point in display order (latitude first).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(validation_error("latitude out of range"));
        }

        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(validation_error("longitude out of range"));
        }

        Ok(())
    }

    /// Directions query form, longitude first.
    pub fn to_lng_lat(&self) -> String {
        format!("{},{}", self.lng, self.lat)
    }
}

impl From<[f64; 2]> for Coordinates {
    /// Provider pairs come as `[lng, lat]`.
    fn from(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lng: pair[0],
        }
    }
}

impl FromStr for Coordinates {
    type Err = Error;

    /// Parses the `lng,lat` query form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lng, lat) = s
            .split_once(',')
            .ok_or_else(|| validation_error("expected lng,lat"))?;

        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| validation_error("invalid longitude"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| validation_error("invalid latitude"))?;

        let coordinates = Self { lat, lng };
        coordinates.validate()?;

        Ok(coordinates)
    }
}

#[test]
fn lng_lat_query_form_round_trips() {
    let madrid = Coordinates::new(40.4168, -3.7038);

    assert_eq!(madrid.to_lng_lat(), "-3.7038,40.4168");
    assert_eq!("-3.7038,40.4168".parse::<Coordinates>().unwrap(), madrid);
}

#[test]
fn malformed_query_form_is_rejected() {
    assert!("40.4168".parse::<Coordinates>().is_err());
    assert!("abc,40.0".parse::<Coordinates>().is_err());
    assert!("10.0,95.0".parse::<Coordinates>().is_err());
    assert!("200.0,10.0".parse::<Coordinates>().is_err());
}

#[test]
fn provider_pairs_swap_axis_order() {
    let point: Coordinates = [-3.7038, 40.4168].into();

    assert_eq!(point.lat, 40.4168);
    assert_eq!(point.lng, -3.7038);
}
