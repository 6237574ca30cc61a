//! Regions: named geographic points the dashboard can focus on.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_REGION_ID: &str = "default";

/// Reference city used for the built-in region and as the geolocation fallback.
pub const REFERENCE_LAT: f64 = 41.8781;
pub const REFERENCE_LON: f64 = -87.6298;

const GEO_ID_PREFIX: &str = "geo:";
const CURRENT_LOCATION_NAME: &str = "Current location";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    #[must_use]
    pub const fn reference() -> Self {
        Self {
            lat: REFERENCE_LAT,
            lon: REFERENCE_LON,
        }
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lon(self) -> f64 {
        self.lon
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::reference()
    }
}

impl TryFrom<(f64, f64)> for Coordinate {
    type Error = CoordinateError;

    fn try_from((lat, lon): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(lat, lon)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Search picks get a timestamp suffix so two picks of the same name never collide.
    pub fn for_search(name: &str, created_at_ms: u64) -> Self {
        Self(format!("{}-{created_at_ms}", slug(name)))
    }

    /// Rounded to 3 decimals (~100 m) so repeated fixes near one spot share an id.
    pub fn for_position(coordinate: Coordinate) -> Self {
        Self(format!(
            "{GEO_ID_PREFIX}{:.3},{:.3}",
            coordinate.lat(),
            coordinate.lon()
        ))
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_REGION_ID
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A saved or candidate region. Serialized as-is under the `regions` storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub admin: Option<String>,
}

impl Region {
    pub fn new(
        id: RegionId,
        name: impl Into<String>,
        label: impl Into<String>,
        coordinate: Coordinate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            label: label.into(),
            lat: coordinate.lat(),
            lon: coordinate.lon(),
            country: None,
            admin: None,
        }
    }

    #[must_use]
    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = country;
        self
    }

    #[must_use]
    pub fn with_admin(mut self, admin: Option<String>) -> Self {
        self.admin = admin;
        self
    }

    /// The single built-in region seeded when nothing else is selectable.
    pub fn builtin_default() -> Self {
        Self::new(
            RegionId::new(DEFAULT_REGION_ID),
            "Chicago",
            "Chicago, IL",
            Coordinate::reference(),
        )
        .with_country(Some("US".into()))
        .with_admin(Some("Illinois".into()))
    }

    pub fn from_position(coordinate: Coordinate) -> Self {
        Self::new(
            RegionId::for_position(coordinate),
            CURRENT_LOCATION_NAME,
            format!("{CURRENT_LOCATION_NAME} ({:.3}, {:.3})", coordinate.lat(), coordinate.lon()),
            coordinate,
        )
    }

    /// Coordinates of a record that came through a validated constructor, or
    /// the validation error for a record read back from storage.
    pub fn coordinate(&self) -> Result<Coordinate, CoordinateError> {
        Coordinate::new(self.lat, self.lon)
    }

    pub fn is_valid(&self) -> bool {
        !self.id.as_str().trim().is_empty() && self.coordinate().is_ok()
    }
}

/// `"Portland, OR"` -> `"portland-or"`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        out.push_str("place");
    }
    out
}
