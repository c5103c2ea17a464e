use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// `lat,lng` with six decimals, the form the directions endpoint expects.
impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Position shown before the first real fix arrives.
///
/// Location sources never emit it; `NavigationState::has_fix` tells the two apart.
pub const FALLBACK_LOCATION: LatLng = LatLng::new(37.421_998_3, -122.084);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub bearing_degrees: f32,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, bearing_degrees: f32, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            bearing_degrees,
            timestamp,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: i64,
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl PointOfInterest {
    pub const UNNAMED: &'static str = "Unnamed gym";

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(Self::UNNAMED)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteResult {
    /// Ordered driving path, origin first.
    pub path: Vec<LatLng>,
    /// Human readable duration, passed through from the directions service.
    pub eta_text: String,
    /// Human readable distance, passed through from the directions service.
    pub distance_text: String,
}

impl RouteResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn origin(&self) -> Option<LatLng> {
        self.path.first().copied()
    }
}
