//! Configuration loading for gym_nav

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{NavError, Result};
use crate::model::{FALLBACK_LOCATION, LatLng};
use crate::paths::ensure_parent_dir;

/// Overrides `directions.api_key` when set and non-empty.
pub const API_KEY_ENV: &str = "GYM_NAV_DIRECTIONS_API_KEY";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NavConfig {
    #[serde(default)]
    pub poi: PoiConfig,
    #[serde(default)]
    pub directions: DirectionsConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Overpass POI search
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoiConfig {
    #[serde(default = "default_poi_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Whole-request budget once connected.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    #[serde(default = "default_radius")]
    pub default_radius_m: u32,

    /// Honour HTTP(S)_PROXY from the environment.
    #[serde(default = "default_true")]
    pub use_system_proxy: bool,
}

/// Driving directions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionsConfig {
    #[serde(default = "default_directions_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub use_system_proxy: bool,
}

/// Location stream cadence and the tracking notification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_fastest_interval_ms")]
    pub fastest_interval_ms: u64,

    #[serde(default = "default_true")]
    pub high_accuracy: bool,

    #[serde(default = "default_channel_id")]
    pub notification_channel_id: String,

    #[serde(default = "default_notification_title")]
    pub notification_title: String,

    #[serde(default = "default_notification_text")]
    pub notification_text: String,
}

/// Camera perspectives and route styling
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_driving_zoom")]
    pub driving_zoom: f32,

    #[serde(default = "default_driving_tilt")]
    pub driving_tilt: f32,

    #[serde(default = "default_overview_zoom")]
    pub overview_zoom: f32,

    /// Camera is considered on target within this many metres.
    #[serde(default = "default_follow_epsilon")]
    pub follow_epsilon_m: f64,

    /// Heading changes below this many degrees do not re-rotate the camera.
    #[serde(default = "default_bearing_epsilon")]
    pub bearing_epsilon_deg: f32,

    /// ARGB
    #[serde(default = "default_route_color")]
    pub route_color: u32,

    #[serde(default = "default_route_width")]
    pub route_width: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_fallback_latitude")]
    pub fallback_latitude: f64,

    #[serde(default = "default_fallback_longitude")]
    pub fallback_longitude: f64,
}

impl Default for PoiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_poi_endpoint(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            default_radius_m: default_radius(),
            use_system_proxy: default_true(),
        }
    }
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_directions_endpoint(),
            api_key: None,
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            use_system_proxy: default_true(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            fastest_interval_ms: default_fastest_interval_ms(),
            high_accuracy: default_true(),
            notification_channel_id: default_channel_id(),
            notification_title: default_notification_title(),
            notification_text: default_notification_text(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            driving_zoom: default_driving_zoom(),
            driving_tilt: default_driving_tilt(),
            overview_zoom: default_overview_zoom(),
            follow_epsilon_m: default_follow_epsilon(),
            bearing_epsilon_deg: default_bearing_epsilon(),
            route_color: default_route_color(),
            route_width: default_route_width(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fallback_latitude: default_fallback_latitude(),
            fallback_longitude: default_fallback_longitude(),
        }
    }
}

impl NavConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            NavError::Config(format!("Unable to read {}: {e}", path.display()))
        })?;
        let config: NavConfig = serde_json::from_str(&raw)
            .map_err(|e| NavError::Config(format!("Invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Missing file means defaults; an unreadable or invalid file is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| NavError::Config(format!("Unable to serialize config: {e}")))?;
        std::fs::write(path, json).map_err(|e| {
            NavError::Config(format!("Unable to write {}: {e}", path.display()))
        })?;
        Ok(())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            self.directions.api_key = Some(key.trim().to_string());
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.poi.endpoint.trim().is_empty() {
            return Err(NavError::Config("poi.endpoint must not be empty".into()));
        }
        if self.directions.endpoint.trim().is_empty() {
            return Err(NavError::Config("directions.endpoint must not be empty".into()));
        }
        if self.poi.connect_timeout_secs == 0 || self.poi.read_timeout_secs == 0 {
            return Err(NavError::Config("poi timeouts must be > 0".into()));
        }
        if self.directions.connect_timeout_secs == 0 || self.directions.read_timeout_secs == 0 {
            return Err(NavError::Config("directions timeouts must be > 0".into()));
        }
        if self.poi.default_radius_m == 0 {
            return Err(NavError::Config("poi.default_radius_m must be > 0".into()));
        }
        if self.location.interval_ms == 0 || self.location.fastest_interval_ms == 0 {
            return Err(NavError::Config("location intervals must be > 0".into()));
        }
        if self.location.fastest_interval_ms > self.location.interval_ms {
            return Err(NavError::Config(format!(
                "location.fastest_interval_ms ({}) must not exceed location.interval_ms ({})",
                self.location.fastest_interval_ms, self.location.interval_ms
            )));
        }
        if !self.session.fallback_location().is_valid() {
            return Err(NavError::Config("session fallback location is out of range".into()));
        }
        Ok(())
    }
}

impl PoiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl DirectionsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl LocationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn fastest_interval(&self) -> Duration {
        Duration::from_millis(self.fastest_interval_ms)
    }
}

impl SessionConfig {
    pub fn fallback_location(&self) -> LatLng {
        LatLng::new(self.fallback_latitude, self.fallback_longitude)
    }
}

// Default value functions
fn default_poi_endpoint() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}
fn default_directions_endpoint() -> String {
    "https://maps.googleapis.com/maps/api/directions/json".to_string()
}
fn default_connect_timeout() -> u64 {
    15
}
fn default_read_timeout() -> u64 {
    20
}
fn default_radius() -> u32 {
    2000
}
fn default_interval_ms() -> u64 {
    1500
}
fn default_fastest_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_channel_id() -> String {
    "gym_nav_tracking".to_string()
}
fn default_notification_title() -> String {
    "Navigating to your gym".to_string()
}
fn default_notification_text() -> String {
    "Location tracking is active".to_string()
}
fn default_driving_zoom() -> f32 {
    18.0
}
fn default_driving_tilt() -> f32 {
    45.0
}
fn default_overview_zoom() -> f32 {
    14.0
}
fn default_follow_epsilon() -> f64 {
    0.5
}
fn default_bearing_epsilon() -> f32 {
    1.0
}
fn default_route_color() -> u32 {
    0xFF42_85F4
}
fn default_route_width() -> f32 {
    12.0
}
fn default_fallback_latitude() -> f64 {
    FALLBACK_LOCATION.latitude
}
fn default_fallback_longitude() -> f64 {
    FALLBACK_LOCATION.longitude
}
