use std::time::Duration;

use crate::config::LocationConfig;
use crate::error::Result;
use crate::model::LocationSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPriority {
    HighAccuracy,
    Balanced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationRequest {
    /// Target cadence.
    pub interval: Duration,
    /// Samples closer together than this are dropped.
    pub fastest_interval: Duration,
    pub priority: LocationPriority,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self::from(&LocationConfig::default())
    }
}

impl From<&LocationConfig> for LocationRequest {
    fn from(config: &LocationConfig) -> Self {
        Self {
            interval: config.interval(),
            fastest_interval: config.fastest_interval(),
            priority: if config.high_accuracy {
                LocationPriority::HighAccuracy
            } else {
                LocationPriority::Balanced
            },
        }
    }
}

/// Platform location provider.
///
/// Driven exclusively from the tracking thread, so implementations need
/// `Send` but not `Sync`.
pub trait LocationSource: Send {
    fn open(&mut self, request: &LocationRequest) -> Result<()>;

    /// Blocks until the next fix or until `timeout` elapses (`Ok(None)`).
    fn next_fix(&mut self, timeout: Duration) -> Result<Option<LocationSample>>;

    fn close(&mut self);
}
