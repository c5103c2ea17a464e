//! Recorded GPS track replayed as a location provider.
//!
//! CSV columns: `latitude,longitude[,bearing]`. A missing bearing is derived
//! from the previous point. Fixes are paced at the request interval divided
//! by the replay speed; timestamps advance by the request interval per fix so
//! replay speed never trips the fastest-interval filter.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{NavError, Result};
use crate::geo::{initial_bearing, normalize_bearing};
use crate::location::source::{LocationRequest, LocationSource};
use crate::model::{LatLng, LocationSample};

#[derive(Debug, Deserialize)]
struct TrackRow {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    bearing: Option<f32>,
}

#[derive(Debug, Clone)]
struct TrackPoint {
    position: LatLng,
    bearing: f32,
}

pub struct CsvTrackSource {
    points: Vec<TrackPoint>,
    cursor: usize,
    speed: f64,
    pace: Duration,
    step: Duration,
    next_due: Option<Instant>,
    started_at: DateTime<Utc>,
}

impl CsvTrackSource {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| NavError::Track(format!("Unable to open {}: {e}", path.display())))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut points: Vec<TrackPoint> = Vec::new();
        for (line, row) in rdr.deserialize::<TrackRow>().enumerate() {
            let row = row?;
            let position = LatLng::new(row.latitude, row.longitude);
            if !position.is_valid() {
                return Err(NavError::Track(format!(
                    "row {}: coordinate out of range ({position})",
                    line + 1
                )));
            }
            let bearing = match (row.bearing, points.last()) {
                (Some(b), _) => normalize_bearing(b),
                (None, Some(prev)) => initial_bearing(prev.position, position),
                (None, None) => 0.0,
            };
            points.push(TrackPoint { position, bearing });
        }

        if points.is_empty() {
            return Err(NavError::Track("track has no points".to_string()));
        }

        Ok(Self {
            points,
            cursor: 0,
            speed: 1.0,
            pace: Duration::ZERO,
            step: Duration::ZERO,
            next_due: None,
            started_at: Utc::now(),
        })
    }

    /// Replay faster (`> 1.0`) or slower than real time.
    pub fn with_speed(mut self, speed: f64) -> Self {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start_position(&self) -> LatLng {
        self.points[0].position
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.points.len()
    }

    /// Wall-clock time needed to replay the whole track at `request`'s cadence.
    pub fn replay_duration(&self, request: &LocationRequest) -> Duration {
        request.interval.div_f64(self.speed) * self.points.len() as u32
    }
}

impl LocationSource for CsvTrackSource {
    fn open(&mut self, request: &LocationRequest) -> Result<()> {
        self.cursor = 0;
        self.step = request.interval;
        self.pace = request.interval.div_f64(self.speed);
        self.next_due = Some(Instant::now());
        self.started_at = Utc::now();
        Ok(())
    }

    fn next_fix(&mut self, timeout: Duration) -> Result<Option<LocationSample>> {
        let Some(point) = self.points.get(self.cursor) else {
            // end of track: behave like a provider with no new fixes
            thread::sleep(timeout);
            return Ok(None);
        };

        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            let wait = due - now;
            if wait > timeout {
                thread::sleep(timeout);
                return Ok(None);
            }
            thread::sleep(wait);
        }

        let offset = chrono::Duration::from_std(self.step * self.cursor as u32)
            .map_err(|e| NavError::Track(e.to_string()))?;
        let sample = LocationSample::new(
            point.position.latitude,
            point.position.longitude,
            point.bearing,
            self.started_at + offset,
        );

        self.cursor += 1;
        self.next_due = Some(due + self.pace);
        Ok(Some(sample))
    }

    fn close(&mut self) {
        self.next_due = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = "latitude,longitude,bearing\n45.0,7.0,10\n45.001,7.0,\n45.001,7.001,370\n";

    fn fast_request() -> LocationRequest {
        LocationRequest {
            interval: Duration::from_millis(20),
            fastest_interval: Duration::from_millis(10),
            ..LocationRequest::default()
        }
    }

    #[test]
    fn parses_rows_and_derives_missing_bearing() {
        let track = CsvTrackSource::from_reader(TRACK.as_bytes()).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.points[0].bearing, 10.0);
        // due north from the first point
        assert!(track.points[1].bearing.abs() < 1e-3);
        assert_eq!(track.points[2].bearing, 10.0);
        assert_eq!(track.start_position(), LatLng::new(45.0, 7.0));
    }

    #[test]
    fn replays_in_order_with_interval_timestamps() {
        let mut track = CsvTrackSource::from_reader(TRACK.as_bytes())
            .unwrap()
            .with_speed(4.0);
        let request = fast_request();
        track.open(&request).unwrap();

        let mut fixes = Vec::new();
        while let Some(s) = track.next_fix(Duration::from_millis(200)).unwrap() {
            fixes.push(s);
            if track.is_exhausted() {
                break;
            }
        }
        assert_eq!(fixes.len(), 3);
        assert_eq!(fixes[1].latitude, 45.001);
        let gap = (fixes[1].timestamp - fixes[0].timestamp).to_std().unwrap();
        assert_eq!(gap, request.interval);
        assert_eq!(track.next_fix(Duration::from_millis(1)).unwrap(), None);
    }

    #[test]
    fn rejects_empty_and_out_of_range_tracks() {
        assert!(matches!(
            CsvTrackSource::from_reader("latitude,longitude\n".as_bytes()),
            Err(NavError::Track(_))
        ));
        assert!(matches!(
            CsvTrackSource::from_reader("latitude,longitude\n95,7\n".as_bytes()),
            Err(NavError::Track(_))
        ));
    }
}
