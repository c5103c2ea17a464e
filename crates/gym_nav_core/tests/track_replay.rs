mod common;

use std::io::Write;
use std::time::Duration;

use gym_nav_core::config::LocationConfig;
use gym_nav_core::location::{CsvTrackSource, LocationService};
use gym_nav_core::{LatLng, NavError};

use crate::common::RecordingNotifier;

const TRACK: &str = "\
latitude,longitude
45.0700,7.6800
45.0710,7.6800
45.0710,7.6814
45.0720,7.6814
";

#[test]
fn recorded_track_streams_through_the_service_in_order() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(TRACK.as_bytes()).expect("write track");

    let track = CsvTrackSource::from_path(file.path())
        .expect("track")
        .with_speed(10.0);
    assert_eq!(track.len(), 4);
    assert_eq!(track.start_position(), LatLng::new(45.07, 7.68));

    let config = LocationConfig {
        interval_ms: 100,
        fastest_interval_ms: 50,
        ..Default::default()
    };
    let mut service = LocationService::new(
        Box::new(track),
        Box::new(RecordingNotifier::default()),
        &config,
    );
    let sub = service.subscribe();
    service.start(true);

    let mut seen = Vec::new();
    while let Some(s) = sub.recv_timeout(Duration::from_secs(2)) {
        let done = s.position() == LatLng::new(45.0720, 7.6814);
        seen.push(s);
        if done {
            break;
        }
    }
    service.stop();

    let last = seen.last().expect("at least one sample");
    assert_eq!(last.position(), LatLng::new(45.0720, 7.6814));
    // heading north at the end
    assert!(last.bearing_degrees < 1.0 || last.bearing_degrees > 359.0);

    // replay-1 may skip, never reorder
    for pair in seen.windows(2) {
        assert!(pair[0].timestamp < pair[1].timestamp);
    }
}

#[test]
fn missing_track_file_is_a_track_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = CsvTrackSource::from_path(&dir.path().join("nope.csv"))
        .err()
        .expect("missing file");
    assert!(matches!(err, NavError::Track(_)), "{err:?}");
}

#[test]
fn header_only_track_is_rejected() {
    let err = CsvTrackSource::from_reader("latitude,longitude\n".as_bytes())
        .err()
        .expect("empty track");
    assert!(matches!(err, NavError::Track(m) if m.contains("no points")));
}
