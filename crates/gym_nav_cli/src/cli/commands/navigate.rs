//! Drives a full session from a recorded track: search around the track's
//! start, route to the chosen gym, then follow the replayed fixes.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use gym_nav_core::config::NavConfig;
use gym_nav_core::directions::{DirectionsClient, RoutePlanner};
use gym_nav_core::geo::{haversine_m, within};
use gym_nav_core::location::{
    CsvTrackSource, ForegroundNotifier, LocationRequest, LocationService, TrackingNotification,
};
use gym_nav_core::map_surface::{CameraPosition, CameraUpdate, MapSurface, Marker, Polyline};
use gym_nav_core::navigation::{NavigationController, NavigationSession, Step};
use gym_nav_core::poi::{OverpassClient, PoiFinder};
use gym_nav_core::{LatLng, LocationSample, NavigationState};

use crate::cli::color::Colors;
use crate::cli::commands::{find, route};
use crate::ui::{Style, info, progress, success, warning};
use crate::utils::formatting::{format_distance, truncate_ellipsis};

/// Close enough to call it arrived.
const ARRIVAL_RADIUS_M: f64 = 30.0;
const POLL: Duration = Duration::from_millis(250);
/// Extra time after the track should have finished replaying.
const REPLAY_GRACE: Duration = Duration::from_secs(3);

pub struct NavigateOptions {
    pub track: PathBuf,
    pub radius: u32,
    pub pick: usize,
    pub speed: f64,
    pub permission_granted: bool,
}

pub fn run(config: &NavConfig, opts: NavigateOptions) -> Result<()> {
    let track = CsvTrackSource::from_path(&opts.track)
        .with_context(|| format!("Loading track {}", opts.track.display()))?
        .with_speed(opts.speed);
    let start = track.start_position();
    let replay = track.replay_duration(&LocationRequest::from(&config.location));

    info(format!(
        "Track: {} point(s) from {start}, about {}s at {}x",
        track.len(),
        replay.as_secs(),
        opts.speed
    ));

    let finder: Arc<dyn PoiFinder> = Arc::new(OverpassClient::new(&config.poi)?);
    let planner: Arc<dyn RoutePlanner> = Arc::new(DirectionsClient::new(&config.directions)?);

    let service = LocationService::new(
        Box::new(track),
        Box::new(ConsoleNotifier),
        &config.location,
    );
    let subscription = service.subscribe();
    let controller = NavigationController::new(
        finder,
        planner,
        Box::new(service),
        TerminalSurface::default(),
        config,
    );
    let mut session = NavigationSession::new(controller, subscription);

    // the track's first point stands in for the platform's last known location
    session
        .controller_mut()
        .handle_sample(LocationSample::new(start.latitude, start.longitude, 0.0, Utc::now()));

    let search_timeout = config.poi.connect_timeout() + config.poi.read_timeout() + POLL;
    let route_timeout =
        config.directions.connect_timeout() + config.directions.read_timeout() + POLL;

    // -- find -----------------------------------------------------------
    session.controller_mut().find_nearby_gyms(opts.radius);
    drive_until(&mut session, search_timeout, |s| !s.is_searching_pois)?;
    bail_on_error(&mut session)?;

    let pois = session.controller().state().pois.clone();
    if pois.is_empty() {
        warning(format!("No gyms within {} m of {start}.", opts.radius));
        session.end();
        return Ok(());
    }

    let rows = find::by_distance(start, pois);
    let colors = Colors::new(&Style::default());
    println!();
    for (i, (poi, meters)) in rows.iter().enumerate() {
        println!(
            "{:>3}  {}  {}",
            i + 1,
            colors.gym_name(truncate_ellipsis(poi.display_name(), 32), poi.name.is_some()),
            colors.dim(format_distance(*meters))
        );
    }
    println!();

    let Some((destination, _)) = rows.get(opts.pick - 1).cloned() else {
        session.end();
        bail!(
            "--pick {} is out of range: only {} gym(s) found.",
            opts.pick,
            rows.len()
        );
    };
    info(format!("Driving to {}", destination.display_name()));

    // -- route ----------------------------------------------------------
    session.controller_mut().select_poi(destination.id);
    drive_until(&mut session, route_timeout, |s| !s.is_planning_route)?;
    bail_on_error(&mut session)?;

    let state = session.controller().state();
    if !state.has_route() {
        session.end();
        bail!("No route to {}.", destination.display_name());
    }
    route::print_route(&state.route, start, destination.position(), false);
    println!();

    // -- navigate -------------------------------------------------------
    session
        .controller_mut()
        .start_navigation(opts.permission_granted);
    if let Some(msg) = session.controller_mut().take_error() {
        warning(msg);
        session.end();
        return Ok(());
    }

    let target = destination.position();
    let arrived = follow(&mut session, target, replay + REPLAY_GRACE, &colors);

    session.controller_mut().stop_navigation();
    let remaining = haversine_m(session.controller().state().user_location, target);
    if arrived {
        success(format!("Arrived at {}", destination.display_name()));
    } else {
        warning(format!(
            "Track ended {} from {}",
            format_distance(remaining),
            destination.display_name()
        ));
    }

    session.controller_mut().clear_route();
    session.end();
    Ok(())
}

/// Prints progress for each new fix. True once within the arrival radius.
fn follow(
    session: &mut NavigationSession<TerminalSurface>,
    target: LatLng,
    budget: Duration,
    colors: &Colors,
) -> bool {
    let deadline = Instant::now() + budget;
    let mut last_seen: Option<LatLng> = None;

    while Instant::now() < deadline {
        if session.step(POLL) == Step::Ended {
            break;
        }

        let state = session.controller().state();
        if last_seen == Some(state.user_location) {
            continue;
        }
        last_seen = Some(state.user_location);

        let remaining = haversine_m(state.user_location, target);
        progress(format!(
            "{}  heading {:>3.0}°  {} to go",
            state.user_location,
            state.user_bearing,
            colors.remaining(remaining, format_distance(remaining))
        ));

        if within(state.user_location, target, ARRIVAL_RADIUS_M) {
            return true;
        }
    }
    false
}

fn drive_until(
    session: &mut NavigationSession<TerminalSurface>,
    timeout: Duration,
    mut done: impl FnMut(&NavigationState) -> bool,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !done(session.controller().state()) {
        let now = Instant::now();
        if now >= deadline {
            bail!("Timed out after {}s waiting for a response", timeout.as_secs());
        }
        session.step((deadline - now).min(POLL));
    }
    Ok(())
}

fn bail_on_error(session: &mut NavigationSession<TerminalSurface>) -> Result<()> {
    match session.controller_mut().take_error() {
        Some(msg) => {
            session.end();
            bail!(msg)
        }
        None => Ok(()),
    }
}

/// Shows the tracking notification as console lines.
struct ConsoleNotifier;

impl ForegroundNotifier for ConsoleNotifier {
    fn show(&mut self, notification: &TrackingNotification) {
        info(format!("{}: {}", notification.title, notification.text));
    }

    fn dismiss(&mut self) {
        info("Location tracking stopped");
    }
}

/// A map with nothing to draw on: keeps the camera, logs the rest.
#[derive(Default)]
struct TerminalSurface {
    camera: Option<CameraPosition>,
}

impl MapSurface for TerminalSurface {
    fn camera(&self) -> Option<CameraPosition> {
        self.camera
    }

    fn set_camera(&mut self, update: CameraUpdate) {
        let p = update.position;
        debug!(center = %p.target, zoom = p.zoom, tilt = p.tilt, bearing = p.bearing, "camera");
        self.camera = Some(p);
    }

    fn upsert_marker(&mut self, marker: Marker) {
        debug!(id = %marker.id, position = %marker.position, "marker");
    }

    fn remove_marker(&mut self, id: &str) {
        debug!(id, "marker removed");
    }

    fn set_polyline(&mut self, polyline: Polyline) {
        debug!(points = polyline.points.len(), "route drawn");
    }

    fn clear_polyline(&mut self) {
        debug!("route cleared");
    }
}
