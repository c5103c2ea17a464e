//! Single-writer navigation controller.
//!
//! All mutation of [`NavigationState`] happens here, from one thread. Network
//! work runs on short-lived worker threads whose results come back as
//! [`NavEvent`]s; each carries the generation it was issued under and is
//! dropped if a newer request of the same kind has been made since.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{CameraConfig, NavConfig};
use crate::directions::RoutePlanner;
use crate::error::{NavError, Result};
use crate::geo;
use crate::location::{LatestSlot, LocationControl};
use crate::map_surface::{
    CameraPosition, CameraUpdate, DESTINATION_MARKER_ID, MapSurface, Marker, MarkerIcon,
    Polyline, USER_MARKER_ID, poi_marker_id,
};
use crate::model::{LatLng, LocationSample, PointOfInterest, RouteResult};
use crate::navigation::state::NavigationState;
use crate::poi::PoiFinder;

/// Completion of a request issued by the controller.
#[derive(Debug)]
pub enum NavEvent {
    PoisFound {
        generation: u64,
        center: LatLng,
        result: Result<Vec<PointOfInterest>>,
    },
    RouteFound {
        generation: u64,
        destination: PointOfInterest,
        result: Result<Option<RouteResult>>,
    },
}

/// Latest-state view handed out by [`NavigationController::watch_state`].
/// Holds at most one undelivered snapshot; an undrained watcher only ever
/// sees the newest state. Dropping it unregisters.
pub struct StateWatch {
    rx: Receiver<NavigationState>,
    _alive: Arc<()>,
}

impl StateWatch {
    pub fn try_recv(&self) -> Option<NavigationState> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<NavigationState> {
        match self.rx.recv_timeout(timeout) {
            Ok(s) => Some(s),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn receiver(&self) -> &Receiver<NavigationState> {
        &self.rx
    }
}

pub struct NavigationController<M: MapSurface> {
    state: NavigationState,
    poi_finder: Arc<dyn PoiFinder>,
    route_planner: Arc<dyn RoutePlanner>,
    tracking: Box<dyn LocationControl>,
    surface: M,
    camera: CameraConfig,
    events_tx: Sender<NavEvent>,
    events_rx: Receiver<NavEvent>,
    search_generation: u64,
    route_generation: u64,
    watchers: Vec<LatestSlot<NavigationState>>,
    ended: bool,
}

impl<M: MapSurface> NavigationController<M> {
    pub fn new(
        poi_finder: Arc<dyn PoiFinder>,
        route_planner: Arc<dyn RoutePlanner>,
        tracking: Box<dyn LocationControl>,
        surface: M,
        config: &NavConfig,
    ) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            state: NavigationState::new(config.session.fallback_location()),
            poi_finder,
            route_planner,
            tracking,
            surface,
            camera: config.camera.clone(),
            events_tx,
            events_rx,
            search_generation: 0,
            route_generation: 0,
            watchers: Vec::new(),
            ended: false,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    /// For simulating gestures on the surface; never touches navigation state.
    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.is_running()
    }

    /// Request completions, for callers that multiplex with `select!`.
    pub fn events(&self) -> &Receiver<NavEvent> {
        &self.events_rx
    }

    /// Receives the newest snapshot after every state change.
    pub fn watch_state(&mut self) -> StateWatch {
        let (slot, rx, alive) = LatestSlot::open();
        slot.offer(self.state.clone());
        self.watchers.push(slot);
        StateWatch { rx, _alive: alive }
    }

    // ---------------------------------------------------------------------
    // Intents
    // ---------------------------------------------------------------------

    /// Searches around the current user location. Last search wins.
    pub fn find_nearby_gyms(&mut self, radius_meters: u32) {
        self.search_generation += 1;
        let generation = self.search_generation;
        let center = self.state.user_location;
        let finder = Arc::clone(&self.poi_finder);

        self.state.is_searching_pois = true;
        info!(generation, radius_meters, %center, "Searching for gyms");

        let spawned = self.spawn_request("poi-search", move || NavEvent::PoisFound {
            generation,
            center,
            result: finder.find_pois(center, radius_meters),
        });
        if let Err(e) = spawned {
            self.state.is_searching_pois = false;
            self.state.error = Some(NavError::from(e).user_message());
        }
        self.notify();
    }

    /// Plans a route to one of the current results. The current destination
    /// and route stay in place until the new route resolves.
    pub fn select_poi(&mut self, poi_id: i64) {
        let Some(destination) = self.state.poi(poi_id).cloned() else {
            warn!(poi_id, "Selected gym is not in the current results");
            self.state.error = Some(format!(
                "That gym is no longer in the results (id {poi_id})."
            ));
            self.notify();
            return;
        };

        self.route_generation += 1;
        let generation = self.route_generation;
        let origin = self.state.user_location;
        let target = destination.position();
        let planner = Arc::clone(&self.route_planner);

        self.state.is_planning_route = true;
        info!(generation, poi_id, name = destination.display_name(), "Planning route");

        let spawned = self.spawn_request("route-plan", move || NavEvent::RouteFound {
            generation,
            result: planner.plan_route(origin, target),
            destination,
        });
        if let Err(e) = spawned {
            self.state.is_planning_route = false;
            self.state.error = Some(NavError::from(e).user_message());
        }
        self.notify();
    }

    pub fn start_navigation(&mut self, permission_granted: bool) {
        if self.state.is_navigating {
            debug!("Navigation already active");
            return;
        }
        if !permission_granted {
            warn!("Navigation requested without location permission");
            self.state.error = Some(NavError::PermissionDenied.user_message());
            self.notify();
            return;
        }
        if !self.state.has_route() {
            warn!("Navigation requested without a planned route");
            self.state.error =
                Some("Pick a gym and wait for its route before starting navigation.".to_string());
            self.notify();
            return;
        }

        self.state.is_navigating = true;
        self.tracking.start(true);
        let update = self.driving_camera();
        self.surface.set_camera(update);

        info!(
            destination = self
                .state
                .selected_poi
                .as_ref()
                .map(PointOfInterest::display_name)
                .unwrap_or_default(),
            "Navigation started"
        );
        self.notify();
    }

    /// Leaves the route in place (back to RoutePlanned).
    pub fn stop_navigation(&mut self) {
        if !self.state.is_navigating {
            return;
        }
        self.state.is_navigating = false;
        self.tracking.stop();
        let update = self.overview_camera(self.state.user_location);
        self.surface.set_camera(update);

        info!("Navigation stopped");
        self.notify();
    }

    /// Drops destination, route and navigation together. Also cancels any
    /// route still being planned.
    pub fn clear_route(&mut self) {
        let was_navigating = self.state.is_navigating;

        self.route_generation += 1;
        self.state.is_navigating = false;
        self.state.is_planning_route = false;
        self.state.selected_poi = None;
        self.state.route = RouteResult::empty();

        if was_navigating {
            self.tracking.stop();
        }
        self.surface.clear_polyline();
        self.surface.remove_marker(DESTINATION_MARKER_ID);

        info!(was_navigating, "Route cleared");
        self.notify();
    }

    pub fn center_on_me(&mut self) {
        let update = self.overview_camera(self.state.user_location);
        self.surface.set_camera(update);
    }

    pub fn acknowledge_error(&mut self) {
        if self.state.error.take().is_some() {
            self.notify();
        }
    }

    /// Returns the pending error and clears it.
    pub fn take_error(&mut self) -> Option<String> {
        let err = self.state.error.take();
        if err.is_some() {
            self.notify();
        }
        err
    }

    /// Always stops tracking, whether or not navigation ever started.
    pub fn end_session(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        if self.state.is_navigating {
            self.state.is_navigating = false;
            self.notify();
        }
        self.tracking.stop();
        info!("Navigation session ended");
    }

    // ---------------------------------------------------------------------
    // Inputs
    // ---------------------------------------------------------------------

    pub fn handle_sample(&mut self, sample: LocationSample) {
        let position = sample.position();
        if !position.is_valid() {
            warn!(%position, "Ignoring out-of-range location sample");
            return;
        }

        // a fix without a usable heading keeps the previous one
        let bearing = if sample.bearing_degrees.is_finite() {
            geo::normalize_bearing(sample.bearing_degrees)
        } else {
            debug!(%position, "Location sample has no usable bearing");
            self.state.user_bearing
        };
        self.state.user_location = position;
        self.state.user_bearing = bearing;
        if !self.state.has_fix {
            info!(%position, "First location fix");
            self.state.has_fix = true;
        }

        self.surface.upsert_marker(Marker {
            id: USER_MARKER_ID.to_string(),
            position,
            icon: MarkerIcon::User,
            rotation: bearing,
        });

        // outside navigation the camera belongs to the user's gestures
        if self.state.is_navigating {
            self.follow_user();
        }
        self.notify();
    }

    pub fn handle_event(&mut self, event: NavEvent) {
        match event {
            NavEvent::PoisFound {
                generation,
                center,
                result,
            } => self.on_pois_found(generation, center, result),
            NavEvent::RouteFound {
                generation,
                destination,
                result,
            } => self.on_route_found(generation, destination, result),
        }
    }

    /// Applies every completion already queued. Returns how many were handled.
    pub fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn wait_for_event(&mut self, timeout: Duration) -> bool {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                true
            }
            Err(_) => false,
        }
    }

    fn on_pois_found(
        &mut self,
        generation: u64,
        center: LatLng,
        result: Result<Vec<PointOfInterest>>,
    ) {
        if generation != self.search_generation {
            debug!(
                generation,
                current = self.search_generation,
                "Discarding stale gym search"
            );
            return;
        }
        self.state.is_searching_pois = false;

        match result {
            Ok(pois) => {
                let keep: HashSet<i64> = pois.iter().map(|p| p.id).collect();
                for old in self.state.pois.iter().filter(|p| !keep.contains(&p.id)) {
                    self.surface.remove_marker(&poi_marker_id(old.id));
                }
                for poi in &pois {
                    self.surface.upsert_marker(Marker {
                        id: poi_marker_id(poi.id),
                        position: poi.position(),
                        icon: MarkerIcon::Gym,
                        rotation: 0.0,
                    });
                }

                info!(count = pois.len(), "Nearby gyms updated");
                self.state.pois = pois;

                if !self.state.is_navigating {
                    let update = self.overview_camera(center);
                    self.surface.set_camera(update);
                }
            }
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "Gym search failed");
                self.state.error = Some(e.user_message());
            }
        }
        self.notify();
    }

    fn on_route_found(
        &mut self,
        generation: u64,
        destination: PointOfInterest,
        result: Result<Option<RouteResult>>,
    ) {
        if generation != self.route_generation {
            debug!(
                generation,
                current = self.route_generation,
                "Discarding stale route"
            );
            return;
        }
        self.state.is_planning_route = false;

        match result {
            Ok(Some(route)) if !route.path.is_empty() => self.install_route(destination, route),
            Ok(_) => {
                info!(poi_id = destination.id, "No driving route");
                self.state.error = Some(format!(
                    "No driving route found to {}.",
                    destination.display_name()
                ));
            }
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "Route planning failed");
                self.state.error = Some(e.user_message());
            }
        }
        self.notify();
    }

    fn install_route(&mut self, destination: PointOfInterest, route: RouteResult) {
        self.surface.set_polyline(Polyline {
            points: route.path.clone(),
            color: self.camera.route_color,
            width: self.camera.route_width,
        });
        self.surface.upsert_marker(Marker {
            id: DESTINATION_MARKER_ID.to_string(),
            position: destination.position(),
            icon: MarkerIcon::Destination,
            rotation: 0.0,
        });

        info!(
            poi_id = destination.id,
            points = route.path.len(),
            eta = %route.eta_text,
            distance = %route.distance_text,
            "Route ready"
        );

        let origin = route.origin();
        self.state.selected_poi = Some(destination);
        self.state.route = route;

        if !self.state.is_navigating
            && let Some(origin) = origin
        {
            let update = self.overview_camera(origin);
            self.surface.set_camera(update);
        }
    }

    // ---------------------------------------------------------------------
    // Camera
    // ---------------------------------------------------------------------

    fn follow_user(&mut self) {
        let target = self.state.user_location;
        let bearing = self.state.user_bearing;

        let on_target = self.surface.camera().is_some_and(|cam| {
            geo::within(cam.target, target, self.camera.follow_epsilon_m)
                && geo::bearing_delta(cam.bearing, bearing) < self.camera.bearing_epsilon_deg
        });
        if on_target {
            return;
        }

        let update = self.driving_camera();
        self.surface.set_camera(update);
    }

    fn driving_camera(&self) -> CameraUpdate {
        CameraUpdate {
            position: CameraPosition {
                target: self.state.user_location,
                zoom: self.camera.driving_zoom,
                tilt: self.camera.driving_tilt,
                bearing: self.state.user_bearing,
            },
            animated: true,
        }
    }

    fn overview_camera(&self, target: LatLng) -> CameraUpdate {
        CameraUpdate {
            position: CameraPosition {
                target,
                zoom: self.camera.overview_zoom,
                tilt: 0.0,
                bearing: 0.0,
            },
            animated: true,
        }
    }

    // ---------------------------------------------------------------------
    // Plumbing
    // ---------------------------------------------------------------------

    fn spawn_request<F>(&self, name: &str, job: F) -> std::io::Result<()>
    where
        F: FnOnce() -> NavEvent + Send + 'static,
    {
        let tx = self.events_tx.clone();
        thread::Builder::new().name(name.into()).spawn(move || {
            // receiver gone means the session ended; nothing left to update
            let _ = tx.send(job());
        })?;
        Ok(())
    }

    fn notify(&mut self) {
        self.watchers.retain(LatestSlot::is_alive);
        for watcher in &self.watchers {
            watcher.offer(self.state.clone());
        }
    }
}

impl<M: MapSurface> Drop for NavigationController<M> {
    fn drop(&mut self) {
        self.end_session();
    }
}
