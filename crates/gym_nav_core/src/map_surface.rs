//! Command interface to the map renderer.
//!
//! The renderer itself (tiles, gestures) lives outside this crate. The
//! navigation controller only issues the commands below and reads the
//! current camera back.

use serde::Serialize;

use crate::model::LatLng;

pub const USER_MARKER_ID: &str = "user";
pub const DESTINATION_MARKER_ID: &str = "destination";

pub fn poi_marker_id(poi_id: i64) -> String {
    format!("poi-{poi_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPosition {
    pub target: LatLng,
    pub zoom: f32,
    pub tilt: f32,
    pub bearing: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraUpdate {
    pub position: CameraPosition,
    pub animated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerIcon {
    User,
    Gym,
    Destination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: String,
    pub position: LatLng,
    pub icon: MarkerIcon,
    /// Degrees clockwise from north.
    pub rotation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub points: Vec<LatLng>,
    /// ARGB
    pub color: u32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MapCommand {
    SetCamera(CameraUpdate),
    UpsertMarker(Marker),
    RemoveMarker(String),
    SetPolyline(Polyline),
    ClearPolyline,
}

pub trait MapSurface {
    /// Where the camera currently is, including any user panning.
    fn camera(&self) -> Option<CameraPosition>;

    fn set_camera(&mut self, update: CameraUpdate);
    fn upsert_marker(&mut self, marker: Marker);
    fn remove_marker(&mut self, id: &str);
    fn set_polyline(&mut self, polyline: Polyline);
    fn clear_polyline(&mut self);
}

/// A surface that records every command and tracks the camera.
#[derive(Debug, Default)]
pub struct CommandLog {
    commands: Vec<MapCommand>,
    camera: Option<CameraPosition>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[MapCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> Vec<MapCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn camera_updates(&self) -> impl Iterator<Item = &CameraUpdate> {
        self.commands.iter().filter_map(|c| match c {
            MapCommand::SetCamera(u) => Some(u),
            _ => None,
        })
    }

    pub fn last_camera_update(&self) -> Option<&CameraUpdate> {
        self.camera_updates().last()
    }

    /// Simulates the user dragging the map.
    pub fn pan_to(&mut self, target: LatLng) {
        let base = self.camera.unwrap_or(CameraPosition {
            target,
            zoom: 0.0,
            tilt: 0.0,
            bearing: 0.0,
        });
        self.camera = Some(CameraPosition { target, ..base });
    }
}

impl MapSurface for CommandLog {
    fn camera(&self) -> Option<CameraPosition> {
        self.camera
    }

    fn set_camera(&mut self, update: CameraUpdate) {
        self.camera = Some(update.position);
        self.commands.push(MapCommand::SetCamera(update));
    }

    fn upsert_marker(&mut self, marker: Marker) {
        self.commands.push(MapCommand::UpsertMarker(marker));
    }

    fn remove_marker(&mut self, id: &str) {
        self.commands.push(MapCommand::RemoveMarker(id.to_string()));
    }

    fn set_polyline(&mut self, polyline: Polyline) {
        self.commands.push(MapCommand::SetPolyline(polyline));
    }

    fn clear_polyline(&mut self) {
        self.commands.push(MapCommand::ClearPolyline);
    }
}
