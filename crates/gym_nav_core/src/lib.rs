//! Gym discovery and live follow-me navigation.
//!
//! The crate is organised leaves first:
//!
//! - [`location`]: background location stream with replay-1 subscriptions
//! - [`poi`]: Overpass-backed gym discovery
//! - [`directions`] and [`polyline`]: driving route lookup and path decoding
//! - [`navigation`]: the single-writer controller that owns [`NavigationState`]
//!   and drives a [`map_surface::MapSurface`]

pub mod config;
pub mod directions;
pub mod error;
pub mod geo;
pub mod location;
pub mod map_surface;
pub mod model;
pub mod navigation;
pub mod paths;
pub mod poi;
pub mod polyline;

pub use error::{NavError, Result};
pub use model::{FALLBACK_LOCATION, LatLng, LocationSample, PointOfInterest, RouteResult};
pub use navigation::{NavPhase, NavigationState};
