//! Background location stream.
//!
//! - [`LocationSource`]: the platform provider, pulled from the tracking thread
//! - [`SampleBroadcast`]: replay-1 fan-out to any number of subscribers
//! - [`LocationService`]: start/stop lifecycle plus the tracking notification
//! - [`CsvTrackSource`]: replays a recorded track as a provider

mod broadcast;
mod service;
mod source;
mod track;

pub(crate) use broadcast::LatestSlot;
pub use broadcast::{SampleBroadcast, Subscription};
pub use service::{
    ForegroundNotifier, LocationControl, LocationService, ServiceAction, TrackingNotification,
};
pub use source::{LocationPriority, LocationRequest, LocationSource};
pub use track::CsvTrackSource;
