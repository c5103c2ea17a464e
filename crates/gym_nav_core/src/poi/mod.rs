pub mod overpass;

pub use overpass::OverpassClient;

use crate::error::Result;
use crate::model::{LatLng, PointOfInterest};

/// One-shot gym search around a point. No retries; the caller owns retry policy.
pub trait PoiFinder: Send + Sync {
    fn find_pois(&self, center: LatLng, radius_meters: u32) -> Result<Vec<PointOfInterest>>;
}
