use serde::Serialize;
use std::fmt;

use crate::model::{LatLng, PointOfInterest, RouteResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavPhase {
    Idle,
    Searching,
    PlanningRoute,
    RoutePlanned,
    Navigating,
}

impl fmt::Display for NavPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NavPhase::Idle => "idle",
            NavPhase::Searching => "searching",
            NavPhase::PlanningRoute => "planning route",
            NavPhase::RoutePlanned => "route planned",
            NavPhase::Navigating => "navigating",
        };
        f.write_str(s)
    }
}

/// Everything the UI renders for one navigation session.
///
/// Only `NavigationController` mutates it; observers get clones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationState {
    pub user_location: LatLng,
    pub user_bearing: f32,
    /// False until the first real sample; `user_location` is the fallback until then.
    pub has_fix: bool,
    pub pois: Vec<PointOfInterest>,
    pub selected_poi: Option<PointOfInterest>,
    pub route: RouteResult,
    pub is_searching_pois: bool,
    pub is_planning_route: bool,
    pub is_navigating: bool,
    /// One-shot, cleared once acknowledged.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    NavigatingWithoutDestination,
    NavigatingWithoutRoute,
    DestinationWithoutRoute,
    RouteWithoutDestination,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvariantViolation::NavigatingWithoutDestination => {
                "navigating without a selected destination"
            }
            InvariantViolation::NavigatingWithoutRoute => "navigating without a route path",
            InvariantViolation::DestinationWithoutRoute => "destination selected without a route",
            InvariantViolation::RouteWithoutDestination => "route installed without a destination",
        };
        f.write_str(s)
    }
}

impl NavigationState {
    pub fn new(fallback: LatLng) -> Self {
        Self {
            user_location: fallback,
            user_bearing: 0.0,
            has_fix: false,
            pois: Vec::new(),
            selected_poi: None,
            route: RouteResult::empty(),
            is_searching_pois: false,
            is_planning_route: false,
            is_navigating: false,
            error: None,
        }
    }

    pub fn phase(&self) -> NavPhase {
        if self.is_navigating {
            NavPhase::Navigating
        } else if self.is_searching_pois {
            NavPhase::Searching
        } else if self.is_planning_route {
            NavPhase::PlanningRoute
        } else if self.selected_poi.is_some() && !self.route.path.is_empty() {
            NavPhase::RoutePlanned
        } else {
            NavPhase::Idle
        }
    }

    pub fn has_route(&self) -> bool {
        self.selected_poi.is_some() && !self.route.path.is_empty()
    }

    pub fn poi(&self, id: i64) -> Option<&PointOfInterest> {
        self.pois.iter().find(|p| p.id == id)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.is_navigating {
            if self.selected_poi.is_none() {
                return Err(InvariantViolation::NavigatingWithoutDestination);
            }
            if self.route.path.is_empty() {
                return Err(InvariantViolation::NavigatingWithoutRoute);
            }
        }
        match (self.selected_poi.is_some(), self.route.path.is_empty()) {
            (true, true) => Err(InvariantViolation::DestinationWithoutRoute),
            (false, false) => Err(InvariantViolation::RouteWithoutDestination),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FALLBACK_LOCATION;

    fn poi() -> PointOfInterest {
        PointOfInterest {
            id: 1,
            name: Some("Gym".into()),
            latitude: 1.0,
            longitude: 1.0,
        }
    }

    #[test]
    fn fresh_state_is_idle_at_fallback() {
        let s = NavigationState::new(FALLBACK_LOCATION);
        assert_eq!(s.phase(), NavPhase::Idle);
        assert_eq!(s.user_location, FALLBACK_LOCATION);
        assert!(!s.has_fix);
        assert_eq!(s.check_invariants(), Ok(()));
    }

    #[test]
    fn navigating_without_route_is_flagged() {
        let mut s = NavigationState::new(FALLBACK_LOCATION);
        s.is_navigating = true;
        s.selected_poi = Some(poi());
        assert_eq!(
            s.check_invariants(),
            Err(InvariantViolation::NavigatingWithoutRoute)
        );
    }

    #[test]
    fn route_and_destination_travel_together() {
        let mut s = NavigationState::new(FALLBACK_LOCATION);
        s.route.path = vec![LatLng::new(0.0, 0.0)];
        assert_eq!(
            s.check_invariants(),
            Err(InvariantViolation::RouteWithoutDestination)
        );
        s.selected_poi = Some(poi());
        assert_eq!(s.check_invariants(), Ok(()));
        assert_eq!(s.phase(), NavPhase::RoutePlanned);
    }
}
