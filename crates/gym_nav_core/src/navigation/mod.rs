mod controller;
mod session;
mod state;

pub use controller::{NavEvent, NavigationController, StateWatch};
pub use session::{Intent, NavigationSession, SessionHandle, Step};
pub use state::{InvariantViolation, NavPhase, NavigationState};
