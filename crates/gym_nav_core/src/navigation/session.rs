//! Event loop for one navigation session.
//!
//! Location samples, request completions and user intents are multiplexed
//! with `select!` and applied to the controller one at a time, so state
//! mutation never interleaves.

use crossbeam_channel::{Receiver, Sender, never, select, unbounded};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::location::Subscription;
use crate::map_surface::MapSurface;
use crate::model::LocationSample;
use crate::navigation::controller::NavigationController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    FindNearbyGyms { radius_meters: u32 },
    SelectPoi(i64),
    StartNavigation { permission_granted: bool },
    StopNavigation,
    ClearRoute,
    CenterOnMe,
    AcknowledgeError,
    EndSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Processed,
    Idle,
    Ended,
}

/// Cloneable sender of intents; usable from any thread.
#[derive(Clone)]
pub struct SessionHandle {
    tx: Sender<Intent>,
}

impl SessionHandle {
    /// False once the session is gone.
    pub fn send(&self, intent: Intent) -> bool {
        self.tx.send(intent).is_ok()
    }
}

pub struct NavigationSession<M: MapSurface> {
    controller: NavigationController<M>,
    _subscription: Subscription,
    samples: Receiver<LocationSample>,
    intents_tx: Sender<Intent>,
    intents_rx: Receiver<Intent>,
    ended: bool,
}

impl<M: MapSurface> NavigationSession<M> {
    pub fn new(controller: NavigationController<M>, subscription: Subscription) -> Self {
        let (intents_tx, intents_rx) = unbounded();
        let samples = subscription.receiver().clone();
        Self {
            controller,
            _subscription: subscription,
            samples,
            intents_tx,
            intents_rx,
            ended: false,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.intents_tx.clone(),
        }
    }

    pub fn controller(&self) -> &NavigationController<M> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut NavigationController<M> {
        &mut self.controller
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Waits up to `timeout` for one input and applies it.
    pub fn step(&mut self, timeout: Duration) -> Step {
        if self.ended {
            return Step::Ended;
        }

        let samples = self.samples.clone();
        let events = self.controller.events().clone();
        let intents = self.intents_rx.clone();

        select! {
            recv(samples) -> msg => match msg {
                Ok(sample) => {
                    self.controller.handle_sample(sample);
                    Step::Processed
                }
                Err(_) => {
                    debug!("Location stream closed");
                    self.samples = never();
                    Step::Idle
                }
            },
            recv(events) -> msg => match msg {
                Ok(event) => {
                    self.controller.handle_event(event);
                    Step::Processed
                }
                // the controller keeps a sender, so this never disconnects
                Err(_) => Step::Idle,
            },
            recv(intents) -> msg => match msg {
                Ok(intent) => self.apply(intent),
                Err(_) => Step::Idle,
            },
            default(timeout) => Step::Idle,
        }
    }

    /// Runs until `EndSession` or until `duration` has elapsed.
    pub fn run_for(&mut self, duration: Duration) -> Step {
        let deadline = Instant::now() + duration;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Step::Idle;
            }
            if self.step(deadline - now) == Step::Ended {
                return Step::Ended;
            }
        }
    }

    /// Runs until `EndSession`.
    pub fn run(&mut self) {
        while self.step(Duration::from_secs(1)) != Step::Ended {}
    }

    pub fn end(&mut self) {
        if !self.ended {
            self.ended = true;
            self.controller.end_session();
        }
    }

    fn apply(&mut self, intent: Intent) -> Step {
        debug!(?intent, "Applying intent");
        match intent {
            Intent::FindNearbyGyms { radius_meters } => {
                self.controller.find_nearby_gyms(radius_meters)
            }
            Intent::SelectPoi(id) => self.controller.select_poi(id),
            Intent::StartNavigation { permission_granted } => {
                self.controller.start_navigation(permission_granted)
            }
            Intent::StopNavigation => self.controller.stop_navigation(),
            Intent::ClearRoute => self.controller.clear_route(),
            Intent::CenterOnMe => self.controller.center_on_me(),
            Intent::AcknowledgeError => self.controller.acknowledge_error(),
            Intent::EndSession => {
                info!("End of session requested");
                self.end();
                return Step::Ended;
            }
        }
        Step::Processed
    }
}
