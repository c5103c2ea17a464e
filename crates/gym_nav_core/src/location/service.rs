use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::LocationConfig;
use crate::location::broadcast::{SampleBroadcast, Subscription};
use crate::location::source::{LocationRequest, LocationSource};
use crate::model::LocationSample;

/// Persistent notification shown for as long as tracking runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingNotification {
    pub channel_id: String,
    pub title: String,
    pub text: String,
    /// Cannot be swiped away while tracking.
    pub ongoing: bool,
}

impl From<&LocationConfig> for TrackingNotification {
    fn from(config: &LocationConfig) -> Self {
        Self {
            channel_id: config.notification_channel_id.clone(),
            title: config.notification_title.clone(),
            text: config.notification_text.clone(),
            ongoing: true,
        }
    }
}

/// Platform hook for the foreground-tracking notification.
pub trait ForegroundNotifier: Send {
    fn show(&mut self, notification: &TrackingNotification);
    fn dismiss(&mut self);
}

/// What the navigation controller needs from the tracking service.
pub trait LocationControl: Send {
    /// Silently does nothing when `permission_granted` is false.
    fn start(&mut self, permission_granted: bool);
    /// Idempotent.
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Intra-process control actions. A dead tracking thread is not restarted
/// until the next `Start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
}

/// How the tracking thread ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    Stopped,
    /// Source already closed and notification already dismissed.
    SourceFailed,
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<(Box<dyn LocationSource>, LoopExit)>,
}

type SharedNotifier = Arc<Mutex<Box<dyn ForegroundNotifier>>>;

pub struct LocationService {
    request: LocationRequest,
    notification: TrackingNotification,
    broadcast: Arc<SampleBroadcast>,
    /// `None` while the tracking thread owns it.
    source: Option<Box<dyn LocationSource>>,
    /// Shared with the tracking thread, which dismisses on a source failure.
    notifier: SharedNotifier,
    worker: Option<Worker>,
}

impl LocationService {
    pub fn new(
        source: Box<dyn LocationSource>,
        notifier: Box<dyn ForegroundNotifier>,
        config: &LocationConfig,
    ) -> Self {
        Self {
            request: LocationRequest::from(config),
            notification: TrackingNotification::from(config),
            broadcast: Arc::new(SampleBroadcast::new()),
            source: Some(source),
            notifier: Arc::new(Mutex::new(notifier)),
            worker: None,
        }
    }

    pub fn request(&self) -> &LocationRequest {
        &self.request
    }

    pub fn subscribe(&self) -> Subscription {
        self.broadcast.subscribe()
    }

    pub fn last_sample(&self) -> Option<LocationSample> {
        self.broadcast.last()
    }

    pub fn handle(&mut self, action: ServiceAction, permission_granted: bool) {
        match action {
            ServiceAction::Start => self.start(permission_granted),
            ServiceAction::Stop => self.stop(),
        }
    }

    /// Begins foreground tracking and returns immediately.
    pub fn start(&mut self, permission_granted: bool) {
        if !permission_granted {
            warn!("Location permission not granted; tracking not started");
            return;
        }
        if self.is_running() {
            debug!("Location tracking already running");
            return;
        }
        // a tracking thread that exited on its own still holds the source
        self.reclaim_worker();

        let Some(mut source) = self.source.take() else {
            error!("Location source unavailable; tracking not started");
            return;
        };

        self.notifier.lock().show(&self.notification);

        if let Err(e) = source.open(&self.request) {
            warn!(error = %e, "Unable to open location source");
            self.source = Some(source);
            self.notifier.lock().dismiss();
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let broadcast = Arc::clone(&self.broadcast);
        let request = self.request.clone();
        let notifier = Arc::clone(&self.notifier);

        let spawned = thread::Builder::new()
            .name("location".into())
            .spawn(move || {
                let exit = run_tracking_loop(source.as_mut(), &request, &broadcast, &thread_stop);
                if exit == LoopExit::SourceFailed {
                    source.close();
                    notifier.lock().dismiss();
                }
                (source, exit)
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker { stop, handle });
                info!(
                    interval_ms = self.request.interval.as_millis() as u64,
                    fastest_ms = self.request.fastest_interval.as_millis() as u64,
                    "Location tracking started"
                );
            }
            Err(e) => {
                error!(error = %e, "Failed to spawn location thread");
                self.notifier.lock().dismiss();
            }
        }
    }

    /// Unregisters updates and ends foreground execution. Safe to call at any time.
    pub fn stop(&mut self) {
        if self.worker.is_none() {
            return;
        }
        self.reclaim_worker();
        info!("Location tracking stopped");
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    fn reclaim_worker(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop.store(true, Ordering::Release);

        match worker.handle.join() {
            Ok((source, LoopExit::SourceFailed)) => {
                self.source = Some(source);
            }
            Ok((mut source, LoopExit::Stopped)) => {
                source.close();
                self.source = Some(source);
                self.notifier.lock().dismiss();
            }
            Err(e) => {
                error!("Location thread panicked: {:?}", e);
                self.notifier.lock().dismiss();
            }
        }
    }
}

impl LocationControl for LocationService {
    fn start(&mut self, permission_granted: bool) {
        LocationService::start(self, permission_granted);
    }

    fn stop(&mut self) {
        LocationService::stop(self);
    }

    fn is_running(&self) -> bool {
        LocationService::is_running(self)
    }
}

impl Drop for LocationService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_tracking_loop(
    source: &mut dyn LocationSource,
    request: &LocationRequest,
    broadcast: &SampleBroadcast,
    stop: &AtomicBool,
) -> LoopExit {
    let mut last_published: Option<DateTime<Utc>> = None;
    // bounded so a stop request is noticed promptly
    let poll = request.fastest_interval;

    while !stop.load(Ordering::Acquire) {
        match source.next_fix(poll) {
            Ok(Some(sample)) => {
                if stop.load(Ordering::Acquire) {
                    break;
                }
                if too_soon(last_published, &sample, request) {
                    debug!("Dropping location sample inside fastest interval");
                    continue;
                }
                last_published = Some(sample.timestamp);
                broadcast.publish(sample);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Location source failed; tracking loop exiting");
                return LoopExit::SourceFailed;
            }
        }
    }
    LoopExit::Stopped
}

fn too_soon(last: Option<DateTime<Utc>>, sample: &LocationSample, request: &LocationRequest) -> bool {
    let Some(last) = last else {
        return false;
    };
    match (sample.timestamp - last).to_std() {
        Ok(gap) => gap < request.fastest_interval,
        // clock went backwards; let it through rather than stall the stream
        Err(_) => false,
    }
}
