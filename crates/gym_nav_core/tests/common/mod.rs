#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use parking_lot::Mutex;

use gym_nav_core::directions::RoutePlanner;
use gym_nav_core::location::{
    ForegroundNotifier, LocationControl, LocationRequest, LocationSource, TrackingNotification,
};
use gym_nav_core::poi::PoiFinder;
use gym_nav_core::{LatLng, LocationSample, NavError, PointOfInterest, Result, RouteResult};

// -------------------------------------------------------------------------
// Samples and fixtures
// -------------------------------------------------------------------------

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

/// Sample `n` seconds after `t0`.
pub fn sample(latitude: f64, longitude: f64, bearing: f32, secs: i64) -> LocationSample {
    LocationSample::new(
        latitude,
        longitude,
        bearing,
        t0() + chrono::Duration::seconds(secs),
    )
}

pub fn gym(id: i64, name: Option<&str>, latitude: f64, longitude: f64) -> PointOfInterest {
    PointOfInterest {
        id,
        name: name.map(str::to_owned),
        latitude,
        longitude,
    }
}

pub fn three_gyms() -> Vec<PointOfInterest> {
    vec![
        gym(101, Some("Iron Temple"), 45.0710, 7.6850),
        gym(102, None, 45.0690, 7.6790),
        gym(103, Some("Pulse Fitness"), 45.0755, 7.6901),
    ]
}

pub fn straight_route(from: LatLng, to: LatLng) -> RouteResult {
    RouteResult {
        path: vec![
            from,
            LatLng::new(
                (from.latitude + to.latitude) / 2.0,
                (from.longitude + to.longitude) / 2.0,
            ),
            to,
        ],
        eta_text: "7 mins".to_string(),
        distance_text: "1.2 km".to_string(),
    }
}

/// Polls `cond` until it holds or `timeout` runs out.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

// -------------------------------------------------------------------------
// Location fakes
// -------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SourceCounters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

/// A location provider fed by the test through a channel.
pub struct ScriptedSource {
    rx: Receiver<LocationSample>,
    counters: Arc<SourceCounters>,
}

pub struct SourceFeed {
    tx: Sender<LocationSample>,
    pub counters: Arc<SourceCounters>,
}

impl SourceFeed {
    pub fn push(&self, sample: LocationSample) {
        self.tx.send(sample).expect("scripted source dropped");
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }
}

pub fn scripted_source() -> (ScriptedSource, SourceFeed) {
    let (tx, rx) = unbounded();
    let counters = Arc::new(SourceCounters::default());
    (
        ScriptedSource {
            rx,
            counters: Arc::clone(&counters),
        },
        SourceFeed { tx, counters },
    )
}

impl LocationSource for ScriptedSource {
    fn open(&mut self, _request: &LocationRequest) -> Result<()> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn next_fix(&mut self, timeout: Duration) -> Result<Option<LocationSample>> {
        match self.rx.recv_timeout(timeout) {
            Ok(s) => Ok(Some(s)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }

    fn close(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// A provider that opens fine and then loses its fix for good.
pub struct FailingSource {
    pub counters: Arc<SourceCounters>,
}

impl LocationSource for FailingSource {
    fn open(&mut self, _request: &LocationRequest) -> Result<()> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn next_fix(&mut self, _timeout: Duration) -> Result<Option<LocationSample>> {
        Err(NavError::Io(std::io::Error::other("gps receiver lost")))
    }

    fn close(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Show(TrackingNotification),
    Dismiss,
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<NotifierCall>>>,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().clone()
    }

    pub fn shows(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Show(_)))
            .count()
    }

    pub fn dismissals(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Dismiss))
            .count()
    }
}

impl ForegroundNotifier for RecordingNotifier {
    fn show(&mut self, notification: &TrackingNotification) {
        self.calls.lock().push(NotifierCall::Show(notification.clone()));
    }

    fn dismiss(&mut self) {
        self.calls.lock().push(NotifierCall::Dismiss);
    }
}

#[derive(Debug, Default)]
pub struct ControlCounters {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl ControlCounters {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

/// Counts start/stop calls and forwards them to an inner control, if any.
pub struct CountingControl {
    inner: Option<Box<dyn LocationControl>>,
    running: bool,
    pub counters: Arc<ControlCounters>,
}

impl CountingControl {
    pub fn standalone() -> (Self, Arc<ControlCounters>) {
        Self::build(None)
    }

    pub fn wrapping(inner: Box<dyn LocationControl>) -> (Self, Arc<ControlCounters>) {
        Self::build(Some(inner))
    }

    fn build(inner: Option<Box<dyn LocationControl>>) -> (Self, Arc<ControlCounters>) {
        let counters = Arc::new(ControlCounters::default());
        (
            Self {
                inner,
                running: false,
                counters: Arc::clone(&counters),
            },
            counters,
        )
    }
}

impl LocationControl for CountingControl {
    fn start(&mut self, permission_granted: bool) {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        match &mut self.inner {
            Some(inner) => inner.start(permission_granted),
            None => self.running = permission_granted,
        }
    }

    fn stop(&mut self) {
        self.counters.stops.fetch_add(1, Ordering::SeqCst);
        match &mut self.inner {
            Some(inner) => inner.stop(),
            None => self.running = false,
        }
    }

    fn is_running(&self) -> bool {
        match &self.inner {
            Some(inner) => inner.is_running(),
            None => self.running,
        }
    }
}

// -------------------------------------------------------------------------
// Network fakes
// -------------------------------------------------------------------------

type PoiFn = dyn Fn(LatLng, u32) -> Result<Vec<PointOfInterest>> + Send + Sync;
type RouteFn = dyn Fn(LatLng, LatLng) -> Result<Option<RouteResult>> + Send + Sync;

pub struct FakePoiFinder {
    respond: Box<PoiFn>,
    pub calls: Mutex<Vec<(LatLng, u32)>>,
}

impl FakePoiFinder {
    pub fn new(respond: impl Fn(LatLng, u32) -> Result<Vec<PointOfInterest>> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn returning(pois: Vec<PointOfInterest>) -> Arc<Self> {
        Self::new(move |_, _| Ok(pois.clone()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl PoiFinder for FakePoiFinder {
    fn find_pois(&self, center: LatLng, radius_meters: u32) -> Result<Vec<PointOfInterest>> {
        self.calls.lock().push((center, radius_meters));
        (self.respond)(center, radius_meters)
    }
}

pub struct FakeRoutePlanner {
    respond: Box<RouteFn>,
    pub calls: Mutex<Vec<(LatLng, LatLng)>>,
}

impl FakeRoutePlanner {
    pub fn new(
        respond: impl Fn(LatLng, LatLng) -> Result<Option<RouteResult>> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// A three-point straight line from origin to destination.
    pub fn straight() -> Arc<Self> {
        Self::new(|origin, destination| Ok(Some(straight_route(origin, destination))))
    }

    pub fn no_route() -> Arc<Self> {
        Self::new(|_, _| Ok(None))
    }

    pub fn failing(make: fn() -> NavError) -> Arc<Self> {
        Self::new(move |_, _| Err(make()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl RoutePlanner for FakeRoutePlanner {
    fn plan_route(&self, origin: LatLng, destination: LatLng) -> Result<Option<RouteResult>> {
        self.calls.lock().push((origin, destination));
        (self.respond)(origin, destination)
    }
}

/// Searches block until the test releases the gate for their radius, so
/// completion order can be chosen independently of issue order.
pub struct GatedPoiFinder {
    gates: Mutex<HashMap<u32, (Sender<Vec<PointOfInterest>>, Receiver<Vec<PointOfInterest>>)>>,
}

impl GatedPoiFinder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gates: Mutex::new(HashMap::new()),
        })
    }

    fn gate(&self, radius: u32) -> (Sender<Vec<PointOfInterest>>, Receiver<Vec<PointOfInterest>>) {
        self.gates
            .lock()
            .entry(radius)
            .or_insert_with(|| bounded(1))
            .clone()
    }

    pub fn release(&self, radius: u32, pois: Vec<PointOfInterest>) {
        let (tx, _) = self.gate(radius);
        tx.send(pois).expect("gate closed");
    }
}

impl PoiFinder for GatedPoiFinder {
    fn find_pois(&self, _center: LatLng, radius_meters: u32) -> Result<Vec<PointOfInterest>> {
        let (_, rx) = self.gate(radius_meters);
        rx.recv_timeout(Duration::from_secs(5))
            .map_err(|_| NavError::NetworkTransient("gate never released".into()))
    }
}

/// Same as [`GatedPoiFinder`], keyed by destination latitude.
pub struct GatedRoutePlanner {
    gates: Mutex<Vec<(i64, Sender<()>, Receiver<()>)>>,
}

impl GatedRoutePlanner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gates: Mutex::new(Vec::new()),
        })
    }

    fn key(destination: LatLng) -> i64 {
        (destination.latitude * 1e6).round() as i64
    }

    fn gate(&self, key: i64) -> (Sender<()>, Receiver<()>) {
        let mut gates = self.gates.lock();
        if let Some((_, tx, rx)) = gates.iter().find(|(k, _, _)| *k == key) {
            return (tx.clone(), rx.clone());
        }
        let (tx, rx) = bounded(1);
        gates.push((key, tx.clone(), rx.clone()));
        (tx, rx)
    }

    pub fn release(&self, destination: LatLng) {
        let (tx, _) = self.gate(Self::key(destination));
        tx.send(()).expect("gate closed");
    }
}

impl RoutePlanner for GatedRoutePlanner {
    fn plan_route(&self, origin: LatLng, destination: LatLng) -> Result<Option<RouteResult>> {
        let (_, rx) = self.gate(Self::key(destination));
        rx.recv_timeout(Duration::from_secs(5))
            .map_err(|_| NavError::NetworkTransient("gate never released".into()))?;
        Ok(Some(straight_route(origin, destination)))
    }
}

// -------------------------------------------------------------------------
// One-shot HTTP responder
// -------------------------------------------------------------------------

/// Accepts a single connection, answers with a canned response and hands
/// the raw request back to the test.
pub struct OneShotServer {
    pub url: String,
    handle: JoinHandle<String>,
}

impl OneShotServer {
    pub fn respond(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let body = body.to_string();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let request = read_request(&mut stream);
            let reason = if status < 400 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write response");
            let _ = stream.flush();
            request
        });

        Self {
            url: format!("http://{addr}/api"),
            handle,
        }
    }

    /// The raw request, head and body.
    pub fn request(self) -> String {
        self.handle.join().expect("responder panicked")
    }
}

/// A URL on which nothing is listening.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/api")
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk).expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(head_end) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let body_len = head
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + body_len {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
