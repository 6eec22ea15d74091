//! Test doubles for the page, camera, tracker and relay collaborators.
//!
//! Used by this crate's tests, the binary's integration tests and the
//! extension crates.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use gesturecall_protocols::landmark::index;
use gesturecall_protocols::{
    CaptureConstraints, CaptureError, FrameData, HandObservation, HandTracker, HandTrackerFactory,
    Handedness, LANDMARK_COUNT, Landmark, NavigationEvent, NavigationObserver, OverlayRenderer,
    OverlaySpec, PageError, PageSurface, RelayEndpoint, RelayError, RelayMessage, RelayResponse,
    TabId, TabInfo, TabMessenger, TrackerError, TrackerOptions, VideoSource, VideoStream,
};

/// Landmarks for a hand with the given fingers extended (thumb first).
///
/// Wrist at the bottom centre, fingers pointing up the image.
pub fn pose_landmarks(fingers: [bool; 5]) -> [Landmark; LANDMARK_COUNT] {
    let mut points = [Landmark::default(); LANDMARK_COUNT];
    points[index::WRIST] = Landmark::new(0.5, 0.9, 0.0);
    points[index::THUMB_CMC] = Landmark::new(0.45, 0.82, 0.0);
    points[index::THUMB_MCP] = Landmark::new(0.4, 0.75, 0.0);
    if fingers[0] {
        points[index::THUMB_IP] = Landmark::new(0.3, 0.65, 0.0);
        points[index::THUMB_TIP] = Landmark::new(0.25, 0.55, 0.0);
    } else {
        points[index::THUMB_IP] = Landmark::new(0.42, 0.7, 0.0);
        points[index::THUMB_TIP] = Landmark::new(0.45, 0.72, 0.0);
    }

    let columns = [0.42_f32, 0.5, 0.58, 0.66];
    for (i, x) in columns.iter().enumerate() {
        let finger = i + 1;
        let mcp = index::MCPS[finger];
        let pip = index::PIPS[finger];
        let dip = pip + 1;
        let tip = index::TIPS[finger];
        points[mcp] = Landmark::new(*x, 0.6, 0.0);
        if fingers[finger] {
            points[pip] = Landmark::new(*x, 0.45, 0.0);
            points[dip] = Landmark::new(*x, 0.37, 0.0);
            points[tip] = Landmark::new(*x, 0.3, 0.0);
        } else {
            points[pip] = Landmark::new(*x, 0.5, 0.0);
            points[dip] = Landmark::new(*x, 0.57, 0.0);
            points[tip] = Landmark::new(*x, 0.62, 0.0);
        }
    }
    points
}

pub fn hand_pose(fingers: [bool; 5], handedness: Handedness) -> HandObservation {
    HandObservation::new(pose_landmarks(fingers), handedness, 0.95)
}

pub fn open_palm(handedness: Handedness) -> HandObservation {
    hand_pose([true; 5], handedness)
}

pub fn index_pointing(handedness: Handedness) -> HandObservation {
    hand_pose([false, true, false, false, false], handedness)
}

pub fn thumb_up(handedness: Handedness) -> HandObservation {
    hand_pose([true, false, false, false, false], handedness)
}

pub fn fist(handedness: Handedness) -> HandObservation {
    hand_pose([false; 5], handedness)
}

// ============================================================================
// Page
// ============================================================================

/// Something that happened on a [`RecordingPage`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    OverlayCreated(OverlaySpec),
    OverlayRemoved,
    Cleared,
    DrewHand(Handedness),
    Status { text: String, highlight: bool },
    Cover(bool),
    Clicked(String),
    Navigated(String),
}

/// In-memory page that records every call.
pub struct RecordingPage {
    url: Mutex<String>,
    elements: Mutex<HashSet<String>>,
    events: Mutex<Vec<PageEvent>>,
    navigation: broadcast::Sender<NavigationEvent>,
}

impl RecordingPage {
    pub fn new(url: impl Into<String>) -> Self {
        let (navigation, _) = broadcast::channel(16);
        Self {
            url: Mutex::new(url.into()),
            elements: Mutex::new(HashSet::new()),
            events: Mutex::new(Vec::new()),
            navigation,
        }
    }

    /// Selectors that match an element on this page.
    pub fn with_elements(self, selectors: &[&str]) -> Self {
        self.elements
            .lock()
            .extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    pub fn url(&self) -> String {
        self.url.lock().clone()
    }

    /// Simulate an in-page URL change (history API, link click).
    pub fn change_url(&self, url: impl Into<String>) {
        let url = url.into();
        *self.url.lock() = url.clone();
        let _ = self.navigation.send(NavigationEvent::new(url));
    }

    pub fn events(&self) -> Vec<PageEvent> {
        self.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub fn clicks(&self) -> Vec<String> {
        self.filter(|e| match e {
            PageEvent::Clicked(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn navigations(&self) -> Vec<String> {
        self.filter(|e| match e {
            PageEvent::Navigated(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn statuses(&self) -> Vec<String> {
        self.filter(|e| match e {
            PageEvent::Status { text, .. } => Some(text.clone()),
            _ => None,
        })
    }

    /// Whether an overlay is currently shown.
    pub fn overlay_visible(&self) -> bool {
        let mut visible = false;
        for event in self.events.lock().iter() {
            match event {
                PageEvent::OverlayCreated(_) => visible = true,
                PageEvent::OverlayRemoved => visible = false,
                _ => {}
            }
        }
        visible
    }

    fn filter<T>(&self, f: impl Fn(&PageEvent) -> Option<T>) -> Vec<T> {
        self.events.lock().iter().filter_map(f).collect()
    }

    fn record(&self, event: PageEvent) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl PageSurface for RecordingPage {
    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.url())
    }

    async fn click_first(&self, selector: &str) -> Result<bool, PageError> {
        if selector.trim().is_empty() {
            return Err(PageError::InvalidSelector(selector.to_string()));
        }
        if self.elements.lock().contains(selector) {
            self.record(PageEvent::Clicked(selector.to_string()));
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.record(PageEvent::Navigated(url.to_string()));
        self.change_url(url);
        Ok(())
    }
}

#[async_trait]
impl OverlayRenderer for RecordingPage {
    async fn create_overlay(&self, spec: &OverlaySpec) -> Result<(), PageError> {
        self.record(PageEvent::OverlayCreated(spec.clone()));
        Ok(())
    }

    async fn remove_overlay(&self) -> Result<(), PageError> {
        self.record(PageEvent::OverlayRemoved);
        Ok(())
    }

    async fn clear(&self) -> Result<(), PageError> {
        self.record(PageEvent::Cleared);
        Ok(())
    }

    async fn draw_hand(&self, hand: &HandObservation) -> Result<(), PageError> {
        self.record(PageEvent::DrewHand(hand.handedness));
        Ok(())
    }

    async fn set_status(&self, text: &str, highlight: bool) -> Result<(), PageError> {
        self.record(PageEvent::Status {
            text: text.to_string(),
            highlight,
        });
        Ok(())
    }

    async fn set_cover_visible(&self, visible: bool) -> Result<(), PageError> {
        self.record(PageEvent::Cover(visible));
        Ok(())
    }
}

impl NavigationObserver for RecordingPage {
    fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.navigation.subscribe()
    }
}

// ============================================================================
// Camera
// ============================================================================

/// Video source handing out streams of one fixed frame.
pub struct StaticVideoSource {
    frame: FrameData,
    fail_open: bool,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    captured: Arc<AtomicUsize>,
}

impl StaticVideoSource {
    pub fn new() -> Self {
        Self {
            frame: FrameData::new(format!("{}AAAA", FrameData::JPEG_PREFIX), 180, 120),
            fail_open: false,
            opened: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
            captured: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose camera can never be acquired.
    pub fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::new()
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn captured(&self) -> usize {
        self.captured.load(Ordering::SeqCst)
    }
}

impl Default for StaticVideoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoSource for StaticVideoSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn open(&self, constraints: CaptureConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
        if self.fail_open {
            return Err(CaptureError::Unavailable("permission denied".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticStream {
            frame: FrameData {
                width: constraints.width,
                height: constraints.height,
                ..self.frame.clone()
            },
            released: false,
            released_count: self.released.clone(),
            captured: self.captured.clone(),
        }))
    }
}

struct StaticStream {
    frame: FrameData,
    released: bool,
    released_count: Arc<AtomicUsize>,
    captured: Arc<AtomicUsize>,
}

#[async_trait]
impl VideoStream for StaticStream {
    fn resolution(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    async fn capture(&mut self) -> Result<FrameData, CaptureError> {
        if self.released {
            return Err(CaptureError::Released);
        }
        self.captured.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.clone())
    }

    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.released_count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// Tracker factory returning a preset list of hands for every frame.
pub struct ScriptedTrackerFactory {
    hands: Arc<Mutex<Vec<HandObservation>>>,
    delay: Duration,
    fail_initialize: bool,
    created: Arc<AtomicUsize>,
    detections: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedTrackerFactory {
    pub fn new(hands: Vec<HandObservation>) -> Self {
        Self {
            hands: Arc::new(Mutex::new(hands)),
            delay: Duration::ZERO,
            fail_initialize: false,
            created: Arc::new(AtomicUsize::new(0)),
            detections: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every `detect` takes this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    pub fn set_hands(&self, hands: Vec<HandObservation>) {
        *self.hands.lock() = hands;
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn detections(&self) -> usize {
        self.detections.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HandTrackerFactory for ScriptedTrackerFactory {
    async fn create(&self) -> Result<Box<dyn HandTracker>, TrackerError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedTracker {
            hands: self.hands.clone(),
            delay: self.delay,
            fail_initialize: self.fail_initialize,
            initialized: AtomicBool::new(false),
            detections: self.detections.clone(),
            closed: self.closed.clone(),
        }))
    }
}

struct ScriptedTracker {
    hands: Arc<Mutex<Vec<HandObservation>>>,
    delay: Duration,
    fail_initialize: bool,
    initialized: AtomicBool,
    detections: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl HandTracker for ScriptedTracker {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn initialize(&self, _options: &TrackerOptions) -> Result<(), TrackerError> {
        if self.fail_initialize {
            return Err(TrackerError::LaunchFailed("model assets missing".to_string()));
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn detect(&self, _frame: &FrameData) -> Result<Vec<HandObservation>, TrackerError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(TrackerError::NotInitialized);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.detections.fetch_add(1, Ordering::SeqCst);
        Ok(self.hands.lock().clone())
    }

    async fn close(&self) -> Result<(), TrackerError> {
        self.initialized.store(false, Ordering::SeqCst);
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Relay
// ============================================================================

/// Endpoint that records requests and answers with a fixed response.
pub struct RecordingEndpoint {
    requests: Mutex<Vec<RelayMessage>>,
    fail_with: Option<RelayError>,
    answers: Mutex<HashMap<&'static str, RelayResponse>>,
}

impl RecordingEndpoint {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_with: None,
            answers: Mutex::new(HashMap::new()),
        }
    }

    /// Every request fails with `error`.
    pub fn failing(error: RelayError) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_with: Some(error),
            answers: Mutex::new(HashMap::new()),
        }
    }

    /// Answer `action` with `response` from now on; `None` restores `ok`.
    pub fn answer(&self, action: &'static str, response: Option<RelayResponse>) {
        let mut answers = self.answers.lock();
        match response {
            Some(response) => answers.insert(action, response),
            None => answers.remove(action),
        };
    }

    pub fn requests(&self) -> Vec<RelayMessage> {
        self.requests.lock().clone()
    }

    pub fn actions(&self) -> Vec<&'static str> {
        self.requests.lock().iter().map(|m| m.action()).collect()
    }

    pub fn count(&self, action: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|m| m.action() == action)
            .count()
    }
}

impl Default for RecordingEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayEndpoint for RecordingEndpoint {
    async fn request(&self, message: RelayMessage) -> Result<RelayResponse, RelayError> {
        let answer = self.answers.lock().get(message.action()).cloned();
        self.requests.lock().push(message);
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(answer.unwrap_or_else(RelayResponse::ok)),
        }
    }
}

/// Tab messenger over a fixed tab list; some tabs refuse delivery.
pub struct StaticTabs {
    tabs: Vec<TabInfo>,
    unreachable: HashSet<TabId>,
    sent: Mutex<Vec<TabId>>,
}

impl StaticTabs {
    pub fn new(tabs: Vec<TabInfo>) -> Self {
        Self {
            tabs,
            unreachable: HashSet::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_unreachable(mut self, tabs: &[&str]) -> Self {
        self.unreachable.extend(tabs.iter().map(|t| t.to_string()));
        self
    }

    /// Tabs a delivery was attempted to, in order.
    pub fn attempts(&self) -> Vec<TabId> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl TabMessenger for StaticTabs {
    async fn query_tabs(&self) -> Vec<TabInfo> {
        self.tabs.clone()
    }

    async fn send_to_tab(&self, tab: &TabId, _message: RelayMessage) -> Result<RelayResponse, RelayError> {
        self.sent.lock().push(tab.clone());
        if self.unreachable.contains(tab) {
            Err(RelayError::Transport(format!("no receiver in tab {}", tab)))
        } else {
            Ok(RelayResponse::ok())
        }
    }
}
