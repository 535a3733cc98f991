//! Addressable devices and sub-devices (§3.2, §3.6): ecoMAX/ecoSTER own a
//! wire address and a write queue; mixers and thermostats mirror a slice of
//! their parent's event map, keyed by index, and forward writes upward.

pub mod ecomax;
pub mod ecoster;
pub mod mixer;
pub mod thermostat;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::event_manager::EventManager;
use crate::frame::{Frame, FrameType};
use crate::value::EventDataType;

/// Timeout for a single setup request attempt (§4.3.4).
pub const SETUP_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);
/// Retries before a required frame is given up on (§4.3.4).
pub const SETUP_REQUEST_RETRIES: u32 = 3;
/// Overall budget for a device's setup to complete (§4.3.4).
pub const SETUP_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared machinery for an addressable device: its event map, write-queue
/// handle, the errors recorded by failed setup requests, and the last-seen
/// frame-version table driving re-fetches (§4.3.3).
pub struct Device {
    pub address: u8,
    pub events: Arc<EventManager>,
    write_queue: mpsc::UnboundedSender<Frame>,
    pub frame_errors: Mutex<Vec<String>>,
    known_versions: Mutex<HashMap<u8, u16>>,
}

impl Device {
    pub fn new(address: u8, write_queue: mpsc::UnboundedSender<Frame>) -> Arc<Self> {
        Arc::new(Self {
            address,
            events: Arc::new(EventManager::new()),
            write_queue,
            frame_errors: Mutex::new(Vec::new()),
            known_versions: Mutex::new(HashMap::new()),
        })
    }

    pub fn enqueue(&self, frame: Frame) {
        if self.write_queue.send(frame).is_err() {
            log::warn!("write queue for device 0x{:02X} is closed", self.address);
        }
    }

    fn request(&self, frame_type: FrameType) {
        self.enqueue(Frame::from_data(frame_type, self.address, EventDataType::new()));
    }

    /// Dispatches every entry of a decoded frame payload onto the event map
    /// (§4.4.1).
    pub fn handle_data(&self, data: EventDataType) {
        self.events.load(data);
    }

    /// Re-issues the request for any frame type whose reported version
    /// differs from what was last seen (§4.3.3). Unknown frame-type codes
    /// are ignored rather than treated as an error.
    pub async fn update_frame_versions(&self, versions: &HashMap<u8, u16>) {
        let mut known = self.known_versions.lock().await;
        for (&code, &version) in versions {
            if known.get(&code).copied() == Some(version) {
                continue;
            }
            known.insert(code, version);
            let Ok(frame_type) = FrameType::from_code(code) else { continue };
            if let Some(request) = frame_type.request_for_response() {
                self.request(request);
            }
        }
    }

    /// Issues `frame_type` up to [`SETUP_REQUEST_RETRIES`] times, waiting for
    /// `key` to appear in the event map within [`SETUP_REQUEST_TIMEOUT`] on
    /// each attempt (§4.3.4). A device whose required frames all fail is
    /// still usable; the failure is only recorded.
    pub async fn request_with_retry(&self, frame_type: FrameType, key: &str) {
        for attempt in 1..=SETUP_REQUEST_RETRIES {
            self.request(frame_type);
            if tokio::time::timeout(SETUP_REQUEST_TIMEOUT, self.events.wait_for(key)).await.is_ok() {
                return;
            }
            log::warn!("{frame_type:?} attempt {attempt}/{SETUP_REQUEST_RETRIES} timed out");
        }
        self.frame_errors
            .lock()
            .await
            .push(format!("{frame_type:?} produced no {key:?} within {SETUP_REQUEST_RETRIES} attempts"));
    }

    pub async fn shutdown(&self) {
        self.events.shutdown().await;
    }
}

/// A sub-device keyed by index within a parent addressable device (§3.2):
/// mixers and thermostats. Writes are forwarded to the parent's queue; reads
/// go through this sub-device's own event map.
pub struct SubDevice {
    pub index: u8,
    pub events: Arc<EventManager>,
    parent: Arc<Device>,
}

impl SubDevice {
    pub fn new(index: u8, parent: Arc<Device>) -> Self {
        Self { index, events: Arc::new(EventManager::new()), parent }
    }

    pub fn enqueue(&self, frame: Frame) {
        self.parent.enqueue(frame);
    }

    pub fn parent_address(&self) -> u8 {
        self.parent.address
    }
}
