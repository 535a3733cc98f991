//! ecoSTER thermostat panel (§3.2): a plain addressable device. It speaks the
//! same frame types as ecoMAX but has no parameter catalog of its own here;
//! its sensor/parameter values are reached through the generic event map.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::devices::Device;
use crate::frame::Frame;
use crate::value::{EventDataType, Value};

pub struct EcoSter {
    pub device: Arc<Device>,
}

impl EcoSter {
    pub fn new(address: u8, write_queue: mpsc::UnboundedSender<Frame>) -> Arc<Self> {
        Arc::new(Self { device: Device::new(address, write_queue) })
    }

    pub fn address(&self) -> u8 {
        self.device.address
    }

    pub fn handle_data(&self, data: EventDataType) {
        self.device.handle_data(data);
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.device.events.get(key).await
    }

    pub async fn shutdown(&self) {
        self.device.shutdown().await;
    }
}
