//! Device parameters: typed, writable cells that round-trip through a
//! device's event map (§3.3, §4.4.2).

pub mod catalog;
pub mod custom;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::frame::{FrameType, ADDR_ECOMAX};
use crate::structures::device_parameters::pack_parameter;
use crate::value::{EventDataType, Value};

/// Default confirmation timeout for a single `set()` attempt (§4.4.1).
pub const DEFAULT_SET_TIMEOUT: Duration = Duration::from_secs(5);

/// A boolean flag with a race-free async wait, mirroring `asyncio.Event` as
/// used by the original `update_done`/`update_pending` parameter state
/// (§4.4.2 steps 6-8).
pub struct ConfirmEvent {
    flag: std::sync::Mutex<bool>,
    notify: tokio::sync::Notify,
}

impl ConfirmEvent {
    pub fn new() -> Self {
        Self { flag: std::sync::Mutex::new(false), notify: tokio::sync::Notify::new() }
    }

    pub fn set(&self) {
        *self.flag.lock().unwrap() = true;
        self.notify.notify_waiters();
    }

    pub fn clear(&self) {
        *self.flag.lock().unwrap() = false;
    }

    pub fn is_set(&self) -> bool {
        *self.flag.lock().unwrap()
    }

    /// Suspends until [`ConfirmEvent::set`] is called. The `notified()`
    /// future is created before the flag is checked so a `set()` racing
    /// with this call is never missed.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ConfirmEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfirmEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmEvent").field("set", &self.is_set()).finish()
    }
}

/// Enqueues `frame` via `enqueue`, then for non-optimistic parameters waits
/// up to `timeout` for `update_done`, retrying up to `retries` additional
/// times (§4.4.2 steps 6-8; §4.4.1 `set`/`set_nowait`).
pub async fn confirm_set(
    mut enqueue: impl FnMut(Frame),
    frame: Frame,
    optimistic: bool,
    update_done: &ConfirmEvent,
    retries: u32,
    timeout: Duration,
) -> bool {
    if optimistic {
        enqueue(frame);
        return true;
    }

    for _ in 0..=retries {
        enqueue(frame.clone());
        if tokio::time::timeout(timeout, update_done.wait()).await.is_ok() && update_done.is_set() {
            return true;
        }
    }

    false
}

/// The raw `value`/`min_value`/`max_value` triple as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterValues {
    pub value: u32,
    pub min_value: u32,
    pub max_value: u32,
}

/// A parameter variant, carrying the fields the wire-level semantic
/// conversion needs (§3.3).
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// `semantic = (raw - offset) * step`.
    Number { step: f64, precision: u8, offset: i32 },
    /// Semantic value is `"on"` iff `raw == 1`.
    Switch,
}

impl Kind {
    pub fn number() -> Self {
        Kind::Number { step: 1.0, precision: 0, offset: 0 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParameterDescription {
    pub name: &'static str,
    pub optimistic: bool,
    pub kind: Kind,
    /// Wire width in bytes per field; thermostat temperatures use 2.
    pub size: u8,
}

impl ParameterDescription {
    pub const fn number(name: &'static str) -> Self {
        ParameterDescription { name, optimistic: false, kind: Kind::Number { step: 1.0, precision: 0, offset: 0 }, size: 1 }
    }

    pub const fn switch(name: &'static str) -> Self {
        ParameterDescription { name, optimistic: false, kind: Kind::Switch, size: 1 }
    }

    pub const fn with_multiplier(mut self, multiplier: u32) -> Self {
        if let Kind::Number { precision, offset, .. } = self.kind {
            self.kind = Kind::Number { step: 1.0 / multiplier as f64, precision, offset };
        }
        self
    }

    pub const fn with_size(mut self, size: u8) -> Self {
        self.size = size;
        self
    }
}

/// A writable cell living inside a device's event map (§3.3). `update_done`/
/// `update_pending` are shared with every clone of this parameter and with
/// the copy held in the owning device's parameter table, so a `set()` call
/// that released the table lock to await confirmation still observes the
/// same later `update()` (§4.4.2 steps 6-8).
#[derive(Debug, Clone)]
pub struct Parameter {
    pub description: ParameterDescription,
    pub values: ParameterValues,
    pub owner: OwnerKey,
    pub update_done: Arc<ConfirmEvent>,
    pub update_pending: Arc<ConfirmEvent>,
}

/// Stable addressing for a parameter independent of its frame encoding.
#[derive(Debug, Clone, Copy)]
pub struct OwnerKey {
    pub index: u8,
    pub device_index: Option<u8>,
    pub is_thermostat: bool,
    pub is_thermostat_profile: bool,
    pub is_ecomax_control: bool,
    /// This parameter's offset within the thermostat's portion of a
    /// `RequestSetThermostatParameter` frame — distinct from
    /// `description.size`, the field's byte width. Only meaningful when
    /// `is_thermostat`.
    pub offset: u8,
}

#[derive(Debug, thiserror::Error)]
#[error("parameter value {value} outside of bounds [{min}, {max}]")]
pub struct ValidationError {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl Parameter {
    /// Semantic value per the variant's conversion rule.
    pub fn value(&self) -> f64 {
        match self.description.kind {
            Kind::Number { step, offset, .. } => (self.values.value as i64 - offset as i64) as f64 * step,
            Kind::Switch => self.values.value as f64,
        }
    }

    pub fn min_value(&self) -> f64 {
        match self.description.kind {
            Kind::Number { step, offset, .. } => (self.values.min_value as i64 - offset as i64) as f64 * step,
            Kind::Switch => 0.0,
        }
    }

    pub fn max_value(&self) -> f64 {
        match self.description.kind {
            Kind::Number { step, offset, .. } => (self.values.max_value as i64 - offset as i64) as f64 * step,
            Kind::Switch => 1.0,
        }
    }

    fn pack(&self, semantic: f64) -> u32 {
        match self.description.kind {
            Kind::Number { step, offset, .. } => ((semantic / step).round() as i64 + offset as i64) as u32,
            Kind::Switch => semantic as u32,
        }
    }

    /// `set()` steps 1-5 of §4.4.2: validates, computes the new raw value,
    /// and reports whether anything actually changed. Non-optimistic
    /// parameters have `update_pending` armed and `update_done` cleared
    /// here, before the caller enqueues the request, so a response racing
    /// with the enqueue is never missed (steps 6-8 are the caller's
    /// responsibility: enqueue, then await `update_done` unless
    /// optimistic).
    pub fn begin_set(&mut self, semantic: f64) -> Result<Option<Frame>, ValidationError> {
        let (min, max) = (self.min_value(), self.max_value());
        if semantic < min || semantic > max {
            return Err(ValidationError { value: semantic, min, max });
        }

        let new = self.pack(semantic);
        if new == self.values.value {
            return Ok(None);
        }
        self.values.value = new;
        let frame = self.build_request();
        if !self.description.optimistic {
            self.update_done.clear();
            self.update_pending.set();
        }
        Ok(Some(frame))
    }

    /// Builds the request frame for this parameter's current raw value, per
    /// the owner-specific encoding table in §4.4.2.
    pub fn build_request(&self) -> Frame {
        let owner = &self.owner;
        if owner.is_ecomax_control {
            let mut data = EventDataType::new();
            data.insert("value".to_string(), Value::U32(self.values.value));
            return Frame::from_data(FrameType::RequestEcomaxControl, ADDR_ECOMAX, data);
        }

        if owner.is_thermostat_profile {
            let mut data = EventDataType::new();
            data.insert("index".to_string(), Value::U8(owner.index));
            data.insert("value".to_string(), Value::U32(self.values.value));
            data.insert("offset".to_string(), Value::U8(0));
            data.insert("size".to_string(), Value::U8(1));
            return Frame::from_data(FrameType::RequestSetThermostatParameter, ADDR_ECOMAX, data);
        }

        if owner.is_thermostat {
            let mut data = EventDataType::new();
            data.insert("index".to_string(), Value::U8(owner.index + 1));
            data.insert("value".to_string(), Value::U32(self.values.value));
            data.insert("offset".to_string(), Value::U8(owner.offset));
            data.insert("size".to_string(), Value::U8(self.description.size));
            return Frame::from_data(FrameType::RequestSetThermostatParameter, ADDR_ECOMAX, data);
        }

        if let Some(device_index) = owner.device_index {
            let mut data = EventDataType::new();
            data.insert("device_index".to_string(), Value::U8(device_index));
            data.insert("index".to_string(), Value::U8(owner.index));
            data.insert("value".to_string(), Value::U32(self.values.value));
            return Frame::from_data(FrameType::RequestSetMixerParameter, ADDR_ECOMAX, data);
        }

        let mut data = EventDataType::new();
        data.insert("index".to_string(), Value::U8(owner.index));
        data.insert("value".to_string(), Value::U32(self.values.value));
        Frame::from_data(FrameType::RequestSetEcomaxParameter, ADDR_ECOMAX, data)
    }

    /// Called when a later response delivers a fresh [`ParameterValues`] for
    /// this parameter's key: confirms any pending `set()` (§4.4.2 step 8).
    pub fn update(&mut self, values: ParameterValues) {
        self.update_done.set();
        self.update_pending.clear();
        self.values = values;
    }

    pub fn raw_record(&self) -> Vec<u8> {
        pack_parameter(&self.values, self.description.size as usize)
    }
}

use crate::frame::Frame;

#[cfg(test)]
mod tests {
    use super::*;

    fn number_parameter() -> Parameter {
        Parameter {
            description: ParameterDescription::number("heating_target_temp"),
            values: ParameterValues { value: 60, min_value: 50, max_value: 80 },
            owner: OwnerKey { index: 5, device_index: None, is_thermostat: false, is_thermostat_profile: false, is_ecomax_control: false, offset: 0 },
            update_done: Arc::new(ConfirmEvent::new()),
            update_pending: Arc::new(ConfirmEvent::new()),
        }
    }

    #[test]
    fn set_is_noop_when_value_unchanged() {
        let mut p = number_parameter();
        let request = p.begin_set(60.0).unwrap();
        assert!(request.is_none());
    }

    #[test]
    fn set_rejects_out_of_bounds() {
        let mut p = number_parameter();
        assert!(p.begin_set(200.0).is_err());
    }

    #[test]
    fn set_builds_ecomax_parameter_request() {
        let mut p = number_parameter();
        let request = p.begin_set(65.0).unwrap().unwrap();
        assert_eq!(request.frame_type, FrameType::RequestSetEcomaxParameter);
        assert_eq!(p.values.value, 65);
    }

    #[test]
    fn begin_set_arms_update_pending_for_non_optimistic_parameters() {
        let mut p = number_parameter();
        p.update_done.set();
        p.begin_set(65.0).unwrap();
        assert!(p.update_pending.is_set());
        assert!(!p.update_done.is_set());
    }

    #[test]
    fn update_confirms_a_pending_set() {
        let mut p = number_parameter();
        p.begin_set(65.0).unwrap();
        assert!(!p.update_done.is_set());
        p.update(ParameterValues { value: 65, min_value: 50, max_value: 80 });
        assert!(p.update_done.is_set());
        assert!(!p.update_pending.is_set());
    }

    #[tokio::test]
    async fn confirm_set_waits_for_update_done_then_succeeds() {
        let mut p = number_parameter();
        let frame = p.begin_set(65.0).unwrap().unwrap();
        let update_done = p.update_done.clone();

        let waiter = tokio::spawn(async move {
            confirm_set(|_| {}, frame, false, &update_done, 0, Duration::from_secs(1)).await
        });

        tokio::task::yield_now().await;
        p.update(ParameterValues { value: 65, min_value: 50, max_value: 80 });
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn confirm_set_returns_false_after_retries_exhausted() {
        let mut p = number_parameter();
        let frame = p.begin_set(65.0).unwrap().unwrap();
        let mut sends = 0;
        let confirmed =
            confirm_set(|_| sends += 1, frame, false, &p.update_done, 2, Duration::from_millis(10)).await;
        assert!(!confirmed);
        assert_eq!(sends, 3);
    }

    #[test]
    fn optimistic_set_does_not_touch_update_events() {
        let mut p = number_parameter();
        p.description.optimistic = true;
        p.update_done.set();
        p.begin_set(65.0).unwrap();
        assert!(p.update_done.is_set());
        assert!(!p.update_pending.is_set());
    }
}
