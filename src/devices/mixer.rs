//! Mixer sub-device (§3.2, §4.2.5): mirrors a slice of the parent ecoMAX's
//! event map, keyed by mixer index, with its own typed parameter table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::devices::{Device, SubDevice};
use crate::error::{Error, RequestError};
use crate::parameters::{confirm_set, ConfirmEvent, OwnerKey, Parameter, ParameterDescription, ParameterValues, DEFAULT_SET_TIMEOUT};
use crate::value::Value;

pub struct Mixer {
    pub sub: SubDevice,
    parameters: RwLock<HashMap<String, Parameter>>,
}

impl Mixer {
    pub fn new(index: u8, parent: Arc<Device>) -> Arc<Self> {
        Arc::new(Self { sub: SubDevice::new(index, parent), parameters: RwLock::new(HashMap::new()) })
    }

    pub fn index(&self) -> u8 {
        self.sub.index
    }

    /// Stores or updates the parameter at `catalog_index`, dispatching its
    /// semantic value onto this mixer's own event map.
    pub async fn apply_parameter(
        &self,
        catalog_index: u8,
        description: ParameterDescription,
        values: ParameterValues,
    ) {
        let key = description.name.to_string();
        let mut parameters = self.parameters.write().await;
        parameters
            .entry(key.clone())
            .and_modify(|p| p.update(values))
            .or_insert_with(|| Parameter {
                description,
                values,
                owner: OwnerKey {
                    index: catalog_index,
                    device_index: Some(self.sub.index),
                    is_thermostat: false,
                    is_thermostat_profile: false,
                    is_ecomax_control: false,
                    offset: 0,
                },
                update_done: Arc::new(ConfirmEvent::new()),
                update_pending: Arc::new(ConfirmEvent::new()),
            });
        drop(parameters);
        self.sub.events.dispatch_nowait(key, Value::U32(values.value));
    }

    pub async fn get_parameter(&self, name: &str) -> Option<Parameter> {
        self.parameters.read().await.get(name).cloned()
    }

    /// Validates and, if changed, enqueues the `RequestSetMixerParameter`
    /// frame for `name`'s new semantic value, then awaits confirmation
    /// (§4.4.2 steps 1-8).
    pub async fn set(&self, name: &str, value: f64) -> Result<bool, Error> {
        self.set_with_retry(name, value, 0, DEFAULT_SET_TIMEOUT).await
    }

    pub async fn set_with_retry(&self, name: &str, value: f64, retries: u32, timeout: Duration) -> Result<bool, Error> {
        let (frame, optimistic, update_done) = {
            let mut parameters = self.parameters.write().await;
            let param = parameters
                .get_mut(name)
                .ok_or_else(|| RequestError(format!("unknown mixer parameter {name:?}")))?;
            match param.begin_set(value)? {
                Some(frame) => (frame, param.description.optimistic, param.update_done.clone()),
                None => return Ok(true),
            }
        };
        Ok(confirm_set(|frame| self.sub.enqueue(frame), frame, optimistic, &update_done, retries, timeout).await)
    }

    pub fn set_nowait(self: &Arc<Self>, name: &str, value: f64, retries: u32, timeout: Duration) {
        let this = self.clone();
        let name = name.to_string();
        self.sub.events.spawn_tracked(async move {
            if let Err(e) = this.set_with_retry(&name, value, retries, timeout).await {
                log::warn!("set_nowait({name:?}) on mixer failed: {e}");
            }
        });
    }
}
