//! The ecoMAX boiler controller (§3.2, §3.6, §4.3.2): the addressable
//! device every master-side session ultimately talks to. Owns the
//! regulator-data schema cache, lazily creates [`Mixer`]/[`Thermostat`]
//! sub-devices as sensor/parameter tables mention them, and derives two
//! attributes other devices only report raw (§4.4.1): a synthetic
//! `boiler_control` switch mirrored from `mode`, and a running `burned_fuel`
//! total integrated from `fuel_consumption` samples over elapsed time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex, RwLock};

use crate::data_types::DataTypeTag;
use crate::devices::mixer::Mixer;
use crate::devices::thermostat::Thermostat;
use crate::devices::{Device, SETUP_REQUEST_RETRIES, SETUP_WAIT_TIMEOUT};
use crate::error::{Error, RequestError};
use crate::filters;
use crate::parameters::custom;
use crate::frame::{Frame, FrameType, ADDR_ECOMAX};
use crate::parameters::catalog::{ECOMAX_I_PARAMETERS, ECOMAX_P_PARAMETERS, MIXER_PARAMETERS, THERMOSTAT_PARAMETERS};
use crate::parameters::{
    confirm_set, ConfirmEvent, Kind, OwnerKey, Parameter, ParameterDescription, ParameterValues, DEFAULT_SET_TIMEOUT,
};
use crate::structures::regulator_data_schema::SchemaEntry;
use crate::value::{EventDataType, Value};

fn parameter_values_from_map(map: &HashMap<String, Value>) -> Option<ParameterValues> {
    Some(ParameterValues {
        value: map.get("value")?.as_i64()? as u32,
        min_value: map.get("min_value")?.as_i64()? as u32,
        max_value: map.get("max_value")?.as_i64()? as u32,
    })
}

fn schema_entry_from_value(value: &Value) -> Option<SchemaEntry> {
    let map = value.as_map()?;
    let id = map.get("id")?.as_i64()? as u16;
    let tag_byte = map.get("type")?.as_i64()? as u8;
    Some(SchemaEntry { id, tag: DataTypeTag::from_tag(tag_byte).unwrap_or(DataTypeTag::Undefined0) })
}

pub struct Ecomax {
    pub device: Arc<Device>,
    mixers: RwLock<HashMap<u8, Arc<Mixer>>>,
    thermostats: RwLock<HashMap<u8, Arc<Thermostat>>>,
    parameters: RwLock<HashMap<String, Parameter>>,
    regulator_schema: RwLock<Vec<SchemaEntry>>,
    product_model: RwLock<Option<String>>,
    product_type: RwLock<Option<u8>>,
    burned_fuel: Mutex<f64>,
    fuel_timer: Mutex<Option<Instant>>,
}

impl Ecomax {
    pub async fn new(write_queue: mpsc::UnboundedSender<Frame>) -> Arc<Self> {
        let this = Arc::new(Self {
            device: Device::new(ADDR_ECOMAX, write_queue),
            mixers: RwLock::new(HashMap::new()),
            thermostats: RwLock::new(HashMap::new()),
            parameters: RwLock::new(HashMap::new()),
            regulator_schema: RwLock::new(Vec::new()),
            product_model: RwLock::new(None),
            product_type: RwLock::new(None),
            burned_fuel: Mutex::new(0.0),
            fuel_timer: Mutex::new(None),
        });
        this.register_derived_attributes().await;
        this
    }

    /// Wires the two attributes computed from raw sensor readings rather
    /// than decoded directly (§4.4.1).
    async fn register_derived_attributes(self: &Arc<Self>) {
        let mode_target = self.clone();
        self.device
            .events
            .subscribe(
                "mode",
                filters::on_change(Arc::new(move |value| {
                    let target = mode_target.clone();
                    Box::pin(async move {
                        target.sync_boiler_control(&value).await;
                        None
                    })
                })),
            )
            .await;

        let fuel_target = self.clone();
        self.device
            .events
            .subscribe(
                "fuel_consumption",
                Arc::new(move |value| {
                    let target = fuel_target.clone();
                    Box::pin(async move {
                        target.integrate_burned_fuel(&value).await;
                        None
                    })
                }),
            )
            .await;
    }

    async fn sync_boiler_control(self: &Arc<Self>, mode: &Value) {
        let Some(mode) = mode.as_i64() else { return };
        let value = if mode != 0 { 1 } else { 0 };
        let values = ParameterValues { value, min_value: 0, max_value: 1 };
        let mut parameters = self.parameters.write().await;
        parameters
            .entry("boiler_control".to_string())
            .and_modify(|p| p.update(values))
            .or_insert_with(|| Parameter {
                description: ParameterDescription { name: "boiler_control", optimistic: true, kind: Kind::Switch, size: 1 },
                values,
                owner: OwnerKey {
                    index: 0,
                    device_index: None,
                    is_thermostat: false,
                    is_thermostat_profile: false,
                    is_ecomax_control: true,
                    offset: 0,
                },
                update_done: Arc::new(ConfirmEvent::new()),
                update_pending: Arc::new(ConfirmEvent::new()),
            });
        drop(parameters);
        self.device.events.dispatch_nowait("boiler_control".to_string(), Value::U32(value));
    }

    async fn integrate_burned_fuel(&self, consumption: &Value) {
        let Some(consumption) = consumption.as_f64() else { return };
        let now = Instant::now();
        let mut timer = self.fuel_timer.lock().await;
        if let Some(previous) = *timer {
            let elapsed_hours = now.duration_since(previous).as_secs_f64() / 3600.0;
            let mut total = self.burned_fuel.lock().await;
            *total += consumption * elapsed_hours;
            self.device.events.dispatch_nowait("burned_fuel".to_string(), Value::F64(*total));
        }
        *timer = Some(now);
    }

    /// Picks the ecoMAX parameter catalog for the current product, applying
    /// any firmware-specific override table (§4.4.3). Product type `1` is
    /// ecoMAX-I; anything else (including unknown) defaults to ecoMAX-P.
    async fn ecomax_catalog(&self) -> Vec<ParameterDescription> {
        let base = match *self.product_type.read().await {
            Some(1) => ECOMAX_I_PARAMETERS,
            _ => ECOMAX_P_PARAMETERS,
        };
        match self.product_model.read().await.as_deref().and_then(custom::lookup) {
            Some(overrides) => custom::apply(base, overrides),
            None => base.to_vec(),
        }
    }

    async fn get_or_create_mixer(self: &Arc<Self>, index: u8) -> Arc<Mixer> {
        let mut mixers = self.mixers.write().await;
        mixers.entry(index).or_insert_with(|| Mixer::new(index, self.device.clone())).clone()
    }

    async fn get_or_create_thermostat(self: &Arc<Self>, index: u8) -> Arc<Thermostat> {
        let mut thermostats = self.thermostats.write().await;
        thermostats.entry(index).or_insert_with(|| Thermostat::new(index, self.device.clone())).clone()
    }

    async fn apply_ecomax_parameters(&self, params: HashMap<String, Value>) {
        let catalog = self.ecomax_catalog().await;
        let mut parameters = self.parameters.write().await;
        for (index_str, record) in params {
            let Ok(index) = index_str.parse::<usize>() else { continue };
            let Some(values) = record.as_map().and_then(parameter_values_from_map) else { continue };
            let Some(description) = catalog.get(index).copied() else { continue };
            parameters
                .entry(description.name.to_string())
                .and_modify(|p| p.update(values))
                .or_insert_with(|| Parameter {
                    description,
                    values,
                    owner: OwnerKey {
                        index: index as u8,
                        device_index: None,
                        is_thermostat: false,
                        is_thermostat_profile: false,
                        is_ecomax_control: false,
                        offset: 0,
                    },
                    update_done: Arc::new(ConfirmEvent::new()),
                    update_pending: Arc::new(ConfirmEvent::new()),
                });
        }
    }

    async fn apply_mixer_parameters(self: &Arc<Self>, mixers: HashMap<String, Value>) {
        for (mixer_index_str, params_value) in mixers {
            let Ok(mixer_index) = mixer_index_str.parse::<u8>() else { continue };
            let Some(params) = params_value.as_map() else { continue };
            let mixer = self.get_or_create_mixer(mixer_index).await;
            for (param_index_str, record) in params {
                let Ok(param_index) = param_index_str.parse::<usize>() else { continue };
                let Some(values) = record.as_map().and_then(parameter_values_from_map) else { continue };
                let Some(description) = MIXER_PARAMETERS.get(param_index).copied() else { continue };
                mixer.apply_parameter(param_index as u8, description, values).await;
            }
        }
    }

    async fn apply_thermostat_parameters(self: &Arc<Self>, data: &EventDataType) {
        if let Some(Value::Map(profile)) = data.get("thermostat_profile").cloned() {
            if let Some(values) = parameter_values_from_map(&profile) {
                let mut parameters = self.parameters.write().await;
                parameters
                    .entry("thermostat_profile".to_string())
                    .and_modify(|p| p.update(values))
                    .or_insert_with(|| Parameter {
                        description: crate::parameters::catalog::THERMOSTAT_PROFILE,
                        values,
                        owner: OwnerKey {
                            index: 0,
                            device_index: None,
                            is_thermostat: false,
                            is_thermostat_profile: true,
                            is_ecomax_control: false,
                            offset: 0,
                        },
                        update_done: Arc::new(ConfirmEvent::new()),
                        update_pending: Arc::new(ConfirmEvent::new()),
                    });
            }
        }

        let Some(Value::Map(thermostats)) = data.get("thermostat_parameters").cloned() else { return };
        for (thermostat_index_str, params_value) in thermostats {
            let Ok(thermostat_index) = thermostat_index_str.parse::<u8>() else { continue };
            let Some(params) = params_value.as_map() else { continue };
            // Parameters are laid out contiguously across all thermostats'
            // blocks in the wire request; this thermostat's block starts at
            // `index * parameter_count_per_thermostat` (§4.4.2 step 5).
            let offset = thermostat_index * params.len() as u8;
            let thermostat = self.get_or_create_thermostat(thermostat_index).await;
            for (param_index_str, record) in params {
                let Ok(param_index) = param_index_str.parse::<usize>() else { continue };
                let Some(values) = record.as_map().and_then(parameter_values_from_map) else { continue };
                let Some(description) = THERMOSTAT_PARAMETERS.get(param_index).copied() else { continue };
                thermostat.apply_parameter(param_index as u8, description, values, offset).await;
            }
        }
    }

    async fn apply_mixer_sensors(self: &Arc<Self>, mixers: HashMap<String, Value>) {
        for (mixer_index_str, record) in mixers {
            let Ok(mixer_index) = mixer_index_str.parse::<u8>() else { continue };
            let Some(fields) = record.as_map() else { continue };
            let mixer = self.get_or_create_mixer(mixer_index).await;
            for (key, value) in fields {
                mixer.sub.events.dispatch_nowait(key.clone(), value.clone());
            }
        }
    }

    async fn apply_thermostat_sensors(self: &Arc<Self>, thermostats: HashMap<String, Value>) {
        for (thermostat_index_str, record) in thermostats {
            let Ok(thermostat_index) = thermostat_index_str.parse::<u8>() else { continue };
            let Some(fields) = record.as_map() else { continue };
            let thermostat = self.get_or_create_thermostat(thermostat_index).await;
            for (key, value) in fields {
                thermostat.sub.events.dispatch_nowait(key.clone(), value.clone());
            }
        }
    }

    /// Decodes a frame already addressed to this ecoMAX and folds it into
    /// device/sub-device state (§4.3.2). `MESSAGE_REGULATOR_DATA` is decoded
    /// against the cached schema rather than through [`crate::frames::decode`]'s
    /// schema-less fallback.
    pub async fn handle_frame(self: &Arc<Self>, frame_type: FrameType, message: &[u8]) -> Result<(), Error> {
        let data = if frame_type == FrameType::MessageRegulatorData {
            let schema = self.regulator_schema.read().await.clone();
            crate::frames::decode_regulator_data(message, &schema)?
        } else {
            crate::frames::decode(frame_type, message)?
        };
        self.ingest(data).await;
        Ok(())
    }

    async fn ingest(self: &Arc<Self>, data: EventDataType) {
        if let Some(Value::List(entries)) = data.get("schema") {
            let schema = entries.iter().filter_map(schema_entry_from_value).collect();
            *self.regulator_schema.write().await = schema;
        }

        if let Some(&Value::U8(product_type)) = data.get("type") {
            *self.product_type.write().await = Some(product_type);
        }

        if let Some(Value::Str(model)) = data.get("model") {
            *self.product_model.write().await = Some(model.clone());
        }

        if let Some(Value::FrameVersions(versions)) = data.get("frame_versions") {
            self.device.update_frame_versions(versions).await;
        }

        if let Some(Value::Map(params)) = data.get("ecomax_parameters").cloned() {
            self.apply_ecomax_parameters(params).await;
        }

        if let Some(Value::Map(mixers)) = data.get("mixer_parameters").cloned() {
            self.apply_mixer_parameters(mixers).await;
        }

        self.apply_thermostat_parameters(&data).await;

        if let Some(Value::Map(mixers)) = data.get("mixer_sensors").cloned() {
            self.apply_mixer_sensors(mixers).await;
        }

        if let Some(Value::Map(thermostats)) = data.get("thermostat_sensors").cloned() {
            self.apply_thermostat_sensors(thermostats).await;
        }

        self.device.handle_data(data);
    }

    /// Issues the required setup frames (§4.3.4): UID, data schema, ecoMAX
    /// parameters, mixer parameters, password and alerts, each with its own
    /// retry budget, bounded overall by [`SETUP_WAIT_TIMEOUT`].
    pub async fn setup(self: &Arc<Self>) {
        let required = [
            (FrameType::RequestUid, "uid"),
            (FrameType::RequestDataSchema, "schema"),
            (FrameType::RequestEcomaxParameters, "ecomax_parameters"),
            (FrameType::RequestMixerParameters, "mixer_parameters"),
            (FrameType::RequestPassword, "password"),
            (FrameType::RequestAlerts, "alerts"),
        ];

        let setup = futures::future::join_all(
            required.iter().map(|&(frame_type, key)| self.device.request_with_retry(frame_type, key)),
        );

        if tokio::time::timeout(SETUP_WAIT_TIMEOUT, setup).await.is_err() {
            self.device
                .frame_errors
                .lock()
                .await
                .push(format!("setup did not complete within {SETUP_WAIT_TIMEOUT:?}"));
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.device.events.get(key).await
    }

    pub async fn get_parameter(&self, name: &str) -> Option<Parameter> {
        self.parameters.read().await.get(name).cloned()
    }

    /// Validates `name`'s new semantic value and, if changed, enqueues the
    /// request; waits up to [`DEFAULT_SET_TIMEOUT`] for confirmation unless
    /// the parameter is optimistic (§4.4.1, §4.4.2).
    pub async fn set(&self, name: &str, value: f64) -> Result<bool, Error> {
        self.set_with_retry(name, value, 0, DEFAULT_SET_TIMEOUT).await
    }

    /// As [`Ecomax::set`], retrying the request up to `retries` additional
    /// times if no confirmation arrives within `timeout` (§4.4.1, §4.4.2
    /// steps 6-8).
    pub async fn set_with_retry(&self, name: &str, value: f64, retries: u32, timeout: Duration) -> Result<bool, Error> {
        let (frame, optimistic, update_done) = {
            let mut parameters = self.parameters.write().await;
            let param = parameters
                .get_mut(name)
                .ok_or_else(|| RequestError(format!("unknown ecomax parameter {name:?}")))?;
            match param.begin_set(value)? {
                Some(frame) => (frame, param.description.optimistic, param.update_done.clone()),
                None => return Ok(true),
            }
        };

        Ok(confirm_set(|frame| self.device.enqueue(frame), frame, optimistic, &update_done, retries, timeout).await)
    }

    /// Fire-and-forget variant of [`Ecomax::set_with_retry`] (§4.4.1
    /// `set_nowait`); failures are logged rather than returned.
    pub fn set_nowait(self: &Arc<Self>, name: &str, value: f64, retries: u32, timeout: Duration) {
        let this = self.clone();
        let name = name.to_string();
        self.device.events.spawn_tracked(async move {
            if let Err(e) = this.set_with_retry(&name, value, retries, timeout).await {
                log::warn!("set_nowait({name:?}) on ecomax failed: {e}");
            }
        });
    }

    pub async fn mixer(self: &Arc<Self>, index: u8) -> Arc<Mixer> {
        self.get_or_create_mixer(index).await
    }

    pub async fn thermostat(self: &Arc<Self>, index: u8) -> Arc<Thermostat> {
        self.get_or_create_thermostat(index).await
    }

    pub async fn shutdown(&self) {
        self.device.shutdown().await;
    }
}

/// Max setup-request retries exposed for tests/diagnostics.
pub const MAX_SETUP_RETRIES: u32 = SETUP_REQUEST_RETRIES;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn boiler_control_mirrors_mode() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let ecomax = Ecomax::new(tx).await;
        ecomax.device.events.dispatch("mode", Value::U8(3)).await;
        tokio::task::yield_now().await;
        let param = ecomax.get_parameter("boiler_control").await.unwrap();
        assert_eq!(param.values.value, 1);
    }

    #[tokio::test]
    async fn burned_fuel_starts_at_zero_until_second_sample() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let ecomax = Ecomax::new(tx).await;
        ecomax.device.events.dispatch("fuel_consumption", Value::F64(2.0)).await;
        assert!(ecomax.device.events.get_nowait_async("burned_fuel").await.is_none());
    }

    #[tokio::test]
    async fn applies_ecomax_parameter_from_catalog() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let ecomax = Ecomax::new(tx).await;
        let mut params = HashMap::new();
        params.insert(
            "0".to_string(),
            Value::Map(HashMap::from([
                ("value".to_string(), Value::U32(80)),
                ("min_value".to_string(), Value::U32(0)),
                ("max_value".to_string(), Value::U32(100)),
            ])),
        );
        ecomax.apply_ecomax_parameters(params).await;
        let param = ecomax.get_parameter("airflow_power_100").await.unwrap();
        assert_eq!(param.values.value, 80);
    }
}
