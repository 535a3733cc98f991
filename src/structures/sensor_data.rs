//! Sensor-data payload decoder (`MESSAGE_SENSOR_DATA`, §4.2.3). The single
//! largest structure decoder: boiler state, sixteen named output bits, four
//! output flags, seventeen named temperatures, statuses, alerts, fuel and
//! combustion metrics, module firmware versions, lambda sensor, and the
//! per-thermostat/per-mixer sensor blocks.

use serde::Serialize;

use crate::structures::lambda_sensor::LambdaState;
use crate::structures::modules::ConnectedModules;
use crate::structures::BYTE_UNDEFINED;
use crate::value::{EventDataType, Value};

const OUTPUTS: [&str; 16] = [
    "fan",
    "feeder",
    "heating_pump",
    "water_heater_pump",
    "circulation_pump",
    "lighter",
    "alarm",
    "outer_boiler",
    "fan2_exhaust",
    "feeder2",
    "outer_feeder",
    "solar_pump",
    "fireplace_pump",
    "gcz_contact",
    "blow_fan1",
    "blow_fan2",
];

const TEMPERATURES: [&str; 17] = [
    "heating_temp",
    "feeder_temp",
    "water_heater_temp",
    "outside_temp",
    "return_temp",
    "exhaust_temp",
    "optical_temp",
    "upper_buffer_temp",
    "lower_buffer_temp",
    "upper_solar_temp",
    "lower_solar_temp",
    "fireplace_temp",
    "total_gain",
    "hydraulic_coupler_temp",
    "exchanger_temp",
    "air_in_temp",
    "air_out_temp",
];

const STATUSES: [&str; 4] = [
    "heating_target",
    "heating_status",
    "water_heater_target",
    "water_heater_status",
];

const FUEL_LEVEL_OFFSET: u8 = 101;

/// Boiler operating state, per §4.2.3 item 1. Unknown raw codes are kept so
/// that firmware-specific extensions don't get silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceState {
    Off,
    Starting,
    Kindling,
    Heating,
    Supervision,
    Cooling,
    Standby,
    Unknown(u8),
}

impl DeviceState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => DeviceState::Off,
            1 => DeviceState::Starting,
            2 => DeviceState::Kindling,
            3 => DeviceState::Heating,
            4 => DeviceState::Supervision,
            5 => DeviceState::Cooling,
            6 => DeviceState::Standby,
            other => DeviceState::Unknown(other),
        }
    }
}

fn read_f32(message: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        message[offset],
        message[offset + 1],
        message[offset + 2],
        message[offset + 3],
    ])
}

fn read_u32(message: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        message[offset],
        message[offset + 1],
        message[offset + 2],
        message[offset + 3],
    ])
}

fn read_u16(message: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([message[offset], message[offset + 1]])
}

/// Decodes the full sensor-data payload starting at `offset`, returning the
/// new offset. Mirrors the original decoder's strict field order; no field
/// may be reordered.
pub fn decode(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    let mut offset = offset;

    let state_raw = message[offset];
    data.insert("state".to_string(), Value::DeviceState(DeviceState::from_raw(state_raw)));
    offset += 1;

    let outputs = read_u32(message, offset);
    offset += 4;
    for (index, name) in OUTPUTS.iter().enumerate() {
        data.insert(name.to_string(), Value::Bool(outputs & (1 << index) != 0));
    }

    let output_flags = read_u32(message, offset);
    offset += 4;
    data.insert("heating_pump_flag".to_string(), Value::Bool(output_flags & 0x04 != 0));
    data.insert(
        "water_heater_pump_flag".to_string(),
        Value::Bool(output_flags & 0x08 != 0),
    );
    data.insert(
        "circulation_pump_flag".to_string(),
        Value::Bool(output_flags & 0x10 != 0),
    );
    data.insert("solar_pump_flag".to_string(), Value::Bool(output_flags & 0x800 != 0));

    let temperature_count = message[offset];
    offset += 1;
    for _ in 0..temperature_count {
        let index = message[offset] as usize;
        offset += 1;
        let temp = read_f32(message, offset);
        offset += 4;
        if !temp.is_nan() && index < TEMPERATURES.len() {
            data.insert(TEMPERATURES[index].to_string(), Value::F64(temp as f64));
        }
    }

    for (index, name) in STATUSES.iter().enumerate() {
        data.insert(name.to_string(), Value::U8(message[offset + index]));
    }
    offset += STATUSES.len();

    let pending_alerts = message[offset];
    data.insert("pending_alerts".to_string(), Value::U8(pending_alerts));
    offset += pending_alerts as usize + 1;

    let fuel_level = message[offset];
    offset += 1;
    if fuel_level != BYTE_UNDEFINED {
        let corrected = if fuel_level < FUEL_LEVEL_OFFSET {
            fuel_level
        } else {
            fuel_level - FUEL_LEVEL_OFFSET
        };
        data.insert("fuel_level".to_string(), Value::U8(corrected));
    }

    data.insert("transmission".to_string(), Value::U8(message[offset]));
    offset += 1;

    let fan_power = read_f32(message, offset);
    offset += 4;
    if !fan_power.is_nan() {
        data.insert("fan_power".to_string(), Value::F64(fan_power as f64));
    }

    let boiler_load = message[offset];
    offset += 1;
    if boiler_load != BYTE_UNDEFINED {
        data.insert("boiler_load".to_string(), Value::U8(boiler_load));
    }

    let boiler_power = read_f32(message, offset);
    offset += 4;
    if !boiler_power.is_nan() {
        data.insert("boiler_power".to_string(), Value::F64(boiler_power as f64));
    }

    let fuel_consumption = read_f32(message, offset);
    offset += 4;
    if !fuel_consumption.is_nan() {
        data.insert("fuel_consumption".to_string(), Value::F64(fuel_consumption as f64));
    }

    data.insert("thermostat".to_string(), Value::U8(message[offset]));
    offset += 1;

    offset = decode_modules(message, offset, data);
    offset = decode_lambda_sensor(message, offset, data);
    offset = decode_thermostat_sensors(message, offset, data);
    offset = decode_mixer_sensors(message, offset, data);

    offset
}

/// Firmware versions of the six connected modules (§4.2.3 item 14). Module A
/// carries an extra vendor code/number suffix; the rest are `u8.u8.u8`.
fn decode_modules(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    let mut offset = offset;
    let mut modules = ConnectedModules::default();

    macro_rules! decode_one {
        ($field:ident, $is_a:expr) => {{
            if message[offset] != BYTE_UNDEFINED {
                let mut version = format!(
                    "{}.{}.{}",
                    message[offset],
                    message[offset + 1],
                    message[offset + 2]
                );
                offset += 3;
                if $is_a {
                    let vendor_code = message[offset] as char;
                    let vendor_version = message[offset + 1];
                    version.push_str(&format!(".{vendor_code}{vendor_version}"));
                    offset += 2;
                }
                modules.$field = Some(version);
            } else {
                offset += 1;
            }
        }};
    }

    decode_one!(module_a, true);
    decode_one!(module_b, false);
    decode_one!(module_c, false);
    decode_one!(ecolambda, false);
    decode_one!(ecoster, false);

    if message[offset] != BYTE_UNDEFINED {
        modules.panel = Some(format!(
            "{}.{}.{}",
            message[offset],
            message[offset + 1],
            message[offset + 2]
        ));
        offset += 3;
    } else {
        offset += 1;
    }

    data.insert("modules".to_string(), Value::Modules(modules));
    offset
}

fn decode_lambda_sensor(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    let mut offset = offset;
    let raw_state = message[offset];
    offset += 1;
    if raw_state == BYTE_UNDEFINED {
        return offset;
    }

    let target = message[offset];
    offset += 1;
    let level = read_u16(message, offset);
    offset += 2;

    data.insert(
        "lambda_state".to_string(),
        Value::LambdaState(lambda_state_from_raw(raw_state)),
    );
    data.insert("lambda_target".to_string(), Value::U8(target));
    data.insert("lambda_level".to_string(), Value::F64(level as f64 / 10.0));
    offset
}

fn lambda_state_from_raw(raw: u8) -> LambdaState {
    crate::structures::lambda_sensor::decode_state(raw)
}

/// Per-thermostat records (§4.2.3 item 16). Two bits per thermostat in the
/// `contacts` mask carry `contacts` (LSB-first) and `schedule` (LSB-first,
/// shifted by 3). Records with a NaN current temp or non-positive target are
/// dropped rather than stored.
fn decode_thermostat_sensors(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    let mut offset = offset;
    let contacts = message[offset];
    offset += 1;
    if contacts == BYTE_UNDEFINED {
        return offset;
    }

    let thermostat_count = message[offset];
    offset += 1;

    let mut contact_mask: u8 = 1;
    let mut schedule_mask: u8 = 1 << 3;
    let mut sensors = std::collections::HashMap::new();

    for index in 0..thermostat_count {
        let state = message[offset];
        offset += 1;
        let current_temp = read_f32(message, offset);
        offset += 4;
        let target_temp = read_f32(message, offset);
        offset += 4;

        let contacts_state = contacts & contact_mask != 0;
        contact_mask = contact_mask.wrapping_shl(1);
        let schedule_state = contacts & schedule_mask != 0;
        schedule_mask = schedule_mask.wrapping_shl(1);

        if current_temp.is_nan() || target_temp <= 0.0 {
            continue;
        }

        let mut record = std::collections::HashMap::new();
        record.insert("state".to_string(), Value::U8(state));
        record.insert("current_temp".to_string(), Value::F64(current_temp as f64));
        record.insert("target_temp".to_string(), Value::F64(target_temp as f64));
        record.insert("contacts".to_string(), Value::Bool(contacts_state));
        record.insert("schedule".to_string(), Value::Bool(schedule_state));
        sensors.insert(index.to_string(), Value::Map(record));
    }

    let connected = sensors.len();
    data.insert("thermostat_sensors".to_string(), Value::Map(sensors));
    data.insert("thermostats_connected".to_string(), Value::U64(connected as u64));
    data.insert(
        "thermostats_available".to_string(),
        Value::U8(thermostat_count),
    );
    offset
}

/// Per-mixer records (§4.2.3 item 17): 8 bytes each, pump state is
/// `outputs & 0x01`. Records with a NaN current temp are dropped.
fn decode_mixer_sensors(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    let mut offset = offset;
    let mixer_count = message[offset];
    offset += 1;

    let mut sensors = std::collections::HashMap::new();
    for index in 0..mixer_count {
        let current_temp = read_f32(message, offset);
        let target_temp = message[offset + 4];
        let pump = message[offset + 6] & 0x01 != 0;
        offset += 8;

        if current_temp.is_nan() {
            continue;
        }

        let mut record = std::collections::HashMap::new();
        record.insert("current_temp".to_string(), Value::F64(current_temp as f64));
        record.insert("target_temp".to_string(), Value::U8(target_temp));
        record.insert("pump".to_string(), Value::Bool(pump));
        sensors.insert(index.to_string(), Value::Map(record));
    }

    let connected = sensors.len();
    data.insert("mixer_sensors".to_string(), Value::Map(sensors));
    data.insert("mixers_connected".to_string(), Value::U64(connected as u64));
    data.insert("mixers_available".to_string(), Value::U8(mixer_count));
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_sensor_data() {
        let mut message = Vec::new();
        message.push(3); // state = Heating
        message.extend_from_slice(&0u32.to_le_bytes()); // outputs
        message.extend_from_slice(&0u32.to_le_bytes()); // output flags
        message.push(0); // 0 temperatures
        message.extend_from_slice(&[0, 0, 0, 0]); // statuses
        message.push(0); // 0 pending alerts
        message.push(BYTE_UNDEFINED); // fuel level absent
        message.push(0); // transmission
        message.extend_from_slice(&f32::NAN.to_le_bytes()); // fan power
        message.push(BYTE_UNDEFINED); // boiler load absent
        message.extend_from_slice(&f32::NAN.to_le_bytes()); // boiler power
        message.extend_from_slice(&f32::NAN.to_le_bytes()); // fuel consumption
        message.push(0); // thermostat
        message.extend_from_slice(&[BYTE_UNDEFINED; 6]); // six absent modules
        message.push(BYTE_UNDEFINED); // lambda absent
        message.push(BYTE_UNDEFINED); // thermostat contacts absent
        message.push(0); // zero mixers

        let mut data = EventDataType::new();
        let offset = decode(&message, 0, &mut data);
        assert_eq!(offset, message.len());
        assert_eq!(data.get("state").unwrap().clone(), Value::DeviceState(DeviceState::Heating));
        assert!(data.get("fuel_level").is_none());
        assert!(data.get("lambda_state").is_none());
    }
}
