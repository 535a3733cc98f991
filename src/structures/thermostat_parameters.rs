//! Thermostat parameter table decoder (`RESPONSE_THERMOSTAT_PARAMETERS`,
//! §4.2.5). The per-thermostat parameter width isn't carried on the wire;
//! it's derived from `(first_index + last_index) / thermostat_count`, so
//! the caller must supply `thermostat_count` from the most recent
//! `thermostats_available` sensor reading (§9 open question #3).

use std::collections::HashMap;

use crate::structures::device_parameters::unpack_parameter;
use crate::value::{EventDataType, Value};

fn parameter_size(index: usize) -> usize {
    // Mirrors the catalog: temperature-like entries are 2 bytes wide.
    matches!(
        index,
        1 | 2 | 9 | 10 | 11 | 12
    )
    .then_some(2)
    .unwrap_or(1)
}

fn record(values: crate::parameters::ParameterValues) -> Value {
    Value::Map(HashMap::from([
        ("value".to_string(), Value::U32(values.value)),
        ("min_value".to_string(), Value::U32(values.min_value)),
        ("max_value".to_string(), Value::U32(values.max_value)),
    ]))
}

/// Decodes the profile parameter plus one block per thermostat. Returns
/// `(data, new_offset)` unchanged at `offset + 0` advance when
/// `thermostat_count == 0`, per the zero-division guard in §9.
pub fn decode(message: &[u8], offset: usize, thermostat_count: u8, data: &mut EventDataType) -> usize {
    if thermostat_count == 0 {
        return offset;
    }

    let first_index = message[offset + 1] as usize;
    let last_index = message[offset + 2] as usize;
    let profile = unpack_parameter(message, offset + 3, 1);
    let parameters_per_thermostat = (first_index + last_index) / thermostat_count as usize;
    let mut offset = offset + 6;

    let mut thermostats = HashMap::new();
    for thermostat_index in 0..thermostat_count {
        let mut parameters = HashMap::new();
        for param_index in first_index..parameters_per_thermostat {
            let size = parameter_size(param_index);
            if let Some(values) = unpack_parameter(message, offset, size) {
                parameters.insert(param_index.to_string(), record(values));
            }
            offset += 3 * size;
        }
        if !parameters.is_empty() {
            thermostats.insert(thermostat_index.to_string(), Value::Map(parameters));
        }
    }

    if thermostats.is_empty() {
        return offset;
    }

    if let Some(profile) = profile {
        data.insert("thermostat_profile".to_string(), record(profile));
    }
    data.insert("thermostat_parameters".to_string(), Value::Map(thermostats));
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_circuits_on_zero_thermostats() {
        let message = [0u8; 16];
        let mut data = EventDataType::new();
        let offset = decode(&message, 0, 0, &mut data);
        assert_eq!(offset, 0);
        assert!(data.is_empty());
    }
}
