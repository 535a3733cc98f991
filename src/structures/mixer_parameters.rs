//! Mixer parameter table decoder (`RESPONSE_MIXER_PARAMETERS`, §4.2.5).

use std::collections::HashMap;

use crate::structures::device_parameters::unpack_parameter;
use crate::value::{EventDataType, Value};

/// Decodes `[_, first_index, parameters_per_mixer, mixer_count] +
/// mixer_count * parameters_per_mixer * record`.
pub fn decode(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    let parameters_per_mixer = message[offset + 2];
    let mixer_count = message[offset + 3];
    let mut offset = offset + 4;

    let mut mixers = HashMap::new();
    for mixer_index in 0..mixer_count {
        let mut parameters = HashMap::new();
        for param_index in 0..parameters_per_mixer {
            if let Some(values) = unpack_parameter(message, offset, 1) {
                parameters.insert(
                    param_index.to_string(),
                    Value::Map(HashMap::from([
                        ("value".to_string(), Value::U32(values.value)),
                        ("min_value".to_string(), Value::U32(values.min_value)),
                        ("max_value".to_string(), Value::U32(values.max_value)),
                    ])),
                );
            }
            offset += 3;
        }
        mixers.insert(mixer_index.to_string(), Value::Map(parameters));
    }

    data.insert("mixer_parameters".to_string(), Value::Map(mixers));
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_mixer_single_parameter() {
        let message = [0x00, 0x00, 0x01, 0x01, 40, 0, 80];
        let mut data = EventDataType::new();
        let offset = decode(&message, 0, &mut data);
        assert_eq!(offset, 7);
        let mixers = data.get("mixer_parameters").unwrap().as_map().unwrap();
        assert_eq!(mixers.len(), 1);
    }
}
