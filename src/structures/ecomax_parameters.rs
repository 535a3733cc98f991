//! ecoMAX parameter table decoder (`RESPONSE_ECOMAX_PARAMETERS`, §4.2.5).

use crate::structures::device_parameters::unpack_parameter;
use crate::value::{EventDataType, Value};

/// Decodes `[_, first_index, count] + count * record`, returning the new
/// offset. Absent records (all `0xFF`) are skipped, not stored.
pub fn decode(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    let first_index = message[offset + 1];
    let count = message[offset + 2];
    let mut offset = offset + 3;

    let mut parameters = std::collections::HashMap::new();
    for index in first_index..first_index.saturating_add(count) {
        if let Some(values) = unpack_parameter(message, offset, 1) {
            parameters.insert(
                index.to_string(),
                Value::Map(std::collections::HashMap::from([
                    ("value".to_string(), Value::U32(values.value)),
                    ("min_value".to_string(), Value::U32(values.min_value)),
                    ("max_value".to_string(), Value::U32(values.max_value)),
                ])),
            );
        }
        offset += 3;
    }

    data.insert("ecomax_parameters".to_string(), Value::Map(parameters));
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_two_parameters() {
        let message = [0x00, 0x00, 0x02, 10, 0, 20, 0xFF, 0xFF, 0xFF];
        let mut data = EventDataType::new();
        let offset = decode(&message, 0, &mut data);
        assert_eq!(offset, 9);
        let params = data.get("ecomax_parameters").unwrap().as_map().unwrap();
        assert_eq!(params.len(), 1);
    }
}
