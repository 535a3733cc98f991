//! Regulator-data payload decoder (`MESSAGE_REGULATOR_DATA`, §4.2.4):
//! 2 reserved bytes, a 2-byte frame version (only `"1.0"` accepted), the
//! frame-version table, then a schema-driven payload. The schema comes from
//! an earlier `RESPONSE_REGULATOR_DATA_SCHEMA` and isn't carried on the
//! wire, so it's supplied by the caller rather than decoded here.

use crate::data_types::{decode_scalar, BitCursor};
use crate::error::VersionError;
use crate::structures::regulator_data_schema::SchemaEntry;
use crate::value::{EventDataType, Value};

pub const SUPPORTED_VERSION: &str = "1.0";

/// Decodes the regulator-data payload starting at `offset`. `schema` is the
/// sensor-id/type table from the device's cached `RESPONSE_REGULATOR_DATA_SCHEMA`.
pub fn decode(
    message: &[u8],
    offset: usize,
    schema: &[SchemaEntry],
    data: &mut EventDataType,
) -> Result<usize, VersionError> {
    let mut offset = offset + 2;
    let version = format!("{}.{}", message[offset + 1], message[offset]);
    if version != SUPPORTED_VERSION {
        return Err(VersionError(format!(
            "unsupported regulator-data version {version:?}, expected {SUPPORTED_VERSION:?}"
        )));
    }
    offset += 2;

    offset = crate::structures::frame_versions::decode(message, offset, data);

    let mut cursor = BitCursor::new();
    let mut sensors = std::collections::HashMap::new();
    for entry in schema {
        let value = decode_scalar(entry.tag, message, &mut offset, &mut cursor);
        sensors.insert(entry.id.to_string(), value);
    }

    if !sensors.is_empty() {
        data.insert("regdata".to_string(), Value::Map(sensors));
    }

    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::DataTypeTag;

    #[test]
    fn rejects_unsupported_version() {
        let mut message = vec![0x00, 0x00, 0x00, 0x02]; // version "2.0"
        message.extend_from_slice(&[0x00]); // zero frame-version entries
        let mut data = EventDataType::new();
        let result = decode(&message, 0, &[], &mut data);
        assert!(result.is_err());
    }

    #[test]
    fn decodes_against_schema() {
        let mut message = vec![0x00, 0x00, 0x00, 0x01]; // version "1.0"
        message.push(0x00); // zero frame-version entries
        message.extend_from_slice(&42u16.to_le_bytes()); // one U16 sensor
        let schema = [SchemaEntry { id: 7, tag: DataTypeTag::U16 }];
        let mut data = EventDataType::new();
        let offset = decode(&message, 0, &schema, &mut data).unwrap();
        assert_eq!(offset, message.len());
        let sensors = data.get("regdata").unwrap().as_map().unwrap();
        assert_eq!(sensors.get("7").unwrap().as_i64().unwrap(), 42);
    }
}
