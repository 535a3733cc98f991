//! Frame-type dispatch table: turns a decoded [`crate::frame::Frame`]'s raw
//! message into an [`EventDataType`] and back (§6.2).
//!
//! `MESSAGE_REGULATOR_DATA` is the one frame type whose payload can't be
//! decoded from the message bytes alone — it needs the schema from a
//! previously received `RESPONSE_REGULATOR_DATA_SCHEMA`. [`decode`] decodes
//! it against an empty schema (frame-version table only, no `regdata`); the
//! dispatcher calls [`decode_regulator_data`] directly with the device's
//! cached schema instead of going through [`crate::frame::Frame::data`].

use std::collections::HashMap;

use crate::error::{Error, FrameDataError};
use crate::frame::FrameType;
use crate::structures;
use crate::structures::regulator_data_schema::SchemaEntry;
use crate::value::{EventDataType, Value};

fn get_u8(data: &EventDataType, key: &str) -> Result<u8, FrameDataError> {
    data.get(key)
        .and_then(Value::as_i64)
        .map(|v| v as u8)
        .ok_or_else(|| FrameDataError(format!("missing or invalid field {key:?}")))
}

fn get_u32(data: &EventDataType, key: &str) -> Result<u32, FrameDataError> {
    data.get(key)
        .and_then(Value::as_i64)
        .map(|v| v as u32)
        .ok_or_else(|| FrameDataError(format!("missing or invalid field {key:?}")))
}

/// Decodes a frame's message into its event map. `MESSAGE_REGULATOR_DATA` is
/// decoded with no schema available here; see [`decode_regulator_data`].
pub fn decode(frame_type: FrameType, message: &[u8]) -> Result<EventDataType, Error> {
    let mut data = EventDataType::new();

    use FrameType::*;
    match frame_type {
        RequestStopMaster | RequestStartMaster | RequestCheckDevice | RequestMixerParameters
        | RequestAlerts | RequestUid | RequestPassword | RequestProgramVersion
        | RequestDataSchema => {}

        RequestEcomaxParameters => {}

        RequestSetEcomaxParameter => {
            if message.len() >= 2 {
                data.insert("index".to_string(), Value::U8(message[0]));
                data.insert("value".to_string(), Value::U32(message[1] as u32));
            }
        }

        RequestSetMixerParameter => {
            if message.len() >= 3 {
                data.insert("device_index".to_string(), Value::U8(message[0]));
                data.insert("index".to_string(), Value::U8(message[1]));
                data.insert("value".to_string(), Value::U32(message[2] as u32));
            }
        }

        RequestSetThermostatParameter => {
            if message.len() >= 4 {
                data.insert("index".to_string(), Value::U8(message[0]));
                data.insert("value".to_string(), Value::U32(message[1] as u32));
                data.insert("offset".to_string(), Value::U8(message[2]));
                data.insert("size".to_string(), Value::U8(message[3]));
            }
        }

        RequestSetSchedule => {}

        RequestEcomaxControl => {
            if !message.is_empty() {
                data.insert("value".to_string(), Value::U32(message[0] as u32));
            }
        }

        MessageRegulatorData => {
            return Ok(decode_regulator_data(message, &[])?);
        }

        MessageSensorData => {
            structures::sensor_data::decode(message, 0, &mut data);
        }

        ResponseDeviceAvailable => {
            let info = structures::network_info::decode(message);
            insert_network_info(&mut data, &info);
        }

        ResponseEcomaxParameters => {
            structures::ecomax_parameters::decode(message, 0, &mut data);
        }

        ResponseMixerParameters => {
            structures::mixer_parameters::decode(message, 0, &mut data);
        }

        ResponseSetEcomaxParameter | ResponseSetMixerParameter | ResponseEcomaxControl => {
            if !message.is_empty() {
                data.insert("result".to_string(), Value::U8(message[0]));
            }
        }

        ResponseAlerts => {
            structures::alerts::decode(message, 0, &mut data);
        }

        ResponseUid => {
            let info = structures::product_info::decode(message);
            data.insert("type".to_string(), Value::U8(info.r#type));
            data.insert("product".to_string(), Value::U16(info.product));
            data.insert("uid".to_string(), Value::Str(info.uid));
            data.insert("logo".to_string(), Value::U16(info.logo));
            data.insert("image".to_string(), Value::U16(info.image));
            data.insert("model".to_string(), Value::Str(info.model));
        }

        ResponsePassword => {
            if message.len() > 1 {
                data.insert(
                    "password".to_string(),
                    Value::Str(String::from_utf8_lossy(&message[1..]).to_string()),
                );
            }
        }

        ResponseProgramVersion => {
            let info = structures::version_info::decode(message)?;
            data.insert("version".to_string(), Value::Str(info.version));
            data.insert("sender".to_string(), Value::U8(info.sender));
        }

        ResponseRegulatorDataSchema => {
            let (schema, _) = structures::regulator_data_schema::decode(message, 0);
            data.insert(
                "schema".to_string(),
                Value::List(
                    schema
                        .into_iter()
                        .map(|entry| {
                            let mut m = HashMap::new();
                            m.insert("id".to_string(), Value::U16(entry.id));
                            m.insert("type".to_string(), Value::U8(entry.tag as u8));
                            Value::Map(m)
                        })
                        .collect(),
                ),
            );
        }
    }

    Ok(data)
}

fn insert_network_info(data: &mut EventDataType, info: &structures::network_info::NetworkInfo) {
    data.insert("eth_ip".to_string(), Value::Str(info.eth.ip.to_string()));
    data.insert("eth_status".to_string(), Value::Bool(info.eth.status));
    data.insert("wlan_ip".to_string(), Value::Str(info.wlan.ip.to_string()));
    data.insert("wlan_ssid".to_string(), Value::Str(info.wlan.ssid.clone()));
    data.insert("wlan_status".to_string(), Value::Bool(info.wlan.status));
    data.insert("server_status".to_string(), Value::Bool(info.server_status));
}

/// Decodes a `MESSAGE_REGULATOR_DATA` payload against a caller-supplied
/// schema (the dispatcher's cached `RESPONSE_REGULATOR_DATA_SCHEMA`).
pub fn decode_regulator_data(
    message: &[u8],
    schema: &[SchemaEntry],
) -> Result<EventDataType, crate::error::VersionError> {
    let mut data = EventDataType::new();
    structures::regulator_data::decode(message, 0, schema, &mut data)?;
    Ok(data)
}

/// Encodes a frame's event map into its wire message.
pub fn encode(frame_type: FrameType, data: &EventDataType) -> Result<Vec<u8>, FrameDataError> {
    use FrameType::*;
    Ok(match frame_type {
        RequestStopMaster | RequestStartMaster | RequestCheckDevice | RequestMixerParameters
        | RequestAlerts | RequestUid | RequestPassword | RequestProgramVersion
        | RequestDataSchema => Vec::new(),

        RequestEcomaxParameters => vec![0xFF, 0x00],

        RequestSetEcomaxParameter => vec![get_u8(data, "index")?, get_u32(data, "value")? as u8],

        RequestSetMixerParameter => vec![
            get_u8(data, "device_index")?,
            get_u8(data, "index")?,
            get_u32(data, "value")? as u8,
        ],

        RequestSetThermostatParameter => vec![
            get_u8(data, "index")?,
            get_u32(data, "value")? as u8,
            get_u8(data, "offset")?,
            get_u8(data, "size")?,
        ],

        RequestSetSchedule => {
            return Err(FrameDataError(
                "schedule requests must be built with structures::schedule::encode".to_string(),
            ));
        }

        RequestEcomaxControl => vec![get_u32(data, "value")? as u8],

        MessageRegulatorData | MessageSensorData => {
            return Err(FrameDataError(format!("{frame_type:?} is never sent by this side")));
        }

        ResponseDeviceAvailable => {
            return Err(FrameDataError(
                "device-available responses must be built with structures::network_info::encode"
                    .to_string(),
            ));
        }

        ResponseEcomaxParameters | ResponseMixerParameters | ResponseAlerts | ResponseUid
        | ResponsePassword | ResponseRegulatorDataSchema => {
            return Err(FrameDataError(format!("{frame_type:?} is never sent by this side")));
        }

        ResponseSetEcomaxParameter | ResponseSetMixerParameter | ResponseEcomaxControl => {
            vec![get_u8(data, "result").unwrap_or(1)]
        }

        ResponseProgramVersion => {
            return Err(FrameDataError(
                "program-version responses must be built with structures::version_info::encode"
                    .to_string(),
            ));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_ecomax_parameters_request_as_all() {
        let data = EventDataType::new();
        assert_eq!(encode(FrameType::RequestEcomaxParameters, &data).unwrap(), vec![0xFF, 0x00]);
    }

    #[test]
    fn round_trips_set_ecomax_parameter() {
        let mut data = EventDataType::new();
        data.insert("index".to_string(), Value::U8(5));
        data.insert("value".to_string(), Value::U32(42));
        let bytes = encode(FrameType::RequestSetEcomaxParameter, &data).unwrap();
        let decoded = decode(FrameType::RequestSetEcomaxParameter, &bytes).unwrap();
        assert_eq!(decoded.get("index").unwrap().as_i64().unwrap(), 5);
        assert_eq!(decoded.get("value").unwrap().as_i64().unwrap(), 42);
    }

    #[test]
    fn decodes_uid_response() {
        let message = [
            0x00, // type
            0x01, 0x00, // product
            0x01, // uid_len
            0x41, // uid byte
            0x02, 0x00, // logo
            0x03, 0x00, // image
            0x02, // model_len
            b'E', b'M',
        ];
        let data = decode(FrameType::ResponseUid, &message).unwrap();
        assert!(data.contains_key("uid"));
        assert_eq!(data.get("model").unwrap().as_str().unwrap(), "ecoMAX ");
    }
}
