//! Lambda (oxygen) sensor decoder (§4.2.3 item 15).

use serde::Serialize;

use crate::structures::BYTE_UNDEFINED;
use crate::value::{EventDataType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LambdaState {
    Stop,
    Start,
    Working,
    Unknown(u8),
}

impl LambdaState {
    fn from_raw(raw: u8) -> Self {
        decode_state(raw)
    }
}

/// Maps a raw lambda-state byte onto the closed set of known states,
/// falling back to `Unknown` for anything else. Shared with the sensor-data
/// decoder, which carries its own copy of the same three-byte block.
pub fn decode_state(raw: u8) -> LambdaState {
    match raw {
        0 => LambdaState::Stop,
        1 => LambdaState::Start,
        2 => LambdaState::Working,
        other => LambdaState::Unknown(other),
    }
}

/// Decodes the lambda sensor block starting at `offset`, returning the new
/// offset. Absent (`0xFF` state byte) leaves `data` untouched.
pub fn decode(message: &[u8], offset: usize, data: &mut EventDataType) -> usize {
    let mut offset = offset;
    let raw_state = message[offset];
    offset += 1;
    if raw_state == BYTE_UNDEFINED {
        return offset;
    }

    let target = message[offset];
    offset += 1;
    let level = u16::from_le_bytes([message[offset], message[offset + 1]]);
    offset += 2;

    data.insert(
        "lambda_state".to_string(),
        Value::LambdaState(LambdaState::from_raw(raw_state)),
    );
    data.insert("lambda_target".to_string(), Value::U8(target));
    data.insert("lambda_level".to_string(), Value::F64(level as f64 / 10.0));

    offset
}
